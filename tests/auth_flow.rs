mod common;

use common::{authorization_headers, authorized_client_for, client_for, request_count};
use vimeo_client::{AuthState, Permission, Token, VimeoError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_request_token(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/oauth/request_token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "oauth_token=request-token&oauth_token_secret=request-secret&oauth_callback_confirmed=true",
        ))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_three_legged_flow() {
    let server = MockServer::start().await;
    mount_request_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/oauth/access_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("oauth_token=access-token&oauth_token_secret=access-secret"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/rest/v2"))
        .and(query_param("method", "vimeo.test.login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"stat":"ok","generated_in":"0","user":{"id":"7"}}"#),
        )
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    assert_eq!(client.auth_state(), &AuthState::Unauthenticated);

    client.get_request_token().await.unwrap();
    assert_eq!(
        client.auth_state(),
        &AuthState::RequestTokenObtained(Token::new("request-token", "request-secret"))
    );

    let url = client.get_authorization_url(Permission::Write).unwrap();
    assert_eq!(
        url,
        format!("{}/oauth/authorize?oauth_token=request-token&permission=write", server.uri())
    );

    let token = client.get_access_token("verifier-123").await.unwrap();
    assert_eq!(token, Token::new("access-token", "access-secret"));
    assert!(client.auth_state().is_authorized());
    assert_eq!(client.access_token(), Some(&token));

    client.call("test.login").send().await.unwrap();

    let headers = authorization_headers(&server).await;
    assert_eq!(headers.len(), 3);
    assert!(headers[0].contains("oauth_callback=\"oob\""));
    assert!(!headers[0].contains("oauth_token="));
    assert!(headers[1].contains("oauth_token=\"request-token\""));
    assert!(headers[1].contains("oauth_verifier=\"verifier-123\""));
    assert!(headers[2].contains("oauth_token=\"access-token\""));
}

#[tokio::test]
async fn test_access_token_before_request_token_sends_nothing() {
    let server = MockServer::start().await;
    let mut client = client_for(&server);

    let result = client.get_access_token("verifier").await;
    assert!(matches!(result, Err(VimeoError::InvalidState(_))));
    assert_eq!(client.auth_state(), &AuthState::Unauthenticated);
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_repeated_request_token_replaces_previous() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth/request_token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("oauth_token=first-token&oauth_token_secret=first-secret"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oauth/request_token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("oauth_token=second-token&oauth_token_secret=second-secret"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    client.get_request_token().await.unwrap();
    assert_eq!(client.auth_state().request_token(), Some(&Token::new("first-token", "first-secret")));

    client.get_request_token().await.unwrap();
    assert_eq!(
        client.auth_state(),
        &AuthState::RequestTokenObtained(Token::new("second-token", "second-secret"))
    );

    let url = client.get_authorization_url(Permission::Read).unwrap();
    assert!(url.contains("oauth_token=second-token"));
    assert!(!url.contains("first-token"));

    // The second request is signed without the discarded temporary token.
    let headers = authorization_headers(&server).await;
    assert_eq!(headers.len(), 2);
    assert!(!headers[1].contains("oauth_token="));
}

#[tokio::test]
async fn test_failed_request_token_leaves_state_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth/request_token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid consumer key"))
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    let err = client.get_request_token().await.unwrap_err();
    assert_eq!(err.remote_code(), Some("401"));
    assert_eq!(client.auth_state(), &AuthState::Unauthenticated);
}

#[tokio::test]
async fn test_failed_exchange_keeps_request_token() {
    let server = MockServer::start().await;
    mount_request_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/oauth/access_token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid verifier"))
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    client.get_request_token().await.unwrap();
    let err = client.get_access_token("wrong").await.unwrap_err();
    assert_eq!(err.remote_code(), Some("401"));
    assert_eq!(
        client.auth_state().request_token(),
        Some(&Token::new("request-token", "request-secret"))
    );
    assert!(client.get_authorization_url(Permission::Read).is_ok());
}

#[tokio::test]
async fn test_garbled_token_response_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth/request_token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    let result = client.get_request_token().await;
    assert!(matches!(result, Err(VimeoError::Decode { .. })));
    assert_eq!(client.auth_state(), &AuthState::Unauthenticated);
}

#[tokio::test]
async fn test_preauthorized_client_skips_flow() {
    let server = MockServer::start().await;
    let mut client = authorized_client_for(&server);

    assert!(client.auth_state().is_authorized());
    assert!(matches!(
        client.get_request_token().await,
        Err(VimeoError::InvalidState(_))
    ));
    assert!(matches!(
        client.get_access_token("verifier").await,
        Err(VimeoError::InvalidState(_))
    ));
    assert!(client.auth_state().is_authorized());
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_request_token_needs_consumer_credentials() {
    let server = MockServer::start().await;
    let mut client = vimeo_client::VimeoClient::new(&vimeo_client::Config {
        base_url: server.uri(),
        ..Default::default()
    })
    .unwrap();

    assert!(matches!(
        client.get_request_token().await,
        Err(VimeoError::MissingCredentials(_))
    ));
    assert_eq!(request_count(&server).await, 0);
}
