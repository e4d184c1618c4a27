mod common;

use common::{authorization_headers, authorized_client_for, client_for, config_for, request_count};
use serde_json::json;
use vimeo_client::{Config, Consumer, CredentialSource, Payload, VimeoClient, VimeoError};
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REST_PATH: &str = "/api/rest/v2";

async fn mount_method(server: &MockServer, name: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(REST_PATH))
        .and(query_param("method", name))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_json_call_is_signed_and_unwrapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REST_PATH))
        .and(query_param("method", "vimeo.videos.getInfo"))
        .and(query_param("video_id", "42"))
        .and(query_param("format", "json"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"generated_in":"0.0123","stat":"ok","video":[{"id":"42","title":"Sintel"}]}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let payload = client
        .call("videos_getInfo")
        .param("video_id", 42)
        .send()
        .await
        .unwrap();

    assert_eq!(payload, Payload::Json(json!([{"id": "42", "title": "Sintel"}])));

    let headers = authorization_headers(&server).await;
    assert!(headers[0].starts_with("OAuth "));
    assert!(headers[0].contains("oauth_consumer_key=\"consumer-key\""));
    assert!(!headers[0].contains("oauth_token="));
}

#[tokio::test]
async fn test_authorized_call_carries_access_token() {
    let server = MockServer::start().await;
    mount_method(
        &server,
        "vimeo.test.login",
        ResponseTemplate::new(200)
            .set_body_string(r#"{"stat":"ok","generated_in":"0","user":{"id":"7","username":"brad"}}"#),
    )
    .await;

    let client = authorized_client_for(&server);
    let payload = client.call("test.login").send().await.unwrap();
    assert_eq!(payload.as_json().unwrap()["username"], "brad");

    let headers = authorization_headers(&server).await;
    assert!(headers[0].contains("oauth_token=\"access-token\""));
}

#[tokio::test]
async fn test_invoke_with_param_slice() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REST_PATH))
        .and(query_param("method", "vimeo.albums.getAll"))
        .and(query_param("user_id", "brad"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"stat":"ok","generated_in":"0","albums":{"on_this_page":"0","album":[]}}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let payload = client
        .invoke("albums.getAll", &[("user_id", "brad"), ("page", "2")])
        .await
        .unwrap();
    assert_eq!(payload.as_json().unwrap()["album"], json!([]));
}

#[tokio::test]
async fn test_xml_call_returns_tree() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REST_PATH))
        .and(query_param("method", "vimeo.people.getInfo"))
        .and(query_param("format", "xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<?xml version="1.0" encoding="utf-8"?>
<rsp generated_in="0.01" stat="ok">
  <person id="7" is_plus="1"><display_name>Brad</display_name></person>
</rsp>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let payload = client
        .call("people.getInfo")
        .param("user_id", "brad")
        .format("XML")
        .send()
        .await
        .unwrap();

    let root = payload.as_xml().unwrap();
    assert_eq!(root.attr("stat"), Some("ok"));
    let person = root.child("person").unwrap();
    assert_eq!(person.attr("id"), Some("7"));
    assert_eq!(person.child("display_name").unwrap().text, "Brad");
}

#[tokio::test]
async fn test_remote_error_envelope_keeps_code_and_message() {
    let server = MockServer::start().await;
    mount_method(
        &server,
        "vimeo.videos.getInfo",
        ResponseTemplate::new(200).set_body_string(
            r#"{"generated_in":"0.01","stat":"fail","err":{"code":"1","expl":"The video id passed was either invalid or not found.","msg":"Video not found"}}"#,
        ),
    )
    .await;

    let client = client_for(&server);
    match client.call("videos.getInfo").param("video_id", 0).send().await {
        Err(VimeoError::RemoteApi {
            code,
            message,
            explanation,
        }) => {
            assert_eq!(code, "1");
            assert_eq!(message, "Video not found");
            assert!(explanation.unwrap().contains("not found"));
        }
        other => panic!("expected remote error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_xml_error_envelope_on_http_error_status() {
    let server = MockServer::start().await;
    mount_method(
        &server,
        "vimeo.videos.delete",
        ResponseTemplate::new(401).set_body_string(
            r#"<rsp generated_in="0.01" stat="fail"><err code="401" expl="The oauth_token passed was either not valid or has expired." msg="Invalid / expired token"/></rsp>"#,
        ),
    )
    .await;

    let mut client = authorized_client_for(&server);
    client.set_format("xml");
    let err = client
        .call("videos.delete")
        .param("video_id", 1)
        .send()
        .await
        .unwrap_err();
    assert_eq!(err.remote_code(), Some("401"));
    assert!(err.to_string().contains("Invalid / expired token"));
}

#[tokio::test]
async fn test_http_error_without_envelope_uses_status() {
    let server = MockServer::start().await;
    mount_method(
        &server,
        "vimeo.videos.search",
        ResponseTemplate::new(503).set_body_string("Service Unavailable"),
    )
    .await;

    let client = client_for(&server);
    let err = client
        .call("videos.search")
        .param("query", "cats")
        .send()
        .await
        .unwrap_err();
    assert_eq!(err.remote_code(), Some("503"));
}

#[tokio::test]
async fn test_malformed_json_is_decode_error() {
    let server = MockServer::start().await;
    mount_method(
        &server,
        "vimeo.videos.getInfo",
        ResponseTemplate::new(200).set_body_string(r#"{"stat":"ok","video":[{"id":"#),
    )
    .await;

    let client = client_for(&server);
    let result = client.call("videos.getInfo").param("video_id", 1).send().await;
    assert!(matches!(result, Err(VimeoError::Decode { .. })));
}

#[tokio::test]
async fn test_unknown_format_returns_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REST_PATH))
        .and(query_param("format", "php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a:1:{s:4:\"stat\";s:2:\"ok\";}"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let payload = client.call("test.echo").param("format", "PHP").send().await.unwrap();
    assert_eq!(
        payload,
        Payload::Raw {
            format: "php".to_string(),
            body: b"a:1:{s:4:\"stat\";s:2:\"ok\";}".to_vec(),
        }
    );
}

#[tokio::test]
async fn test_unprocessed_call_skips_decoding() {
    let server = MockServer::start().await;
    let body = r#"{"stat":"ok","generated_in":"0","echo":{"foo":"bar"}}"#;
    mount_method(&server, "vimeo.test.echo", ResponseTemplate::new(200).set_body_string(body)).await;

    let client = client_for(&server);
    let payload = client
        .call("test.echo")
        .param("foo", "bar")
        .unprocessed()
        .send()
        .await
        .unwrap();
    assert_eq!(payload.raw_body(), Some(body.as_bytes()));
}

#[tokio::test]
async fn test_missing_credentials_fail_before_network() {
    let server = MockServer::start().await;
    let config = Config {
        base_url: server.uri(),
        format: "json".into(),
        ..Config::default()
    };
    let client = VimeoClient::new(&config).unwrap();

    let result = client.call("videos.getInfo").param("video_id", 1).send().await;
    assert!(matches!(result, Err(VimeoError::MissingCredentials(_))));
    assert_eq!(request_count(&server).await, 0);
}

struct HostSettings;

impl CredentialSource for HostSettings {
    fn consumer_credentials(&self) -> Option<Consumer> {
        Some(Consumer::new("host-key", "host-secret"))
    }
}

#[tokio::test]
async fn test_credentials_fall_back_to_ambient_source() {
    let server = MockServer::start().await;
    mount_method(
        &server,
        "vimeo.test.null",
        ResponseTemplate::new(200).set_body_string(r#"{"stat":"ok","generated_in":"0"}"#),
    )
    .await;

    let config = Config {
        base_url: server.uri(),
        ..Config::default()
    };
    let client = VimeoClient::with_credential_source(&config, &HostSettings).unwrap();
    let payload = client.call("test.null").send().await.unwrap();
    assert_eq!(payload, Payload::Json(json!({})));

    let headers = authorization_headers(&server).await;
    assert!(headers[0].contains("oauth_consumer_key=\"host-key\""));
}

#[tokio::test]
async fn test_user_token_required_without_token_fails_early() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    let result = client
        .call("videos.setTitle")
        .param("video_id", 1)
        .param("title", "New")
        .require_user_token()
        .send()
        .await;
    assert!(matches!(result, Err(VimeoError::InvalidState(_))));
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_invalid_method_name_is_rejected_locally() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    let result = client.call("videos..getInfo").send().await;
    assert!(matches!(result, Err(VimeoError::InvalidInput(_))));
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    let config = Config {
        base_url: "http://127.0.0.1:1".to_string(),
        ..config_for(&MockServer::start().await)
    };
    let client = VimeoClient::new(&config).unwrap();

    let result = client.call("test.echo").send().await;
    assert!(matches!(result, Err(VimeoError::Transport(_))));
}
