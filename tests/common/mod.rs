#![allow(dead_code)]

use vimeo_client::{Config, VimeoClient};
use wiremock::MockServer;

pub fn config_for(server: &MockServer) -> Config {
    Config {
        consumer_key: Some("consumer-key".to_string()),
        consumer_secret: Some("consumer-secret".to_string()),
        base_url: server.uri(),
        ..Config::default()
    }
}

pub fn client_for(server: &MockServer) -> VimeoClient {
    VimeoClient::new(&config_for(server)).unwrap()
}

pub fn authorized_client_for(server: &MockServer) -> VimeoClient {
    let config = Config {
        access_token: Some("access-token".to_string()),
        access_token_secret: Some("access-secret".to_string()),
        ..config_for(server)
    };
    VimeoClient::new(&config).unwrap()
}

/// Authorization header of every request the server saw, in order.
pub async fn authorization_headers(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| {
            request
                .headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

pub async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}
