//! OAuth 1.0a request signing (HMAC-SHA1).
//!
//! Builds the `Authorization: OAuth ...` header for a request from the
//! consumer credentials, an optional token and the request parameters.

use crate::error::{Result, VimeoError};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distributions::Alphanumeric;
use reqwest::Url;
use sha1::Sha1;
use std::fmt;

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// Application credential pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Consumer {
    pub key: String,
    pub secret: String,
}

impl Consumer {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Token pair: either the temporary request token or the user's access token.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub key: String,
    pub secret: String,
}

impl Token {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// RFC 3986 percent encoding: everything except ALPHA, DIGIT, '-', '.', '_', '~'.
pub fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.as_bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(*b as char)
            }
            b => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Build the signature base string.
///
/// `url` must already be normalized (no query, no default port); `params`
/// holds every request and `oauth_*` parameter except `oauth_signature`.
pub fn signature_base_string(method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<String>>()
        .join("&");

    format!(
        "{}&{}&{}",
        percent_encode(&method.to_uppercase()),
        percent_encode(url),
        percent_encode(&param_string)
    )
}

/// HMAC-SHA1 over the base string, base64 encoded.
pub fn sign(base_string: &str, consumer_secret: &str, token_secret: Option<&str>) -> Result<String> {
    let signing_key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret.unwrap_or_default())
    );
    let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
        .map_err(|e| VimeoError::invalid_input(format!("Invalid signing key: {}", e)))?;
    mac.update(base_string.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Split a URL into its normalized signing form and its query pairs.
fn normalize_url(url: &str) -> Result<(String, Vec<(String, String)>)> {
    let parsed =
        Url::parse(url).map_err(|e| VimeoError::invalid_input(format!("Invalid URL {}: {}", url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| VimeoError::invalid_input(format!("URL has no host: {}", url)))?;
    let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
    let normalized = format!("{}://{}{}{}", parsed.scheme(), host, port, parsed.path());
    let query = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    Ok((normalized, query))
}

/// Signs requests for one consumer and an optional token.
#[derive(Debug, Clone, Copy)]
pub struct Signer<'a> {
    consumer: &'a Consumer,
    token: Option<&'a Token>,
}

impl<'a> Signer<'a> {
    pub fn new(consumer: &'a Consumer, token: Option<&'a Token>) -> Self {
        Self { consumer, token }
    }

    /// Authorization header with a fresh nonce and the current timestamp.
    ///
    /// `extra` carries additional protocol parameters such as
    /// `oauth_callback` or `oauth_verifier`.
    pub fn authorization_header(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        extra: &[(&str, &str)],
    ) -> Result<String> {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorization_header_with(method, url, params, extra, &nonce, &timestamp)
    }

    pub fn authorization_header_with(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        extra: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String> {
        let mut oauth_params: Vec<(String, String)> = vec![
            ("oauth_consumer_key".to_string(), self.consumer.key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), SIGNATURE_METHOD.to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
        ];
        if let Some(token) = self.token {
            oauth_params.push(("oauth_token".to_string(), token.key.clone()));
        }
        oauth_params.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let (normalized_url, query) = normalize_url(url)?;
        let mut all_params = oauth_params.clone();
        all_params.extend(query);
        all_params.extend(params.iter().cloned());

        let base_string = signature_base_string(method, &normalized_url, &all_params);
        let signature = sign(
            &base_string,
            &self.consumer.secret,
            self.token.map(|t| t.secret.as_str()),
        )?;
        oauth_params.push(("oauth_signature".to_string(), signature));
        oauth_params.sort();

        let header_parts: Vec<String> = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect();

        Ok(format!("OAuth {}", header_parts.join(", ")))
    }
}
