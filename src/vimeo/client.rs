//! Vimeo Advanced API client and method dispatcher.
//!
//! Every remote method is reachable by name through [`VimeoClient::call`];
//! nothing here enumerates the API's method families.

use crate::config::{Config, CredentialSource};
use crate::decode::{self, Payload, ResponseFormat};
use crate::error::{Result, VimeoError};
use crate::oauth::{Consumer, Signer, Token};
use crate::vimeo::auth::AuthState;
use crate::vimeo::method::MethodPath;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, StatusCode};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Remote endpoints, all derived from one base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub request_token_url: String,
    pub access_token_url: String,
    pub authorization_url: String,
    pub rest_url: String,
    pub oembed_url: String,
}

impl Endpoints {
    pub fn for_base(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            request_token_url: format!("{}/oauth/request_token", base),
            access_token_url: format!("{}/oauth/access_token", base),
            authorization_url: format!("{}/oauth/authorize", base),
            rest_url: format!("{}/api/rest/v2", base),
            oembed_url: format!("{}/api/oembed.json", base),
        }
    }
}

/// Vimeo Advanced API client.
///
/// Owns the consumer credentials, the default response format and the
/// authorization state. Token fields change only through the authorization
/// flow, which takes `&mut self`; share a client between tasks only behind
/// external locking, or give each caller its own clone.
#[derive(Debug, Clone)]
pub struct VimeoClient {
    pub(crate) http: Client,
    pub(crate) consumer: Option<Consumer>,
    pub(crate) auth: AuthState,
    pub(crate) format: ResponseFormat,
    pub(crate) endpoints: Endpoints,
    pub(crate) callback_url: Option<String>,
}

impl VimeoClient {
    /// Create a new client from configuration.
    ///
    /// # Arguments
    /// * `config` - Credentials, default format, base URL and HTTP settings
    ///
    /// # Returns
    /// * `Result<VimeoClient>` - Client, or an error if the HTTP client cannot be built
    ///
    /// # Details
    /// Credentials are not required here: oEmbed lookups work without them,
    /// and API calls fail with [`VimeoError::MissingCredentials`] before any
    /// network I/O when they are absent. A configured access token (token
    /// and secret) puts the client straight into the authorized state.
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        let auth = match config.access_token() {
            Some(token) => AuthState::Authorized(token),
            None => AuthState::Unauthenticated,
        };

        Ok(Self {
            http,
            consumer: config.consumer(),
            auth,
            format: config.format.clone(),
            endpoints: Endpoints::for_base(&config.base_url),
            callback_url: config.callback_url.clone(),
        })
    }

    /// Create a client, looking up missing consumer credentials in `source`.
    pub fn with_credential_source(config: &Config, source: &dyn CredentialSource) -> Result<Self> {
        Self::new(&config.clone().with_credential_source(source))
    }

    pub fn format(&self) -> &ResponseFormat {
        &self.format
    }

    pub fn set_format(&mut self, format: impl Into<ResponseFormat>) {
        self.format = format.into();
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn has_consumer(&self) -> bool {
        self.consumer.is_some()
    }

    /// Start building a call to the named remote method.
    ///
    /// # Arguments
    /// * `method` - Method identifier, dotted or underscore-joined
    ///
    /// # Returns
    /// * `MethodCall` - Builder; nothing is sent until `send` is awaited
    ///
    /// # Details
    /// Accepts any spelling [`MethodPath::parse`] understands, e.g.
    /// `client.call("videos_getInfo").param("video_id", 42).send().await`.
    pub fn call(&self, method: &str) -> MethodCall<'_> {
        MethodCall {
            client: self,
            path: MethodPath::parse(method),
            params: Vec::new(),
            format: None,
            user_token_required: false,
            process: true,
        }
    }

    /// Call `method` with `params` using the default format.
    pub async fn invoke<K, V>(&self, method: &str, params: &[(K, V)]) -> Result<Payload>
    where
        K: AsRef<str>,
        V: ToString,
    {
        self.call(method)
            .params(params.iter().map(|(k, v)| (k.as_ref(), v.to_string())))
            .send()
            .await
    }

    pub(crate) fn require_consumer(&self) -> Result<&Consumer> {
        self.consumer
            .as_ref()
            .ok_or(VimeoError::MissingCredentials("consumer key and secret are not configured"))
    }

    /// Send a signed request with `params` in the query string.
    ///
    /// Returns the status and the raw body; interpreting it is up to the
    /// caller.
    pub(crate) async fn signed_get(
        &self,
        url: &str,
        params: &[(String, String)],
        token: Option<&Token>,
        extra_oauth: &[(&str, &str)],
    ) -> Result<(StatusCode, Vec<u8>)> {
        let consumer = self.require_consumer()?;
        let authorization = Signer::new(consumer, token).authorization_header(
            Method::GET.as_str(),
            url,
            params,
            extra_oauth,
        )?;

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, authorization)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?.to_vec();
        Ok((status, body))
    }
}

impl fmt::Display for VimeoClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokened = if self.auth.is_authorized() { "T" } else { "Unt" };
        write!(
            f,
            "<{}okened Vimeo API Client ({})>",
            tokened,
            self.format.as_str().to_uppercase()
        )
    }
}

/// Decode a response body, giving the service's error envelope priority
/// over the HTTP status.
pub(crate) fn interpret(status: StatusCode, format: &ResponseFormat, body: &[u8]) -> Result<Payload> {
    match decode::decode(format, body) {
        Err(err @ VimeoError::RemoteApi { .. }) => {
            warn!(code = err.remote_code().unwrap_or_default(), "remote API reported an error");
            Err(err)
        }
        _ if !status.is_success() => Err(status_error(status, body)),
        decoded => decoded,
    }
}

/// Error for a non-success status that carried no error envelope.
pub(crate) fn status_error(status: StatusCode, body: &[u8]) -> VimeoError {
    let text = String::from_utf8_lossy(body).trim().to_string();
    let message = if text.is_empty() {
        status.canonical_reason().unwrap_or("unexpected status").to_string()
    } else {
        text
    };
    VimeoError::remote(status.as_u16().to_string(), message)
}

/// A single remote method invocation under construction.
#[derive(Debug)]
#[must_use = "a method call does nothing until `send` is awaited"]
pub struct MethodCall<'a> {
    client: &'a VimeoClient,
    path: Result<MethodPath>,
    params: Vec<(String, String)>,
    format: Option<ResponseFormat>,
    user_token_required: bool,
    process: bool,
}

impl MethodCall<'_> {
    /// Add a keyword parameter. A `format` parameter overrides the response
    /// format for this call.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        if key == "format" {
            self.format = Some(ResponseFormat::from(value));
        } else {
            self.params.push((key, value));
        }
        self
    }

    pub fn params<I, K, V>(self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        params
            .into_iter()
            .fold(self, |call, (key, value)| call.param(key, value))
    }

    pub fn format(mut self, format: impl Into<ResponseFormat>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Refuse to send unless the client holds an access token.
    pub fn require_user_token(mut self) -> Self {
        self.user_token_required = true;
        self
    }

    /// Return the body as [`Payload::Raw`] without decoding it.
    pub fn unprocessed(mut self) -> Self {
        self.process = false;
        self
    }

    pub async fn send(self) -> Result<Payload> {
        let path = self.path?;
        let client = self.client;
        let format = self.format.unwrap_or_else(|| client.format.clone());

        client.require_consumer()?;
        let token = client.auth.access_token();
        if self.user_token_required && token.is_none() {
            return Err(VimeoError::invalid_state(format!(
                "{} requires an access token; complete the authorization flow first",
                path
            )));
        }

        let mut params = self.params;
        params.push(("method".to_string(), path.remote_name()));
        params.push(("format".to_string(), format.as_str().to_string()));

        debug!(
            method = %path,
            format = %format,
            authorized = token.is_some(),
            "calling remote method"
        );

        let (status, body) = client
            .signed_get(&client.endpoints.rest_url, &params, token, &[])
            .await?;

        debug!(method = %path, status = status.as_u16(), bytes = body.len(), "received response");

        if !self.process {
            if !status.is_success() {
                return Err(status_error(status, &body));
            }
            return Ok(Payload::Raw {
                format: format.as_str().to_string(),
                body,
            });
        }
        interpret(status, &format, &body)
    }
}
