//! Three-legged OAuth flow.
//!
//! UNAUTHENTICATED -> REQUEST_TOKEN_OBTAINED -> AUTHORIZED, forward only.
//! A failed step leaves the state where it was.

use crate::error::{Result, VimeoError};
use crate::oauth::Token;
use crate::vimeo::client::{VimeoClient, status_error};
use std::fmt;
use tracing::{debug, info};

const OUT_OF_BAND: &str = "oob";

/// Authorization state of a client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    /// Holds the temporary request token.
    RequestTokenObtained(Token),
    /// Holds the access token used to sign calls.
    Authorized(Token),
}

impl AuthState {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }

    pub fn access_token(&self) -> Option<&Token> {
        match self {
            Self::Authorized(token) => Some(token),
            _ => None,
        }
    }

    pub fn request_token(&self) -> Option<&Token> {
        match self {
            Self::RequestTokenObtained(token) => Some(token),
            _ => None,
        }
    }
}

/// Access level requested on the authorization page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Permission {
    #[default]
    Read,
    Write,
    Delete,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl VimeoClient {
    pub fn auth_state(&self) -> &AuthState {
        &self.auth
    }

    pub fn access_token(&self) -> Option<&Token> {
        self.auth.access_token()
    }

    /// Step 1: obtain a temporary request token.
    ///
    /// # Returns
    /// * `Result<()>` - Ok once the request token is stored in the client
    ///
    /// # Details
    /// Sends the configured callback URL, or `oob` when none is set.
    /// May be repeated before the user authorizes, replacing the previous
    /// temporary token. Fails with [`VimeoError::InvalidState`] once the
    /// client is authorized.
    pub async fn get_request_token(&mut self) -> Result<()> {
        if self.auth.is_authorized() {
            return Err(VimeoError::invalid_state(
                "client is already authorized; use a fresh client to restart the flow",
            ));
        }
        let callback = self.callback_url.as_deref().unwrap_or(OUT_OF_BAND);
        let token = self
            .fetch_token(&self.endpoints.request_token_url, None, &[("oauth_callback", callback)])
            .await?;
        debug!(token = %token.key, "obtained request token");
        self.auth = AuthState::RequestTokenObtained(token);
        Ok(())
    }

    /// Step 2: URL the user visits to grant access.
    ///
    /// # Arguments
    /// * `permission` - Access level to request
    ///
    /// # Returns
    /// * `Result<String>` - Authorization URL carrying the request token
    ///
    /// # Details
    /// No request is sent. Fails with [`VimeoError::InvalidState`] unless a
    /// request token is present.
    pub fn get_authorization_url(&self, permission: Permission) -> Result<String> {
        let token = self.auth.request_token().ok_or_else(|| {
            VimeoError::invalid_state("no request token present; call get_request_token first")
        })?;
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("oauth_token", &token.key)
            .append_pair("permission", permission.as_str())
            .finish();
        Ok(format!("{}?{}", self.endpoints.authorization_url, query))
    }

    /// Step 3: exchange the request token and the user's verifier for an
    /// access token.
    ///
    /// # Arguments
    /// * `verifier` - Code shown to the user after granting access
    ///
    /// # Returns
    /// * `Result<Token>` - Access token
    ///
    /// # Details
    /// On failure the request token is kept, so the exchange can be retried.
    /// The token is kept for subsequent calls and also returned so the
    /// caller can store it.
    pub async fn get_access_token(&mut self, verifier: &str) -> Result<Token> {
        let request_token = match &self.auth {
            AuthState::RequestTokenObtained(token) => token,
            AuthState::Unauthenticated => {
                return Err(VimeoError::invalid_state(
                    "no request token present; call get_request_token first",
                ));
            }
            AuthState::Authorized(_) => {
                return Err(VimeoError::invalid_state("client is already authorized"));
            }
        };
        let token = self
            .fetch_token(
                &self.endpoints.access_token_url,
                Some(request_token),
                &[("oauth_verifier", verifier)],
            )
            .await?;
        info!(token = %token.key, "authorization granted");
        self.auth = AuthState::Authorized(token.clone());
        Ok(token)
    }

    async fn fetch_token(
        &self,
        url: &str,
        token: Option<&Token>,
        extra_oauth: &[(&str, &str)],
    ) -> Result<Token> {
        let (status, body) = self.signed_get(url, &[], token, extra_oauth).await?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        parse_token_response(&body)
    }
}

/// Parse `oauth_token=...&oauth_token_secret=...`.
fn parse_token_response(body: &[u8]) -> Result<Token> {
    let mut key = None;
    let mut secret = None;
    for (name, value) in form_urlencoded::parse(body) {
        match name.as_ref() {
            "oauth_token" => key = Some(value.into_owned()),
            "oauth_token_secret" => secret = Some(value.into_owned()),
            _ => {}
        }
    }
    match (key, secret) {
        (Some(key), Some(secret)) => Ok(Token::new(key, secret)),
        _ => Err(VimeoError::decode(
            "form",
            "token response lacks oauth_token or oauth_token_secret",
        )),
    }
}
