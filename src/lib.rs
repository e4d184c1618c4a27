//! Client library for the Vimeo Advanced API.
//!
//! Any remote method is callable by name, requests are signed with OAuth 1.0a,
//! and responses are decoded as JSON, XML, or handed back raw.
//!
//! ```no_run
//! # async fn demo() -> vimeo_client::Result<()> {
//! use vimeo_client::{Config, VimeoClient};
//!
//! let config = Config {
//!     consumer_key: Some("key".into()),
//!     consumer_secret: Some("secret".into()),
//!     ..Config::default()
//! };
//! let client = VimeoClient::new(&config)?;
//! let videos = client.call("videos.getUploaded").param("user_id", "brad").send().await?;
//! println!("{:?}", videos.as_json());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod decode;
pub mod error;
pub mod oauth;
pub mod vimeo;

pub use config::{Config, CredentialSource, EnvCredentials};
pub use decode::{Payload, ResponseFormat, XmlElement};
pub use error::{Result, VimeoError};
pub use oauth::{Consumer, Token};
pub use vimeo::{AuthState, MethodPath, OEmbed, Permission, UploadSession, VimeoClient};
