//! Vimeo Advanced API integration module.
//!
//! Provides the client façade: method dispatch, the OAuth handshake,
//! chunked uploads and oEmbed lookups.

pub mod auth;
pub mod client;
pub mod method;
pub mod models;
pub mod oembed;
pub mod upload;

pub use auth::{AuthState, Permission};
pub use client::{Endpoints, MethodCall, VimeoClient};
pub use method::MethodPath;
pub use models::{OEmbed, UploadQuota, UploadTicket};
pub use oembed::OEmbedRequest;
pub use upload::{DEFAULT_CHUNK_SIZE, Progress, UploadSession};
