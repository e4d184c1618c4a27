//! oEmbed lookup: embed metadata for a video URL, no credentials needed.

use crate::error::{Result, VimeoError};
use crate::vimeo::client::{VimeoClient, status_error};
use crate::vimeo::models::OEmbed;
use tracing::debug;

/// An oEmbed request under construction.
#[derive(Debug)]
#[must_use = "an oEmbed request does nothing until `send` is awaited"]
pub struct OEmbedRequest<'a> {
    client: &'a VimeoClient,
    params: Vec<(String, String)>,
}

impl VimeoClient {
    /// Look up embed metadata for `video_url`.
    ///
    /// # Arguments
    /// * `video_url` - Public URL of the video page
    ///
    /// # Returns
    /// * `OEmbedRequest` - Builder for the optional player parameters
    ///
    /// # Details
    /// The request is unauthenticated and needs no credentials.
    pub fn oembed(&self, video_url: &str) -> OEmbedRequest<'_> {
        OEmbedRequest {
            client: self,
            params: vec![("url".to_string(), video_url.to_string())],
        }
    }
}

impl OEmbedRequest<'_> {
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn width(self, width: u32) -> Self {
        self.param("width", width)
    }

    pub fn height(self, height: u32) -> Self {
        self.param("height", height)
    }

    pub fn max_width(self, max_width: u32) -> Self {
        self.param("maxwidth", max_width)
    }

    pub fn max_height(self, max_height: u32) -> Self {
        self.param("maxheight", max_height)
    }

    pub fn byline(self, show: bool) -> Self {
        self.param("byline", show)
    }

    pub fn title(self, show: bool) -> Self {
        self.param("title", show)
    }

    pub fn portrait(self, show: bool) -> Self {
        self.param("portrait", show)
    }

    /// Player accent color as hex without `#`, e.g. `00adef`.
    pub fn color(self, color: &str) -> Self {
        self.param("color", color.trim_start_matches('#'))
    }

    pub fn autoplay(self, autoplay: bool) -> Self {
        self.param("autoplay", autoplay)
    }

    pub fn looped(self, looped: bool) -> Self {
        self.param("loop", looped)
    }

    pub async fn send(self) -> Result<OEmbed> {
        let client = self.client;
        let response = client
            .http
            .get(&client.endpoints.oembed_url)
            .query(&self.params)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "oEmbed response");
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        serde_json::from_slice(&body).map_err(|e| VimeoError::decode("json", e))
    }
}
