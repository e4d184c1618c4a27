//! Typed models for the responses the client interprets itself.
//!
//! The API is loose about numbers: the same field may arrive as `1024` or
//! `"1024"`, so numeric and boolean fields go through the lenient
//! deserializers in [`lenient`].

use serde::{Deserialize, Serialize};

/// Upload quota of the authorized user (`vimeo.videos.upload.getQuota`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadQuota {
    pub upload_space: UploadSpace,
    /// Whether the user may still upload SD video this period
    #[serde(default, deserialize_with = "lenient::flag")]
    pub sd_quota: bool,
    /// Whether the user may still upload HD video this period
    #[serde(default, deserialize_with = "lenient::flag")]
    pub hd_quota: bool,
}

/// Remaining and total upload space in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadSpace {
    #[serde(deserialize_with = "lenient::number")]
    pub free: u64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub max: u64,
}

/// Upload ticket (`vimeo.videos.upload.getTicket`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadTicket {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    /// URL the chunks are posted to
    pub endpoint: String,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub max_file_size: Option<u64>,
}

/// Result of `vimeo.videos.upload.complete`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompletedUpload {
    #[serde(deserialize_with = "lenient::string")]
    pub video_id: String,
}

/// oEmbed metadata for a video URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OEmbed {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub provider_url: Option<String>,
    pub title: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_url: Option<String>,
    /// Embed markup
    pub html: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub thumbnail_width: Option<u32>,
    #[serde(default)]
    pub thumbnail_height: Option<u32>,
    #[serde(default)]
    pub video_id: Option<u64>,
}

pub(crate) mod lenient {
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;
    use serde_json::Value;

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| D::Error::custom(format!("expected unsigned integer, got {}", n))),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("expected unsigned integer, got {:?}", s))),
            other => Err(D::Error::custom(format!("expected unsigned integer, got {}", other))),
        }
    }

    pub fn optional_number<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::String(s) if s.is_empty() => Ok(None),
            other => number(other).map(Some).map_err(D::Error::custom),
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(D::Error::custom(format!("expected string or number, got {}", other))),
        }
    }

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Bool(b) => Ok(b),
            Value::Number(n) => Ok(n.as_u64().is_some_and(|v| v != 0)),
            Value::String(s) => Ok(!matches!(s.trim(), "" | "0" | "false")),
            Value::Null => Ok(false),
            other => Err(D::Error::custom(format!("expected flag, got {}", other))),
        }
    }
}
