//! Translation between method identifiers and remote method names.
//!
//! The API namespace is open-ended, so no method families are enumerated
//! here: any dotted or underscore-joined identifier maps to a path whose
//! remote name is `vimeo.` followed by the segments joined with dots.

use crate::error::{Result, VimeoError};
use std::fmt;
use std::str::FromStr;

/// Root namespace shared by every Advanced API method.
pub const ROOT_NAMESPACE: &str = "vimeo";

/// A method path below the root namespace, e.g. `videos.upload.getQuota`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodPath {
    segments: Vec<String>,
}

impl MethodPath {
    /// Parse a method identifier.
    ///
    /// `videos.getInfo`, `videos_getInfo`, `vimeo_videos_getInfo` and
    /// `vimeo.videos.getInfo` all name the same method.
    pub fn parse(identifier: &str) -> Result<Self> {
        let identifier = identifier.trim();
        validate(identifier.split(['.', '_']))
            .map(|segments| Self { segments })
            .map_err(|reason| {
                VimeoError::invalid_input(format!("invalid method name {:?}: {}", identifier, reason))
            })
    }

    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        validate(segments)
            .map(|segments| Self { segments })
            .map_err(|reason| VimeoError::invalid_input(format!("invalid method path: {}", reason)))
    }

    /// Segments below the root namespace.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment, i.e. the method family (`videos`, `albums`, ...).
    pub fn family(&self) -> &str {
        &self.segments[0]
    }

    /// Dotted name sent as the `method` parameter.
    pub fn remote_name(&self) -> String {
        format!("{}.{}", ROOT_NAMESPACE, self.segments.join("."))
    }
}

// Drops a leading root segment and checks the rest.
fn validate<I, S>(segments: I) -> std::result::Result<Vec<String>, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut segments: Vec<String> = segments
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect();

    if segments.first().is_some_and(|s| s == ROOT_NAMESPACE) {
        segments.remove(0);
    }
    if segments.is_empty() {
        return Err("empty method path".to_string());
    }
    for segment in &segments {
        if segment.is_empty() {
            return Err("empty path segment".to_string());
        }
        if !segment.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!(
                "segment {:?} contains characters other than ASCII letters and digits",
                segment
            ));
        }
    }
    Ok(segments)
}

impl FromStr for MethodPath {
    type Err = VimeoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for MethodPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.remote_name())
    }
}
