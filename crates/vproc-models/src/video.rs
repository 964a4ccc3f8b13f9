//! Video identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Suffix appended to a video ID to name its processed artifact.
pub const PROCESSED_SUFFIX: &str = "_processed";

/// Identifier of a raw video, as carried on the request queue.
///
/// The ID ends up in local file names and object keys, so it must be a
/// single path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

impl VideoId {
    /// Parse a queue payload into a video ID.
    ///
    /// Surrounding whitespace is trimmed. Empty IDs, IDs containing path
    /// separators or control characters, and `.`/`..` are rejected.
    pub fn parse(raw: &str) -> ModelResult<Self> {
        let id = raw.trim();

        if id.is_empty() {
            return Err(ModelError::invalid_video_id(raw, "empty"));
        }
        if id == "." || id == ".." {
            return Err(ModelError::invalid_video_id(raw, "relative path component"));
        }
        if id.contains('/') || id.contains('\\') {
            return Err(ModelError::invalid_video_id(raw, "contains a path separator"));
        }
        if id.chars().any(char::is_control) {
            return Err(ModelError::invalid_video_id(raw, "contains control characters"));
        }

        Ok(Self(id.to_string()))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// ID of the artifact produced by processing this video.
    pub fn processed_id(&self) -> ProcessedId {
        ProcessedId(format!("{}{}", self.0, PROCESSED_SUFFIX))
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for VideoId {
    type Error = ModelError;

    fn try_from(s: String) -> ModelResult<Self> {
        Self::parse(&s)
    }
}

impl From<VideoId> for String {
    fn from(id: VideoId) -> Self {
        id.0
    }
}

/// Identifier of a processed video (`<video_id>_processed`).
///
/// Published on the finished queue and used as the object ID of the
/// processed artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessedId(String);

impl ProcessedId {
    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processed_id_appends_suffix() {
        let id = VideoId::parse("v1").unwrap();
        assert_eq!(id.processed_id().as_str(), "v1_processed");
    }

    #[test]
    fn parse_trims_whitespace() {
        let id = VideoId::parse("  abc-123\n").unwrap();
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn parse_rejects_unsafe_ids() {
        assert!(VideoId::parse("").is_err());
        assert!(VideoId::parse("   ").is_err());
        assert!(VideoId::parse("..").is_err());
        assert!(VideoId::parse("../etc/passwd").is_err());
        assert!(VideoId::parse("a\\b").is_err());
        assert!(VideoId::parse("a\u{0}b").is_err());
    }

    #[test]
    fn serde_uses_plain_string() {
        let id = VideoId::parse("v1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"v1\"");
        let back: VideoId = serde_json::from_str("\"v1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn deserialize_validates() {
        assert!(serde_json::from_str::<VideoId>("\"../etc/passwd\"").is_err());
        assert!(serde_json::from_str::<VideoId>("\"\"").is_err());
    }
}
