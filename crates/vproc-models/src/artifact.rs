//! Object-store artifact references.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::video::{ProcessedId, VideoId};

/// Kind of artifact kept in the object store. Doubles as the key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Uploaded source video
    Raw,
    /// Output of the processing pipeline
    Processed,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Raw => "raw",
            ArtifactKind::Processed => "processed",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to an artifact: `(kind, object_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub kind: ArtifactKind,
    pub object_id: String,
}

impl ArtifactRef {
    pub fn new(kind: ArtifactKind, object_id: impl Into<String>) -> Self {
        Self {
            kind,
            object_id: object_id.into(),
        }
    }

    /// Raw source artifact of a video.
    pub fn raw(video_id: &VideoId) -> Self {
        Self::new(ArtifactKind::Raw, video_id.as_str())
    }

    /// Processed artifact.
    pub fn processed(processed_id: &ProcessedId) -> Self {
        Self::new(ArtifactKind::Processed, processed_id.as_str())
    }

    /// Storage key: `<kind>/<object_id>`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.kind.as_str(), self.object_id)
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.object_id)
    }
}
