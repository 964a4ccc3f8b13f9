//! Shared data models for the video processing worker.
//!
//! This crate provides:
//! - Video and processed-video identifiers
//! - Artifact kinds and their object-store keys

pub mod artifact;
pub mod error;
pub mod video;

pub use artifact::{ArtifactKind, ArtifactRef};
pub use error::{ModelError, ModelResult};
pub use video::{ProcessedId, VideoId, PROCESSED_SUFFIX};
