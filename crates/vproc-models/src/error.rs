//! Model error types.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid video ID {id:?}: {reason}")]
    InvalidVideoId { id: String, reason: &'static str },
}

impl ModelError {
    pub fn invalid_video_id(id: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidVideoId {
            id: id.into(),
            reason,
        }
    }
}
