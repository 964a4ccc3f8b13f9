//! Worker error types.
//!
//! One variant per job phase, so a failure log line always names the phase
//! that failed. Nothing here is retried.

use std::time::Duration;

use thiserror::Error;
use vproc_media::MediaError;
use vproc_models::ModelError;
use vproc_queue::QueueError;
use vproc_storage::StorageError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Startup failed: {0}")]
    Startup(String),

    #[error("Claim failed: {0}")]
    Claim(#[source] QueueError),

    #[error("Invalid job payload: {0}")]
    InvalidPayload(#[from] ModelError),

    #[error("Work directory unavailable: {0}")]
    WorkDir(#[source] std::io::Error),

    #[error("Fetch failed: {0}")]
    Fetch(#[source] StorageError),

    #[error("Stage {stage} failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: MediaError,
    },

    #[error("Pipeline aborted: {0}")]
    PipelineAborted(String),

    #[error("Store failed: {0}")]
    Store(#[source] StorageError),

    #[error("Publish failed: {0}")]
    Publish(#[source] QueueError),

    #[error("Job timed out after {0:?}")]
    Timeout(Duration),
}

impl WorkerError {
    pub fn startup(msg: impl Into<String>) -> Self {
        Self::Startup(msg.into())
    }

    /// Translate a pipeline error into the stage that caused it.
    pub fn from_pipeline(err: MediaError) -> Self {
        match err {
            MediaError::StageFailed { stage, source } => Self::Stage {
                stage,
                source: *source,
            },
            other => Self::Stage {
                stage: "pipeline".to_string(),
                source: other,
            },
        }
    }

    /// Job phase the error belongs to, for logs and metric labels.
    pub fn phase(&self) -> &'static str {
        match self {
            WorkerError::Startup(_) => "startup",
            WorkerError::Claim(_) | WorkerError::InvalidPayload(_) => "claim",
            WorkerError::WorkDir(_) => "setup",
            WorkerError::Fetch(_) => "fetch",
            WorkerError::Stage { .. } | WorkerError::PipelineAborted(_) => "pipeline",
            WorkerError::Store(_) => "store",
            WorkerError::Publish(_) => "publish",
            WorkerError::Timeout(_) => "timeout",
        }
    }

    /// Failing stage name, for stage failures.
    pub fn stage(&self) -> Option<&str> {
        match self {
            WorkerError::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Broker read failures, after which a worker backs off before claiming again.
    pub fn is_claim_failure(&self) -> bool {
        matches!(self, WorkerError::Claim(_))
    }
}

impl From<QueueError> for WorkerError {
    fn from(err: QueueError) -> Self {
        Self::Startup(err.to_string())
    }
}

impl From<StorageError> for WorkerError {
    fn from(err: StorageError) -> Self {
        Self::Startup(err.to_string())
    }
}
