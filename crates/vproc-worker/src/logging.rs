//! Structured job logging utilities.
//!
//! Provides consistent, structured logging for job processing with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};

use crate::error::WorkerError;

/// Job logger for structured logging with consistent formatting.
///
/// Every line carries the worker and the video being processed.
#[derive(Debug, Clone)]
pub struct JobLogger {
    worker_id: usize,
    video_id: String,
}

impl JobLogger {
    pub fn new(worker_id: usize, video_id: impl Into<String>) -> Self {
        Self {
            worker_id,
            video_id: video_id.into(),
        }
    }

    /// Log the start of a job.
    pub fn log_start(&self) {
        info!(
            worker_id = self.worker_id,
            video_id = %self.video_id,
            "Job started"
        );
    }

    /// Log entry into a job phase.
    pub fn log_phase(&self, phase: &str) {
        info!(
            worker_id = self.worker_id,
            video_id = %self.video_id,
            phase,
            "Job progress"
        );
    }

    /// Log a non-fatal problem.
    pub fn log_warning(&self, message: &str) {
        warn!(
            worker_id = self.worker_id,
            video_id = %self.video_id,
            "Job warning: {}", message
        );
    }

    /// Log a job failure with its phase and cause.
    pub fn log_failure(&self, err: &WorkerError) {
        error!(
            worker_id = self.worker_id,
            video_id = %self.video_id,
            phase = err.phase(),
            stage = err.stage().unwrap_or(""),
            "Job failed: {}", err
        );
    }

    /// Log the completion of a job.
    pub fn log_completion(&self, processed_id: &str) {
        info!(
            worker_id = self.worker_id,
            video_id = %self.video_id,
            processed_id,
            "Job completed"
        );
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            worker_id = self.worker_id,
            video_id = %self.video_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let logger = JobLogger::new(3, String::from("v1"));

        assert_eq!(logger.worker_id, 3);
        assert_eq!(logger.video_id, "v1");
    }
}
