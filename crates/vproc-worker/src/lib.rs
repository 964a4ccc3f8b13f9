//! Video processing worker.
//!
//! This crate provides:
//! - Job executor: claim, fetch, pipeline, store, publish, cleanup
//! - Worker pool with bounded graceful shutdown
//! - Service configuration and job metrics

pub mod config;
pub mod error;
pub mod executor;
pub mod job_files;
pub mod logging;
pub mod metrics;
pub mod pool;

pub use config::{ServiceConfig, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use executor::{ExecutorSettings, JobExecutor};
pub use job_files::JobFiles;
pub use logging::JobLogger;
pub use pool::{ShutdownOutcome, WorkerPool, WorkerState, WorkerStatus};
