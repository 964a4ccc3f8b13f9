//! Work queue over Redis lists.
//!
//! This crate provides:
//! - The `WorkQueue` capability consumed by the job executor
//! - A Redis adapter (`BLPOP` to claim, `RPUSH` to publish)
//! - An in-process queue for tests and local runs

pub mod config;
pub mod error;
pub mod memory;
pub mod queue;

pub use config::QueueConfig;
pub use error::{QueueError, QueueResult};
pub use memory::MemoryQueue;
pub use queue::{RedisQueue, WorkQueue};
