//! S3-compatible object store client.
//!
//! This crate provides:
//! - The `ObjectStore` capability consumed by the job executor
//! - An S3 adapter (MinIO) for fetching raw and storing processed videos
//! - An in-process store for tests and local runs

pub mod client;
pub mod config;
pub mod error;
pub mod memory;
pub mod store;

pub use client::S3ObjectStore;
pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use memory::MemoryObjectStore;
pub use store::{ObjectStore, VIDEO_CONTENT_TYPE};
