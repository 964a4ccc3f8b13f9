//! Video processing pipeline.
//!
//! This crate provides:
//! - The `PipelineStage` interface every processing step implements
//! - The fixed, ordered stage registry (`Pipeline`)
//! - FFmpeg/FFprobe backed implementations of the seven standard stages

pub mod command;
pub mod error;
pub mod pipeline;
pub mod probe;
pub mod stage;
pub mod stages;

pub use command::{FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use pipeline::{Pipeline, STANDARD_STAGE_ORDER};
pub use probe::{probe_video, VideoInfo};
pub use stage::{PipelineStage, StageContext};
