//! Standard FFmpeg-backed stage implementations.

mod analyze;
mod audio;
mod preview;
mod segment;
mod thumbnails;
mod transcode;
mod validate;

pub use analyze::AnalyzeContentStage;
pub use audio::ExtractAudioStage;
pub use preview::GeneratePreviewStage;
pub use segment::SegmentForStreamingStage;
pub use thumbnails::GenerateThumbnailsStage;
pub use transcode::TranscodeStage;
pub use validate::ValidateStage;
