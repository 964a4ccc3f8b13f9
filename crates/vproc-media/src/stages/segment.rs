use std::path::Path;

use async_trait::async_trait;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::stage::{PipelineStage, StageContext};

/// Produces a VOD HLS playlist with segments in `streaming/`.
#[derive(Debug, Clone)]
pub struct SegmentForStreamingStage {
    pub segment_secs: u32,
}

impl Default for SegmentForStreamingStage {
    fn default() -> Self {
        Self { segment_secs: 6 }
    }
}

impl SegmentForStreamingStage {
    fn command(&self, input: &Path, work_dir: &Path) -> FfmpegCommand {
        let segment_pattern = work_dir.join("segment_%03d.ts");

        FfmpegCommand::new(input, work_dir.join("index.m3u8"))
            .video_codec("libx264")
            .preset("veryfast")
            .audio_codec("aac")
            .output_args([
                "-f".to_string(),
                "hls".to_string(),
                "-hls_time".to_string(),
                self.segment_secs.max(1).to_string(),
                "-hls_playlist_type".to_string(),
                "vod".to_string(),
                "-hls_segment_filename".to_string(),
                segment_pattern.to_string_lossy().to_string(),
            ])
    }
}

#[async_trait]
impl PipelineStage for SegmentForStreamingStage {
    fn name(&self) -> &'static str {
        "segment-for-streaming"
    }

    fn work_subdir(&self) -> Option<&'static str> {
        Some("streaming")
    }

    async fn run(&self, input: &Path, work_dir: &Path, ctx: &StageContext) -> MediaResult<()> {
        let cmd = self.command(input, work_dir);
        FfmpegRunner::new()
            .with_cancel(ctx.cancel.clone())
            .run(&cmd)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_land_in_work_dir() {
        let args = SegmentForStreamingStage::default()
            .command(Path::new("/tmp/v_input.mp4"), Path::new("/tmp/v_work/streaming"))
            .build_args();

        assert_eq!(
            args.last().map(String::as_str),
            Some("/tmp/v_work/streaming/index.m3u8")
        );
        assert!(args
            .windows(2)
            .any(|w| w == ["-hls_segment_filename", "/tmp/v_work/streaming/segment_%03d.ts"]));
    }
}
