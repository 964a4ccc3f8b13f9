use std::path::Path;

use async_trait::async_trait;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::stage::{PipelineStage, StageContext};

/// Writes one JPEG every `interval_secs` into `thumbnails/`.
#[derive(Debug, Clone)]
pub struct GenerateThumbnailsStage {
    pub interval_secs: u32,
    pub width: u32,
}

impl Default for GenerateThumbnailsStage {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            width: 480,
        }
    }
}

#[async_trait]
impl PipelineStage for GenerateThumbnailsStage {
    fn name(&self) -> &'static str {
        "generate-thumbnails"
    }

    fn work_subdir(&self) -> Option<&'static str> {
        Some("thumbnails")
    }

    async fn run(&self, input: &Path, work_dir: &Path, ctx: &StageContext) -> MediaResult<()> {
        let filter = format!(
            "fps=1/{},scale={}:-2",
            self.interval_secs.max(1),
            self.width
        );
        let cmd = FfmpegCommand::new(input, work_dir.join("thumb_%03d.jpg"))
            .video_filter(filter)
            .output_args(["-q:v", "2"]);

        FfmpegRunner::new()
            .with_cancel(ctx.cancel.clone())
            .run(&cmd)
            .await
    }
}
