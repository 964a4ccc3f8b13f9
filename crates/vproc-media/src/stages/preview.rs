use std::path::Path;

use async_trait::async_trait;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::probe::probe_video;
use crate::stage::{PipelineStage, StageContext};

/// Grabs a single poster frame into `preview/preview.jpg`.
#[derive(Debug, Clone)]
pub struct GeneratePreviewStage {
    /// Position of the frame as a fraction of the duration
    pub position: f64,
    pub width: u32,
}

impl Default for GeneratePreviewStage {
    fn default() -> Self {
        Self {
            position: 0.1,
            width: 1280,
        }
    }
}

impl GeneratePreviewStage {
    fn seek_seconds(&self, duration: f64) -> f64 {
        (duration * self.position.clamp(0.0, 1.0)).max(0.0)
    }
}

#[async_trait]
impl PipelineStage for GeneratePreviewStage {
    fn name(&self) -> &'static str {
        "generate-preview"
    }

    fn work_subdir(&self) -> Option<&'static str> {
        Some("preview")
    }

    async fn run(&self, input: &Path, work_dir: &Path, ctx: &StageContext) -> MediaResult<()> {
        let info = probe_video(input, &ctx.cancel).await?;

        let cmd = FfmpegCommand::new(input, work_dir.join("preview.jpg"))
            .seek(self.seek_seconds(info.duration))
            .single_frame()
            .video_filter(format!("scale='min({},iw)':-2", self.width));

        FfmpegRunner::new()
            .with_cancel(ctx.cancel.clone())
            .run(&cmd)
            .await
    }
}
