use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::probe::probe_video;
use crate::stage::{PipelineStage, StageContext};

/// Extracts the soundtrack to `audio/audio.mp3`. Silent videos are skipped.
#[derive(Debug, Clone)]
pub struct ExtractAudioStage {
    pub bitrate: String,
}

impl Default for ExtractAudioStage {
    fn default() -> Self {
        Self {
            bitrate: "192k".to_string(),
        }
    }
}

#[async_trait]
impl PipelineStage for ExtractAudioStage {
    fn name(&self) -> &'static str {
        "extract-audio"
    }

    fn work_subdir(&self) -> Option<&'static str> {
        Some("audio")
    }

    async fn run(&self, input: &Path, work_dir: &Path, ctx: &StageContext) -> MediaResult<()> {
        let info = probe_video(input, &ctx.cancel).await?;
        if !info.has_audio() {
            info!("No audio stream in {}, skipping extraction", input.display());
            return Ok(());
        }

        let cmd = FfmpegCommand::new(input, work_dir.join("audio.mp3"))
            .no_video()
            .audio_codec("libmp3lame")
            .audio_bitrate(self.bitrate.as_str());

        FfmpegRunner::new()
            .with_cancel(ctx.cancel.clone())
            .run(&cmd)
            .await
    }
}
