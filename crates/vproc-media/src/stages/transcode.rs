use std::path::Path;

use async_trait::async_trait;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::stage::{PipelineStage, StageContext};

/// Re-encodes the input to H.264/AAC MP4 at the job's output path.
#[derive(Debug, Clone)]
pub struct TranscodeStage {
    pub crf: u8,
    pub preset: String,
    pub audio_bitrate: String,
}

impl Default for TranscodeStage {
    fn default() -> Self {
        Self {
            crf: 23,
            preset: "veryfast".to_string(),
            audio_bitrate: "128k".to_string(),
        }
    }
}

impl TranscodeStage {
    fn command(&self, input: &Path, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new(input, output)
            .video_codec("libx264")
            .preset(self.preset.as_str())
            .crf(self.crf)
            .audio_codec("aac")
            .audio_bitrate(self.audio_bitrate.as_str())
            .output_args(["-movflags", "+faststart"])
    }
}

#[async_trait]
impl PipelineStage for TranscodeStage {
    fn name(&self) -> &'static str {
        "transcode"
    }

    async fn run(&self, input: &Path, _work_dir: &Path, ctx: &StageContext) -> MediaResult<()> {
        let cmd = self.command(input, &ctx.output);
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
    fn test_writes_faststart_mp4_to_output() {
        let args = TranscodeStage::default()
            .command(Path::new("/tmp/v_input.mp4"), Path::new("/tmp/v_output.mp4"))
            .build_args();

        assert_eq!(args.last().map(String::as_str), Some("/tmp/v_output.mp4"));
        assert!(args.windows(2).any(|w| w == ["-c:v", "libx264"]));
        assert!(args.windows(2).any(|w| w == ["-movflags", "+faststart"]));
    }
}
