use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{MediaError, MediaResult};
use crate::probe::probe_video;
use crate::stage::{PipelineStage, StageContext};

/// Rejects inputs FFprobe cannot read or that have no playable video.
pub struct ValidateStage;

#[async_trait]
impl PipelineStage for ValidateStage {
    fn name(&self) -> &'static str {
        "validate"
    }

    async fn run(&self, input: &Path, _work_dir: &Path, ctx: &StageContext) -> MediaResult<()> {
        let info = probe_video(input, &ctx.cancel).await?;

        if info.duration <= 0.0 {
            return Err(MediaError::invalid_video("duration is zero"));
        }
        if info.width == 0 || info.height == 0 {
            return Err(MediaError::invalid_video("video stream has no dimensions"));
        }

        debug!(
            "Validated {}: {}x{} {} {:.1}s",
            input.display(),
            info.width,
            info.height,
            info.codec,
            info.duration
        );
        Ok(())
    }
}
