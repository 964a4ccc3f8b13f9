use std::path::Path;

use async_trait::async_trait;

use crate::error::MediaResult;
use crate::probe::probe_video;
use crate::stage::{PipelineStage, StageContext};

/// Records stream metadata as `analysis/analysis.json`.
pub struct AnalyzeContentStage;

#[async_trait]
impl PipelineStage for AnalyzeContentStage {
    fn name(&self) -> &'static str {
        "analyze-content"
    }

    fn work_subdir(&self) -> Option<&'static str> {
        Some("analysis")
    }

    async fn run(&self, input: &Path, work_dir: &Path, ctx: &StageContext) -> MediaResult<()> {
        let info = probe_video(input, &ctx.cancel).await?;
        let json = serde_json::to_vec_pretty(&info)?;
        tokio::fs::write(work_dir.join("analysis.json"), json).await?;
        Ok(())
    }
}
