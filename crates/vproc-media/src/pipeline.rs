//! Fixed, ordered stage registry.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use metrics::histogram;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};
use crate::stage::{PipelineStage, StageContext};
use crate::stages::{
    AnalyzeContentStage, ExtractAudioStage, GeneratePreviewStage, GenerateThumbnailsStage,
    SegmentForStreamingStage, TranscodeStage, ValidateStage,
};

/// Names of the standard stages, in execution order.
pub const STANDARD_STAGE_ORDER: [&str; 7] = [
    "validate",
    "transcode",
    "generate-thumbnails",
    "extract-audio",
    "generate-preview",
    "analyze-content",
    "segment-for-streaming",
];

const STAGE_DURATION_SECONDS: &str = "vproc_stage_duration_seconds";

/// Immutable, ordered list of stages.
///
/// Stages run one at a time in declaration order; the first failure stops
/// the run.
#[derive(Clone)]
pub struct Pipeline {
    stages: Arc<[Arc<dyn PipelineStage>]>,
}

impl Pipeline {
    /// Build a pipeline from an explicit stage list.
    pub fn new(stages: Vec<Arc<dyn PipelineStage>>) -> Self {
        Self {
            stages: stages.into(),
        }
    }

    /// The seven standard FFmpeg-backed stages.
    pub fn standard() -> Self {
        Self::new(vec![
            Arc::new(ValidateStage),
            Arc::new(TranscodeStage::default()),
            Arc::new(GenerateThumbnailsStage::default()),
            Arc::new(ExtractAudioStage::default()),
            Arc::new(GeneratePreviewStage::default()),
            Arc::new(AnalyzeContentStage),
            Arc::new(SegmentForStreamingStage::default()),
        ])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order.
    ///
    /// Returns `MediaError::StageFailed` naming the first stage that failed;
    /// later stages are not invoked. The cancellation token is checked
    /// before each stage; a cancelled run returns `MediaError::Cancelled`.
    pub async fn run(&self, ctx: &StageContext) -> MediaResult<()> {
        for stage in self.stages.iter() {
            let name = stage.name();

            if ctx.cancel.is_cancelled() {
                return Err(MediaError::Cancelled);
            }

            let work_dir = ctx.work_dir(stage.work_subdir());
            tokio::fs::create_dir_all(&work_dir)
                .await
                .map_err(|e| MediaError::stage_failed(name, e.into()))?;

            debug!(stage = name, "Running stage");
            let started = Instant::now();

            stage
                .run(&ctx.input, &work_dir, ctx)
                .await
                .map_err(|e| MediaError::stage_failed(name, e))?;

            let elapsed = started.elapsed();
            histogram!(STAGE_DURATION_SECONDS, "stage" => name).record(elapsed.as_secs_f64());
            info!(stage = name, elapsed_ms = elapsed.as_millis() as u64, "Stage completed");
        }

        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}
