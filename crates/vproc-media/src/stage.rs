//! Uniform interface for pipeline stages.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::MediaResult;

/// Per-job inputs shared by every stage of one pipeline run.
#[derive(Debug, Clone)]
pub struct StageContext {
    /// Fetched source video
    pub input: PathBuf,
    /// Where the transcoded artifact must be written
    pub output: PathBuf,
    /// Job-private directory holding each stage's working subdirectory
    pub work_root: PathBuf,
    /// Fired when the job is abandoned; stages may poll it to stop early
    pub cancel: CancellationToken,
}

impl StageContext {
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        work_root: impl Into<PathBuf>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            work_root: work_root.into(),
            cancel,
        }
    }

    /// Working directory for a stage with the given subdirectory.
    pub fn work_dir(&self, subdir: Option<&str>) -> PathBuf {
        match subdir {
            Some(dir) => self.work_root.join(dir),
            None => self.work_root.clone(),
        }
    }
}

/// One named processing step.
///
/// Stages share nothing but the files passed between them through the
/// filesystem. A failing stage is not retried.
#[async_trait]
pub trait PipelineStage: Send + Sync {
    /// Stable stage name, used in errors and logs.
    fn name(&self) -> &'static str;

    /// Subdirectory of the job's working root this stage writes into.
    fn work_subdir(&self) -> Option<&'static str> {
        None
    }

    /// Run the stage over `input`, writing into `work_dir`.
    async fn run(&self, input: &Path, work_dir: &Path, ctx: &StageContext) -> MediaResult<()>;
}
