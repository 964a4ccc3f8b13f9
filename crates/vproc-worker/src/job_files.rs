//! Per-job ephemeral files.

use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;
use vproc_models::VideoId;

/// The temporary paths owned by one job execution.
///
/// `<work_dir>/<id>_input.mp4`, `<work_dir>/<id>_output.mp4` and the stage
/// working root `<work_dir>/<id>_work/`. Released explicitly with
/// [`JobFiles::release`]; dropping an unreleased value removes them
/// synchronously so no exit path leaks them.
#[derive(Debug)]
pub struct JobFiles {
    input: PathBuf,
    output: PathBuf,
    work_root: PathBuf,
    released: bool,
}

impl JobFiles {
    pub fn new(work_dir: &Path, video_id: &VideoId) -> Self {
        Self {
            input: work_dir.join(format!("{}_input.mp4", video_id)),
            output: work_dir.join(format!("{}_output.mp4", video_id)),
            work_root: work_dir.join(format!("{}_work", video_id)),
            released: false,
        }
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn work_root(&self) -> &Path {
        &self.work_root
    }

    /// Remove every path. Missing paths are not errors, so calling this
    /// again is a no-op. Failures are logged and never returned.
    pub async fn release(&mut self) {
        for file in [&self.input, &self.output] {
            if let Err(e) = ignore_missing(tokio::fs::remove_file(file).await) {
                warn!("Failed to remove {}: {}", file.display(), e);
            }
        }
        if let Err(e) = ignore_missing(tokio::fs::remove_dir_all(&self.work_root).await) {
            warn!("Failed to remove {}: {}", self.work_root.display(), e);
        }
        self.released = true;
    }

    fn release_blocking(&mut self) {
        for file in [&self.input, &self.output] {
            if let Err(e) = ignore_missing(std::fs::remove_file(file)) {
                warn!("Failed to remove {}: {}", file.display(), e);
            }
        }
        if let Err(e) = ignore_missing(std::fs::remove_dir_all(&self.work_root)) {
            warn!("Failed to remove {}: {}", self.work_root.display(), e);
        }
        self.released = true;
    }
}

impl Drop for JobFiles {
    fn drop(&mut self) {
        if !self.released {
            self.release_blocking();
        }
    }
}

fn ignore_missing(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str) -> VideoId {
        VideoId::parse(id).unwrap()
    }

    #[test]
    fn test_paths_are_unique_per_video() {
        let dir = Path::new("/tmp/jobs");
        let files = JobFiles::new(dir, &video("v1"));

        assert_eq!(files.input(), Path::new("/tmp/jobs/v1_input.mp4"));
        assert_eq!(files.output(), Path::new("/tmp/jobs/v1_output.mp4"));
        assert_eq!(files.work_root(), Path::new("/tmp/jobs/v1_work"));

        let other = JobFiles::new(dir, &video("v2"));
        assert_ne!(files.input(), other.input());
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = JobFiles::new(dir.path(), &video("v1"));

        tokio::fs::write(files.input(), b"raw").await.unwrap();
        tokio::fs::create_dir_all(files.work_root().join("thumbnails"))
            .await
            .unwrap();

        files.release().await;
        assert!(!files.input().exists());
        assert!(!files.work_root().exists());

        files.release().await;
        assert!(!files.output().exists());
    }

    #[tokio::test]
    async fn test_drop_removes_unreleased_files() {
        let dir = tempfile::tempdir().unwrap();
        let output;
        {
            let files = JobFiles::new(dir.path(), &video("v3"));
            tokio::fs::write(files.output(), b"partial").await.unwrap();
            output = files.output().to_path_buf();
        }
        assert!(!output.exists());
    }
}
