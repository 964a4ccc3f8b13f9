//! Job executor.
//!
//! One call to [`JobExecutor::claim_and_run`] owns one job from claim to
//! cleanup: claim a video ID, fetch `raw/<id>`, run the pipeline against the
//! job deadline, store `processed/<id>_processed`, publish the processed ID,
//! and remove the job's temporary files whatever happened.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use vproc_media::{Pipeline, StageContext};
use vproc_models::{ArtifactRef, ProcessedId, VideoId};
use vproc_queue::WorkQueue;
use vproc_storage::ObjectStore;

use crate::config::{ServiceConfig, DEFAULT_JOB_TIMEOUT};
use crate::error::{WorkerError, WorkerResult};
use crate::job_files::JobFiles;
use crate::logging::JobLogger;
use crate::metrics;

/// Static settings of an executor.
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Queue video IDs are claimed from
    pub request_queue: String,
    /// Queue processed IDs are published to
    pub finished_queue: String,
    /// Budget from claim to pipeline completion
    pub job_timeout: Duration,
    /// Directory for per-job temporary files
    pub work_dir: PathBuf,
}

impl ExecutorSettings {
    pub fn new(request_queue: impl Into<String>, finished_queue: impl Into<String>) -> Self {
        Self {
            request_queue: request_queue.into(),
            finished_queue: finished_queue.into(),
            job_timeout: DEFAULT_JOB_TIMEOUT,
            work_dir: std::env::temp_dir(),
        }
    }

    pub fn with_job_timeout(mut self, job_timeout: Duration) -> Self {
        self.job_timeout = job_timeout;
        self
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }
}

impl From<&ServiceConfig> for ExecutorSettings {
    fn from(config: &ServiceConfig) -> Self {
        Self::new(&config.queue.request_queue, &config.queue.finished_queue)
            .with_job_timeout(config.worker.job_timeout)
            .with_work_dir(&config.worker.work_dir)
    }
}

/// Runs jobs claimed from the request queue.
///
/// Safe to share between workers: the only shared state is the queue and
/// store clients, which are themselves safe for concurrent use.
pub struct JobExecutor {
    queue: Arc<dyn WorkQueue>,
    store: Arc<dyn ObjectStore>,
    pipeline: Pipeline,
    settings: ExecutorSettings,
}

impl JobExecutor {
    pub fn new(
        queue: Arc<dyn WorkQueue>,
        store: Arc<dyn ObjectStore>,
        pipeline: Pipeline,
        settings: ExecutorSettings,
    ) -> Self {
        Self {
            queue,
            store,
            pipeline,
            settings,
        }
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Claim the next job and run it to completion.
    ///
    /// Blocks until a video ID is available. Returns `Ok(None)` when
    /// `shutdown` interrupts the wait, `Ok(Some(processed_id))` once the
    /// result has been stored and published, and the failing phase's error
    /// otherwise. Temporary files are gone by the time this returns.
    pub async fn claim_and_run(
        &self,
        worker_id: usize,
        shutdown: &CancellationToken,
    ) -> WorkerResult<Option<ProcessedId>> {
        let payload = self
            .queue
            .dequeue(&self.settings.request_queue, shutdown)
            .await
            .map_err(WorkerError::Claim)?;

        let Some(payload) = payload else {
            return Ok(None);
        };

        let claimed_at = Instant::now();
        let deadline = claimed_at + self.settings.job_timeout;
        metrics::record_job_claimed();

        let video_id = match VideoId::parse(&payload) {
            Ok(id) => id,
            Err(e) => {
                let err = WorkerError::from(e);
                JobLogger::new(worker_id, payload).log_failure(&err);
                metrics::record_job_failed(&err);
                return Err(err);
            }
        };

        let logger = JobLogger::new(worker_id, video_id.as_str());
        let span = logger.create_span();

        async {
            logger.log_start();

            let mut files = JobFiles::new(&self.settings.work_dir, &video_id);
            let result = self.run_job(&video_id, &files, deadline, &logger).await;
            files.release().await;

            match &result {
                Ok(processed_id) => {
                    logger.log_completion(processed_id.as_str());
                    metrics::record_job_completed(claimed_at.elapsed());
                }
                Err(err) => {
                    logger.log_failure(err);
                    metrics::record_job_failed(err);
                }
            }

            result.map(Some)
        }
        .instrument(span)
        .await
    }

    async fn run_job(
        &self,
        video_id: &VideoId,
        files: &JobFiles,
        deadline: Instant,
        logger: &JobLogger,
    ) -> WorkerResult<ProcessedId> {
        tokio::fs::create_dir_all(&self.settings.work_dir)
            .await
            .map_err(WorkerError::WorkDir)?;

        logger.log_phase("fetch");
        self.store
            .fetch(&ArtifactRef::raw(video_id), files.input())
            .await
            .map_err(WorkerError::Fetch)?;

        logger.log_phase("pipeline");
        self.run_pipeline(files, deadline, logger).await?;

        let processed_id = video_id.processed_id();

        logger.log_phase("store");
        self.store
            .store(files.output(), &ArtifactRef::processed(&processed_id))
            .await
            .map_err(WorkerError::Store)?;

        logger.log_phase("publish");
        self.queue
            .enqueue(&self.settings.finished_queue, processed_id.as_str())
            .await
            .map_err(WorkerError::Publish)?;

        Ok(processed_id)
    }

    /// Run the pipeline on its own task, racing it against the deadline.
    ///
    /// When the deadline wins the task is detached, not aborted: it keeps
    /// running unobserved. Its cancellation token is fired so stages that
    /// poll it can stop early.
    async fn run_pipeline(
        &self,
        files: &JobFiles,
        deadline: Instant,
        logger: &JobLogger,
    ) -> WorkerResult<()> {
        let job_cancel = CancellationToken::new();
        let ctx = StageContext::new(
            files.input(),
            files.output(),
            files.work_root(),
            job_cancel.clone(),
        );
        let pipeline = self.pipeline.clone();

        let run = tokio::spawn(
            async move { pipeline.run(&ctx).await }.instrument(tracing::Span::current()),
        );

        match tokio::time::timeout_at(deadline, run).await {
            Ok(Ok(result)) => result.map_err(WorkerError::from_pipeline),
            Ok(Err(join_err)) => Err(WorkerError::PipelineAborted(join_err.to_string())),
            Err(_) => {
                job_cancel.cancel();
                logger.log_warning("deadline reached, pipeline task detached");
                Err(WorkerError::Timeout(self.settings.job_timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use vproc_media::{MediaError, MediaResult, PipelineStage, STANDARD_STAGE_ORDER};
    use vproc_queue::{MemoryQueue, QueueError, QueueResult};
    use vproc_storage::{MemoryObjectStore, StorageError, StorageResult};

    use super::*;

    const REQUESTS: &str = "video_queue";
    const FINISHED: &str = "video_success_queue";

    type CallLog = Arc<Mutex<Vec<String>>>;

    /// Records its invocation; the transcode stand-in writes the output file.
    struct FakeStage {
        name: &'static str,
        fail: bool,
        sleep: Option<Duration>,
        calls: CallLog,
    }

    #[async_trait]
    impl PipelineStage for FakeStage {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self, input: &Path, _work_dir: &Path, ctx: &StageContext) -> MediaResult<()> {
            self.calls.lock().unwrap().push(self.name.to_string());
            assert!(input.exists(), "input must be fetched before stages run");

            if let Some(sleep) = self.sleep {
                tokio::time::sleep(sleep).await;
            }
            if self.fail {
                return Err(MediaError::invalid_video(format!("{} broke", self.name)));
            }
            if self.name == "transcode" {
                tokio::fs::write(&ctx.output, b"processed bytes").await?;
            }
            Ok(())
        }
    }

    fn pipeline(calls: &CallLog, fail_at: Option<&str>, sleep_at: Option<(&str, Duration)>) -> Pipeline {
        Pipeline::new(
            STANDARD_STAGE_ORDER
                .iter()
                .map(|&name| {
                    Arc::new(FakeStage {
                        name,
                        fail: fail_at == Some(name),
                        sleep: sleep_at.filter(|(n, _)| *n == name).map(|(_, d)| d),
                        calls: Arc::clone(calls),
                    }) as Arc<dyn PipelineStage>
                })
                .collect(),
        )
    }

    /// Store that counts calls and can be told to fail uploads.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryObjectStore,
        fetches: AtomicUsize,
        stores: AtomicUsize,
        fail_store: bool,
    }

    #[async_trait]
    impl ObjectStore for CountingStore {
        async fn fetch(&self, artifact: &ArtifactRef, dest: &Path) -> StorageResult<()> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(artifact, dest).await
        }

        async fn store(&self, src: &Path, artifact: &ArtifactRef) -> StorageResult<()> {
            self.stores.fetch_add(1, Ordering::SeqCst);
            if self.fail_store {
                return Err(StorageError::upload_failed("bucket unavailable"));
            }
            self.inner.store(src, artifact).await
        }
    }

    /// Queue whose publish side can be broken.
    #[derive(Default)]
    struct FlakyQueue {
        inner: MemoryQueue,
        fail_publish: bool,
    }

    #[async_trait]
    impl WorkQueue for FlakyQueue {
        async fn dequeue(
            &self,
            queue: &str,
            cancel: &CancellationToken,
        ) -> QueueResult<Option<String>> {
            self.inner.dequeue(queue, cancel).await
        }

        async fn enqueue(&self, queue: &str, payload: &str) -> QueueResult<()> {
            if self.fail_publish && queue == FINISHED {
                return Err(QueueError::enqueue_failed("broker gone"));
            }
            self.inner.enqueue(queue, payload).await
        }
    }

    struct Harness {
        queue: Arc<FlakyQueue>,
        store: Arc<CountingStore>,
        calls: CallLog,
        dir: tempfile::TempDir,
        executor: JobExecutor,
    }

    impl Harness {
        async fn new(
            queue: FlakyQueue,
            store: CountingStore,
            fail_at: Option<&str>,
            sleep_at: Option<(&str, Duration)>,
            job_timeout: Duration,
        ) -> Self {
            let queue = Arc::new(queue);
            let store = Arc::new(store);
            let calls: CallLog = Arc::default();
            let dir = tempfile::tempdir().unwrap();

            let settings = ExecutorSettings::new(REQUESTS, FINISHED)
                .with_job_timeout(job_timeout)
                .with_work_dir(dir.path());
            let executor = JobExecutor::new(
                queue.clone(),
                store.clone(),
                pipeline(&calls, fail_at, sleep_at),
                settings,
            );

            Self {
                queue,
                store,
                calls,
                dir,
                executor,
            }
        }

        async fn with_job(self, video_id: &str, raw: bool) -> Self {
            if raw {
                let id = VideoId::parse(video_id).unwrap();
                self.store.inner.insert(&ArtifactRef::raw(&id), b"raw bytes".to_vec());
            }
            self.queue.inner.enqueue(REQUESTS, video_id).await.unwrap();
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn leftover_files(&self) -> Vec<String> {
            std::fs::read_dir(self.dir.path())
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
                .collect()
        }
    }

    async fn default_harness(fail_at: Option<&str>) -> Harness {
        Harness::new(
            FlakyQueue::default(),
            CountingStore::default(),
            fail_at,
            None,
            DEFAULT_JOB_TIMEOUT,
        )
        .await
    }

    #[tokio::test]
    async fn test_happy_path_stores_and_publishes() {
        let h = default_harness(None).await.with_job("v1", true).await;

        let result = h
            .executor
            .claim_and_run(1, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.map(|id| id.to_string()).as_deref(), Some("v1_processed"));
        assert_eq!(h.calls(), STANDARD_STAGE_ORDER.to_vec());
        assert_eq!(
            h.store.inner.keys(),
            vec!["processed/v1_processed".to_string(), "raw/v1".to_string()]
        );
        assert_eq!(
            h.store
                .inner
                .get(&ArtifactRef::new(vproc_models::ArtifactKind::Processed, "v1_processed"))
                .as_deref(),
            Some(&b"processed bytes"[..])
        );
        assert_eq!(h.queue.inner.messages(FINISHED), vec!["v1_processed".to_string()]);
        assert!(h.queue.inner.is_empty(REQUESTS));
        assert!(h.leftover_files().is_empty());
    }

    #[tokio::test]
    async fn test_stage_failure_skips_rest_and_cleans_up() {
        let h = default_harness(Some("generate-thumbnails"))
            .await
            .with_job("v1", true)
            .await;

        let err = h
            .executor
            .claim_and_run(1, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some("generate-thumbnails"));
        assert_eq!(h.calls(), vec!["validate", "transcode", "generate-thumbnails"]);
        assert_eq!(h.store.stores.load(Ordering::SeqCst), 0);
        assert!(h.queue.inner.is_empty(FINISHED));
        assert!(h.leftover_files().is_empty());
    }

    #[tokio::test]
    async fn test_missing_input_runs_no_stage() {
        let h = default_harness(None).await.with_job("v2", false).await;

        let err = h
            .executor
            .claim_and_run(1, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::Fetch(StorageError::NotFound(ref key)) if key == "raw/v2"));
        assert!(h.calls().is_empty());
        assert!(h.queue.inner.is_empty(REQUESTS));
        assert!(h.leftover_files().is_empty());
    }

    #[tokio::test]
    async fn test_deadline_abandons_pipeline() {
        let h = Harness::new(
            FlakyQueue::default(),
            CountingStore::default(),
            None,
            Some(("analyze-content", Duration::from_secs(30))),
            Duration::from_millis(100),
        )
        .await
        .with_job("v1", true)
        .await;

        let started = std::time::Instant::now();
        let err = h
            .executor
            .claim_and_run(1, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::Timeout(d) if d == Duration::from_millis(100)));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(h.calls().contains(&"analyze-content".to_string()));
        assert_eq!(h.store.stores.load(Ordering::SeqCst), 0);
        assert!(h.queue.inner.is_empty(FINISHED));
        assert!(!h.dir.path().join("v1_input.mp4").exists());
        assert!(!h.dir.path().join("v1_output.mp4").exists());
    }

    #[tokio::test]
    async fn test_store_failure_publishes_nothing() {
        let store = CountingStore {
            fail_store: true,
            ..Default::default()
        };
        let h = Harness::new(FlakyQueue::default(), store, None, None, DEFAULT_JOB_TIMEOUT)
            .await
            .with_job("v1", true)
            .await;

        let err = h
            .executor
            .claim_and_run(1, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.phase(), "store");
        assert!(h.queue.inner.is_empty(FINISHED));
        assert!(h.leftover_files().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_is_reported() {
        let queue = FlakyQueue {
            fail_publish: true,
            ..Default::default()
        };
        let h = Harness::new(queue, CountingStore::default(), None, None, DEFAULT_JOB_TIMEOUT)
            .await
            .with_job("v1", true)
            .await;

        let err = h
            .executor
            .claim_and_run(1, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::Publish(_)));
        assert_eq!(h.store.stores.load(Ordering::SeqCst), 1);
        assert!(h.leftover_files().is_empty());
    }

    #[tokio::test]
    async fn test_unusable_work_dir_fails_before_fetch() {
        let h = default_harness(None).await.with_job("v1", true).await;
        let blocker = h.dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();

        let executor = JobExecutor::new(
            h.queue.clone(),
            h.store.clone(),
            pipeline(&h.calls, None, None),
            ExecutorSettings::new(REQUESTS, FINISHED).with_work_dir(blocker.join("jobs")),
        );
        let err = executor
            .claim_and_run(1, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::WorkDir(_)));
        assert_eq!(err.phase(), "setup");
        assert_eq!(h.store.fetches.load(Ordering::SeqCst), 0);
        assert!(h.calls().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_while_waiting_is_a_noop() {
        let h = default_harness(None).await;
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let result = h.executor.claim_and_run(1, &shutdown).await.unwrap();

        assert!(result.is_none());
        assert_eq!(h.store.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsafe_payload_is_rejected_without_fetch() {
        let h = default_harness(None).await.with_job("../escape", false).await;

        let err = h
            .executor
            .claim_and_run(1, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::InvalidPayload(_)));
        assert_eq!(h.store.fetches.load(Ordering::SeqCst), 0);
        assert!(h.queue.inner.is_empty(REQUESTS));
    }

    #[tokio::test]
    async fn test_each_claim_takes_exactly_one_message() {
        let h = default_harness(None)
            .await
            .with_job("a", true)
            .await
            .with_job("b", true)
            .await;

        h.executor
            .claim_and_run(1, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(h.queue.inner.messages(REQUESTS), vec!["b".to_string()]);
        assert_eq!(h.queue.inner.messages(FINISHED), vec!["a_processed".to_string()]);
    }
}
