//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use vproc_queue::QueueConfig;
use vproc_storage::StorageConfig;

use crate::error::{WorkerError, WorkerResult};

/// Default per-job budget, measured from claim.
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(300);

/// Default bound on shutdown draining.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of worker loops; 0 means one per logical CPU
    pub worker_count: usize,
    /// Job timeout
    pub job_timeout: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// Pause after a failed claim before trying the broker again
    pub claim_backoff: Duration,
    /// Directory for per-job temporary files
    pub work_dir: PathBuf,
    /// Port for the Prometheus exporter; disabled when unset
    pub metrics_port: Option<u16>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_count: 0,
            job_timeout: DEFAULT_JOB_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            claim_backoff: Duration::from_secs(1),
            work_dir: std::env::temp_dir(),
            metrics_port: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> WorkerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |key: &str| -> WorkerResult<Option<u64>> {
            match lookup(key).map(|v| v.trim().to_string()) {
                None => Ok(None),
                Some(v) if v.is_empty() => Ok(None),
                Some(v) => v
                    .parse()
                    .map(Some)
                    .map_err(|_| WorkerError::startup(format!("{} is not a number: {:?}", key, v))),
            }
        };

        let config = Self {
            worker_count: parsed("WORKER_COUNT")?.map_or(defaults.worker_count, |n| n as usize),
            job_timeout: parsed("WORKER_JOB_TIMEOUT")?
                .map_or(defaults.job_timeout, Duration::from_secs),
            shutdown_timeout: parsed("WORKER_SHUTDOWN_TIMEOUT")?
                .map_or(defaults.shutdown_timeout, Duration::from_secs),
            claim_backoff: parsed("WORKER_CLAIM_BACKOFF_MS")?
                .map_or(defaults.claim_backoff, Duration::from_millis),
            work_dir: lookup("WORKER_WORK_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            metrics_port: parsed("METRICS_PORT")?
                .map(|p| {
                    u16::try_from(p)
                        .map_err(|_| WorkerError::startup(format!("METRICS_PORT out of range: {}", p)))
                })
                .transpose()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the worker cannot start with.
    pub fn validate(&self) -> WorkerResult<()> {
        if self.job_timeout.is_zero() {
            return Err(WorkerError::startup("job timeout must be positive"));
        }
        if self.work_dir.as_os_str().is_empty() {
            return Err(WorkerError::startup("work directory is empty"));
        }
        Ok(())
    }

    /// Effective number of worker loops.
    pub fn worker_count(&self) -> usize {
        if self.worker_count > 0 {
            self.worker_count
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

/// Everything the service needs before it can start.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub worker: WorkerConfig,
    pub queue: QueueConfig,
    pub storage: StorageConfig,
}

impl ServiceConfig {
    /// Load and validate all sections from the environment.
    pub fn from_env() -> WorkerResult<Self> {
        Ok(Self {
            worker: WorkerConfig::from_env()?,
            queue: QueueConfig::from_env()?,
            storage: StorageConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> WorkerResult<WorkerConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        WorkerConfig::from_vars(|k| env.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.job_timeout, Duration::from_secs(300));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
        assert_eq!(config.metrics_port, None);
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn test_zero_workers_means_cpu_count() {
        let config = load(&[("WORKER_COUNT", "0")]).unwrap();
        let cpus = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        assert_eq!(config.worker_count(), cpus);

        let config = load(&[("WORKER_COUNT", "3")]).unwrap();
        assert_eq!(config.worker_count(), 3);
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        assert!(matches!(
            load(&[("WORKER_COUNT", "many")]),
            Err(WorkerError::Startup(_))
        ));
        assert!(load(&[("METRICS_PORT", "70000")]).is_err());
        assert!(load(&[("WORKER_JOB_TIMEOUT", "0")]).is_err());
    }
}
