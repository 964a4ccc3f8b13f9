//! Queue configuration.

use std::time::Duration;

use crate::error::{QueueError, QueueResult};

const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// List the worker claims video IDs from
    pub request_queue: String,
    /// List processed IDs are published to
    pub finished_queue: String,
    /// Length of one blocking pop; bounds how long a claim takes to notice shutdown
    pub poll_interval: Duration,
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> QueueResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| QueueError::config_error(format!("{} not set", key)))
        };

        let config = Self {
            redis_url: redis_url_from_host(&required("REDIS_HOST")?),
            request_queue: required("PROCESSING_REQUEST_QUEUE")?,
            finished_queue: required("PROCESSING_FINISHED_QUEUE")?,
            poll_interval: Duration::from_secs(poll_interval_secs(
                lookup("QUEUE_POLL_INTERVAL_SECS"),
            )?),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the worker cannot start with.
    pub fn validate(&self) -> QueueResult<()> {
        if self.redis_url.is_empty() {
            return Err(QueueError::config_error("redis URL is empty"));
        }
        if self.request_queue.is_empty() || self.finished_queue.is_empty() {
            return Err(QueueError::config_error("queue names must not be empty"));
        }
        if self.request_queue == self.finished_queue {
            return Err(QueueError::config_error(
                "request and finished queues must differ",
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(QueueError::config_error("poll interval must be positive"));
        }
        Ok(())
    }
}

/// `QUEUE_POLL_INTERVAL_SECS`, defaulting to 5 when unset or blank.
fn poll_interval_secs(raw: Option<String>) -> QueueResult<u64> {
    match raw.map(|v| v.trim().to_string()) {
        None => Ok(DEFAULT_POLL_INTERVAL_SECS),
        Some(v) if v.is_empty() => Ok(DEFAULT_POLL_INTERVAL_SECS),
        Some(v) => v.parse().map_err(|_| {
            QueueError::config_error(format!("QUEUE_POLL_INTERVAL_SECS is not a number: {:?}", v))
        }),
    }
}

/// Accept either a bare `host:port` or a full `redis://`/`rediss://` URL.
fn redis_url_from_host(host: &str) -> String {
    if host.contains("://") {
        host.to_string()
    } else {
        format!("redis://{}", host)
    }
}
