//! Work queue capability and its Redis list implementation.

use async_trait::async_trait;
use redis::AsyncCommands;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::QueueConfig;
use crate::error::{QueueError, QueueResult};

/// Blocking FIFO queue used to claim work and announce results.
///
/// Implementations must be safe to call from every worker at once.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Pop the next payload from `queue`, waiting for one to arrive.
    ///
    /// Returns `Ok(None)` once `cancel` fires. A payload that has been
    /// removed from the broker is always returned, never dropped.
    async fn dequeue(&self, queue: &str, cancel: &CancellationToken)
        -> QueueResult<Option<String>>;

    /// Append `payload` to `queue`.
    async fn enqueue(&self, queue: &str, payload: &str) -> QueueResult<()>;
}

/// Redis list queue.
pub struct RedisQueue {
    client: redis::Client,
    config: QueueConfig,
}

impl RedisQueue {
    /// Create a new queue client. Does not connect.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        config.validate()?;
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env()?)
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Check connectivity with a PING.
    pub async fn ping(&self) -> QueueResult<()> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| QueueError::connection_failed(e.to_string()))?;

        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Connected to Redis at {} ({})", self.config.redis_url, pong);
        Ok(())
    }

    /// Number of messages waiting in `queue`.
    pub async fn len(&self, queue: &str) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.llen(queue).await?;
        Ok(len)
    }
}

#[async_trait]
impl WorkQueue for RedisQueue {
    async fn dequeue(
        &self,
        queue: &str,
        cancel: &CancellationToken,
    ) -> QueueResult<Option<String>> {
        if cancel.is_cancelled() {
            return Ok(None);
        }

        // A blocking pop holds its connection, so each claim gets its own
        // instead of stalling commands multiplexed by other workers.
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| QueueError::connection_failed(e.to_string()))?;

        let slice = self.config.poll_interval.as_secs_f64();

        // The token is only checked between whole BLPOP calls; abandoning one
        // mid-flight could lose an element Redis already popped.
        loop {
            let popped: Option<(String, String)> = conn
                .blpop(queue, slice)
                .await
                .map_err(|e| QueueError::dequeue_failed(e.to_string()))?;

            if let Some((_, payload)) = popped {
                debug!("Dequeued {:?} from {}", payload, queue);
                return Ok(Some(payload));
            }

            if cancel.is_cancelled() {
                debug!("Dequeue on {} interrupted by shutdown", queue);
                return Ok(None);
            }
        }
    }

    async fn enqueue(&self, queue: &str, payload: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        conn.rpush::<_, _, ()>(queue, payload)
            .await
            .map_err(|e| QueueError::enqueue_failed(e.to_string()))?;

        debug!("Enqueued {:?} on {}", payload, queue);
        Ok(())
    }
}
