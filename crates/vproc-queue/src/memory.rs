//! In-process queue with the same blocking semantics as the Redis adapter.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::error::{QueueError, QueueResult};
use crate::queue::WorkQueue;

/// Named FIFO lists held in memory.
#[derive(Default)]
pub struct MemoryQueue {
    lists: Mutex<HashMap<String, VecDeque<String>>>,
    pushed: Notify,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages waiting in `queue`.
    pub fn len(&self, queue: &str) -> usize {
        self.lists
            .lock()
            .map(|lists| lists.get(queue).map_or(0, VecDeque::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, queue: &str) -> bool {
        self.len(queue) == 0
    }

    /// Snapshot of the messages waiting in `queue`, head first.
    pub fn messages(&self, queue: &str) -> Vec<String> {
        self.lists
            .lock()
            .map(|lists| {
                lists
                    .get(queue)
                    .map(|list| list.iter().cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    fn pop(&self, queue: &str) -> QueueResult<Option<String>> {
        let mut lists = self
            .lists
            .lock()
            .map_err(|_| QueueError::dequeue_failed("queue lock poisoned"))?;
        Ok(lists.get_mut(queue).and_then(VecDeque::pop_front))
    }
}

#[async_trait]
impl WorkQueue for MemoryQueue {
    async fn dequeue(
        &self,
        queue: &str,
        cancel: &CancellationToken,
    ) -> QueueResult<Option<String>> {
        loop {
            // Register interest before looking so a push between the check
            // and the await still wakes us.
            let pushed = self.pushed.notified();
            tokio::pin!(pushed);
            pushed.as_mut().enable();

            if cancel.is_cancelled() {
                return Ok(None);
            }
            if let Some(payload) = self.pop(queue)? {
                return Ok(Some(payload));
            }

            tokio::select! {
                _ = &mut pushed => {}
                _ = cancel.cancelled() => {}
            }
        }
    }

    async fn enqueue(&self, queue: &str, payload: &str) -> QueueResult<()> {
        {
            let mut lists = self
                .lists
                .lock()
                .map_err(|_| QueueError::enqueue_failed("queue lock poisoned"))?;
            lists
                .entry(queue.to_string())
                .or_default()
                .push_back(payload.to_string());
        }
        self.pushed.notify_waiters();
        Ok(())
    }
}
