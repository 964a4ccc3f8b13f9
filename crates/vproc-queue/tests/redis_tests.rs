//! Redis queue integration tests.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use vproc_queue::{QueueConfig, RedisQueue, WorkQueue};

fn test_queue(suffix: &str) -> RedisQueue {
    dotenvy::dotenv().ok();

    let host = std::env::var("REDIS_HOST").unwrap_or_else(|_| "localhost:6379".to_string());
    let config = QueueConfig::from_vars(|key| match key {
        "REDIS_HOST" => Some(host.clone()),
        "PROCESSING_REQUEST_QUEUE" => Some(format!("vproc:test:{}:requests", suffix)),
        "PROCESSING_FINISHED_QUEUE" => Some(format!("vproc:test:{}:finished", suffix)),
        "QUEUE_POLL_INTERVAL_SECS" => Some("1".to_string()),
        _ => None,
    })
    .expect("valid test config");

    RedisQueue::new(config).expect("Failed to create queue")
}

/// Test Redis connection.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_redis_connection() {
    let queue = test_queue("ping");
    queue.ping().await.expect("Failed to ping Redis");
}

/// Test FIFO enqueue and dequeue.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_enqueue_dequeue_fifo() {
    let queue = test_queue("fifo");
    let name = queue.config().request_queue.clone();
    let cancel = CancellationToken::new();

    queue.enqueue(&name, "first").await.expect("Failed to enqueue");
    queue.enqueue(&name, "second").await.expect("Failed to enqueue");

    let first = queue.dequeue(&name, &cancel).await.expect("Failed to dequeue");
    let second = queue.dequeue(&name, &cancel).await.expect("Failed to dequeue");

    assert_eq!(first.as_deref(), Some("first"));
    assert_eq!(second.as_deref(), Some("second"));
    assert_eq!(queue.len(&name).await.expect("Failed to get length"), 0);
}

/// An empty queue blocks across poll slices until a message is pushed.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_dequeue_waits_for_push() {
    let queue = Arc::new(test_queue("blocking"));
    let name = queue.config().request_queue.clone();
    let cancel = CancellationToken::new();

    let consumer = {
        let queue = Arc::clone(&queue);
        let name = name.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { queue.dequeue(&name, &cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(!consumer.is_finished());

    queue.enqueue(&name, "late").await.expect("Failed to enqueue");
    let got = consumer.await.unwrap().expect("Failed to dequeue");
    assert_eq!(got.as_deref(), Some("late"));
}

/// Shutdown interrupts a blocked dequeue within one poll slice.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_cancel_interrupts_dequeue() {
    let queue = Arc::new(test_queue("cancel"));
    let name = queue.config().request_queue.clone();
    let cancel = CancellationToken::new();

    let consumer = {
        let queue = Arc::clone(&queue);
        let cancel = cancel.clone();
        tokio::spawn(async move { queue.dequeue(&name, &cancel).await })
    };

    cancel.cancel();
    let got = tokio::time::timeout(Duration::from_secs(3), consumer)
        .await
        .expect("dequeue did not observe cancellation")
        .unwrap()
        .expect("Failed to dequeue");
    assert_eq!(got, None);
}
