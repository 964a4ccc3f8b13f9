//! Video processing worker binary.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vproc_media::Pipeline;
use vproc_queue::RedisQueue;
use vproc_storage::S3ObjectStore;
use vproc_worker::{
    metrics, ExecutorSettings, JobExecutor, ServiceConfig, ShutdownOutcome, WorkerPool,
};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider already installed");
    }

    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting vproc-worker");

    let config = match ServiceConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Worker config: {:?}", config.worker);

    let queue = match RedisQueue::new(config.queue.clone()) {
        Ok(q) => q,
        Err(e) => {
            error!("Failed to create queue client: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = queue.ping().await {
        error!("Redis is unreachable: {}", e);
        std::process::exit(1);
    }

    let store = match S3ObjectStore::new(config.storage.clone()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create object store client: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = store.ensure_bucket().await {
        error!("Bucket {} is unavailable: {}", store.bucket(), e);
        std::process::exit(1);
    }

    if let Some(port) = config.worker.metrics_port {
        match metrics::init_exporter(port) {
            Ok(()) => info!(port, "Metrics exporter listening"),
            Err(e) => warn!("Metrics disabled: {}", e),
        }
    }

    let pipeline = Pipeline::standard();
    info!(stages = ?pipeline.stage_names(), "Pipeline ready");

    let executor = JobExecutor::new(
        Arc::new(queue),
        Arc::new(store),
        pipeline,
        ExecutorSettings::from(&config),
    );

    let mut pool = WorkerPool::new(Arc::new(executor), config.worker.claim_backoff);
    pool.start(config.worker.worker_count());

    wait_for_shutdown_signal().await;
    info!("Received shutdown signal");

    match pool.stop(config.worker.shutdown_timeout).await {
        ShutdownOutcome::Drained => info!("Worker shutdown complete"),
        ShutdownOutcome::TimedOut { abandoned } => {
            warn!(abandoned, "Worker shutdown timed out, abandoning in-flight jobs");
            std::process::exit(0);
        }
    }
}

fn init_tracing() {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,vproc_worker=info,vproc_media=info,vproc_queue=info,vproc_storage=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            warn!("SIGTERM handler unavailable: {}", e);
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
}
