//! Graceful shutdown coordination
//!
//! One watch channel fans the stop signal out to background tasks; their join
//! handles are collected here and drained, bounded by a timeout, before the
//! database gets its final checkpoint.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use super::constants::SHUTDOWN_TIMEOUT_SECS;
use crate::data::SqliteService;

#[derive(Clone)]
pub struct ShutdownService {
    signal: Arc<watch::Sender<bool>>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
    database: Arc<SqliteService>,
}

impl ShutdownService {
    pub fn new(database: Arc<SqliteService>) -> Self {
        let (signal, _) = watch::channel(false);
        Self {
            signal: Arc::new(signal),
            tasks: Arc::new(Mutex::new(Vec::new())),
            database,
        }
    }

    /// Track a task that must finish before the database closes
    pub async fn register(&self, handle: JoinHandle<()>) {
        self.tasks.lock().await.push(handle);
    }

    /// Receiver that flips to `true` once shutdown starts
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.signal.subscribe()
    }

    pub fn trigger(&self) {
        self.signal.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.signal.borrow()
    }

    /// Owned future resolving on shutdown, for `with_graceful_shutdown`
    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.subscribe();
        async move {
            let _ = rx.wait_for(|&stopped| stopped).await;
        }
    }

    /// Signal, drain registered tasks, then checkpoint and close the database
    pub async fn shutdown(&self) {
        self.trigger();

        let tasks = std::mem::take(&mut *self.tasks.lock().await);
        tracing::debug!(tasks = tasks.len(), "Draining background tasks");

        let limit = Duration::from_secs(SHUTDOWN_TIMEOUT_SECS);
        if tokio::time::timeout(limit, futures::future::join_all(tasks))
            .await
            .is_err()
        {
            tracing::warn!(
                timeout_secs = limit.as_secs(),
                "Background tasks still running at shutdown"
            );
        }

        if let Err(e) = self.database.checkpoint().await {
            tracing::warn!(error = %e, "Final checkpoint failed");
        }
        self.database.close().await;
        tracing::debug!("Shutdown complete");
    }

    /// Trigger shutdown on Ctrl+C, or SIGTERM on unix
    pub fn install_signal_handlers(&self) {
        let service = self.clone();
        tokio::spawn(async move {
            let source = os_signal().await;
            tracing::info!(signal = source, "Stopping");
            service.trigger();
        });
    }
}

/// Resolve with the name of the first termination signal received
async fn os_signal() -> &'static str {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}
