//! Periodic RTSP OPTIONS keep-alive for one tuner's connection.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::protocol::rtsp::{Method, RtspCodec};

/// Runs one OPTIONS request per `interval` on a codec until stopped.
///
/// Holds an `Arc<RtspCodec>` — a back-reference, per §9 — rather than owning
/// the codec itself; the owning `RtspSession` keeps its own clone, and the
/// codec's lifetime must outlive this task (the caller is responsible for
/// calling `close()` before the session's codec is dropped).
pub struct KeepAlive {
    shutdown_tx: tokio::sync::watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl KeepAlive {
    /// Start the keep-alive loop at `interval`, sending OPTIONS through
    /// `codec`. Non-200 responses are logged but do not stop the loop; only
    /// `close()` stops it.
    #[must_use]
    pub fn start(codec: Arc<RtspCodec>, interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately; skip it

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match codec.perform(Method::Options, "", &[]).await {
                            Ok(response) if response.is_success() => {}
                            Ok(response) => {
                                tracing::warn!(
                                    status = response.status.as_u16(),
                                    "keep-alive OPTIONS returned non-success status"
                                );
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "keep-alive OPTIONS request failed");
                            }
                        }
                    }

                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            task: Some(task),
        }
    }

    /// Signal the loop to stop and join its task. Idempotent: calling twice
    /// is a no-op the second time.
    pub async fn close(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}
