//! UDP RTP/RTCP receive loop for one tuner.

use std::sync::{Arc, Mutex};

use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

use crate::error::SatIpError;

/// A swappable, clearable sink callback.
///
/// Modeled as an atomic slot (per §9's "callbacks as first-class values")
/// rather than a fixed trait object field, so the receiver task can be
/// handed a sink after construction and the sink cleared on shutdown without
/// the task itself needing a mutable reference to the receiver.
pub type Sink = Arc<Mutex<Option<Box<dyn Fn(&[u8]) + Send + 'static>>>>;

fn empty_sink() -> Sink {
    Arc::new(Mutex::new(None))
}

fn invoke(sink: &Sink, label: &str, data: &[u8]) {
    let guard = sink.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Some(callback) = guard.as_ref() {
        callback(data);
    }
    drop(guard);
    let _ = label;
}

/// Binds a pair of UDP sockets (RTP, RTCP) for one tuner and runs a receive
/// task that dispatches each datagram to the registered sink.
pub struct RtpReceiver {
    on_rtp: Sink,
    on_rtcp: Sink,
    shutdown_tx: tokio::sync::watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl RtpReceiver {
    /// Bind `0.0.0.0:<rtp_port>` and `0.0.0.0:<rtcp_port>` and start the
    /// receive task. Sinks may be registered with `set_on_rtp`/`set_on_rtcp`
    /// either before or after this call; the atomic slot makes both safe.
    ///
    /// # Errors
    /// Returns `SatIpError::TransportError` if either socket fails to bind.
    pub async fn bind(rtp_port: u16, rtcp_port: u16, recv_buffer_size: usize) -> Result<Self, SatIpError> {
        let rtp_socket = UdpSocket::bind(("0.0.0.0", rtp_port))
            .await
            .map_err(|e| SatIpError::TransportError(format!("bind RTP port {rtp_port}: {e}")))?;
        let rtcp_socket = UdpSocket::bind(("0.0.0.0", rtcp_port))
            .await
            .map_err(|e| SatIpError::TransportError(format!("bind RTCP port {rtcp_port}: {e}")))?;

        let on_rtp = empty_sink();
        let on_rtcp = empty_sink();
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        let task = tokio::spawn(Self::run(
            rtp_socket,
            rtcp_socket,
            on_rtp.clone(),
            on_rtcp.clone(),
            recv_buffer_size,
            shutdown_rx,
        ));

        Ok(Self {
            on_rtp,
            on_rtcp,
            shutdown_tx,
            task: Some(task),
        })
    }

    /// Register (or clear, with `None`) the sink invoked for RTP datagrams.
    pub fn set_on_rtp(&self, callback: Option<Box<dyn Fn(&[u8]) + Send + 'static>>) {
        *self
            .on_rtp
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = callback;
    }

    /// Register (or clear, with `None`) the sink invoked for RTCP datagrams.
    pub fn set_on_rtcp(&self, callback: Option<Box<dyn Fn(&[u8]) + Send + 'static>>) {
        *self
            .on_rtcp
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = callback;
    }

    async fn run(
        rtp_socket: UdpSocket,
        rtcp_socket: UdpSocket,
        on_rtp: Sink,
        on_rtcp: Sink,
        recv_buffer_size: usize,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) {
        let mut rtp_buf = vec![0u8; recv_buffer_size];
        let mut rtcp_buf = vec![0u8; recv_buffer_size];

        loop {
            tokio::select! {
                result = rtp_socket.recv_from(&mut rtp_buf) => {
                    match result {
                        Ok((len, _src)) => invoke(&on_rtp, "rtp", &rtp_buf[..len]),
                        Err(e) => {
                            tracing::warn!(error = %e, "RTP socket error, terminating receive loop");
                            break;
                        }
                    }
                }

                result = rtcp_socket.recv_from(&mut rtcp_buf) => {
                    match result {
                        Ok((len, _src)) => invoke(&on_rtcp, "rtcp", &rtcp_buf[..len]),
                        Err(e) => {
                            tracing::warn!(error = %e, "RTCP socket error, terminating receive loop");
                            break;
                        }
                    }
                }

                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }

    /// Signal shutdown, join the receive task, then drop the sockets.
    ///
    /// After this returns, no registered sink will ever be invoked again.
    /// Idempotent: calling `close()` a second time is a no-op.
    pub async fn close(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.set_on_rtp(None);
        self.set_on_rtcp(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::UdpSocket as ClientSocket;

    #[tokio::test]
    async fn sink_is_invoked_exactly_once_then_never_after_close() {
        let rtp_port = 42100;
        let rtcp_port = 42101;
        let mut receiver = RtpReceiver::bind(rtp_port, rtcp_port, 4096)
            .await
            .expect("bind should succeed");

        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        receiver.set_on_rtp(Some(Box::new(move |_data: &[u8]| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        })));

        let client = ClientSocket::bind("0.0.0.0:0").await.unwrap();
        client
            .send_to(b"hello", ("127.0.0.1", rtp_port))
            .await
            .unwrap();

        // Give the receive task a chance to run.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        receiver.close().await;

        // A datagram sent after close is simply unreceived; no sink fires.
        let _ = client.send_to(b"late", ("127.0.0.1", rtp_port)).await;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let mut receiver = RtpReceiver::bind(42102, 42103, 4096)
            .await
            .expect("bind should succeed");
        receiver.close().await;
        receiver.close().await;
    }
}
