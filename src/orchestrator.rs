//! Wires N tuner sessions together: ordered startup, concurrent keep-alive,
//! and deterministic shutdown on signal or setup failure.

use std::sync::Arc;

use crate::config::RuntimeConfig;
use crate::discovery::fetch_device_descriptor;
use crate::display::Display;
use crate::error::SatIpError;
use crate::keepalive::KeepAlive;
use crate::protocol::rtcp::first_app_packet;
use crate::protocol::rtsp::session::RtspSession;
use crate::rtp_receiver::RtpReceiver;
use crate::types::ChannelSpec;

/// One running tuner's resources, kept alive for the duration of the
/// program so they can be torn down in reverse construction order.
struct Tuner {
    session: RtspSession,
    receiver: RtpReceiver,
    keepalive: KeepAlive,
}

/// Runs the full SAT>IP client lifecycle for a set of requested channels
/// against one server.
pub struct Orchestrator {
    config: RuntimeConfig,
    display: Arc<Display>,
    tuners: Vec<Tuner>,
}

impl Orchestrator {
    /// Fetch the device descriptor, validate tuner count, and start
    /// streaming every requested channel. Tears down any already-started
    /// tuner and returns an error if any SETUP or PLAY fails.
    ///
    /// # Errors
    /// Returns `SatIpError::InvalidDescriptor` if the device descriptor
    /// can't be fetched or parsed, `SatIpError::InvalidArgument` if more
    /// channels are requested than the device has tuners, or whatever error
    /// the first failing SETUP/PLAY produced.
    pub async fn start(
        descriptor_url: &str,
        channels: Vec<ChannelSpec>,
        config: RuntimeConfig,
    ) -> Result<Self, SatIpError> {
        let device = fetch_device_descriptor(descriptor_url).await?;
        if device.number_of_tuners < channels.len() as u32 {
            return Err(SatIpError::InvalidArgument(format!(
                "requested {} tuners but device only has {}",
                channels.len(),
                device.number_of_tuners
            )));
        }

        let display = Display::new();
        let mut tuners = Vec::with_capacity(channels.len());

        for (index, channel) in channels.into_iter().enumerate() {
            match Self::start_tuner(&device.hostname, index as u16, channel, &config, &display).await {
                Ok(tuner) => tuners.push(tuner),
                Err(err) => {
                    tracing::error!(error = %err, tuner = index, "failed to start tuner, tearing down");
                    let mut orchestrator = Self {
                        config,
                        display,
                        tuners,
                    };
                    orchestrator.shutdown().await;
                    return Err(err);
                }
            }
        }

        Ok(Self {
            config,
            display,
            tuners,
        })
    }

    async fn start_tuner(
        hostname: &str,
        index: u16,
        channel: ChannelSpec,
        config: &RuntimeConfig,
        display: &Arc<Display>,
    ) -> Result<Tuner, SatIpError> {
        let (rtp_port, rtcp_port) = config.client_ports(index);
        let display_label = channel.display_label();

        let mut session = RtspSession::new(hostname, config.rtsp_port, config.rtsp_timeout, channel);
        session.setup(rtp_port, rtcp_port).await?;

        let mut receiver = RtpReceiver::bind(rtp_port, rtcp_port, config.recv_buffer_size).await?;

        let update = display.register(display_label);
        receiver.set_on_rtcp(Some(Box::new(move |data: &[u8]| {
            match first_app_packet(data) {
                Ok(Some(packet)) => update(packet.level_pct() as u8, packet.quality_pct() as u8),
                Ok(None) => {}
                Err(e) => tracing::debug!(error = %e, "malformed RTCP APP packet, ignoring"),
            }
        })));

        if let Err(err) = session.play(&[1]).await {
            receiver.close().await;
            return Err(err);
        }

        let timeout_secs = session
            .setup_info()
            .map_or(60, |info| info.timeout_secs);
        let keepalive = KeepAlive::start(session.codec(), config.keepalive_interval(timeout_secs));

        Ok(Tuner {
            session,
            receiver,
            keepalive,
        })
    }

    /// Start the display and block until a termination signal arrives, then
    /// tear down every resource in reverse construction order.
    ///
    /// # Errors
    /// Returns `SatIpError::TransportError` only if installing the signal
    /// handler itself fails.
    pub async fn run(mut self) -> Result<(), SatIpError> {
        self.display.start();

        tokio::signal::ctrl_c()
            .await
            .map_err(|e| SatIpError::TransportError(format!("failed to install signal handler: {e}")))?;

        tracing::info!("shutdown signal received, tearing down");
        self.shutdown().await;
        Ok(())
    }

    /// Close the display, then every tuner's keep-alive, receiver, and
    /// session in reverse construction order. Best-effort: failures are
    /// logged, never propagated.
    async fn shutdown(&mut self) {
        self.display.close();

        while let Some(mut tuner) = self.tuners.pop() {
            tuner.keepalive.close().await;
            tuner.receiver.close().await;
            tuner.session.teardown().await;
        }
    }

    /// Convenience constructor for keep-alive interval derivation shared
    /// with `config`.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}
