//! Runtime constants, overridable for tests

use std::time::Duration;

/// Fixed constants governing RTSP timeouts, port allocation, and buffer
/// sizes, kept in one place so tests can override them without threading
/// magic numbers through call sites.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Per-RTSP-request wall-clock timeout (§4.3: 4 seconds).
    pub rtsp_timeout: Duration,
    /// Default RTSP port, used when a `ChannelSpec`'s host has none.
    pub rtsp_port: u16,
    /// First client RTP port; tuner `i` gets `base_rtp_port + 2*i`, and
    /// the paired RTCP port is always one above it.
    pub base_rtp_port: u16,
    /// Maximum UDP datagram size read per `recv_from` (§4.4: 4096 bytes).
    pub recv_buffer_size: usize,
    /// Seconds subtracted from the SETUP `timeout` to derive the keep-alive
    /// interval (§4.6).
    pub keepalive_margin_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            rtsp_timeout: Duration::from_secs(4),
            rtsp_port: 554,
            base_rtp_port: 57000,
            recv_buffer_size: 4096,
            keepalive_margin_secs: 2,
        }
    }
}

impl RuntimeConfig {
    /// RTP/RTCP client port pair for tuner index `i` (0-based).
    #[must_use]
    pub fn client_ports(&self, tuner_index: u16) -> (u16, u16) {
        let rtp = self.base_rtp_port + tuner_index * 2;
        (rtp, rtp + 1)
    }

    /// Keep-alive interval for a session-reported `timeout` (§4.6:
    /// `max(1, timeout - 2)`).
    #[must_use]
    pub fn keepalive_interval(&self, session_timeout_secs: u64) -> Duration {
        Duration::from_secs(session_timeout_secs.saturating_sub(self.keepalive_margin_secs).max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ports_are_two_apart_per_tuner() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.client_ports(0), (57000, 57001));
        assert_eq!(cfg.client_ports(1), (57002, 57003));
    }

    #[test]
    fn keepalive_interval_floors_at_one_second() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.keepalive_interval(30), Duration::from_secs(28));
        assert_eq!(cfg.keepalive_interval(2), Duration::from_secs(1));
        assert_eq!(cfg.keepalive_interval(0), Duration::from_secs(1));
    }
}
