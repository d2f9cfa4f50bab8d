use std::sync::Arc;
use std::time::Duration;

use crate::error::SatIpError;
use crate::types::ChannelSpec;

use super::{Method, RtspCodec};

/// Per-tuner session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session established yet
    Init,
    /// SETUP succeeded, transport allocated
    Ready,
    /// PLAY succeeded, stream active
    Playing,
    /// TEARDOWN succeeded
    Closed,
    /// A request failed; session is unusable
    Failed,
}

/// Session details extracted from a successful SETUP response
#[derive(Debug, Clone)]
pub struct SetupInfo {
    /// Server-assigned `Session` id
    pub session_id: String,
    /// `com.ses.streamID` value
    pub stream_id: u32,
    /// Keep-alive timeout in seconds, defaulted to 60 if absent or zero
    pub timeout_secs: u64,
}

/// One tuner's RTSP lifecycle: SETUP → PLAY → TEARDOWN.
///
/// Owns the codec used to talk to the server for this tuner. The receive
/// sockets are opened by the caller (see `rtp_receiver`) and bound before
/// `play()` is invoked, per the bind-before-PLAY ordering mandated for this
/// client: a PLAY response can start producing datagrams before the
/// response bytes even finish arriving, so the sockets must already exist.
pub struct RtspSession {
    codec: Arc<RtspCodec>,
    channel: ChannelSpec,
    state: SessionState,
    setup: Option<SetupInfo>,
}

impl RtspSession {
    /// Create a session for one tuner against `host:port`.
    #[must_use]
    pub fn new(host: &str, port: u16, timeout: Duration, channel: ChannelSpec) -> Self {
        Self {
            codec: Arc::new(RtspCodec::new(host, port, timeout)),
            channel,
            state: SessionState::Init,
            setup: None,
        }
    }

    /// Current session state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// A back-reference to this session's codec, for the keep-alive task.
    /// The codec outlives the session's own handle as long as this clone is
    /// held, which is exactly the lifetime keep-alive needs.
    #[must_use]
    pub fn codec(&self) -> Arc<RtspCodec> {
        self.codec.clone()
    }

    /// Details extracted from SETUP, once available
    #[must_use]
    pub fn setup_info(&self) -> Option<&SetupInfo> {
        self.setup.as_ref()
    }

    /// Send SETUP for this tuner's channel with the given client RTP/RTCP
    /// ports, extracting `(session_id, stream_id, timeout)` on success.
    ///
    /// # Errors
    /// Returns `SatIpError::ProtocolError` on a non-200 response or missing
    /// required headers, or `SatIpError::TransportError` on I/O failure.
    pub async fn setup(
        &mut self,
        client_rtp_port: u16,
        client_rtcp_port: u16,
    ) -> Result<&SetupInfo, SatIpError> {
        let uri_suffix = self.channel.to_stream_uri_params();
        let transport = format!("RTP/AVP;unicast;client_port={client_rtp_port}-{client_rtcp_port}");

        let result = self
            .codec
            .perform(Method::Setup, &uri_suffix, &[("Transport", &transport)])
            .await;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.state = SessionState::Failed;
                return Err(err);
            }
        };

        if !response.is_success() {
            self.state = SessionState::Failed;
            return Err(SatIpError::ProtocolError(format!(
                "SETUP failed: {} {}",
                response.status.as_u16(),
                response.reason
            )));
        }

        let session_header = response.session().ok_or_else(|| {
            self.state = SessionState::Failed;
            SatIpError::ProtocolError("SETUP response missing Session header".to_string())
        })?;
        let (session_id, timeout_secs) = parse_session_header(session_header);

        let stream_id = response
            .stream_id()
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| {
                self.state = SessionState::Failed;
                SatIpError::ProtocolError(
                    "SETUP response missing com.ses.streamID header".to_string(),
                )
            })?;

        self.setup = Some(SetupInfo {
            session_id,
            stream_id,
            timeout_secs,
        });
        self.state = SessionState::Ready;
        Ok(self.setup.as_ref().expect("just assigned"))
    }

    /// Send PLAY for the given pid list. Must only be called after a
    /// successful `setup()`.
    ///
    /// # Errors
    /// Returns `SatIpError::ProtocolError` if the session is not in `Ready`
    /// state or the server responds with a non-200 status, or
    /// `SatIpError::TransportError` on I/O failure.
    pub async fn play(&mut self, pids: &[u32]) -> Result<(), SatIpError> {
        let Some(setup) = self.setup.as_ref() else {
            return Err(SatIpError::ProtocolError(
                "PLAY requires a prior successful SETUP".to_string(),
            ));
        };

        let pid_list = pids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let uri_suffix = format!("stream={}?addpids={pid_list}", setup.stream_id);
        let session_id = setup.session_id.clone();

        let result = self
            .codec
            .perform(Method::Play, &uri_suffix, &[("Session", &session_id)])
            .await;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.state = SessionState::Failed;
                return Err(err);
            }
        };

        if !response.is_success() {
            self.state = SessionState::Failed;
            return Err(SatIpError::ProtocolError(format!(
                "PLAY failed: {} {}",
                response.status.as_u16(),
                response.reason
            )));
        }

        self.state = SessionState::Playing;
        Ok(())
    }

    /// Send TEARDOWN. Idempotent: safe to call on a `Failed` or already
    /// `Closed` session, always returning `true` in those cases without
    /// sending a request.
    ///
    /// Returns `true` if the server acknowledged with 200 (or no request was
    /// necessary), `false` on a non-200 response. I/O errors are logged and
    /// also reported as `false` rather than propagated, since teardown is
    /// always best-effort.
    pub async fn teardown(&mut self) -> bool {
        if matches!(self.state, SessionState::Closed | SessionState::Failed) {
            self.state = SessionState::Closed;
            return true;
        }

        let session_id = self
            .setup
            .as_ref()
            .map(|s| s.session_id.clone())
            .unwrap_or_default();
        let uri_suffix = self
            .setup
            .as_ref()
            .map_or_else(String::new, |s| format!("stream={}", s.stream_id));

        let result = self
            .codec
            .perform(Method::Teardown, &uri_suffix, &[("Session", &session_id)])
            .await;

        self.state = SessionState::Closed;

        match result {
            Ok(response) if response.is_success() => true,
            Ok(response) => {
                tracing::warn!(
                    status = response.status.as_u16(),
                    "TEARDOWN returned non-success status"
                );
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "TEARDOWN request failed");
                false
            }
        }
    }

}

/// Parse a `Session` header value of the form `<id>;timeout=<sec>`.
///
/// Falls back to a 60 second timeout if the `timeout` parameter is missing
/// or zero.
fn parse_session_header(raw: &str) -> (String, u64) {
    let mut parts = raw.split(';');
    let session_id = parts.next().unwrap_or(raw).trim().to_string();

    let timeout_secs = parts
        .find_map(|p| p.trim().strip_prefix("timeout="))
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|&t| t != 0)
        .unwrap_or(60);

    (session_id, timeout_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_header_with_timeout_is_parsed() {
        let (id, timeout) = parse_session_header("abcd1234;timeout=30");
        assert_eq!(id, "abcd1234");
        assert_eq!(timeout, 30);
    }

    #[test]
    fn session_header_with_zero_timeout_falls_back_to_sixty() {
        let (id, timeout) = parse_session_header("abcd1234;timeout=0");
        assert_eq!(id, "abcd1234");
        assert_eq!(timeout, 60);
    }

    #[test]
    fn session_header_without_timeout_falls_back_to_sixty() {
        let (id, timeout) = parse_session_header("abcd1234");
        assert_eq!(id, "abcd1234");
        assert_eq!(timeout, 60);
    }
}
