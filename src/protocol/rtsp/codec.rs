use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::error::SatIpError;

use super::response_parser::ResponseParser;
use super::{Method, RtspRequest, RtspResponse};

const USER_AGENT: &str = "satip-finder/0.1";
const DEFAULT_RTSP_PORT: u16 = 554;

/// Drives one RTSP request/response exchange over a single persistent TCP
/// connection to a SAT>IP server.
///
/// Unlike [`ResponseParser`], which only knows how to decode bytes already in
/// hand, `RtspCodec` owns the socket: it writes the encoded request, then
/// feeds bytes read off the wire into the parser until a full response (or a
/// timeout) arrives.
pub struct RtspCodec {
    host: String,
    port: u16,
    timeout: Duration,
    stream: Mutex<Option<TcpStream>>,
    parser: Mutex<ResponseParser>,
    cseq: Mutex<u32>,
}

impl RtspCodec {
    /// Create a codec for a not-yet-connected server
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
            stream: Mutex::new(None),
            parser: Mutex::new(ResponseParser::new()),
            cseq: Mutex::new(0),
        }
    }

    /// Base URI for this server, e.g. `rtsp://192.168.1.10/` or
    /// `rtsp://192.168.1.10:8554/` when the port differs from the default.
    #[must_use]
    pub fn base_uri(&self) -> String {
        if self.port == DEFAULT_RTSP_PORT {
            format!("rtsp://{}/", self.host)
        } else {
            format!("rtsp://{}:{}/", self.host, self.port)
        }
    }

    async fn ensure_connected(&self) -> Result<(), SatIpError> {
        let mut guard = self.stream.lock().await;
        if guard.is_some() {
            return Ok(());
        }
        let addr = format!("{}:{}", self.host, self.port);
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| SatIpError::TransportError(format!("connect to {addr} timed out")))??;
        *guard = Some(stream);
        Ok(())
    }

    /// Perform a single RTSP request/response round trip.
    ///
    /// `uri_suffix` is appended directly to the base URI (it may already
    /// include a leading `?` for query parameters). `extra_headers` lets
    /// callers attach method-specific headers such as `Transport` or
    /// `Session`.
    ///
    /// # Errors
    /// Returns `SatIpError::TransportError` on connection/I/O failure or
    /// timeout, and `SatIpError::ProtocolError` if the response cannot be
    /// parsed.
    pub async fn perform(
        &self,
        method: Method,
        uri_suffix: &str,
        extra_headers: &[(&str, &str)],
    ) -> Result<RtspResponse, SatIpError> {
        self.ensure_connected().await?;

        let uri = format!("{}{}", self.base_uri(), uri_suffix);
        let seq = {
            let mut cseq = self.cseq.lock().await;
            *cseq += 1;
            *cseq
        };

        let mut builder = RtspRequest::builder(method, uri)
            .cseq(seq)
            .user_agent(USER_AGENT);
        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.build();

        tokio::time::timeout(self.timeout, self.send_and_receive(&request))
            .await
            .map_err(|_| SatIpError::TransportError("RTSP request timed out".to_string()))?
    }

    async fn send_and_receive(&self, request: &RtspRequest) -> Result<RtspResponse, SatIpError> {
        let encoded = request.encode();

        let mut stream_guard = self.stream.lock().await;
        let stream = stream_guard
            .as_mut()
            .ok_or_else(|| SatIpError::TransportError("not connected".to_string()))?;

        stream
            .write_all(&encoded)
            .await
            .map_err(|e| SatIpError::TransportError(e.to_string()))?;

        let mut parser = self.parser.lock().await;
        let mut buf = [0u8; 4096];
        loop {
            let n = stream
                .read(&mut buf)
                .await
                .map_err(|e| SatIpError::TransportError(e.to_string()))?;
            if n == 0 {
                return Err(SatIpError::TransportError(
                    "connection closed by peer".to_string(),
                ));
            }
            parser.feed(&buf[..n])?;
            if let Some(response) = parser.decode()? {
                return Ok(response);
            }
        }
    }

    /// Drop the underlying TCP connection. A subsequent `perform()` call
    /// reconnects automatically.
    pub async fn disconnect(&self) {
        *self.stream.lock().await = None;
        self.parser.lock().await.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_uri_omits_default_port() {
        let codec = RtspCodec::new("192.168.1.10", 554, Duration::from_secs(4));
        assert_eq!(codec.base_uri(), "rtsp://192.168.1.10/");
    }

    #[test]
    fn base_uri_includes_non_default_port() {
        let codec = RtspCodec::new("192.168.1.10", 8554, Duration::from_secs(4));
        assert_eq!(codec.base_uri(), "rtsp://192.168.1.10:8554/");
    }
}
