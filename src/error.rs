//! Crate-wide error taxonomy

use crate::protocol::rtcp::RtcpError;
use crate::protocol::rtsp::RtspCodecError;

/// Top-level error type for the SAT>IP client.
#[derive(Debug, thiserror::Error)]
pub enum SatIpError {
    /// Malformed CLI input or a `ChannelSpec` validation failure.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The UPnP device descriptor was missing a required field or carried
    /// an unparseable `X_SATIPCAP` value.
    #[error("invalid device descriptor: {0}")]
    InvalidDescriptor(String),

    /// A non-200 RTSP status, an unparseable response line, or a missing
    /// required header.
    #[error("RTSP protocol error: {0}")]
    ProtocolError(String),

    /// Socket, connect, timeout, or other lower-level I/O failure.
    #[error("transport error: {0}")]
    TransportError(String),

    /// A structurally or range invalid RTCP/APP packet.
    #[error("malformed packet: {0}")]
    Malformed(String),

    /// The operation raced with a `close()` and was dropped.
    #[error("shutting down")]
    ShuttingDown,
}

impl From<std::io::Error> for SatIpError {
    fn from(e: std::io::Error) -> Self {
        SatIpError::TransportError(e.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for SatIpError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        SatIpError::TransportError("request timed out".to_string())
    }
}

impl From<RtspCodecError> for SatIpError {
    fn from(e: RtspCodecError) -> Self {
        SatIpError::ProtocolError(e.to_string())
    }
}

impl From<RtcpError> for SatIpError {
    fn from(e: RtcpError) -> Self {
        SatIpError::Malformed(e.to_string())
    }
}

impl From<reqwest::Error> for SatIpError {
    fn from(e: reqwest::Error) -> Self {
        SatIpError::TransportError(e.to_string())
    }
}

impl From<roxmltree::Error> for SatIpError {
    fn from(e: roxmltree::Error) -> Self {
        SatIpError::InvalidDescriptor(e.to_string())
    }
}
