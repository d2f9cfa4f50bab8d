//! RTSP protocol support for SAT>IP tuner sessions

pub mod codec;
pub mod headers;
pub mod request;
pub mod response;
pub mod response_parser;
pub mod session;

pub use codec::RtspCodec;
pub use headers::Headers;
pub use request::{RtspRequest, RtspRequestBuilder};
pub use response::{RtspResponse, StatusCode};
pub use response_parser::{ResponseParser, RtspCodecError};
pub use session::{RtspSession, SessionState};

/// RTSP methods used by the SAT>IP protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Capability negotiation, also used as a keep-alive
    Options,
    /// Describe a stream (device descriptor is fetched over HTTP instead, but
    /// some servers also answer RTSP DESCRIBE)
    Describe,
    /// Allocate transport and a session for a tuner
    Setup,
    /// Start streaming on an existing session
    Play,
    /// Release a session and its tuner
    Teardown,
}

impl Method {
    /// Convert to the RTSP wire method string
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Options => "OPTIONS",
            Method::Describe => "DESCRIBE",
            Method::Setup => "SETUP",
            Method::Play => "PLAY",
            Method::Teardown => "TEARDOWN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_str_matches_wire_methods() {
        assert_eq!(Method::Options.as_str(), "OPTIONS");
        assert_eq!(Method::Describe.as_str(), "DESCRIBE");
        assert_eq!(Method::Setup.as_str(), "SETUP");
        assert_eq!(Method::Play.as_str(), "PLAY");
        assert_eq!(Method::Teardown.as_str(), "TEARDOWN");
    }
}
