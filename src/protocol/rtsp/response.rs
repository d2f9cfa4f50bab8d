use super::Headers;

/// RTSP status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);

    /// Check if this is a success status (2xx)
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Get status code as u16
    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

/// An RTSP response message
#[derive(Debug, Clone)]
pub struct RtspResponse {
    /// RTSP version (expected "RTSP/1.0")
    pub version: String,
    /// Status code
    pub status: StatusCode,
    /// Reason phrase (e.g., "OK")
    pub reason: String,
    /// Response headers
    pub headers: Headers,
    /// Response body (may be empty)
    pub body: Vec<u8>,
}

impl RtspResponse {
    /// Check if response indicates success
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get `CSeq` from response headers
    #[must_use]
    pub fn cseq(&self) -> Option<u32> {
        self.headers.cseq()
    }

    /// Get raw `Session` header value
    #[must_use]
    pub fn session(&self) -> Option<&str> {
        self.headers.session()
    }

    /// Get raw `com.ses.streamID` header value
    #[must_use]
    pub fn stream_id(&self) -> Option<&str> {
        self.headers.stream_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_is_success_only_for_2xx() {
        assert!(StatusCode(200).is_success());
        assert!(StatusCode(204).is_success());
        assert!(!StatusCode(404).is_success());
        assert!(!StatusCode(100).is_success());
    }

    #[test]
    fn response_accessors_delegate_to_headers() {
        let mut headers = Headers::new();
        headers.insert("CSeq", "7");
        headers.insert("Session", "6379EF83;timeout=30");
        headers.insert("com.ses.streamID", "1");

        let response = RtspResponse {
            version: "RTSP/1.0".to_string(),
            status: StatusCode::OK,
            reason: "OK".to_string(),
            headers,
            body: Vec::new(),
        };

        assert!(response.is_success());
        assert_eq!(response.cseq(), Some(7));
        assert_eq!(response.session(), Some("6379EF83;timeout=30"));
        assert_eq!(response.stream_id(), Some("1"));
    }
}
