use super::{Headers, RtspResponse, StatusCode};
use thiserror::Error;

/// Errors while parsing an RTSP response off the wire
#[derive(Debug, Error)]
pub enum RtspCodecError {
    #[error("incomplete data: need more bytes")]
    Incomplete,

    #[error("invalid status line: {0}")]
    InvalidStatusLine(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("invalid content length")]
    InvalidContentLength,

    #[error("response too large: {size} bytes")]
    ResponseTooLarge { size: usize },
}

/// Sans-IO incremental parser for RTSP responses.
///
/// Feed bytes as they arrive off the socket with `feed()`, then call
/// `decode()` to check whether a full response is available yet.
pub struct ResponseParser {
    buffer: Vec<u8>,
    max_size: usize,
    state: ParseState,
}

#[derive(Debug, Clone)]
enum ParseState {
    StatusLine,
    Headers {
        version: String,
        status: StatusCode,
        reason: String,
    },
    Body {
        version: String,
        status: StatusCode,
        reason: String,
        headers: Headers,
        content_length: usize,
    },
}

impl ResponseParser {
    /// Create a new parser with a 1MB response cap
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            max_size: 1024 * 1024,
            state: ParseState::StatusLine,
        }
    }

    /// Feed bytes into the parser
    ///
    /// # Errors
    /// Returns `RtspCodecError::ResponseTooLarge` if the buffer exceeds `max_size`.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<(), RtspCodecError> {
        if self.buffer.len() + bytes.len() > self.max_size {
            return Err(RtspCodecError::ResponseTooLarge {
                size: self.buffer.len() + bytes.len(),
            });
        }
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// Try to decode a complete response
    ///
    /// Returns `Ok(Some(response))` if a complete response is available,
    /// `Ok(None)` if more data is needed.
    ///
    /// # Errors
    /// Returns `RtspCodecError` if the response is malformed.
    pub fn decode(&mut self) -> Result<Option<RtspResponse>, RtspCodecError> {
        loop {
            match &self.state {
                ParseState::StatusLine => {
                    let Some(line_end) = self.find_line_end() else {
                        return Ok(None);
                    };
                    let line = String::from_utf8_lossy(&self.buffer[..line_end]).to_string();
                    let (version, status, reason) = Self::parse_status_line(&line)?;
                    self.buffer.drain(..line_end + 2);
                    self.state = ParseState::Headers {
                        version,
                        status,
                        reason,
                    };
                }

                ParseState::Headers {
                    version,
                    status,
                    reason,
                } => {
                    let Some((headers, body_start)) = self.parse_headers()? else {
                        return Ok(None);
                    };
                    let content_length = headers.content_length().unwrap_or(0);
                    self.buffer.drain(..body_start);

                    if content_length == 0 {
                        let response = RtspResponse {
                            version: version.clone(),
                            status: *status,
                            reason: reason.clone(),
                            headers,
                            body: Vec::new(),
                        };
                        self.state = ParseState::StatusLine;
                        return Ok(Some(response));
                    }

                    self.state = ParseState::Body {
                        version: version.clone(),
                        status: *status,
                        reason: reason.clone(),
                        headers,
                        content_length,
                    };
                }

                ParseState::Body {
                    version,
                    status,
                    reason,
                    headers,
                    content_length,
                } => {
                    if self.buffer.len() < *content_length {
                        return Ok(None);
                    }
                    let body = self.buffer.drain(..*content_length).collect();
                    let response = RtspResponse {
                        version: version.clone(),
                        status: *status,
                        reason: reason.clone(),
                        headers: headers.clone(),
                        body,
                    };
                    self.state = ParseState::StatusLine;
                    return Ok(Some(response));
                }
            }
        }
    }

    /// Clear the buffer and reset parsing state
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = ParseState::StatusLine;
    }

    /// Current number of unparsed bytes buffered
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    fn find_line_end(&self) -> Option<usize> {
        self.buffer.windows(2).position(|w| w == b"\r\n")
    }

    fn parse_status_line(line: &str) -> Result<(String, StatusCode, String), RtspCodecError> {
        let mut parts = line.splitn(3, ' ');

        let version = parts
            .next()
            .ok_or_else(|| RtspCodecError::InvalidStatusLine(line.to_string()))?
            .to_string();
        if version != "RTSP/1.0" {
            return Err(RtspCodecError::InvalidStatusLine(line.to_string()));
        }

        let status = parts
            .next()
            .ok_or_else(|| RtspCodecError::InvalidStatusLine(line.to_string()))?
            .parse::<u16>()
            .map_err(|_| RtspCodecError::InvalidStatusLine(line.to_string()))?;

        let reason = parts.next().unwrap_or("").to_string();

        Ok((version, StatusCode(status), reason))
    }

    fn parse_headers(&self) -> Result<Option<(Headers, usize)>, RtspCodecError> {
        if self.buffer.starts_with(b"\r\n") {
            return Ok(Some((Headers::new(), 2)));
        }

        let Some(header_end) = self.buffer.windows(4).position(|w| w == b"\r\n\r\n") else {
            return Ok(None);
        };

        let header_str = String::from_utf8_lossy(&self.buffer[..header_end]);
        let mut headers = Headers::new();

        for line in header_str.split("\r\n") {
            if line.is_empty() {
                continue;
            }

            let colon_pos = line
                .find(':')
                .ok_or_else(|| RtspCodecError::InvalidHeader(line.to_string()))?;

            let name = line[..colon_pos].trim().to_string();
            let value = line[colon_pos + 1..].trim().to_string();

            headers.insert(name, value);
        }

        Ok(Some((headers, header_end + 4)))
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_status_line_and_headers_with_no_body() {
        let mut parser = ResponseParser::new();
        parser
            .feed(b"RTSP/1.0 200 OK\r\nCSeq: 1\r\nSession: 6379EF83;timeout=30\r\n\r\n")
            .unwrap();

        let response = parser.decode().unwrap().expect("response should decode");
        assert_eq!(response.status.as_u16(), 200);
        assert_eq!(response.reason, "OK");
        assert_eq!(response.headers.cseq(), Some(1));
        assert_eq!(response.headers.session(), Some("6379EF83;timeout=30"));
        assert!(response.body.is_empty());
    }

    #[test]
    fn returns_none_until_full_response_is_buffered() {
        let mut parser = ResponseParser::new();
        parser.feed(b"RTSP/1.0 200 OK\r\nCSeq: 1\r\n").unwrap();
        assert!(parser.decode().unwrap().is_none());

        parser.feed(b"\r\n").unwrap();
        let response = parser.decode().unwrap().expect("response should decode");
        assert_eq!(response.status.as_u16(), 200);
    }

    #[test]
    fn waits_for_body_bytes_indicated_by_content_length() {
        let mut parser = ResponseParser::new();
        parser
            .feed(b"RTSP/1.0 200 OK\r\nContent-Length: 5\r\n\r\nhel")
            .unwrap();
        assert!(parser.decode().unwrap().is_none());

        parser.feed(b"lo").unwrap();
        let response = parser.decode().unwrap().expect("response should decode");
        assert_eq!(response.body, b"hello");
    }

    #[test]
    fn s2_status_line_variants() {
        let mut ok = ResponseParser::new();
        ok.feed(b"RTSP/1.0 200 OK\r\n\r\n").unwrap();
        assert_eq!(ok.decode().unwrap().unwrap().status.as_u16(), 200);

        let mut session_not_found = ResponseParser::new();
        session_not_found
            .feed(b"RTSP/1.0 454 Session Not Found\r\n\r\n")
            .unwrap();
        assert_eq!(
            session_not_found.decode().unwrap().unwrap().status.as_u16(),
            454
        );

        let mut wrong_scheme = ResponseParser::new();
        wrong_scheme.feed(b"HTTP/1.1 200 OK\r\n\r\n").unwrap();
        assert!(matches!(
            wrong_scheme.decode(),
            Err(RtspCodecError::InvalidStatusLine(_))
        ));

        let mut swapped = ResponseParser::new();
        swapped.feed(b"RTSP/1.0 OK 200\r\n\r\n").unwrap();
        assert!(matches!(
            swapped.decode(),
            Err(RtspCodecError::InvalidStatusLine(_))
        ));
    }

    #[test]
    fn rejects_oversized_buffer() {
        let mut parser = ResponseParser::new().with_max_size_for_test(4);
        assert!(matches!(
            parser.feed(b"hello"),
            Err(RtspCodecError::ResponseTooLarge { .. })
        ));
    }

    impl ResponseParser {
        fn with_max_size_for_test(mut self, size: usize) -> Self {
            self.max_size = size;
            self
        }
    }
}
