use std::collections::HashMap;

/// Well-known RTSP header names used by the SAT>IP wire protocol
pub mod names {
    pub const CSEQ: &str = "CSeq";
    pub const CONTENT_LENGTH: &str = "Content-Length";
    pub const SESSION: &str = "Session";
    pub const TRANSPORT: &str = "Transport";
    pub const USER_AGENT: &str = "User-Agent";
    pub const STREAM_ID: &str = "com.ses.streamID";
}

/// RTSP header collection, case-insensitive by key.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    inner: HashMap<String, String>,
}

impl Headers {
    /// Create empty headers
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header (case-insensitive key storage)
    ///
    /// If a header with the same name (case-insensitive) already exists, it is replaced.
    /// The new key casing is preserved.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name_str = name.into();
        self.inner.retain(|k, _| !k.eq_ignore_ascii_case(&name_str));
        self.inner.insert(name_str, value.into());
    }

    /// Get header value (case-insensitive)
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get `CSeq` value
    #[must_use]
    pub fn cseq(&self) -> Option<u32> {
        self.get(names::CSEQ)?.parse().ok()
    }

    /// Get Content-Length value
    #[must_use]
    pub fn content_length(&self) -> Option<usize> {
        self.get(names::CONTENT_LENGTH)?.parse().ok()
    }

    /// Get the raw `Session` header value.
    #[must_use]
    pub fn session(&self) -> Option<&str> {
        self.get(names::SESSION)
    }

    /// Get the raw `com.ses.streamID` header value.
    #[must_use]
    pub fn stream_id(&self) -> Option<&str> {
        self.get(names::STREAM_ID)
    }

    /// Iterate over all headers
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of headers
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_is_case_insensitive() {
        let mut h = Headers::new();
        h.insert("Session", "abcd1234;timeout=30");
        assert_eq!(h.get("session"), Some("abcd1234;timeout=30"));
        assert_eq!(h.get("SESSION"), Some("abcd1234;timeout=30"));
    }

    #[test]
    fn insert_replaces_existing_case_insensitively() {
        let mut h = Headers::new();
        h.insert("CSeq", "1");
        h.insert("cseq", "2");
        assert_eq!(h.len(), 1);
        assert_eq!(h.cseq(), Some(2));
    }
}
