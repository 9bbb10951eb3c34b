/// The request payload and response-completion rule for one attempt.
///
/// The exact bytes on the wire are a protocol detail, not an engine
/// invariant, so they live behind this seam. The default probe matches the
/// classic line-oriented ping server: send `PING\n`, read one
/// newline-terminated reply.
#[derive(Debug, Clone)]
pub struct Probe {
    request: Vec<u8>,
    max_response_bytes: usize,
    terminator: Option<u8>,
}

impl Probe {
    pub fn new(request: Vec<u8>, max_response_bytes: usize, terminator: Option<u8>) -> Self {
        Self {
            request,
            // A zero threshold would make every response complete before the
            // first read; clamp to at least one byte.
            max_response_bytes: max_response_bytes.max(1),
            terminator,
        }
    }

    #[must_use]
    pub fn ping() -> Self {
        Self::new(b"PING\n".to_vec(), 1024, Some(b'\n'))
    }

    #[must_use]
    pub fn request_bytes(&self) -> &[u8] {
        &self.request
    }

    /// Whether `buf` already holds a complete response. Reaching the byte
    /// threshold always counts as complete; otherwise the terminator byte
    /// decides (probes without a terminator read until EOF or threshold).
    #[must_use]
    pub fn response_complete(&self, buf: &[u8]) -> bool {
        if buf.len() >= self.max_response_bytes {
            return true;
        }
        match self.terminator {
            Some(t) => buf.contains(&t),
            None => false,
        }
    }
}

impl Default for Probe {
    fn default() -> Self {
        Self::ping()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_probe_completes_on_newline() {
        let probe = Probe::ping();
        assert!(!probe.response_complete(b""));
        assert!(!probe.response_complete(b"{\"status\": \"OK\"}"));
        assert!(probe.response_complete(b"{\"status\": \"OK\"}\n"));
    }

    #[test]
    fn threshold_always_completes() {
        let probe = Probe::new(b"X".to_vec(), 4, None);
        assert!(!probe.response_complete(b"abc"));
        assert!(probe.response_complete(b"abcd"));
        assert!(probe.response_complete(b"abcde"));
    }

    #[test]
    fn zero_threshold_is_clamped() {
        let probe = Probe::new(b"X".to_vec(), 0, None);
        assert!(!probe.response_complete(b""));
        assert!(probe.response_complete(b"a"));
    }
}
