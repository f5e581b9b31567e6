//! Request correlation ids shared by both services.

use uuid::Uuid;

/// Header carrying the request id on inbound and outbound calls.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Client-supplied ids longer than this are truncated.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Request id used to correlate a coordinator request with its shard calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new random request id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Build a request id from a client-provided header value.
    ///
    /// The value is truncated to 128 characters and stripped of anything but
    /// printable ASCII. An empty result falls back to a generated id.
    pub fn from_client(value: &str) -> Self {
        let sanitized: String = value
            .chars()
            .take(MAX_REQUEST_ID_LEN)
            .filter(|c| c.is_ascii_graphic())
            .collect();

        if sanitized.is_empty() {
            Self::new()
        } else {
            Self(sanitized)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
