//! Request adapter for mapping inbound requests to gate types.

use crate::request::{Metadata, RequestMeta};

use super::ExtractMetadata;

/// Header a caller or load balancer may use to supply the request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Framework-agnostic view of an inbound request.
///
/// Holds owned, simple data so it can be built from any framework's request
/// type. Header names are case-insensitive and a header may repeat.
///
/// # Examples
///
/// ```
/// use apikey_gate::web::{ExtractMetadata, RequestAdapter};
///
/// let mut adapter = RequestAdapter::new("req-12345");
/// adapter.add_header("Authorization", "raw-key");
/// adapter.add_header("X-Trace", "a");
/// adapter.add_header("X-Trace", "b");
///
/// let meta = adapter.extract_metadata();
/// assert_eq!(meta.request_id, "req-12345");
/// assert_eq!(meta.metadata.first("authorization"), Some("raw-key"));
/// assert_eq!(meta.metadata.get_all("x-trace").len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestAdapter {
    request_id: String,
    headers: Metadata,
}

impl RequestAdapter {
    /// Creates an adapter with the given request ID and no headers.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            headers: Metadata::new(),
        }
    }

    /// Builds an adapter from raw header pairs.
    ///
    /// The request ID is taken from [`REQUEST_ID_HEADER`] when present and
    /// non-empty, otherwise `fallback_request_id` is used.
    ///
    /// ```
    /// use apikey_gate::web::RequestAdapter;
    ///
    /// let adapter = RequestAdapter::from_headers(
    ///     "generated-1",
    ///     [("X-Request-Id", "edge-42"), ("authorization", "k")],
    /// );
    /// assert_eq!(adapter.request_id(), "edge-42");
    ///
    /// let adapter = RequestAdapter::from_headers("generated-2", [("authorization", "k")]);
    /// assert_eq!(adapter.request_id(), "generated-2");
    /// ```
    pub fn from_headers<I, K, V>(fallback_request_id: impl Into<String>, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers: Metadata = headers.into_iter().collect();
        let request_id = match headers.first(REQUEST_ID_HEADER) {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => fallback_request_id.into(),
        };
        Self {
            request_id,
            headers,
        }
    }

    /// Appends a header value. Repeated names keep every value in order.
    pub fn add_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.headers.append(name, value);
    }

    /// Returns the request ID.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the collected headers.
    pub fn headers(&self) -> &Metadata {
        &self.headers
    }
}

impl ExtractMetadata for RequestAdapter {
    fn extract_metadata(&self) -> RequestMeta {
        RequestMeta::new(self.request_id.clone(), self.headers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_adapter_is_empty() {
        let adapter = RequestAdapter::new("req-001");
        assert_eq!(adapter.request_id(), "req-001");
        assert!(adapter.headers().is_empty());
    }

    #[test]
    fn header_names_are_case_insensitive() {
        let mut adapter = RequestAdapter::new("req-002");
        adapter.add_header("AUTHORIZATION", "k1");
        assert_eq!(adapter.headers().first("authorization"), Some("k1"));
    }

    #[test]
    fn credential_is_copied_verbatim() {
        let mut adapter = RequestAdapter::new("req-003");
        adapter.add_header("authorization", "Bearer  spaced-key ");

        let meta = adapter.extract_metadata();
        assert_eq!(meta.metadata.first("authorization"), Some("Bearer  spaced-key "));
    }

    #[test]
    fn blank_request_id_header_falls_back() {
        let adapter = RequestAdapter::from_headers("fallback", [("x-request-id", "  ")]);
        assert_eq!(adapter.request_id(), "fallback");
    }

    #[test]
    fn extraction_is_repeatable() {
        let mut adapter = RequestAdapter::new("req-004");
        adapter.add_header("authorization", "k");
        assert_eq!(adapter.extract_metadata(), adapter.extract_metadata());
    }
}
