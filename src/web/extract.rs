//! Extraction boundary trait for web integration.

use crate::request::RequestMeta;

/// Extracts request metadata from a framework-specific request.
///
/// Implementations copy the request ID and every inbound header into a
/// [`RequestMeta`]. They must not strip, validate, or interpret the
/// credential header; that is the gate's job.
///
/// # Examples
///
/// ```
/// use apikey_gate::web::ExtractMetadata;
/// use apikey_gate::{Metadata, RequestMeta};
///
/// struct MyFrameworkRequest {
///     id: String,
///     headers: Vec<(String, String)>,
/// }
///
/// impl ExtractMetadata for MyFrameworkRequest {
///     fn extract_metadata(&self) -> RequestMeta {
///         let metadata: Metadata = self.headers.iter().cloned().collect();
///         RequestMeta::new(self.id.clone(), metadata)
///     }
/// }
///
/// let req = MyFrameworkRequest {
///     id: "req-9".to_string(),
///     headers: vec![("Authorization".to_string(), "key".to_string())],
/// };
/// assert_eq!(req.extract_metadata().metadata.first("authorization"), Some("key"));
/// ```
pub trait ExtractMetadata {
    /// Extracts the request ID and inbound metadata.
    fn extract_metadata(&self) -> RequestMeta;
}

impl<T: ExtractMetadata + ?Sized> ExtractMetadata for &T {
    fn extract_metadata(&self) -> RequestMeta {
        (**self).extract_metadata()
    }
}

impl ExtractMetadata for RequestMeta {
    fn extract_metadata(&self) -> RequestMeta {
        self.clone()
    }
}
