//! Web framework integration surface.
//!
//! Maps inbound HTTP or gRPC requests onto [`RequestMeta`](crate::RequestMeta)
//! without depending on any framework. Framework-specific code builds a
//! [`RequestAdapter`] (or implements [`ExtractMetadata`] directly) and hands
//! the result to a [`Gate`](crate::Gate).
//!
//! The boundary never authenticates anything itself. Headers are copied
//! verbatim, including the credential, and only the gate decides whether
//! the request may proceed.
//!
//! # Example Flow
//!
//! ```ignore
//! // In a framework-specific integration (e.g., axum, tonic):
//! let mut adapter = RequestAdapter::new(request_id);
//! for (name, value) in http_req.headers() {
//!     adapter.add_header(name.as_str(), value.to_str()?);
//! }
//!
//! let ctx = authorize_request(&gate, &adapter, "GetAccount")
//!     .map_err(|v| http_status(v.status()))?;
//! ```

mod adapter;
mod extract;
mod middleware;

pub use adapter::{RequestAdapter, REQUEST_ID_HEADER};
pub use extract::ExtractMetadata;
pub use middleware::{authorize_request, http_status};
