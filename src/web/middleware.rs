//! Glue between an inbound request and the gate.
//!
//! ```text
//! HTTP/gRPC request
//!   ↓
//! framework code builds RequestAdapter (or implements ExtractMetadata)
//!   ↓
//! authorize_request(&gate, &request, operation)
//!   ↓
//! Ctx<Authorized>  or  Violation → http_status(violation.status())
//! ```

use crate::cache::KeyCache;
use crate::context::Ctx;
use crate::error::{Status, Violation};
use crate::gate::Gate;

use super::ExtractMetadata;

/// Extracts metadata from `request` and runs the gate checks for
/// `operation`.
///
/// # Errors
///
/// Returns the gate's [`Violation`]; map it with [`http_status`] for an
/// HTTP response.
///
/// # Examples
///
/// ```
/// use apikey_gate::web::{authorize_request, http_status, RequestAdapter};
/// use apikey_gate::{Gate, MemoryKeyCache, OperationTable};
///
/// let gate = Gate::new(MemoryKeyCache::default(), OperationTable::gateway_defaults());
/// let adapter = RequestAdapter::new("req-no-key");
///
/// let violation = authorize_request(&gate, &adapter, "GetAccount").unwrap_err();
/// assert_eq!(http_status(violation.status()), 401);
/// ```
pub fn authorize_request<C, R>(
    gate: &Gate<C>,
    request: &R,
    operation: &str,
) -> Result<Ctx, Violation>
where
    C: KeyCache,
    R: ExtractMetadata + ?Sized,
{
    let meta = request.extract_metadata();
    gate.check(&meta, operation)
}

/// Maps an outward status to its HTTP status code.
pub fn http_status(status: Status) -> u16 {
    match status {
        Status::Unauthenticated => 401,
        Status::PermissionDenied => 403,
        Status::NotFound => 404,
        Status::Internal => 500,
    }
}
