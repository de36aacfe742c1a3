//! Type-state markers for the request context.
//!
//! Each state carries exactly the data established so far, so a principal
//! cannot be read before it was resolved and an operation cannot be called
//! before it was authorized.

use crate::request::Principal;

/// A credential was extracted; nothing is known about it yet.
#[derive(Debug, Clone, Copy)]
pub struct Extracted {
    _private: (),
}

impl Extracted {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// The credential resolved to an active principal; its role is unchecked.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub(crate) principal: Principal,
}

/// The principal's role is allowed for `operation`.
#[derive(Debug, Clone)]
pub struct Authorized {
    pub(crate) principal: Principal,
    pub(crate) operation: String,
}
