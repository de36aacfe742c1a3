use std::fmt;

use thiserror::Error;

/// Errors that can occur around a gated gateway operation.
///
/// `Violation` is what the gate itself produces. The other variants belong
/// to the surrounding handler: a downstream call that answered with nothing,
/// or a downstream failure that is passed through untouched.
#[derive(Debug, Error)]
pub enum Error<E = std::convert::Infallible> {
    /// The request was rejected by the gate
    #[error("gate violation: {0}")]
    Violation(#[from] Violation),
    /// The downstream call succeeded but returned no payload
    #[error("downstream returned an empty response for '{operation}'")]
    EmptyResponse {
        /// Operation whose downstream call answered with nothing
        operation: String,
    },
    /// The downstream call itself failed
    #[error("downstream call failed: {0}")]
    Downstream(E),
}

impl<E> Error<E> {
    /// Returns the outward status the transport layer should report.
    ///
    /// Downstream failures are not mapped here; they keep whatever status
    /// the backend assigned and are reported as `None`.
    pub fn status(&self) -> Option<Status> {
        match self {
            Error::Violation(v) => Some(v.status()),
            Error::EmptyResponse { .. } => Some(Status::Internal),
            Error::Downstream(_) => None,
        }
    }

    /// Returns the gate violation, if this error is one.
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Error::Violation(v) => Some(v),
            _ => None,
        }
    }
}

/// A request rejected by the gate, with details about which check failed.
///
/// The message is for server-side logs; the transport layer should only
/// expose [`Violation::status`] to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct Violation {
    /// The check that failed
    pub kind: ViolationKind,
    /// Human-readable message explaining the violation
    pub message: String,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// No credential was presented.
    pub fn missing_credential(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::MissingCredential, message)
    }

    /// The credential does not resolve to an active principal.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::Unauthenticated, message)
    }

    /// The principal's role is not allowed for the operation.
    pub fn bad_role(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::BadRole, message)
    }

    /// The resource is absent, or owned by another organization.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::NotFound, message)
    }

    /// Returns the outward status for this violation.
    pub fn status(&self) -> Status {
        self.kind.status()
    }
}

/// The kind of gate violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// No credential under the authorization header
    MissingCredential,
    /// Credential unknown, lookup failed, no environment, or disabled
    Unauthenticated,
    /// Role not in the operation's allowed set
    BadRole,
    /// Resource absent or owned by a different organization
    NotFound,
}

impl ViolationKind {
    /// Maps the violation kind to the outward status.
    ///
    /// `MissingCredential` is reported exactly like `Unauthenticated`.
    pub fn status(self) -> Status {
        match self {
            ViolationKind::MissingCredential | ViolationKind::Unauthenticated => {
                Status::Unauthenticated
            }
            ViolationKind::BadRole => Status::PermissionDenied,
            ViolationKind::NotFound => Status::NotFound,
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::MissingCredential => write!(f, "MissingCredential"),
            ViolationKind::Unauthenticated => write!(f, "Unauthenticated"),
            ViolationKind::BadRole => write!(f, "BadRole"),
            ViolationKind::NotFound => write!(f, "NotFound"),
        }
    }
}

/// Transport-neutral status the gateway reports to its client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Authentication failed or was missing
    Unauthenticated,
    /// Authenticated, but not allowed to call the operation
    PermissionDenied,
    /// Resource does not exist for this caller
    NotFound,
    /// Handler-side failure
    Internal,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Unauthenticated => write!(f, "unauthenticated"),
            Status::PermissionDenied => write!(f, "permission_denied"),
            Status::NotFound => write!(f, "not_found"),
            Status::Internal => write!(f, "internal"),
        }
    }
}
