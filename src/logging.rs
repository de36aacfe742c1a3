use std::fmt;

use crate::error::{Violation, ViolationKind};
use crate::request::Principal;

/// Request-scoped logger for one gated operation.
///
/// Every event carries the request ID and the operation name, so a failed
/// check can be traced without repeating those fields at each call site.
/// It is lifetime-bound to the strings it borrows and never holds the raw
/// credential.
#[derive(Debug, Clone, Copy)]
pub struct GateLog<'a> {
    request_id: &'a str,
    operation: &'a str,
}

impl<'a> GateLog<'a> {
    /// Creates a logger for `operation` within request `request_id`.
    pub fn new(request_id: &'a str, operation: &'a str) -> Self {
        Self {
            request_id,
            operation,
        }
    }

    /// Returns the request ID associated with this logger.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Returns the operation associated with this logger.
    pub fn operation(&self) -> &str {
        self.operation
    }

    /// Logs an info-level message.
    ///
    /// Use with `format_args!`:
    /// ```no_run
    /// # use apikey_gate::{GateLog, Secret};
    /// # fn example(log: &GateLog) {
    /// let key = Secret::new("raw-key".to_string());
    /// log.info(format_args!("resolving key {}", key));
    /// # }
    /// ```
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(request_id = %self.request_id, operation = %self.operation, "{}", args);
    }

    /// Logs a warning-level message.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(request_id = %self.request_id, operation = %self.operation, "{}", args);
    }

    /// Logs an error-level message.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(request_id = %self.request_id, operation = %self.operation, "{}", args);
    }

    /// Logs a debug-level message.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(request_id = %self.request_id, operation = %self.operation, "{}", args);
    }

    /// Logs a rejected request at the level its kind warrants.
    ///
    /// Authentication failures are routine and logged as warnings. Role
    /// mismatches and cross-organization access point at a misconfigured or
    /// hostile client and are logged as errors.
    pub fn rejected(&self, violation: &Violation) {
        match violation.kind {
            ViolationKind::MissingCredential | ViolationKind::Unauthenticated => {
                self.warn(format_args!("request rejected: {violation}"));
            }
            ViolationKind::BadRole | ViolationKind::NotFound => {
                self.error(format_args!("request rejected: {violation}"));
            }
        }
    }

    /// Logs a downstream resource owned by another organization.
    ///
    /// The resource's organization goes to the server log only; the caller
    /// just sees `NotFound`.
    pub fn cross_tenant(&self, principal: &Principal, resource_organization_id: &str) {
        tracing::error!(
            request_id = %self.request_id,
            operation = %self.operation,
            api_key_id = %principal.api_key_id(),
            caller_organization_id = %principal.organization_id(),
            resource_organization_id,
            "cross-organization resource access rejected"
        );
    }

    /// Logs a downstream call that succeeded without a payload.
    pub fn empty_response(&self) {
        self.error(format_args!("downstream returned an empty response"));
    }
}
