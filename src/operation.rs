//! Operation descriptors: which roles may invoke which gateway operation.
//!
//! The table is built once at startup and shared read-only by every request
//! (typically behind an `Arc`). Role lists live here and nowhere else.

use std::collections::HashMap;

use thiserror::Error;

use crate::role::{AllowedRoles, Role};

/// Static description of one gateway operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationDescriptor<'a> {
    /// Operation identifier, e.g. `"GetAccount"`
    pub name: &'a str,
    /// Roles permitted to invoke it
    pub allowed: AllowedRoles,
}

/// Invalid operation table definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// The same operation was registered twice
    #[error("operation '{0}' is registered more than once")]
    DuplicateOperation(String),
    /// An operation was registered with no allowed role
    #[error("operation '{0}' allows no role")]
    EmptyRoleSet(String),
    /// An operation grants access to keys whose role was never set
    #[error("operation '{0}' must not allow the unknown role")]
    UnknownRoleAllowed(String),
    /// An operation was registered with an empty name
    #[error("operation name must not be empty")]
    EmptyName,
}

/// Immutable mapping from operation identifier to its allowed roles.
///
/// # Examples
///
/// ```
/// use apikey_gate::{AllowedRoles, OperationTable, Role};
///
/// let table = OperationTable::builder()
///     .allow("GetWidget", AllowedRoles::READ)
///     .allow("DeleteWidget", AllowedRoles::ADMIN_ONLY)
///     .build()
///     .expect("valid table");
///
/// assert!(table.allowed_roles("GetWidget").unwrap().contains(Role::ReadOnly));
/// assert!(table.allowed_roles("Unknown").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationTable {
    operations: HashMap<String, AllowedRoles>,
}

impl OperationTable {
    /// Starts building a table.
    pub fn builder() -> OperationTableBuilder {
        OperationTableBuilder::default()
    }

    /// The public gateway's operation table.
    ///
    /// Reads allow read-only, write and admin keys; mutations allow write and
    /// admin keys; SDK endpoints allow only the matching SDK role.
    pub fn gateway_defaults() -> Self {
        let operations = GATEWAY_OPERATIONS
            .iter()
            .map(|(name, allowed)| ((*name).to_string(), *allowed))
            .collect();
        Self { operations }
    }

    /// Returns the allowed roles for `operation`, if it is registered.
    pub fn allowed_roles(&self, operation: &str) -> Option<AllowedRoles> {
        self.operations.get(operation).copied()
    }

    /// Returns the descriptor for `operation`, if it is registered.
    pub fn descriptor(&self, operation: &str) -> Option<OperationDescriptor<'_>> {
        self.operations
            .get_key_value(operation)
            .map(|(name, allowed)| OperationDescriptor {
                name: name.as_str(),
                allowed: *allowed,
            })
    }

    /// Returns `true` if `operation` is registered.
    pub fn contains(&self, operation: &str) -> bool {
        self.operations.contains_key(operation)
    }

    /// Number of registered operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns `true` if no operation is registered.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Iterates every registered operation, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = OperationDescriptor<'_>> {
        self.operations
            .iter()
            .map(|(name, allowed)| OperationDescriptor {
                name: name.as_str(),
                allowed: *allowed,
            })
    }

    /// Returns a new table where `overrides` replace or extend `self`.
    pub(crate) fn merged_with(mut self, overrides: OperationTable) -> Self {
        self.operations.extend(overrides.operations);
        self
    }
}

/// Builder for [`OperationTable`].
///
/// Registrations are accumulated and validated together by
/// [`build`](Self::build).
#[derive(Debug, Default)]
pub struct OperationTableBuilder {
    entries: Vec<(String, AllowedRoles)>,
}

impl OperationTableBuilder {
    /// Registers `operation` with its explicit set of allowed roles.
    pub fn allow(mut self, operation: impl Into<String>, roles: AllowedRoles) -> Self {
        self.entries.push((operation.into(), roles));
        self
    }

    /// Validates the registrations and freezes them into a table.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] for an empty name, an empty role set, a set
    /// containing [`Role::Unknown`], or an operation registered twice.
    pub fn build(self) -> Result<OperationTable, TableError> {
        let mut operations = HashMap::with_capacity(self.entries.len());
        for (name, allowed) in self.entries {
            if name.is_empty() {
                return Err(TableError::EmptyName);
            }
            if allowed.is_empty() {
                return Err(TableError::EmptyRoleSet(name));
            }
            if allowed.contains(Role::Unknown) {
                return Err(TableError::UnknownRoleAllowed(name));
            }
            if operations.contains_key(&name) {
                return Err(TableError::DuplicateOperation(name));
            }
            operations.insert(name, allowed);
        }
        Ok(OperationTable { operations })
    }
}

const GATEWAY_OPERATIONS: &[(&str, AllowedRoles)] = &[
    // SDK endpoints
    ("GetEvaluations", AllowedRoles::SDK_CLIENT),
    ("GetEvaluation", AllowedRoles::SDK_CLIENT),
    ("GetFeatureFlags", AllowedRoles::SDK_SERVER),
    ("GetSegmentUsers", AllowedRoles::SDK_SERVER),
    ("RegisterEvents", AllowedRoles::SDK),
    // Accounts
    ("CreateAccount", AllowedRoles::MUTATE),
    ("UpdateAccount", AllowedRoles::MUTATE),
    ("GetAccount", AllowedRoles::READ),
    ("GetAccountByEnvironmentId", AllowedRoles::READ),
    ("GetMe", AllowedRoles::READ),
    ("ListAccounts", AllowedRoles::READ),
    // Auto operations
    ("GetAutoOpsRule", AllowedRoles::READ),
    ("ListAutoOpsRules", AllowedRoles::READ),
    ("CreateAutoOpsRule", AllowedRoles::MUTATE),
    ("UpdateAutoOpsRule", AllowedRoles::MUTATE),
    ("StopAutoOpsRule", AllowedRoles::MUTATE),
    ("DeleteAutoOpsRule", AllowedRoles::MUTATE),
    ("ExecuteAutoOps", AllowedRoles::MUTATE),
    // Code references
    ("GetCodeReference", AllowedRoles::READ),
    ("ListCodeReferences", AllowedRoles::READ),
    ("CreateCodeReference", AllowedRoles::MUTATE),
    ("UpdateCodeReference", AllowedRoles::MUTATE),
    ("DeleteCodeReference", AllowedRoles::MUTATE),
    // Event counters
    ("GetExperimentEvaluationCount", AllowedRoles::READ),
    ("GetEvaluationTimeseriesCount", AllowedRoles::READ),
    ("GetExperimentResult", AllowedRoles::READ),
    ("ListExperimentResults", AllowedRoles::READ),
    ("GetExperimentGoalCount", AllowedRoles::READ),
    ("GetOpsEvaluationUserCount", AllowedRoles::READ),
    ("GetOpsGoalUserCount", AllowedRoles::READ),
    // Progressive rollouts
    ("GetProgressiveRollout", AllowedRoles::READ),
    ("ListProgressiveRollouts", AllowedRoles::READ),
    ("CreateProgressiveRollout", AllowedRoles::MUTATE),
    ("StopProgressiveRollout", AllowedRoles::MUTATE),
    ("DeleteProgressiveRollout", AllowedRoles::MUTATE),
    ("ExecuteProgressiveRollout", AllowedRoles::MUTATE),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_duplicates() {
        let err = OperationTable::builder()
            .allow("GetThing", AllowedRoles::READ)
            .allow("GetThing", AllowedRoles::MUTATE)
            .build()
            .unwrap_err();
        assert_eq!(err, TableError::DuplicateOperation("GetThing".to_string()));
    }

    #[test]
    fn builder_rejects_empty_role_set() {
        let err = OperationTable::builder()
            .allow("Nobody", AllowedRoles::NONE)
            .build()
            .unwrap_err();
        assert_eq!(err, TableError::EmptyRoleSet("Nobody".to_string()));
    }

    #[test]
    fn builder_rejects_unknown_role() {
        let err = OperationTable::builder()
            .allow("GetThing", AllowedRoles::from_roles([Role::Unknown, Role::Admin]))
            .build()
            .unwrap_err();
        assert_eq!(err, TableError::UnknownRoleAllowed("GetThing".to_string()));
    }

    #[test]
    fn builder_rejects_empty_name() {
        let err = OperationTable::builder()
            .allow("", AllowedRoles::READ)
            .build()
            .unwrap_err();
        assert_eq!(err, TableError::EmptyName);
    }

    #[test]
    fn gateway_defaults_have_no_duplicates() {
        let table = OperationTable::gateway_defaults();
        assert_eq!(table.len(), GATEWAY_OPERATIONS.len());
    }

    #[test]
    fn gateway_defaults_separate_reads_from_writes() {
        let table = OperationTable::gateway_defaults();

        let get = table.allowed_roles("GetAccount").unwrap();
        assert!(get.contains(Role::ReadOnly));

        let create = table.allowed_roles("CreateAccount").unwrap();
        assert!(!create.contains(Role::ReadOnly));
        assert!(create.contains(Role::Write));
        assert!(create.contains(Role::Admin));
    }

    #[test]
    fn gateway_defaults_keep_sdk_and_public_api_apart() {
        let table = OperationTable::gateway_defaults();

        let flags = table.allowed_roles("GetFeatureFlags").unwrap();
        assert!(flags.contains(Role::SdkServer));
        assert!(!flags.contains(Role::Admin));

        for descriptor in table.iter() {
            assert!(!descriptor.allowed.contains(Role::Unknown));
        }
    }

    #[test]
    fn merge_overrides_defaults() {
        let overrides = OperationTable::builder()
            .allow("GetAccount", AllowedRoles::ADMIN_ONLY)
            .allow("Custom", AllowedRoles::READ)
            .build()
            .unwrap();

        let table = OperationTable::gateway_defaults().merged_with(overrides);

        assert_eq!(
            table.allowed_roles("GetAccount"),
            Some(AllowedRoles::ADMIN_ONLY)
        );
        assert!(table.contains("Custom"));
        assert!(table.contains("ListAccounts"));
    }

    #[test]
    fn descriptor_exposes_name_and_roles() {
        let table = OperationTable::gateway_defaults();
        let d = table.descriptor("ListAccounts").unwrap();
        assert_eq!(d.name, "ListAccounts");
        assert_eq!(d.allowed, AllowedRoles::READ);
        assert!(table.descriptor("Nope").is_none());
    }
}
