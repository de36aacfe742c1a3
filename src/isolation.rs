//! Tenant isolation: callers only ever observe their own organization's data.
//!
//! Single-resource fetches are checked after the downstream call with
//! [`enforce`]/[`enforce_resource`]. List calls are scoped before the call by
//! injecting an [`OrgScope`] into the downstream request.
//!
//! A mismatch is reported as `NotFound`, never as a permission failure, so a
//! caller cannot tell "belongs to someone else" apart from "does not exist".

use crate::error::Violation;
use crate::request::Principal;

/// A downstream payload that belongs to one organization.
pub trait OrganizationScoped {
    /// Organization that owns this resource.
    fn organization_id(&self) -> &str;
}

impl<T: OrganizationScoped + ?Sized> OrganizationScoped for &T {
    fn organization_id(&self) -> &str {
        (**self).organization_id()
    }
}

impl<T: OrganizationScoped + ?Sized> OrganizationScoped for Box<T> {
    fn organization_id(&self) -> &str {
        (**self).organization_id()
    }
}

/// Compares the caller's organization with the resource's.
///
/// # Errors
///
/// Returns a `NotFound` violation when the two ids differ.
///
/// # Examples
///
/// ```
/// use apikey_gate::{enforce, ViolationKind};
///
/// assert!(enforce("org-a", "org-a").is_ok());
/// assert_eq!(enforce("org-a", "org-b").unwrap_err().kind, ViolationKind::NotFound);
/// ```
pub fn enforce(principal_org_id: &str, resource_org_id: &str) -> Result<(), Violation> {
    if principal_org_id == resource_org_id {
        Ok(())
    } else {
        Err(Violation::not_found("resource not found"))
    }
}

/// Checks that `resource` belongs to the principal's organization.
///
/// # Errors
///
/// Returns a `NotFound` violation on mismatch. Nothing is logged here;
/// [`Ctx::check_resource`](crate::Ctx::check_resource) logs the rejection
/// with its request context.
pub fn enforce_resource<R>(principal: &Principal, resource: &R) -> Result<(), Violation>
where
    R: OrganizationScoped + ?Sized,
{
    enforce(principal.organization_id(), resource.organization_id())
}

/// The caller's organization, to be pushed into list queries.
///
/// Obtained from an authorized context; a handler copies it into the
/// downstream request before making the call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrgScope {
    organization_id: String,
}

impl OrgScope {
    pub(crate) fn new(organization_id: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
        }
    }

    /// Organization id the downstream query must be constrained to.
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    /// Returns `true` if `resource` falls inside this scope.
    pub fn includes<R: OrganizationScoped + ?Sized>(&self, resource: &R) -> bool {
        self.organization_id == resource.organization_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Status, ViolationKind};
    use crate::policy::tests::principal_with;
    use crate::role::Role;

    struct Account {
        organization_id: String,
    }

    impl OrganizationScoped for Account {
        fn organization_id(&self) -> &str {
            &self.organization_id
        }
    }

    #[test]
    fn same_organization_passes() {
        assert!(enforce("org-1", "org-1").is_ok());
    }

    #[test]
    fn different_organization_is_not_found() {
        let err = enforce("org-a", "org-b").unwrap_err();
        assert_eq!(err.kind, ViolationKind::NotFound);
        assert_eq!(err.status(), Status::NotFound);
    }

    #[test]
    fn message_does_not_leak_the_other_tenant() {
        let err = enforce("org-a", "org-secret").unwrap_err();
        assert!(!err.message.contains("org-secret"));
        assert!(!err.to_string().contains("org-secret"));
    }

    #[test]
    fn comparison_is_exact() {
        assert!(enforce("org-1", "ORG-1").is_err());
        assert!(enforce("org-1", "org-1 ").is_err());
        assert!(enforce("", "org-1").is_err());
    }

    #[test]
    fn enforce_resource_uses_principal_org() {
        let principal = principal_with(Role::Admin, "org-0");
        let mine = Account {
            organization_id: "org-0".to_string(),
        };
        let theirs = Account {
            organization_id: "org-9".to_string(),
        };

        assert!(enforce_resource(&principal, &mine).is_ok());
        assert_eq!(
            enforce_resource(&principal, &theirs).unwrap_err().kind,
            ViolationKind::NotFound
        );
    }

    #[test]
    fn org_scope_includes_only_its_tenant() {
        let scope = OrgScope::new("org-1");
        let inside = Account {
            organization_id: "org-1".to_string(),
        };
        let outside = Account {
            organization_id: "org-2".to_string(),
        };

        assert_eq!(scope.organization_id(), "org-1");
        assert!(scope.includes(&inside));
        assert!(!scope.includes(&outside));
    }
}
