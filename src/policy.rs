use crate::error::Violation;
use crate::request::Principal;
use crate::role::AllowedRoles;

/// Checks the principal's role against an operation's allowed roles.
///
/// Pure set membership. A role outside `allowed` is rejected even when it is
/// "more powerful" than every member.
///
/// # Errors
///
/// Returns a `BadRole` violation when `principal.role()` is not in `allowed`.
pub fn authorize(principal: &Principal, allowed: AllowedRoles) -> Result<(), Violation> {
    if allowed.contains(principal.role()) {
        Ok(())
    } else {
        Err(Violation::bad_role(format!(
            "role '{}' is not in {}",
            principal.role(),
            allowed
        )))
    }
}
