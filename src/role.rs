//! API key roles and explicit per-operation role sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

/// The role an API key was issued with.
///
/// Roles are flat labels. No role implies the permissions of another:
/// an `Admin` key may call a write operation only because that operation
/// lists `Admin` explicitly in its [`AllowedRoles`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Role was never set on the key
    Unknown,
    /// Client-side SDK key
    SdkClient,
    /// Server-side SDK key
    SdkServer,
    /// Public API, read-only access
    ReadOnly,
    /// Public API, read and write access
    Write,
    /// Public API, sensitive administrative access
    Admin,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 6] = [
        Role::Unknown,
        Role::SdkClient,
        Role::SdkServer,
        Role::ReadOnly,
        Role::Write,
        Role::Admin,
    ];

    /// Returns the configuration name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Unknown => "unknown",
            Role::SdkClient => "sdk_client",
            Role::SdkServer => "sdk_server",
            Role::ReadOnly => "read_only",
            Role::Write => "write",
            Role::Admin => "admin",
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role name '{0}'")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    /// Parses both the short names (`read_only`) and the upstream long
    /// names (`PUBLIC_API_READ_ONLY`), ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let short = normalized
            .strip_prefix("public_api_")
            .unwrap_or(normalized.as_str());

        match short {
            "unknown" => Ok(Role::Unknown),
            "sdk_client" => Ok(Role::SdkClient),
            "sdk_server" => Ok(Role::SdkServer),
            "read_only" => Ok(Role::ReadOnly),
            "write" => Ok(Role::Write),
            "admin" => Ok(Role::Admin),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The explicit set of roles permitted to invoke one operation.
///
/// Stored as a bitmask so the set is `Copy` and membership is a single
/// AND. Sets are built from an exhaustive list; there is no notion of
/// "at least" a role.
///
/// # Examples
///
/// ```
/// use apikey_gate::{AllowedRoles, Role};
///
/// let roles = AllowedRoles::MUTATE;
/// assert!(roles.contains(Role::Admin));
/// assert!(!roles.contains(Role::ReadOnly));
///
/// let custom = AllowedRoles::from_roles([Role::SdkServer, Role::Admin]);
/// assert_eq!(custom.len(), 2);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AllowedRoles {
    bits: u8,
}

impl AllowedRoles {
    /// The empty set. Nothing is allowed.
    pub const NONE: AllowedRoles = AllowedRoles { bits: 0 };

    /// Read operations: read-only, write and admin keys.
    pub const READ: AllowedRoles = AllowedRoles {
        bits: Role::ReadOnly.bit() | Role::Write.bit() | Role::Admin.bit(),
    };

    /// Mutating operations: write and admin keys.
    pub const MUTATE: AllowedRoles = AllowedRoles {
        bits: Role::Write.bit() | Role::Admin.bit(),
    };

    /// Sensitive operations: admin keys only.
    pub const ADMIN_ONLY: AllowedRoles = AllowedRoles {
        bits: Role::Admin.bit(),
    };

    /// Client SDK operations.
    pub const SDK_CLIENT: AllowedRoles = AllowedRoles {
        bits: Role::SdkClient.bit(),
    };

    /// Server SDK operations.
    pub const SDK_SERVER: AllowedRoles = AllowedRoles {
        bits: Role::SdkServer.bit(),
    };

    /// Operations shared by both SDK kinds.
    pub const SDK: AllowedRoles = AllowedRoles {
        bits: Role::SdkClient.bit() | Role::SdkServer.bit(),
    };

    /// Builds a set from an explicit list of roles.
    pub fn from_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        let bits = roles.into_iter().fold(0, |acc, role| acc | role.bit());
        Self { bits }
    }

    /// Returns `true` if `role` is a member of the set.
    pub fn contains(self, role: Role) -> bool {
        self.bits & role.bit() != 0
    }

    /// Returns `true` if no role is allowed.
    pub fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Number of roles in the set.
    pub fn len(self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Iterates the member roles in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |role| self.contains(*role))
    }
}

impl FromIterator<Role> for AllowedRoles {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self::from_roles(iter)
    }
}

impl fmt::Debug for AllowedRoles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for AllowedRoles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, role) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", role)?;
        }
        f.write_str("}")
    }
}

impl<'de> Deserialize<'de> for AllowedRoles {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let roles = Vec::<Role>::deserialize(deserializer)?;
        Ok(Self::from_roles(roles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_the_documented_sets() {
        assert_eq!(
            AllowedRoles::READ.iter().collect::<Vec<_>>(),
            vec![Role::ReadOnly, Role::Write, Role::Admin]
        );
        assert_eq!(
            AllowedRoles::MUTATE.iter().collect::<Vec<_>>(),
            vec![Role::Write, Role::Admin]
        );
        assert_eq!(
            AllowedRoles::ADMIN_ONLY.iter().collect::<Vec<_>>(),
            vec![Role::Admin]
        );
        assert_eq!(AllowedRoles::SDK.len(), 2);
    }

    #[test]
    fn no_role_is_implied_by_another() {
        // Admin is not a superset of the SDK roles.
        assert!(!AllowedRoles::SDK_SERVER.contains(Role::Admin));
        assert!(!AllowedRoles::READ.contains(Role::SdkServer));
        assert!(!AllowedRoles::READ.contains(Role::Unknown));
    }

    #[test]
    fn empty_set_allows_nothing() {
        let none = AllowedRoles::from_roles([]);
        assert!(none.is_empty());
        for role in Role::ALL {
            assert!(!none.contains(role));
        }
    }

    #[test]
    fn parse_accepts_short_and_upstream_names() {
        assert_eq!("read_only".parse::<Role>().unwrap(), Role::ReadOnly);
        assert_eq!(
            "PUBLIC_API_READ_ONLY".parse::<Role>().unwrap(),
            Role::ReadOnly
        );
        assert_eq!("sdk-server".parse::<Role>().unwrap(), Role::SdkServer);
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn allowed_roles_display_is_readable() {
        assert_eq!(AllowedRoles::MUTATE.to_string(), "{write, admin}");
        assert_eq!(AllowedRoles::NONE.to_string(), "{}");
    }
}
