//! Principal resolution: raw credential → validated, scoped [`Principal`].

use crate::cache::{KeyCache, KeyRecord};
use crate::error::Violation;
use crate::request::Principal;
use crate::secret::Secret;

/// Turns a raw API key into a [`Principal`] using a [`KeyCache`].
///
/// The resolver reads the cache and nothing else. It never populates or
/// refreshes it.
///
/// # Examples
///
/// ```
/// use apikey_gate::{
///     ApiKeyRecord, EnvironmentRecord, KeyRecord, MemoryKeyCache, PrincipalResolver,
///     ProjectRecord, Role, Secret, ViolationKind,
/// };
///
/// let cache = MemoryKeyCache::default();
/// cache.insert("raw-key", KeyRecord {
///     api_key: ApiKeyRecord {
///         id: "key-1".into(),
///         name: "ci".into(),
///         maintainer: "ops@example.com".into(),
///         role: Role::ReadOnly,
///         disabled: false,
///     },
///     environment: Some(EnvironmentRecord {
///         id: "env-1".into(),
///         organization_id: "org-1".into(),
///         url_code: "prod".into(),
///         disabled: false,
///     }),
///     project: ProjectRecord { id: "proj-1".into(), url_code: "web".into() },
/// });
///
/// let resolver = PrincipalResolver::new(cache);
/// let principal = resolver.resolve(&Secret::new("raw-key".to_string())).unwrap();
/// assert_eq!(principal.organization_id(), "org-1");
///
/// let err = resolver.resolve(&Secret::new("unknown".to_string())).unwrap_err();
/// assert_eq!(err.kind, ViolationKind::Unauthenticated);
/// ```
#[derive(Debug, Clone)]
pub struct PrincipalResolver<C> {
    cache: C,
}

impl<C: KeyCache> PrincipalResolver<C> {
    /// Creates a resolver backed by `cache`.
    pub fn new(cache: C) -> Self {
        Self { cache }
    }

    /// Returns the underlying key cache.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Resolves `raw_key` to an active principal.
    ///
    /// # Errors
    ///
    /// Returns an `Unauthenticated` violation when the key is not in the
    /// cache, the lookup fails, the record has no environment, or either
    /// the key or its environment is disabled.
    pub fn resolve(&self, raw_key: &Secret<String>) -> Result<Principal, Violation> {
        let record = match self.cache.get(raw_key.expose_secret()) {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::warn!(api_key = %raw_key.masked(), "api key not found in cache");
                return Err(Violation::unauthenticated("api key not found"));
            }
            Err(err) => {
                tracing::error!(
                    api_key = %raw_key.masked(),
                    error = %err,
                    "api key lookup failed"
                );
                return Err(Violation::unauthenticated("api key lookup failed"));
            }
        };

        principal_from_record(record)
    }
}

/// Validates a cache record and converts it into a principal.
fn principal_from_record(record: KeyRecord) -> Result<Principal, Violation> {
    let KeyRecord {
        api_key,
        environment,
        project,
    } = record;

    let environment = environment.ok_or_else(|| {
        tracing::warn!(api_key_id = %api_key.id, "api key has no environment");
        Violation::unauthenticated("api key has no environment")
    })?;

    if api_key.disabled {
        tracing::warn!(api_key_id = %api_key.id, "api key is disabled");
        return Err(Violation::unauthenticated("api key is disabled"));
    }

    if environment.disabled {
        tracing::warn!(
            api_key_id = %api_key.id,
            environment_id = %environment.id,
            "environment is disabled"
        );
        return Err(Violation::unauthenticated("environment is disabled"));
    }

    Ok(Principal {
        api_key_id: api_key.id,
        api_key_name: api_key.name,
        maintainer: api_key.maintainer,
        role: api_key.role,
        disabled: api_key.disabled,
        environment_id: environment.id,
        environment_url_code: environment.url_code,
        organization_id: environment.organization_id,
        project_id: project.id,
        project_url_code: project.url_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ApiKeyRecord, CacheError, EnvironmentRecord, MemoryKeyCache, ProjectRecord};
    use crate::error::ViolationKind;
    use crate::role::Role;

    struct FailingCache;

    impl KeyCache for FailingCache {
        fn get(&self, _raw_key: &str) -> Result<Option<KeyRecord>, CacheError> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }
    }

    fn record(role: Role) -> KeyRecord {
        KeyRecord {
            api_key: ApiKeyRecord {
                id: "key-1".to_string(),
                name: "backend".to_string(),
                maintainer: "dev@example.com".to_string(),
                role,
                disabled: false,
            },
            environment: Some(EnvironmentRecord {
                id: "env-1".to_string(),
                organization_id: "org-1".to_string(),
                url_code: "staging".to_string(),
                disabled: false,
            }),
            project: ProjectRecord {
                id: "proj-1".to_string(),
                url_code: "shop".to_string(),
            },
        }
    }

    fn key(raw: &str) -> Secret<String> {
        Secret::new(raw.to_string())
    }

    #[test]
    fn resolves_active_key() {
        let cache = MemoryKeyCache::default();
        cache.insert("raw", record(Role::Write));

        let principal = PrincipalResolver::new(cache).resolve(&key("raw")).unwrap();

        assert_eq!(principal.api_key_id(), "key-1");
        assert_eq!(principal.role(), Role::Write);
        assert_eq!(principal.environment_id(), "env-1");
        assert_eq!(principal.environment_url_code(), "staging");
        assert_eq!(principal.organization_id(), "org-1");
        assert_eq!(principal.project_id(), "proj-1");
        assert_eq!(principal.project_url_code(), "shop");
        assert!(!principal.disabled());
    }

    #[test]
    fn unknown_key_is_unauthenticated() {
        let resolver = PrincipalResolver::new(MemoryKeyCache::default());
        let err = resolver.resolve(&key("missing")).unwrap_err();
        assert_eq!(err.kind, ViolationKind::Unauthenticated);
    }

    #[test]
    fn lookup_error_is_unauthenticated() {
        let err = PrincipalResolver::new(FailingCache)
            .resolve(&key("raw"))
            .unwrap_err();
        assert_eq!(err.kind, ViolationKind::Unauthenticated);
    }

    #[test]
    fn record_without_environment_is_unauthenticated() {
        let cache = MemoryKeyCache::default();
        let mut rec = record(Role::Admin);
        rec.environment = None;
        cache.insert("raw", rec);

        let err = PrincipalResolver::new(cache).resolve(&key("raw")).unwrap_err();
        assert_eq!(err.kind, ViolationKind::Unauthenticated);
    }

    #[test]
    fn disabled_key_is_unauthenticated() {
        let cache = MemoryKeyCache::default();
        let mut rec = record(Role::Admin);
        rec.api_key.disabled = true;
        cache.insert("raw", rec);

        let err = PrincipalResolver::new(cache).resolve(&key("raw")).unwrap_err();
        assert_eq!(err.kind, ViolationKind::Unauthenticated);
    }

    #[test]
    fn disabled_environment_is_unauthenticated() {
        let cache = MemoryKeyCache::default();
        let mut rec = record(Role::Admin);
        if let Some(env) = rec.environment.as_mut() {
            env.disabled = true;
        }
        cache.insert("raw", rec);

        let err = PrincipalResolver::new(cache).resolve(&key("raw")).unwrap_err();
        assert_eq!(err.kind, ViolationKind::Unauthenticated);
    }

    #[test]
    fn resolution_is_repeatable() {
        let cache = MemoryKeyCache::default();
        cache.insert("raw", record(Role::ReadOnly));
        let resolver = PrincipalResolver::new(cache);

        let first = resolver.resolve(&key("raw")).unwrap();
        let second = resolver.resolve(&key("raw")).unwrap();
        assert_eq!(first, second);
    }
}
