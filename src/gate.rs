use std::sync::Arc;

use crate::{
    cache::KeyCache,
    config::{ConfigError, GateConfig},
    context::Ctx,
    credential::AUTHORIZATION_HEADER,
    error::{Error, Violation},
    isolation::{OrgScope, OrganizationScoped},
    logging::GateLog,
    operation::OperationTable,
    request::RequestMeta,
    resolver::PrincipalResolver,
    response::expect_response,
};

/// The API key gate in front of every gateway operation.
///
/// `Gate` is the only way handlers obtain an authorized [`Ctx`]. It runs the
/// checks in a fixed order and stops at the first failure:
///
/// 1. extract the credential from request metadata
/// 2. resolve it to an active principal through the key cache
/// 3. check the principal's role against the operation's allowed roles
///
/// The `fetch`/`list`/`invoke` helpers wrap a downstream call with those
/// checks and with the response checks that follow it. The downstream
/// closure is never invoked when the gate rejects the request.
///
/// A gate is immutable after construction and can be shared across threads.
///
/// # Examples
///
/// ```
/// use apikey_gate::{
///     ApiKeyRecord, EnvironmentRecord, Gate, KeyRecord, MemoryKeyCache, Metadata,
///     OperationTable, ProjectRecord, RequestMeta, Role, Status,
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
///     project: ProjectRecord::default(),
/// });
///
/// let gate = Gate::new(cache, OperationTable::gateway_defaults());
/// let meta = RequestMeta::new(
///     "req-1",
///     [("authorization", "raw-key")].into_iter().collect::<Metadata>(),
/// );
///
/// let ctx = gate.check(&meta, "GetAccount").expect("read-only key may read");
/// assert_eq!(ctx.principal().api_key_id(), "key-1");
///
/// let denied = gate.check(&meta, "CreateAccount").unwrap_err();
/// assert_eq!(denied.status(), Status::PermissionDenied);
/// ```
#[derive(Debug, Clone)]
pub struct Gate<C> {
    resolver: PrincipalResolver<C>,
    operations: Arc<OperationTable>,
    header: String,
}

impl<C: KeyCache> Gate<C> {
    /// Creates a gate reading the `authorization` header.
    pub fn new(cache: C, operations: OperationTable) -> Self {
        Self {
            resolver: PrincipalResolver::new(cache),
            operations: Arc::new(operations),
            header: AUTHORIZATION_HEADER.to_string(),
        }
    }

    /// Reads the credential from `header` instead. Names are case-insensitive
    /// and surrounding whitespace is ignored.
    pub fn with_header(mut self, header: impl AsRef<str>) -> Self {
        self.header = header.as_ref().trim().to_ascii_lowercase();
        self
    }

    /// Creates a gate from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the configured operation table is
    /// invalid.
    pub fn from_config(cache: C, config: &GateConfig) -> Result<Self, ConfigError> {
        let operations = config.operation_table()?;
        Ok(Self::new(cache, operations).with_header(&config.credential.header))
    }

    /// Metadata key the credential is read from.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// The operation table this gate checks against.
    pub fn operations(&self) -> &OperationTable {
        &self.operations
    }

    /// The resolver this gate authenticates with.
    pub fn resolver(&self) -> &PrincipalResolver<C> {
        &self.resolver
    }

    /// Runs the gate checks for `operation`.
    ///
    /// # Errors
    ///
    /// Returns the [`Violation`] of the first check that fails.
    pub fn check(&self, meta: &RequestMeta, operation: &str) -> Result<Ctx, Violation> {
        let log = GateLog::new(&meta.request_id, operation);

        let ctx = Ctx::extract(meta, &self.header)
            .and_then(|ctx| ctx.resolve(&self.resolver))
            .and_then(|ctx| ctx.authorize(&self.operations, operation))
            .inspect_err(|violation| log.rejected(violation))?;

        log.debug(format_args!(
            "authorized api key {} with role {}",
            ctx.principal().api_key_id(),
            ctx.principal().role()
        ));
        Ok(ctx)
    }

    /// Gates a single-resource fetch.
    ///
    /// After the downstream call the response must be present and must
    /// belong to the caller's organization. A resource from another
    /// organization is reported as not found.
    ///
    /// # Errors
    ///
    /// Returns `Error::Violation` for a gate rejection or a cross-tenant
    /// resource, `Error::Downstream` for a downstream failure, and
    /// `Error::EmptyResponse` when the downstream answered with nothing.
    pub fn fetch<T, E, F>(
        &self,
        meta: &RequestMeta,
        operation: &str,
        downstream: F,
    ) -> Result<T, Error<E>>
    where
        T: OrganizationScoped,
        F: FnOnce(&Ctx) -> Result<Option<T>, E>,
    {
        let ctx = self.check(meta, operation)?;
        let response = downstream(&ctx).map_err(Error::Downstream)?;
        let resource = expect_logged(meta, operation, response)?;
        ctx.check_resource(&resource)?;
        Ok(resource)
    }

    /// Gates a list call, scoping it to the caller's organization.
    ///
    /// The downstream closure receives the [`OrgScope`] it must apply to
    /// its query.
    ///
    /// # Errors
    ///
    /// Same as [`fetch`](Self::fetch), minus the cross-tenant check.
    pub fn list<T, E, F>(
        &self,
        meta: &RequestMeta,
        operation: &str,
        downstream: F,
    ) -> Result<T, Error<E>>
    where
        F: FnOnce(&Ctx, OrgScope) -> Result<Option<T>, E>,
    {
        let ctx = self.check(meta, operation)?;
        let scope = ctx.organization_scope();
        let response = downstream(&ctx, scope).map_err(Error::Downstream)?;
        expect_logged(meta, operation, response)
    }

    /// Gates a call whose response carries no organization, such as a
    /// mutation acknowledgement or an SDK evaluation.
    ///
    /// # Errors
    ///
    /// Same as [`list`](Self::list).
    pub fn invoke<T, E, F>(
        &self,
        meta: &RequestMeta,
        operation: &str,
        downstream: F,
    ) -> Result<T, Error<E>>
    where
        F: FnOnce(&Ctx) -> Result<Option<T>, E>,
    {
        let ctx = self.check(meta, operation)?;
        let response = downstream(&ctx).map_err(Error::Downstream)?;
        expect_logged(meta, operation, response)
    }
}

fn expect_logged<T, E>(
    meta: &RequestMeta,
    operation: &str,
    response: Option<T>,
) -> Result<T, Error<E>> {
    expect_response(operation, response)
        .inspect_err(|_| GateLog::new(&meta.request_id, operation).empty_response())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::cache::{ApiKeyRecord, EnvironmentRecord, KeyRecord, MemoryKeyCache, ProjectRecord};
    use crate::error::{Status, ViolationKind};
    use crate::request::Metadata;
    use crate::role::{AllowedRoles, Role};

    #[derive(Debug, PartialEq)]
    struct Flag {
        id: String,
        organization_id: String,
    }

    impl OrganizationScoped for Flag {
        fn organization_id(&self) -> &str {
            &self.organization_id
        }
    }

    fn record(role: Role, organization_id: &str) -> KeyRecord {
        KeyRecord {
            api_key: ApiKeyRecord {
                id: format!("key-{}", role),
                name: "test key".to_string(),
                maintainer: "owner@example.com".to_string(),
                role,
                disabled: false,
            },
            environment: Some(EnvironmentRecord {
                id: "env-1".to_string(),
                organization_id: organization_id.to_string(),
                url_code: "prod".to_string(),
                disabled: false,
            }),
            project: ProjectRecord::default(),
        }
    }

    fn gate() -> Gate<MemoryKeyCache> {
        let cache = MemoryKeyCache::default();
        cache.insert("reader", record(Role::ReadOnly, "org-1"));
        cache.insert("writer", record(Role::Write, "org-1"));
        let table = OperationTable::builder()
            .allow("GetFlag", AllowedRoles::READ)
            .allow("ListFlags", AllowedRoles::READ)
            .allow("CreateFlag", AllowedRoles::MUTATE)
            .build()
            .unwrap();
        Gate::new(cache, table)
    }

    fn meta(key: &str) -> RequestMeta {
        let mut md = Metadata::new();
        md.append("authorization", key);
        RequestMeta::new("req-gate", md)
    }

    fn flag(org: &str) -> Flag {
        Flag {
            id: "flag-1".to_string(),
            organization_id: org.to_string(),
        }
    }

    #[test]
    fn gate_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Gate<MemoryKeyCache>>();
    }

    #[test]
    fn check_passes_for_allowed_role() {
        let ctx = gate().check(&meta("reader"), "GetFlag").unwrap();
        assert_eq!(ctx.operation(), "GetFlag");
        assert_eq!(ctx.request_id(), "req-gate");
    }

    #[test]
    fn check_rejects_missing_header() {
        let meta = RequestMeta::new("req-gate", Metadata::new());
        let err = gate().check(&meta, "GetFlag").unwrap_err();
        assert_eq!(err.kind, ViolationKind::MissingCredential);
        assert_eq!(err.status(), Status::Unauthenticated);
    }

    #[test]
    fn custom_header_is_honoured() {
        let gate = gate().with_header(" X-Api-Key ");
        assert_eq!(gate.header(), "x-api-key");

        let mut md = Metadata::new();
        md.append("x-api-key", "reader");
        assert!(gate.check(&RequestMeta::new("r", md), "GetFlag").is_ok());
        assert!(gate.check(&meta("reader"), "GetFlag").is_err());
    }

    #[test]
    fn rejected_request_never_reaches_downstream() {
        let calls = Cell::new(0);
        let result: Result<Flag, Error> = gate().fetch(&meta("reader"), "CreateFlag", |_| {
            calls.set(calls.get() + 1);
            Ok(Some(flag("org-1")))
        });

        assert_eq!(calls.get(), 0);
        assert_eq!(result.unwrap_err().status(), Some(Status::PermissionDenied));
    }

    #[test]
    fn fetch_returns_own_resource() {
        let result: Result<Flag, Error> =
            gate().fetch(&meta("reader"), "GetFlag", |_| Ok(Some(flag("org-1"))));
        assert_eq!(result.unwrap(), flag("org-1"));
    }

    #[test]
    fn fetch_hides_other_tenants_resource() {
        let result: Result<Flag, Error> =
            gate().fetch(&meta("reader"), "GetFlag", |_| Ok(Some(flag("org-2"))));
        let err = result.unwrap_err();
        assert_eq!(err.violation().unwrap().kind, ViolationKind::NotFound);
        assert_eq!(err.status(), Some(Status::NotFound));
    }

    #[test]
    fn fetch_reports_empty_response() {
        let result: Result<Flag, Error> = gate().fetch(&meta("reader"), "GetFlag", |_| Ok(None));
        assert!(matches!(
            result,
            Err(Error::EmptyResponse { ref operation }) if operation == "GetFlag"
        ));
    }

    #[test]
    fn downstream_error_passes_through() {
        let result: Result<Flag, Error<&str>> =
            gate().fetch(&meta("reader"), "GetFlag", |_| Err("backend down"));
        assert!(matches!(result, Err(Error::Downstream("backend down"))));
    }

    #[test]
    fn list_receives_callers_scope() {
        let result: Result<Vec<String>, Error> =
            gate().list(&meta("reader"), "ListFlags", |_, scope| {
                Ok(Some(vec![scope.organization_id().to_string()]))
            });
        assert_eq!(result.unwrap(), vec!["org-1".to_string()]);
    }

    #[test]
    fn invoke_passes_outgoing_metadata() {
        let result: Result<String, Error> = gate().invoke(&meta("writer"), "CreateFlag", |ctx| {
            Ok(ctx.outgoing_metadata().first("apikey-token").map(str::to_string))
        });
        assert_eq!(result.unwrap(), "writer");
    }
}
