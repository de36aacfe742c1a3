use crate::cache::KeyCache;
use crate::credential::extract_credential;
use crate::error::Violation;
use crate::isolation::{enforce_resource, OrgScope, OrganizationScoped};
use crate::logging::GateLog;
use crate::operation::OperationTable;
use crate::policy::authorize;
use crate::request::{Metadata, Principal, RequestMeta};
use crate::resolver::PrincipalResolver;
use crate::secret::Secret;
use crate::state::{Authorized, Extracted, Resolved};

/// Outgoing metadata key carrying the caller's raw API key.
pub const APIKEY_TOKEN_KEY: &str = "apikey-token";
/// Outgoing metadata key carrying the API key's maintainer.
pub const APIKEY_MAINTAINER_KEY: &str = "apikey-maintainer";
/// Outgoing metadata key carrying the API key's name.
pub const APIKEY_NAME_KEY: &str = "apikey-name";

/// Per-request context, progressing through the gate's checks.
///
/// ```text
/// Ctx<Extracted> --resolve--> Ctx<Resolved> --authorize--> Ctx<Authorized>
/// ```
///
/// Each transition consumes the previous context, so a request can only ever
/// be in one state. Only `Ctx<Authorized>` exposes what a handler needs to
/// call the downstream service.
///
/// # Examples
///
/// ```
/// use apikey_gate::{
///     ApiKeyRecord, Ctx, EnvironmentRecord, KeyRecord, MemoryKeyCache, Metadata,
///     OperationTable, PrincipalResolver, ProjectRecord, RequestMeta, Role,
///     AUTHORIZATION_HEADER,
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
/// let resolver = PrincipalResolver::new(cache);
/// let table = OperationTable::gateway_defaults();
///
/// let mut md = Metadata::new();
/// md.append(AUTHORIZATION_HEADER, "raw-key");
/// let meta = RequestMeta::new("req-1", md);
///
/// let ctx = Ctx::extract(&meta, AUTHORIZATION_HEADER)
///     .and_then(|ctx| ctx.resolve(&resolver))
///     .and_then(|ctx| ctx.authorize(&table, "GetAccount"))
///     .expect("read-only key may read accounts");
///
/// assert_eq!(ctx.principal().organization_id(), "org-1");
/// assert_eq!(ctx.operation(), "GetAccount");
/// ```
#[derive(Debug)]
pub struct Ctx<S = Authorized> {
    request_id: String,
    credential: Secret<String>,
    state: S,
}

// ============================================================================
// Shared methods (available on all states)
// ============================================================================

impl<S> Ctx<S> {
    /// Returns the request ID for this context.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the credential in masked form, for log correlation.
    pub fn masked_credential(&self) -> String {
        self.credential.masked()
    }

    fn advance<T>(self, state: T) -> Ctx<T> {
        Ctx {
            request_id: self.request_id,
            credential: self.credential,
            state,
        }
    }
}

// ============================================================================
// Ctx<Extracted> - credential present, identity unknown
// ============================================================================

impl Ctx<Extracted> {
    /// Extracts the credential from `meta` under `header`.
    ///
    /// # Errors
    ///
    /// Returns a `MissingCredential` violation when no usable value is
    /// present.
    pub fn extract(meta: &RequestMeta, header: &str) -> Result<Self, Violation> {
        let credential = extract_credential(&meta.metadata, header)?;
        Ok(Self {
            request_id: meta.request_id.clone(),
            credential,
            state: Extracted::new(),
        })
    }

    /// Resolves the credential to an active principal.
    ///
    /// # Errors
    ///
    /// Returns an `Unauthenticated` violation; see
    /// [`PrincipalResolver::resolve`].
    pub fn resolve<C: KeyCache>(
        self,
        resolver: &PrincipalResolver<C>,
    ) -> Result<Ctx<Resolved>, Violation> {
        let principal = resolver.resolve(&self.credential)?;
        Ok(self.advance(Resolved { principal }))
    }
}

// ============================================================================
// Ctx<Resolved> - principal known, role unchecked
// ============================================================================

impl Ctx<Resolved> {
    /// Returns the resolved principal.
    pub fn principal(&self) -> &Principal {
        &self.state.principal
    }

    /// Checks the principal's role against the roles `table` allows for
    /// `operation`.
    ///
    /// # Errors
    ///
    /// Returns a `BadRole` violation when the role is not allowed, or when
    /// `operation` is not in the table at all.
    pub fn authorize(
        self,
        table: &OperationTable,
        operation: &str,
    ) -> Result<Ctx<Authorized>, Violation> {
        let allowed = table.allowed_roles(operation).ok_or_else(|| {
            Violation::bad_role(format!("operation '{operation}' is not registered"))
        })?;
        authorize(&self.state.principal, allowed)?;

        let Ctx {
            request_id,
            credential,
            state: Resolved { principal },
        } = self;
        Ok(Ctx {
            request_id,
            credential,
            state: Authorized {
                principal,
                operation: operation.to_string(),
            },
        })
    }
}

// ============================================================================
// Ctx<Authorized> - cleared to call the downstream service
// ============================================================================

impl Ctx<Authorized> {
    /// Returns the authorized principal.
    pub fn principal(&self) -> &Principal {
        &self.state.principal
    }

    /// Returns the operation this context was authorized for.
    pub fn operation(&self) -> &str {
        &self.state.operation
    }

    /// Returns the caller's organization, for scoping list queries.
    pub fn organization_scope(&self) -> OrgScope {
        OrgScope::new(self.state.principal.organization_id())
    }

    /// Metadata to attach to the downstream call so the backend sees which
    /// key is acting.
    ///
    /// Contains the raw credential; never log it.
    pub fn outgoing_metadata(&self) -> Metadata {
        let mut md = Metadata::new();
        md.insert(APIKEY_TOKEN_KEY, self.credential.expose_secret().as_str());
        md.insert(APIKEY_MAINTAINER_KEY, self.state.principal.maintainer());
        md.insert(APIKEY_NAME_KEY, self.state.principal.api_key_name());
        md
    }

    /// Checks that a downstream resource belongs to the caller's
    /// organization.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` violation on mismatch, logged with this
    /// context's request ID and operation.
    pub fn check_resource<R>(&self, resource: &R) -> Result<(), Violation>
    where
        R: OrganizationScoped + ?Sized,
    {
        let principal = &self.state.principal;
        enforce_resource(principal, resource).inspect_err(|_| {
            self.log().cross_tenant(principal, resource.organization_id());
        })
    }

    fn log(&self) -> GateLog<'_> {
        GateLog::new(&self.request_id, &self.state.operation)
    }
}
