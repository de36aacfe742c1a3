//! API key gate for a multi-tenant gateway.
//!
//! Every inbound call to the gateway passes through the same checks before
//! any backend is contacted:
//! - **Credential extraction**: the API key is read from request metadata
//! - **Principal resolution**: the key is looked up in a [`KeyCache`] and
//!   must be active and bound to an active environment
//! - **Role authorization**: the key's [`Role`] must be in the operation's
//!   explicit [`AllowedRoles`]
//! - **Tenant isolation**: results are confined to the caller's organization
//!
//! # Core Types
//!
//! - [`Gate`]: Runs the checks and wraps downstream calls
//! - [`Ctx`]: Type-state request context; only `Ctx<Authorized>` can call downstream
//! - [`OperationTable`]: Immutable operation → allowed roles mapping
//! - [`Secret<T>`]: Wrapper that redacts the raw key in logs/output
//! - [`Violation`]: A rejected request, mapped outward through [`Status`]
//!
//! # Examples
//!
//! ```
//! use apikey_gate::{
//!     ApiKeyRecord, EnvironmentRecord, Error, Gate, KeyRecord, MemoryKeyCache, Metadata,
//!     OperationTable, OrganizationScoped, ProjectRecord, RequestMeta, Role, Status,
//! };
//!
//! #[derive(Debug)]
//! struct Account { email: String, organization_id: String }
//!
//! impl OrganizationScoped for Account {
//!     fn organization_id(&self) -> &str { &self.organization_id }
//! }
//!
//! let cache = MemoryKeyCache::default();
//! cache.insert("raw-key", KeyRecord {
//!     api_key: ApiKeyRecord {
//!         id: "key-1".into(),
//!         name: "ci".into(),
//!         maintainer: "ops@example.com".into(),
//!         role: Role::ReadOnly,
//!         disabled: false,
//!     },
//!     environment: Some(EnvironmentRecord {
//!         id: "env-1".into(),
//!         organization_id: "org-1".into(),
//!         url_code: "prod".into(),
//!         disabled: false,
//!     }),
//!     project: ProjectRecord::default(),
//! });
//! let gate = Gate::new(cache, OperationTable::gateway_defaults());
//!
//! let mut md = Metadata::new();
//! md.append("authorization", "raw-key");
//! let meta = RequestMeta::new("req-123", md);
//!
//! // Own organization: returned as-is.
//! let account: Result<Account, Error> = gate.fetch(&meta, "GetAccount", |_ctx| {
//!     Ok(Some(Account { email: "a@example.com".into(), organization_id: "org-1".into() }))
//! });
//! assert_eq!(account.unwrap().email, "a@example.com");
//!
//! // Another organization's resource looks like it does not exist.
//! let other: Result<Account, Error> = gate.fetch(&meta, "GetAccount", |_ctx| {
//!     Ok(Some(Account { email: "b@example.com".into(), organization_id: "org-2".into() }))
//! });
//! assert_eq!(other.unwrap_err().status(), Some(Status::NotFound));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod context;
mod credential;
mod error;
mod gate;
mod isolation;
mod logging;
mod operation;
mod policy;
mod request;
mod resolver;
mod response;
mod role;
mod secret;
mod state;
pub mod web;

pub use cache::{
    ApiKeyRecord, CacheError, EnvironmentRecord, KeyCache, KeyRecord, MemoryKeyCache,
    ProjectRecord, DEFAULT_KEY_CACHE_TTL, DEFAULT_PURGE_INTERVAL,
};
pub use config::{ConfigError, CredentialConfig, GateConfig, KeyCacheConfig};
pub use context::{Ctx, APIKEY_MAINTAINER_KEY, APIKEY_NAME_KEY, APIKEY_TOKEN_KEY};
pub use credential::{extract_credential, AUTHORIZATION_HEADER};
pub use error::{Error, Status, Violation, ViolationKind};
pub use gate::Gate;
pub use isolation::{enforce, enforce_resource, OrgScope, OrganizationScoped};
pub use logging::GateLog;
pub use operation::{OperationDescriptor, OperationTable, OperationTableBuilder, TableError};
pub use policy::authorize;
pub use request::{Metadata, Principal, RequestMeta};
pub use resolver::PrincipalResolver;
pub use response::expect_response;
pub use role::{AllowedRoles, ParseRoleError, Role};
pub use secret::{Secret, MASK_VISIBLE_CHARS};
pub use state::{Authorized, Extracted, Resolved};
