use std::collections::BTreeMap;

use crate::role::Role;

/// Inbound or outgoing request metadata.
///
/// A mapping from header name to an ordered list of values, the way RPC
/// metadata is carried. Names are stored lower-cased so lookups are
/// case-insensitive.
///
/// # Examples
///
/// ```
/// use apikey_gate::Metadata;
///
/// let mut md = Metadata::new();
/// md.append("Authorization", "key-1");
/// md.append("authorization", "key-2");
///
/// assert_eq!(md.first("AUTHORIZATION"), Some("key-1"));
/// assert_eq!(md.get_all("authorization").len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: BTreeMap<String, Vec<String>>,
}

impl Metadata {
    /// Creates empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value under `name`, keeping earlier values.
    pub fn append(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .entry(name.as_ref().to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// Replaces all values under `name` with a single value.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .insert(name.as_ref().to_ascii_lowercase(), vec![value.into()]);
    }

    /// Returns every value stored under `name`, or an empty slice.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the first value stored under `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// Returns `true` if no header is present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates `(name, values)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut md = Metadata::new();
        for (name, value) in iter {
            md.append(name, value);
        }
        md
    }
}

/// Metadata about an incoming gateway request.
///
/// Contains the request identifier used to correlate log lines and the raw
/// inbound metadata the credential is extracted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    /// Unique identifier for this request
    pub request_id: String,
    /// Inbound request metadata (headers)
    pub metadata: Metadata,
}

impl RequestMeta {
    /// Creates request metadata with the given id and headers.
    pub fn new(request_id: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            request_id: request_id.into(),
            metadata,
        }
    }
}

/// A resolved API key, scoped to one environment, project and organization.
///
/// Built fresh for every request from a key cache record and never mutated.
/// There are no setters; fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub(crate) api_key_id: String,
    pub(crate) api_key_name: String,
    pub(crate) maintainer: String,
    pub(crate) role: Role,
    pub(crate) disabled: bool,
    pub(crate) environment_id: String,
    pub(crate) environment_url_code: String,
    pub(crate) organization_id: String,
    pub(crate) project_id: String,
    pub(crate) project_url_code: String,
}

impl Principal {
    /// Identifier of the API key.
    pub fn api_key_id(&self) -> &str {
        &self.api_key_id
    }

    /// Human-readable name of the API key.
    pub fn api_key_name(&self) -> &str {
        &self.api_key_name
    }

    /// Account responsible for the key.
    pub fn maintainer(&self) -> &str {
        &self.maintainer
    }

    /// Role the key was issued with.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether the key was flagged disabled. Always `false` for a principal
    /// produced by the resolver.
    pub fn disabled(&self) -> bool {
        self.disabled
    }

    /// Environment the key is bound to.
    pub fn environment_id(&self) -> &str {
        &self.environment_id
    }

    /// URL code of the environment.
    pub fn environment_url_code(&self) -> &str {
        &self.environment_url_code
    }

    /// Organization (tenant) that owns the environment.
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    /// Project that owns the environment.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// URL code of the project.
    pub fn project_url_code(&self) -> &str {
        &self.project_url_code
    }
}
