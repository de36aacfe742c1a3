//! Credential extraction from inbound request metadata.

use crate::error::Violation;
use crate::request::Metadata;
use crate::secret::Secret;

/// Metadata key the gateway reads the API key from.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Pulls the raw API key out of inbound metadata.
///
/// Only the first value under `header` is considered, and it is taken
/// verbatim. No scheme prefix is stripped.
///
/// # Errors
///
/// Returns a `MissingCredential` violation when the header is absent, has
/// no values, or its first value is empty.
///
/// # Examples
///
/// ```
/// use apikey_gate::{extract_credential, Metadata, ViolationKind, AUTHORIZATION_HEADER};
///
/// let mut md = Metadata::new();
/// md.append("Authorization", "api-key-123");
///
/// let key = extract_credential(&md, AUTHORIZATION_HEADER).unwrap();
/// assert_eq!(key.expose_secret(), "api-key-123");
///
/// let err = extract_credential(&Metadata::new(), AUTHORIZATION_HEADER).unwrap_err();
/// assert_eq!(err.kind, ViolationKind::MissingCredential);
/// ```
pub fn extract_credential(metadata: &Metadata, header: &str) -> Result<Secret<String>, Violation> {
    match metadata.first(header) {
        Some(value) if !value.is_empty() => Ok(Secret::new(value.to_string())),
        Some(_) => Err(Violation::missing_credential(format!(
            "empty value under '{header}'"
        ))),
        None => Err(Violation::missing_credential(format!(
            "no value under '{header}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationKind;

    #[test]
    fn extracts_first_value() {
        let md: Metadata = [("authorization", "key-a"), ("authorization", "key-b")]
            .into_iter()
            .collect();

        let key = extract_credential(&md, AUTHORIZATION_HEADER).unwrap();
        assert_eq!(key.expose_secret(), "key-a");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let md: Metadata = [("AUTHORIZATION", "key-a")].into_iter().collect();
        assert!(extract_credential(&md, AUTHORIZATION_HEADER).is_ok());
    }

    #[test]
    fn absent_header_is_missing_credential() {
        let md: Metadata = [("x-other", "value")].into_iter().collect();
        let err = extract_credential(&md, AUTHORIZATION_HEADER).unwrap_err();
        assert_eq!(err.kind, ViolationKind::MissingCredential);
    }

    #[test]
    fn empty_first_value_is_missing_credential() {
        // A later non-empty value does not rescue an empty first one.
        let md: Metadata = [("authorization", ""), ("authorization", "key-b")]
            .into_iter()
            .collect();
        let err = extract_credential(&md, AUTHORIZATION_HEADER).unwrap_err();
        assert_eq!(err.kind, ViolationKind::MissingCredential);
    }

    #[test]
    fn value_is_taken_verbatim() {
        let md: Metadata = [("authorization", "Bearer abc")].into_iter().collect();
        let key = extract_credential(&md, AUTHORIZATION_HEADER).unwrap();
        assert_eq!(key.expose_secret(), "Bearer abc");
    }

    #[test]
    fn custom_header_name() {
        let md: Metadata = [("x-api-key", "k")].into_iter().collect();
        assert!(extract_credential(&md, "x-api-key").is_ok());
        assert!(extract_credential(&md, AUTHORIZATION_HEADER).is_err());
    }
}
