use crate::error::Error;

/// Validates a downstream response before it is used.
///
/// Every downstream call answers with `Option<T>`; `None` means the backend
/// reported success without a payload. This is the one place that turns it
/// into a typed [`Error::EmptyResponse`]. The gate logs the rejection with
/// its request context.
///
/// # Errors
///
/// Returns `Error::EmptyResponse` naming `operation` when `response` is `None`.
///
/// # Examples
///
/// ```
/// use apikey_gate::{expect_response, Error};
///
/// let ok: Result<u32, Error> = expect_response("GetThing", Some(7));
/// assert_eq!(ok.unwrap(), 7);
///
/// let empty: Result<u32, Error> = expect_response("GetThing", None);
/// assert!(matches!(empty, Err(Error::EmptyResponse { .. })));
/// ```
pub fn expect_response<T, E>(operation: &str, response: Option<T>) -> Result<T, Error<E>> {
    response.ok_or_else(|| Error::EmptyResponse {
        operation: operation.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Status;

    #[test]
    fn some_passes_through() {
        let value: Result<&str, Error> = expect_response("Op", Some("payload"));
        assert_eq!(value.unwrap(), "payload");
    }

    #[test]
    fn none_is_empty_response_with_operation() {
        let err: Error = expect_response::<(), _>("ListAccounts", None).unwrap_err();
        match &err {
            Error::EmptyResponse { operation } => assert_eq!(operation, "ListAccounts"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.status(), Some(Status::Internal));
    }
}
