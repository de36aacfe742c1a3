use std::fmt;

/// Number of leading and trailing characters kept by [`Secret::masked`].
pub const MASK_VISIBLE_CHARS: usize = 4;

/// A wrapper that keeps a raw credential out of logs and error messages.
///
/// `Secret<T>` holds the API key exactly as presented by the caller. The
/// value is only reachable through [`expose_secret`](Self::expose_secret);
/// `Debug` and `Display` always print `[REDACTED]`.
///
/// # Examples
///
/// ```
/// use apikey_gate::Secret;
///
/// let api_key = Secret::new("sk-1234567890".to_string());
///
/// assert_eq!(format!("{:?}", api_key), "[REDACTED]");
/// assert_eq!(format!("{}", api_key), "[REDACTED]");
/// assert_eq!(api_key.expose_secret(), "sk-1234567890");
/// ```
// Do NOT derive Clone, Copy or Default.
pub struct Secret<T> {
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the wrapped value.
    ///
    /// The exposed value must not be logged or displayed.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl<T: AsRef<str>> Secret<T> {
    /// Renders the credential for log correlation without revealing it.
    ///
    /// Keeps the first and last four characters around a `....` marker.
    /// Values too short to hide anything are fully redacted.
    ///
    /// ```
    /// use apikey_gate::Secret;
    ///
    /// let key = Secret::new("abcd-secret-wxyz");
    /// assert_eq!(key.masked(), "abcd....wxyz");
    ///
    /// let short = Secret::new("abcdefgh");
    /// assert_eq!(short.masked(), "[REDACTED]");
    /// ```
    pub fn masked(&self) -> String {
        let raw = self.inner.as_ref();
        let chars: Vec<char> = raw.chars().collect();
        if chars.len() <= MASK_VISIBLE_CHARS * 2 {
            return "[REDACTED]".to_string();
        }
        let head: String = chars[..MASK_VISIBLE_CHARS].iter().collect();
        let tail: String = chars[chars.len() - MASK_VISIBLE_CHARS..].iter().collect();
        format!("{head}....{tail}")
    }
}

impl<T> fmt::Debug for Secret<T> {
    // MUST unconditionally return "[REDACTED]" (CWE-532).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    // MUST unconditionally return "[REDACTED]" (CWE-532).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
