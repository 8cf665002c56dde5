//! Redacting wrapper for credential material

use std::fmt;
use zeroize::Zeroize;

/// Wrapper for sensitive values (tokens, API keys).
///
/// `Debug` and `Display` print `[REDACTED]` so a credential can never leak
/// through logs or error formatting. The inner value is zeroized on drop.
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    /// Wrap a sensitive value.
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the inner value. Call sites should be the only places the raw
    /// credential is needed (request headers, comparisons).
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_and_display_are_redacted() {
        let secret = Secret::new(String::from("sk-live-token"));
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(format!("{secret}"), "[REDACTED]");
    }

    #[test]
    fn expose_returns_inner_value() {
        let secret = Secret::new(String::from("sk-live-token"));
        assert_eq!(secret.expose(), "sk-live-token");
    }

    #[test]
    fn clone_preserves_value() {
        let secret = Secret::new(String::from("rt-abc"));
        let copy = secret.clone();
        assert_eq!(copy.expose(), secret.expose());
    }
}
