//! Token validation
//!
//! Purely local inspection: API keys only need to be non-empty, session
//! tokens get their JWT payload decoded for the `exp` claim. Signatures are
//! never verified — the identity provider already signed the token; this
//! check only reads the expiry for caching and refresh decisions. A payload
//! that cannot be decoded is treated as valid (fail open): the provider, not
//! this check, is authoritative.
//!
//! Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
//! (`Arc<dyn TokenValidator>`); the interface is async so a future
//! implementation can check against the API remotely.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;

use crate::clock::{Clock, SystemClock};
use crate::credential::AuthKind;

/// Default expiry safety margin: tokens expiring within this window are
/// already treated as invalid.
pub const DEFAULT_EXPIRY_SLACK_MS: u64 = 60_000;

/// Decides whether a candidate token is still acceptable.
pub trait TokenValidator: Send + Sync {
    fn validate<'a>(
        &'a self,
        token: &'a str,
        kind: AuthKind,
        base_url: &'a str,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>>;
}

/// Structural validator reading the JWT `exp` claim.
pub struct JwtExpiryValidator {
    slack_ms: u64,
    clock: Arc<dyn Clock>,
}

impl JwtExpiryValidator {
    pub fn new(slack_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self { slack_ms, clock }
    }

    fn check(&self, token: &str, kind: AuthKind) -> bool {
        if token.is_empty() {
            return false;
        }
        if kind == AuthKind::ApiKey {
            // A conventional `sk-` prefix is the strong signal, but any
            // non-empty key is accepted.
            return true;
        }
        let Some(payload) = decode_payload(token) else {
            return true;
        };
        if let Some(exp) = payload.get("exp").and_then(Value::as_i64) {
            let expires_at_ms = exp.saturating_mul(1000);
            let deadline = self.clock.now_millis() as i64 + self.slack_ms as i64;
            if expires_at_ms <= deadline {
                return false;
            }
        }
        true
    }
}

impl Default for JwtExpiryValidator {
    fn default() -> Self {
        Self::new(DEFAULT_EXPIRY_SLACK_MS, Arc::new(SystemClock))
    }
}

impl TokenValidator for JwtExpiryValidator {
    fn validate<'a>(
        &'a self,
        token: &'a str,
        kind: AuthKind,
        _base_url: &'a str,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        let verdict = self.check(token, kind);
        Box::pin(async move { verdict })
    }
}

/// Decode the middle segment of a JWT-shaped token as base64url JSON.
fn decode_payload(token: &str) -> Option<Value> {
    let mut parts = token.split('.');
    let payload = parts.nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}
