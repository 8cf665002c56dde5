//! Credential data model and field selection
//!
//! `ResolvedCredential` is the best usable field picked out of one auth file
//! read; `CredentialResolution` is the caller-facing verdict the resolver
//! builds from it (or from the environment, or from a failure). Token values
//! travel as `common::Secret` so Debug output and logs stay redacted.

use std::path::{Path, PathBuf};

use common::Secret;

use crate::error::{Error, Result};
use crate::store::AuthRecord;

/// Which kind of credential the auth file yielded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    OAuth,
    ApiKey,
}

impl AuthKind {
    pub fn label(&self) -> &'static str {
        match self {
            AuthKind::OAuth => "oauth",
            AuthKind::ApiKey => "api_key",
        }
    }
}

/// The best field picked from one auth file read.
///
/// Invariant, held by construction in [`ResolvedCredential::select`]: an
/// OAuth credential always carries a refresh token, an API-key credential
/// never does.
#[derive(Debug, Clone)]
pub struct ResolvedCredential {
    pub kind: AuthKind,
    pub access_token: Secret<String>,
    pub refresh_token: Option<Secret<String>>,
    pub path: PathBuf,
    pub last_refresh: Option<String>,
}

impl ResolvedCredential {
    /// Pick the best usable field from an auth record.
    ///
    /// A complete token pair is an OAuth credential regardless of whether a
    /// flat API key is also present — OAuth always wins. Otherwise a
    /// non-empty API key is used. Anything else is unusable.
    pub fn select(path: &Path, record: &AuthRecord) -> Result<Self> {
        if let Some(tokens) = &record.tokens {
            if let (Some(access), Some(refresh)) = (&tokens.access_token, &tokens.refresh_token) {
                if !access.is_empty() && !refresh.is_empty() {
                    return Ok(Self {
                        kind: AuthKind::OAuth,
                        access_token: Secret::new(access.clone()),
                        refresh_token: Some(Secret::new(refresh.clone())),
                        path: path.to_path_buf(),
                        last_refresh: record.last_refresh.clone(),
                    });
                }
            }
        }
        if let Some(key) = &record.api_key {
            if !key.is_empty() {
                return Ok(Self {
                    kind: AuthKind::ApiKey,
                    access_token: Secret::new(key.clone()),
                    refresh_token: None,
                    path: path.to_path_buf(),
                    last_refresh: record.last_refresh.clone(),
                });
            }
        }
        Err(Error::NoUsableCredential {
            path: path.to_path_buf(),
        })
    }
}

/// Overall standing of the resolved credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    /// OAuth session or explicit environment key in good standing.
    Healthy,
    /// Usable but suboptimal (API-key fallback, or env key used only after
    /// the session path failed). Callers should log a warning and proceed.
    Degraded,
    /// No usable credential.
    Unhealthy,
}

impl CredentialState {
    pub fn label(&self) -> &'static str {
        match self {
            CredentialState::Healthy => "healthy",
            CredentialState::Degraded => "degraded",
            CredentialState::Unhealthy => "unhealthy",
        }
    }
}

/// Where the credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    CodexOauth,
    CodexApiKey,
    EnvApiKey,
    Missing,
}

impl CredentialSource {
    pub fn label(&self) -> &'static str {
        match self {
            CredentialSource::CodexOauth => "codex_oauth",
            CredentialSource::CodexApiKey => "codex_api_key",
            CredentialSource::EnvApiKey => "env_api_key",
            CredentialSource::Missing => "missing",
        }
    }
}

/// Context attached to a resolution for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ResolutionMetadata {
    pub path: Option<PathBuf>,
    pub last_refresh: Option<String>,
    /// Why the session path was bypassed, when the env fallback was used.
    pub fallback_reason: Option<String>,
}

/// Final caller-facing result of one `resolve()` call.
///
/// Constructed fresh per call, never mutated afterwards. `detail` always
/// names the concrete reason (file path, failed check, nested CLI failure)
/// so operators can diagnose without extra logs.
#[derive(Debug, Clone)]
pub struct CredentialResolution {
    pub state: CredentialState,
    pub source: CredentialSource,
    pub detail: String,
    pub api_key: Option<Secret<String>>,
    pub metadata: ResolutionMetadata,
}
