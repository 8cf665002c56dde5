//! Credential resolution orchestration
//!
//! Implements the source-priority chain and the validate/refresh/login
//! recovery machine. Priority, first success wins:
//! 1. Explicit environment API key — no file I/O, no CLI invocation
//! 2. The codex CLI's auth file (cache → read → staleness refresh →
//!    rate-limited validation → one refresh-and-revalidate cycle)
//! 3. Environment key again, degraded, with the session failure recorded
//! 4. Unhealthy
//!
//! The cache slot and the last-validation record live behind a tokio Mutex
//! that is held across the whole session-file sequence, so two concurrent
//! `resolve()` calls can never spawn duplicate login or refresh subprocesses
//! — the second caller waits and then hits the cache. A cancelled resolution
//! writes no cache entry: the put happens in one synchronous step after
//! validation has completed.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use common::Secret;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::CredentialCache;
use crate::cli::{CliTransport, CodexCli};
use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::credential::{
    AuthKind, CredentialResolution, CredentialSource, CredentialState, ResolutionMetadata,
    ResolvedCredential,
};
use crate::error::{Error, Result};
use crate::paths::resolve_auth_path;
use crate::store::{AuthFileStore, AuthRecord, ensure_secure_permissions};
use crate::validator::{JwtExpiryValidator, TokenValidator};

/// Sessions whose `last_refresh` is older than this are proactively
/// refreshed before use, independent of validator outcome.
const STALENESS_WINDOW_MS: u64 = 25 * 24 * 60 * 60 * 1000;

const LOGIN_ATTEMPTS: u32 = 3;
const LOGIN_BACKOFF_START: Duration = Duration::from_millis(1_000);

/// The last token the validator approved, for rate limiting.
struct ValidationRecord {
    token: String,
    kind: AuthKind,
    timestamp: u64,
}

/// Mutable state shared across `resolve()` calls.
#[derive(Default)]
struct ResolverState {
    cache: CredentialCache,
    last_validated: Option<ValidationRecord>,
}

/// The only component the rest of the application calls.
pub struct CredentialResolver {
    config: AuthConfig,
    env: HashMap<String, String>,
    store: AuthFileStore,
    cli: Arc<dyn CliTransport>,
    validator: Arc<dyn TokenValidator>,
    clock: Arc<dyn Clock>,
    state: Mutex<ResolverState>,
}

impl CredentialResolver {
    /// Resolver with the real CLI, the JWT validator, and the wall clock.
    /// Captures the process environment once at construction.
    pub fn new(config: AuthConfig) -> Self {
        let env: HashMap<String, String> = std::env::vars().collect();
        let cli = Arc::new(CodexCli::from_env(&env));
        Self::with_collaborators(
            config,
            env,
            cli,
            Arc::new(JwtExpiryValidator::default()),
            Arc::new(SystemClock),
        )
    }

    /// Resolver with explicit collaborators (tests, embedding).
    pub fn with_collaborators(
        config: AuthConfig,
        env: HashMap<String, String>,
        cli: Arc<dyn CliTransport>,
        validator: Arc<dyn TokenValidator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            env,
            store: AuthFileStore,
            cli,
            validator,
            clock,
            state: Mutex::new(ResolverState::default()),
        }
    }

    /// Resolve the best available credential. Never returns an error: every
    /// failure inside the session path is converted into the environment
    /// fallback or the terminal unhealthy resolution.
    pub async fn resolve(&self) -> CredentialResolution {
        if let Some(key) = self.env_override() {
            debug!(var = %self.config.api_key_env, "using environment API key override");
            return CredentialResolution {
                state: CredentialState::Healthy,
                source: CredentialSource::EnvApiKey,
                detail: format!("using {} environment variable", self.config.api_key_env),
                api_key: Some(Secret::new(key)),
                metadata: ResolutionMetadata::default(),
            };
        }

        if !self.config.enabled {
            return CredentialResolution {
                state: CredentialState::Unhealthy,
                source: CredentialSource::Missing,
                detail: format!(
                    "session reuse disabled and {} is unset",
                    self.config.api_key_env
                ),
                api_key: None,
                metadata: ResolutionMetadata::default(),
            };
        }

        match self.resolve_session().await {
            Ok(credential) => self.session_resolution(credential),
            Err(err) => {
                warn!(error = %err, "session credential resolution failed");
                // Kept for completeness: with a consistent snapshot the
                // override was already taken at step 1.
                if let Some(key) = self.env_override() {
                    return CredentialResolution {
                        state: CredentialState::Degraded,
                        source: CredentialSource::EnvApiKey,
                        detail: format!(
                            "using {} after session reuse failed: {err}",
                            self.config.api_key_env
                        ),
                        api_key: Some(Secret::new(key)),
                        metadata: ResolutionMetadata {
                            fallback_reason: Some(err.to_string()),
                            ..ResolutionMetadata::default()
                        },
                    };
                }
                CredentialResolution {
                    state: CredentialState::Unhealthy,
                    source: CredentialSource::Missing,
                    detail: format!(
                        "session credential resolution failed ({err}) and {} is unset",
                        self.config.api_key_env
                    ),
                    api_key: None,
                    metadata: ResolutionMetadata {
                        fallback_reason: Some(err.to_string()),
                        ..ResolutionMetadata::default()
                    },
                }
            }
        }
    }

    fn env_override(&self) -> Option<String> {
        self.env
            .get(&self.config.api_key_env)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn session_resolution(&self, credential: ResolvedCredential) -> CredentialResolution {
        let oauth = credential.kind == AuthKind::OAuth;
        let path = credential.path.display();
        CredentialResolution {
            state: if oauth {
                CredentialState::Healthy
            } else {
                CredentialState::Degraded
            },
            source: if oauth {
                CredentialSource::CodexOauth
            } else {
                CredentialSource::CodexApiKey
            },
            detail: if oauth {
                format!("codex auth file ({path}) access token ready")
            } else {
                format!("codex auth file provided API key fallback ({path})")
            },
            api_key: Some(credential.access_token.clone()),
            metadata: ResolutionMetadata {
                path: Some(credential.path.clone()),
                last_refresh: credential.last_refresh.clone(),
                fallback_reason: (!oauth).then(|| "auth file contains API key".to_string()),
            },
        }
    }

    /// The session-file attempt. Runs under the state mutex so only one
    /// login/refresh/validate sequence is ever in flight.
    async fn resolve_session(&self) -> Result<ResolvedCredential> {
        let mut state = self.state.lock().await;

        let path = resolve_auth_path(&self.config.auth_path, &self.env);
        let stat = self.store.stat(&path).await?;
        if self.config.strict_permissions {
            if let Some(stat) = &stat {
                ensure_secure_permissions(&path, stat.mode)?;
            }
        }

        if let Some(stat) = &stat {
            if let Some(hit) = state
                .cache
                .get(Some(stat.mtime_millis), self.clock.now_millis())
            {
                debug!(path = %path.display(), "serving cached credential");
                return Ok(hit.clone());
            }
        }

        let mut record = match self.store.read(&path).await? {
            Some(record) => record,
            None => {
                self.login_with_backoff(&path).await?;
                self.store
                    .read(&path)
                    .await?
                    .ok_or_else(|| Error::LoginIncomplete { path: path.clone() })?
            }
        };

        if self.config.auto_refresh {
            if let Some(refreshed) = self.maybe_refresh(&path, &record).await? {
                record = refreshed;
            }
        }

        let candidate = ResolvedCredential::select(&path, &record)?;
        let credential = self.ensure_valid(&mut state, &path, candidate).await?;

        // Re-stat so an mtime bumped by login/refresh is the one we key on.
        let mtime = self.store.stat(&path).await?.map(|s| s.mtime_millis);
        let expires_at = self.clock.now_millis() + self.config.cache_ttl_ms;
        state.cache.put(credential.clone(), mtime, expires_at);
        Ok(credential)
    }

    /// Retry `codex login` with exponential backoff (1 s, 2 s between the
    /// three attempts). The file is not re-checked between attempts.
    async fn login_with_backoff(&self, path: &Path) -> Result<()> {
        let mut delay = LOGIN_BACKOFF_START;
        for attempt in 1..=LOGIN_ATTEMPTS {
            info!(
                path = %path.display(),
                attempt,
                attempts = LOGIN_ATTEMPTS,
                "auth file missing, invoking codex login"
            );
            if self.cli.login().await {
                return Ok(());
            }
            if attempt < LOGIN_ATTEMPTS {
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
        Err(Error::LoginFailed {
            path: path.to_path_buf(),
            attempts: LOGIN_ATTEMPTS,
        })
    }

    /// Staleness check: refresh a session whose `last_refresh` is older than
    /// the 25-day window. An absent or unparsable timestamp is treated as
    /// not stale, so malformed data cannot cause refresh loops.
    async fn maybe_refresh(&self, path: &Path, record: &AuthRecord) -> Result<Option<AuthRecord>> {
        let Some(tokens) = &record.tokens else {
            return Ok(None);
        };
        if tokens.refresh_token.is_none() {
            return Ok(None);
        }
        let Some(last_refresh) = &record.last_refresh else {
            return Ok(None);
        };
        let Ok(parsed) = DateTime::parse_from_rfc3339(last_refresh) else {
            debug!(
                path = %path.display(),
                last_refresh,
                "unparsable last_refresh, skipping staleness check"
            );
            return Ok(None);
        };
        let last_refresh_ms = parsed.timestamp_millis().max(0) as u64;
        if self.clock.now_millis().saturating_sub(last_refresh_ms) < STALENESS_WINDOW_MS {
            return Ok(None);
        }
        info!(path = %path.display(), "session is past the staleness window, refreshing");
        Ok(Some(self.perform_refresh(path).await?))
    }

    /// One `codex auth refresh` followed by a mandatory re-read.
    async fn perform_refresh(&self, path: &Path) -> Result<AuthRecord> {
        if !self.cli.refresh().await {
            return Err(Error::RefreshFailed {
                path: path.to_path_buf(),
            });
        }
        self.store
            .read(path)
            .await?
            .ok_or_else(|| Error::RefreshIncomplete {
                path: path.to_path_buf(),
            })
    }

    /// Validation decision plus the single refresh-and-revalidate cycle.
    ///
    /// Skips the validator when the same token and kind were approved within
    /// the rate-limit interval. On rejection of an OAuth candidate (with
    /// auto-refresh on) the session is refreshed and re-validated exactly
    /// once; a second rejection is fatal.
    async fn ensure_valid(
        &self,
        state: &mut ResolverState,
        path: &Path,
        candidate: ResolvedCredential,
    ) -> Result<ResolvedCredential> {
        if !self.should_validate(state, &candidate) {
            return Ok(candidate);
        }

        let valid = self
            .validator
            .validate(
                candidate.access_token.expose(),
                candidate.kind,
                &self.config.base_url,
            )
            .await;
        if valid {
            self.record_validation(state, &candidate);
            return Ok(candidate);
        }

        if candidate.kind == AuthKind::OAuth && self.config.auto_refresh {
            info!(path = %path.display(), "access token failed validation, refreshing");
            let record = self.perform_refresh(path).await?;
            let refreshed = ResolvedCredential::select(path, &record)?;
            let ok = self
                .validator
                .validate(
                    refreshed.access_token.expose(),
                    refreshed.kind,
                    &self.config.base_url,
                )
                .await;
            if !ok {
                return Err(Error::ValidationFailed {
                    path: path.to_path_buf(),
                });
            }
            self.record_validation(state, &refreshed);
            return Ok(refreshed);
        }

        Err(Error::ValidationFailed {
            path: path.to_path_buf(),
        })
    }

    fn should_validate(&self, state: &ResolverState, candidate: &ResolvedCredential) -> bool {
        let Some(last) = &state.last_validated else {
            return true;
        };
        // A changed token or kind always re-validates, regardless of time.
        if last.token != *candidate.access_token.expose() {
            return true;
        }
        if last.kind != candidate.kind {
            return true;
        }
        self.clock.now_millis().saturating_sub(last.timestamp)
            >= self.config.validation_rate_limit_ms
    }

    fn record_validation(&self, state: &mut ResolverState, credential: &ResolvedCredential) {
        state.last_validated = Some(ValidationRecord {
            token: credential.access_token.expose().clone(),
            kind: credential.kind,
            timestamp: self.clock.now_millis(),
        });
    }
}
