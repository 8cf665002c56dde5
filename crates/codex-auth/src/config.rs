//! Resolution configuration
//!
//! Defaults mirror the codex CLI conventions: auth file under `~/.codex`,
//! five-minute cache TTL, five-minute validation rate limit, `OPENAI_API_KEY`
//! as the override variable. Deserializable so binaries can load it from a
//! TOML table; every field has a default so an empty table is valid.

use serde::Deserialize;

use crate::paths::DEFAULT_AUTH_PATH;

/// Configuration for [`crate::CredentialResolver`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Whether the session-file source is consulted at all. When false, only
    /// the environment override can produce a credential.
    pub enabled: bool,
    /// Auth file path template. `$VAR`, `${VAR}`, and leading `~` expand;
    /// a non-default value wins over `CODEX_HOME`.
    pub auth_path: String,
    /// Proactively refresh stale sessions and retry failed validations once.
    pub auto_refresh: bool,
    /// Reject auth files readable by group or other (unix only).
    pub strict_permissions: bool,
    /// How long a resolved credential may be served from cache.
    pub cache_ttl_ms: u64,
    /// Minimum interval between validator calls for an unchanged token.
    pub validation_rate_limit_ms: u64,
    /// Environment variable holding an explicit API key override.
    pub api_key_env: String,
    /// Base URL handed to the validator for context.
    pub base_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth_path: DEFAULT_AUTH_PATH.to_string(),
            auto_refresh: true,
            strict_permissions: true,
            cache_ttl_ms: 5 * 60_000,
            validation_rate_limit_ms: 5 * 60_000,
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_codex_conventions() {
        let cfg = AuthConfig::default();
        assert!(cfg.enabled);
        assert_eq!(cfg.auth_path, "~/.codex/auth.json");
        assert!(cfg.auto_refresh);
        assert!(cfg.strict_permissions);
        assert_eq!(cfg.cache_ttl_ms, 300_000);
        assert_eq!(cfg.validation_rate_limit_ms, 300_000);
        assert_eq!(cfg.api_key_env, "OPENAI_API_KEY");
        assert_eq!(cfg.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn empty_toml_table_deserializes_to_defaults() {
        let cfg: AuthConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.auth_path, AuthConfig::default().auth_path);
        assert!(cfg.strict_permissions);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let cfg: AuthConfig = toml::from_str(
            r#"
auth_path = "/etc/codex/auth.json"
strict_permissions = false
cache_ttl_ms = 1000
"#,
        )
        .unwrap();
        assert_eq!(cfg.auth_path, "/etc/codex/auth.json");
        assert!(!cfg.strict_permissions);
        assert_eq!(cfg.cache_ttl_ms, 1000);
        assert_eq!(cfg.api_key_env, "OPENAI_API_KEY");
    }
}
