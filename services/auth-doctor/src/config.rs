//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The file is optional: running the doctor with no config at all uses the
//! library defaults, which match a stock codex installation.

use codex_auth::AuthConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub codex: AuthConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if !self.codex.base_url.starts_with("http://")
            && !self.codex.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.codex.base_url
            )));
        }

        if self.codex.api_key_env.trim().is_empty() {
            return Err(common::Error::Config(
                "api_key_env must not be empty".into(),
            ));
        }

        if self.codex.auth_path.trim().is_empty() {
            return Err(common::Error::Config("auth_path must not be empty".into()));
        }

        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    /// Returns the path and whether it was explicitly requested; an explicit
    /// path that does not exist is an error, the default is optional.
    pub fn resolve_path(cli_path: Option<&str>) -> (PathBuf, bool) {
        if let Some(p) = cli_path {
            return (PathBuf::from(p), true);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return (PathBuf::from(p), true);
        }
        (PathBuf::from("auth-doctor.toml"), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables, preventing
    /// data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn valid_toml() -> &'static str {
        r#"
[codex]
auth_path = "~/.codex/auth.json"
cache_ttl_ms = 60000
strict_permissions = false
"#
    }

    #[test]
    fn test_load_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, valid_toml()).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.codex.auth_path, "~/.codex/auth.json");
        assert_eq!(config.codex.cache_ttl_ms, 60_000);
        assert!(!config.codex.strict_permissions);
        // Unspecified fields keep their defaults
        assert!(config.codex.enabled);
        assert_eq!(config.codex.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.codex.enabled);
        assert!(config.codex.strict_permissions);
        assert_eq!(config.codex.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "not valid {{{{ toml").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[codex]\nbase_url = \"api.openai.com\"\n").unwrap();

        let err = format!("{}", Config::load(&path).unwrap_err());
        assert!(
            err.contains("base_url must start with http"),
            "error message should explain the issue, got: {err}"
        );
    }

    #[test]
    fn test_empty_api_key_env_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[codex]\napi_key_env = \"  \"\n").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_resolve_path_cli_arg() {
        let (path, explicit) = Config::resolve_path(Some("/custom/path.toml"));
        assert_eq!(path, PathBuf::from("/custom/path.toml"));
        assert!(explicit);
    }

    #[test]
    fn test_resolve_path_env_var() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/path.toml") };
        let (path, explicit) = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from("/env/path.toml"));
        assert!(explicit);
        unsafe { remove_env("CONFIG_PATH") };
    }

    #[test]
    fn test_resolve_path_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("CONFIG_PATH") };
        let (path, explicit) = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from("auth-doctor.toml"));
        assert!(!explicit);
    }

    #[test]
    fn test_resolve_path_cli_overrides_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/should-lose.toml") };
        let (path, _) = Config::resolve_path(Some("/cli/wins.toml"));
        assert_eq!(
            path,
            PathBuf::from("/cli/wins.toml"),
            "CLI arg must take precedence over CONFIG_PATH env var"
        );
        unsafe { remove_env("CONFIG_PATH") };
    }
}
