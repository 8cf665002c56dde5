//! Auth file path resolution
//!
//! Turns the configured path template plus an environment snapshot into one
//! concrete path, deterministically and without touching the filesystem. An
//! explicitly configured (non-default) template always wins; otherwise
//! `CODEX_HOME` relocates the default file. Unexpandable templates are not
//! an error here — they simply yield a path the read step will miss on.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Default location of the codex CLI's auth file.
pub const DEFAULT_AUTH_PATH: &str = "~/.codex/auth.json";

/// File name joined onto `CODEX_HOME` when the default template is in use.
pub const AUTH_FILE_NAME: &str = "auth.json";

static ENV_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\w+)|\$\{([^}]+)\}").expect("env segment pattern is valid"));

/// Resolve the configured auth path template against an environment snapshot.
///
/// Expansion order: `$NAME`/`${NAME}` substitution (unresolved names become
/// empty), then leading `~` via `HOME` or `USERPROFILE`.
pub fn resolve_auth_path(configured: &str, env: &HashMap<String, String>) -> PathBuf {
    let preferred = configured.trim();
    let preferred = if preferred.is_empty() {
        DEFAULT_AUTH_PATH
    } else {
        preferred
    };

    let base = if preferred != DEFAULT_AUTH_PATH {
        preferred.to_string()
    } else if let Some(codex_home) = env.get("CODEX_HOME").filter(|v| !v.is_empty()) {
        Path::new(codex_home)
            .join(AUTH_FILE_NAME)
            .to_string_lossy()
            .into_owned()
    } else {
        DEFAULT_AUTH_PATH.to_string()
    };

    let expanded = expand_env_segments(&base, env);
    expand_home_prefix(&expanded, env)
}

fn expand_env_segments(input: &str, env: &HashMap<String, String>) -> String {
    ENV_SEGMENT
        .replace_all(input, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            env.get(name).cloned().unwrap_or_default()
        })
        .into_owned()
}

fn expand_home_prefix(input: &str, env: &HashMap<String, String>) -> PathBuf {
    if !input.starts_with('~') {
        return PathBuf::from(input);
    }
    let home = env
        .get("HOME")
        .or_else(|| env.get("USERPROFILE"))
        .filter(|v| !v.is_empty());
    let Some(home) = home else {
        return PathBuf::from(input);
    };
    if input == "~" {
        return PathBuf::from(home);
    }
    let rest = input
        .strip_prefix("~/")
        .or_else(|| input.strip_prefix('~'))
        .unwrap_or(input);
    Path::new(home).join(rest)
}
