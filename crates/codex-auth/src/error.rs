//! Error types for credential resolution

use std::path::PathBuf;

/// Errors from the session-file resolution path.
///
/// Every variant is fatal for one resolution attempt. The orchestrator
/// catches all of them at the `resolve()` boundary and converts them into
/// either the environment fallback or the terminal unhealthy resolution —
/// none of these ever crosses into callers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Auth file grants access bits to group or other under strict mode.
    #[error("auth file {} has overly broad permissions (mode {mode:o})", path.display())]
    Permission { path: PathBuf, mode: u32 },

    /// File exists but carries neither an OAuth token pair nor an API key.
    #[error("auth file {} does not contain usable credentials", path.display())]
    NoUsableCredential { path: PathBuf },

    /// `codex login` exhausted its retry budget without a successful exit.
    #[error("codex login failed for {} after {attempts} attempts", path.display())]
    LoginFailed { path: PathBuf, attempts: u32 },

    /// Login reported success but the auth file still did not appear.
    #[error("codex login succeeded but auth file is still missing at {}", path.display())]
    LoginIncomplete { path: PathBuf },

    /// `codex auth refresh` exited non-zero or timed out.
    #[error("codex auth refresh failed for {}", path.display())]
    RefreshFailed { path: PathBuf },

    /// Refresh reported success but the auth file vanished.
    #[error("codex auth refresh succeeded but auth file is missing at {}", path.display())]
    RefreshIncomplete { path: PathBuf },

    /// Token still rejected after the single refresh-and-revalidate cycle.
    #[error("credentials from {} failed validation", path.display())]
    ValidationFailed { path: PathBuf },

    /// Filesystem error other than "not found" while statting or reading.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for resolution operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_error_formats_mode_as_octal() {
        let err = Error::Permission {
            path: PathBuf::from("/home/u/.codex/auth.json"),
            mode: 0o666,
        };
        let msg = err.to_string();
        assert!(msg.contains("mode 666"), "got: {msg}");
        assert!(msg.contains("/home/u/.codex/auth.json"));
    }

    #[test]
    fn login_failed_names_attempts() {
        let err = Error::LoginFailed {
            path: PathBuf::from("/tmp/auth.json"),
            attempts: 3,
        };
        assert!(err.to_string().contains("after 3 attempts"));
    }
}
