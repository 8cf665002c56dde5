//! Auth file access
//!
//! Reads the JSON file the codex CLI owns. The CLI is the only writer; this
//! side only stats and parses. "Not found" is a normal state (`None`), never
//! an error, and malformed JSON is downgraded to `None` with a warning so a
//! half-written file behaves like a missing one. Strict mode rejects files
//! whose mode grants any access to group or other.

use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};

/// OAuth token fields inside the auth file.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenBundle {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
}

/// Parsed contents of the auth file at a point in time.
///
/// Re-created on every read, never mutated in place. All fields are optional
/// because the CLI writes different shapes depending on how the user logged
/// in (browser OAuth vs. plain API key).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthRecord {
    #[serde(rename = "OPENAI_API_KEY")]
    pub api_key: Option<String>,
    pub tokens: Option<TokenBundle>,
    /// RFC 3339 timestamp of the CLI's last token refresh.
    pub last_refresh: Option<String>,
}

/// File metadata needed for cache invalidation and the permission check.
#[derive(Debug, Clone, Copy)]
pub struct FileStat {
    pub mtime_millis: u64,
    pub mode: u32,
}

/// Stat/read access to the auth file.
#[derive(Debug, Default)]
pub struct AuthFileStore;

impl AuthFileStore {
    /// Stat the auth file. `Ok(None)` when it does not exist; any other
    /// filesystem error propagates.
    pub async fn stat(&self, path: &Path) -> Result<Option<FileStat>> {
        let meta = match tokio::fs::metadata(path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mtime_millis = meta
            .modified()
            .map_err(Error::from)?
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            meta.permissions().mode()
        };
        #[cfg(not(unix))]
        let mode = 0;
        Ok(Some(FileStat { mtime_millis, mode }))
    }

    /// Read and parse the auth file. `Ok(None)` when the file is absent or
    /// its contents are not valid JSON.
    pub async fn read(&self, path: &Path) -> Result<Option<AuthRecord>> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<AuthRecord>(&contents) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "auth file is not valid JSON, treating as absent");
                Ok(None)
            }
        }
    }
}

/// Enforce the strict permission invariant: no access bits for group or
/// other. A no-op on platforms where the mode field is meaningless.
pub fn ensure_secure_permissions(path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        const GROUP_OTHER_MASK: u32 = 0o077;
        if mode & GROUP_OTHER_MASK != 0 {
            return Err(Error::Permission {
                path: path.to_path_buf(),
                mode: mode & 0o777,
            });
        }
    }
    #[cfg(not(unix))]
    {
        let _ = (path, mode);
    }
    Ok(())
}
