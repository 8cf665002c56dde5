//! External codex CLI invocation
//!
//! Login and refresh are performed by the external `codex` binary; this
//! module only collapses its exit behavior into a success/failure signal.
//! Output is captured for diagnostics, exit code 0 is the sole success
//! signal, and every invocation carries a bounded timeout after which the
//! child is killed. Retry policy lives in the resolver, not here.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

/// Default bound on one CLI invocation.
pub const DEFAULT_CLI_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variable overriding the `codex` executable path.
pub const CLI_PATH_ENV: &str = "CODEX_CLI_PATH";

/// Login/refresh transport. Uses `Pin<Box<dyn Future>>` return types for
/// dyn-compatibility (`Arc<dyn CliTransport>`); tests substitute scripted
/// implementations.
pub trait CliTransport: Send + Sync {
    /// Run the login subcommand. `true` iff it exited 0.
    fn login(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;

    /// Run the refresh subcommand. `true` iff it exited 0.
    fn refresh(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Spawns the real codex CLI as a subprocess.
pub struct CodexCli {
    command: String,
    timeout: Duration,
}

impl CodexCli {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    /// Build from an environment snapshot: `CODEX_CLI_PATH` overrides the
    /// executable name, otherwise `codex` is resolved from PATH.
    pub fn from_env(env: &HashMap<String, String>) -> Self {
        let command = env
            .get(CLI_PATH_ENV)
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| "codex".to_string());
        Self::new(command, DEFAULT_CLI_TIMEOUT)
    }

    async fn run(&self, args: &[&str]) -> bool {
        let mut child = match Command::new(&self.command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(command = %self.command, error = %e, "failed to spawn codex CLI");
                return false;
            }
        };

        let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
        let stderr_task = tokio::spawn(read_stream(child.stderr.take()));

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                warn!(command = %self.command, error = %e, "failed to wait for codex CLI");
                return false;
            }
            Err(_) => {
                warn!(
                    command = %self.command,
                    timeout_ms = self.timeout.as_millis() as u64,
                    ?args,
                    "codex CLI timed out, killing"
                );
                let _ = child.kill().await;
                return false;
            }
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();
        if status.success() {
            debug!(command = %self.command, ?args, stdout = %stdout.trim(), "codex CLI completed");
            true
        } else {
            warn!(
                command = %self.command,
                ?args,
                code = status.code(),
                stderr = %stderr.trim(),
                "codex CLI exited with failure"
            );
            false
        }
    }
}

impl CliTransport for CodexCli {
    fn login(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(self.run_owned(vec!["login".into(), "--json".into()]))
    }

    fn refresh(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(self.run_owned(vec!["auth".into(), "refresh".into(), "--json".into()]))
    }
}

impl CodexCli {
    async fn run_owned(&self, args: Vec<String>) -> bool {
        let borrowed: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&borrowed).await
    }
}

async fn read_stream<R: AsyncRead + Unpin>(stream: Option<R>) -> String {
    let Some(mut stream) = stream else {
        return String::new();
    };
    let mut buf = String::new();
    let _ = stream.read_to_string(&mut buf).await;
    buf
}
