//! Codex credential doctor
//!
//! Single-binary diagnostic that:
//! 1. Loads configuration (optional TOML file)
//! 2. Resolves an OpenAI credential exactly the way the runtime does,
//!    including login bootstrap and staleness refresh
//! 3. Prints a JSON report to stdout — never the credential itself
//! 4. Exits 0 (healthy), 10 (degraded) or 1 (unhealthy)
//!
//! The non-zero-but-working degraded code lets orchestrators distinguish
//! "usable but worth attention" from a hard failure.

mod config;

use anyhow::{Context, Result};
use codex_auth::{CredentialResolution, CredentialResolver, CredentialState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

const EXIT_HEALTHY: i32 = 0;
const EXIT_UNHEALTHY: i32 = 1;
const EXIT_DEGRADED: i32 = 10;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support.
    // Diagnostics go to stderr so stdout stays machine-parsable.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    info!("starting auth-doctor");

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let (config_path, explicit) = Config::resolve_path(cli_config_path);
    let config = if explicit || config_path.exists() {
        info!(path = %config_path.display(), "loading configuration");
        Config::load(&config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?
    } else {
        info!("no config file found, using defaults");
        Config::default()
    };

    info!(
        auth_path = %config.codex.auth_path,
        enabled = config.codex.enabled,
        strict_permissions = config.codex.strict_permissions,
        "configuration loaded"
    );

    let resolver = CredentialResolver::new(config.codex);
    let resolution = resolver.resolve().await;

    match resolution.state {
        CredentialState::Healthy => info!(detail = %resolution.detail, "credential healthy"),
        CredentialState::Degraded => warn!(detail = %resolution.detail, "credential degraded"),
        CredentialState::Unhealthy => warn!(detail = %resolution.detail, "no usable credential"),
    }

    println!("{}", serde_json::to_string_pretty(&report(&resolution))?);
    std::process::exit(exit_code(resolution.state));
}

/// The stdout payload. Carries everything an operator needs to act on and
/// deliberately omits the credential material.
fn report(resolution: &CredentialResolution) -> serde_json::Value {
    serde_json::json!({
        "status": resolution.state.label(),
        "source": resolution.source.label(),
        "detail": resolution.detail,
        "metadata": {
            "path": resolution.metadata.path.as_ref().map(|p| p.display().to_string()),
            "last_refresh": resolution.metadata.last_refresh,
            "fallback_reason": resolution.metadata.fallback_reason,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        },
    })
}

fn exit_code(state: CredentialState) -> i32 {
    match state {
        CredentialState::Healthy => EXIT_HEALTHY,
        CredentialState::Degraded => EXIT_DEGRADED,
        CredentialState::Unhealthy => EXIT_UNHEALTHY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codex_auth::{CredentialSource, ResolutionMetadata};
    use common::Secret;
    use std::path::PathBuf;

    fn healthy_resolution() -> CredentialResolution {
        CredentialResolution {
            state: CredentialState::Healthy,
            source: CredentialSource::CodexOauth,
            detail: "codex auth file (/home/u/.codex/auth.json) access token ready".into(),
            api_key: Some(Secret::new("sk-super-secret".to_string())),
            metadata: ResolutionMetadata {
                path: Some(PathBuf::from("/home/u/.codex/auth.json")),
                last_refresh: Some("2026-08-01T00:00:00Z".into()),
                fallback_reason: None,
            },
        }
    }

    #[test]
    fn exit_codes_map_to_states() {
        assert_eq!(exit_code(CredentialState::Healthy), 0);
        assert_eq!(exit_code(CredentialState::Degraded), 10);
        assert_eq!(exit_code(CredentialState::Unhealthy), 1);
    }

    #[test]
    fn report_never_contains_the_credential() {
        let rendered = report(&healthy_resolution()).to_string();
        assert!(
            !rendered.contains("sk-super-secret"),
            "report leaked the API key: {rendered}"
        );
    }

    #[test]
    fn report_carries_state_source_and_metadata() {
        let payload = report(&healthy_resolution());
        assert_eq!(payload["status"], "healthy");
        assert_eq!(payload["source"], "codex_oauth");
        assert_eq!(payload["metadata"]["path"], "/home/u/.codex/auth.json");
        assert_eq!(payload["metadata"]["last_refresh"], "2026-08-01T00:00:00Z");
        assert!(payload["metadata"]["fallback_reason"].is_null());
        assert!(payload["metadata"]["timestamp"].is_string());
    }

    #[test]
    fn report_surfaces_fallback_reason_when_degraded() {
        let resolution = CredentialResolution {
            state: CredentialState::Degraded,
            source: CredentialSource::CodexApiKey,
            detail: "codex auth file provided API key fallback (/tmp/auth.json)".into(),
            api_key: Some(Secret::new("sk-file".to_string())),
            metadata: ResolutionMetadata {
                path: Some(PathBuf::from("/tmp/auth.json")),
                last_refresh: None,
                fallback_reason: Some("auth file contains API key".into()),
            },
        };
        let payload = report(&resolution);
        assert_eq!(payload["status"], "degraded");
        assert_eq!(
            payload["metadata"]["fallback_reason"],
            "auth file contains API key"
        );
    }
}
