//! Codex credential resolution library
//!
//! Resolves, validates, caches, and repairs the API credentials needed to
//! call OpenAI, reusing the auth file written by the external `codex` CLI.
//! This crate is a standalone library with no dependency on any binary — it
//! can be tested and used independently.
//!
//! Resolution flow:
//! 1. An explicit environment API key short-circuits everything else
//! 2. `paths::resolve_auth_path()` locates the CLI's auth file
//! 3. `store::AuthFileStore` stats and reads it (strict permission check)
//! 4. `cache::CredentialCache` serves a recent result while the TTL holds
//!    and the file has not been rewritten out-of-band
//! 5. `validator::TokenValidator` inspects the token (rate-limited)
//! 6. `cli::CliTransport` invokes `codex login` / `codex auth refresh` to
//!    materialize or repair a stale session
//!
//! The orchestrator (`resolver::CredentialResolver`) serializes the whole
//! sequence so concurrent callers share one login/refresh in flight.

pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod credential;
pub mod error;
pub mod paths;
pub mod resolver;
pub mod store;
pub mod validator;

pub use cli::{CliTransport, CodexCli};
pub use clock::{Clock, SystemClock};
pub use config::AuthConfig;
pub use credential::{
    AuthKind, CredentialResolution, CredentialSource, CredentialState, ResolvedCredential,
    ResolutionMetadata,
};
pub use error::{Error, Result};
pub use resolver::CredentialResolver;
pub use validator::{JwtExpiryValidator, TokenValidator};
