//! Shared types for the Codex credential toolkit

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
