//! Driver-level failure modes that don't belong to any one library crate.
//! Everything downstream of here is folded into `anyhow::Error` at the
//! `main` boundary, the way `faxt`'s command layer stays on typed errors
//! while the binary itself reports through one generic error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("--entry is required for --emit=run")]
    MissingEntry,

    #[error("no function named @{name} in this module")]
    EntryNotFound { name: String },

    #[error("verification failed:\n{0}")]
    VerificationFailed(String),
}
