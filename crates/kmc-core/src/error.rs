//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`, so configuration problems surface unchanged at the
//! engine boundary.

use thiserror::Error;

/// Errors raised while validating core configuration values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `kmc-core`.
pub type CoreResult<T> = Result<T, CoreError>;
