//! Core error type.
//!
//! Sub-crates define their own error enums; `rn-network` wraps `CoreError`
//! as one variant of its `LoadError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
