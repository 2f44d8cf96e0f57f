//! Errores específicos del core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum CoreEngineError {
    #[error("fingerprint size mismatch: expected {expected} bits, found {found}")]
    FingerprintSizeMismatch { expected: usize, found: usize },
    #[error("internal: {0}")] Internal(String),
}
