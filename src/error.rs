//! Error types for the Chronicle buffers.

use crate::types::ScalarKind;

/// Everything that can go wrong while driving a shared buffer.
///
/// Routine "nothing to do" outcomes (empty slots, unchanged indices) are not
/// errors and are reported through `bool`/`Option` returns instead.
#[derive(Debug, thiserror::Error)]
pub enum ChronicleError {
    #[error("invalid sample request: from = {from}, length = {length}, buffer size = {size}")]
    InvalidSampleRequest { from: isize, length: isize, size: usize },

    #[error("scalar kind mismatch: expected {expected:?}, got {actual:?}")]
    KindMismatch { expected: ScalarKind, actual: ScalarKind },

    #[error("index {index} is out of bounds, should be in [0, {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    #[error("invalid length: {0}")]
    InvalidLength(String),

    #[error("invalid name: {0:?}")]
    InvalidName(String),

    #[error("namespace {namespace} is not under {root}")]
    NamespaceMismatch { namespace: String, root: String },

    #[error("variable {0} already exists with a different kind")]
    VariableConflict(String),

    #[error("enum ordinal {ordinal:?} is invalid for {name} ({constants} constants)")]
    InvalidEnumOrdinal { name: String, ordinal: Option<u8>, constants: usize },

    #[error("enum {name} declares {count} constants, at most {max} are supported")]
    TooManyEnumConstants { name: String, count: usize, max: usize },

    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    #[error("shared buffer has been disposed")]
    Disposed,

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChronicleError>;
