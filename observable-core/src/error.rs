//! Error types.
//!
//! Only a handful of operations can fail at runtime: checked element access
//! (`at`), borrowing a place whose projection no longer resolves, opening a
//! second transaction on the same class, and the archive helpers. Everything
//! else either cannot fail or is rejected at compile time by the trait
//! bounds (an unknown member tag, a field/adapter type mismatch).

use thiserror::Error;

/// Errors returned by observable operations.
#[derive(Debug, Error)]
pub enum ObservableError {
    /// Positional access past the end of a sequence.
    #[error("index {index} out of range for length {len}")]
    OutOfRange {
        /// The requested position.
        index: usize,
        /// The container length at the time of the access.
        len: usize,
    },

    /// Keyed access to a key that is not present.
    #[error("key not found")]
    KeyNotFound,

    /// The place no longer resolves: its element was erased or the enum
    /// alternative it projects into is not active any more.
    #[error("observable is detached from its model")]
    Detached,

    /// A transaction is already open on this class.
    #[error("a transaction is already active on this observable")]
    TransactionActive,

    /// JSON archive failure.
    #[error("json archive error: {0}")]
    Json(#[from] serde_json::Error),

    /// MessagePack encoding failure.
    #[error("msgpack encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// MessagePack decoding failure.
    #[error("msgpack decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ObservableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_names_index_and_len() {
        let err = ObservableError::OutOfRange { index: 7, len: 3 };
        assert_eq!(err.to_string(), "index 7 out of range for length 3");
    }

    #[test]
    fn json_errors_convert() {
        let parse: std::result::Result<i32, _> = serde_json::from_str("not json");
        let err: ObservableError = parse.unwrap_err().into();
        assert!(matches!(err, ObservableError::Json(_)));
    }
}
