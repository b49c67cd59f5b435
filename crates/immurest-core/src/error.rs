//! Request decoding errors

use thiserror::Error;

/// Errors raised while turning a raw request body into a [`KeyValue`](crate::KeyValue).
///
/// The display strings are part of the HTTP contract and are returned to
/// clients verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Body is not JSON, or is JSON of the wrong shape
    #[error("incorrect JSON payload")]
    IncorrectPayload,

    /// `key` or `value` is not strict standard base64
    #[error("illegal base64 data at input byte {offset}")]
    InvalidBase64 { offset: usize },

    /// `key` is missing or decodes to zero bytes
    #[error("invalid key")]
    InvalidKey,
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
