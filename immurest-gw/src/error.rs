//! Gateway error types and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use immurest_core::CodecError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::root_cache::RootCacheError;

/// Failure reported by the backend (or by the transport in front of it).
///
/// Displays the backend's message verbatim; `code` decides the HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    pub code: tonic::Code,
    pub message: String,
}

impl BackendError {
    pub fn new(code: tonic::Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.code {
            tonic::Code::InvalidArgument | tonic::Code::OutOfRange => StatusCode::BAD_REQUEST,
            tonic::Code::NotFound => StatusCode::NOT_FOUND,
            tonic::Code::FailedPrecondition => StatusCode::PRECONDITION_FAILED,
            tonic::Code::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            tonic::Code::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            tonic::Code::DataLoss => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<tonic::Status> for BackendError {
    fn from(status: tonic::Status) -> Self {
        Self::new(status.code(), status.message())
    }
}

/// Errors that end a single request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Client sent a body the codec rejected
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Backend could not complete the write
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("unknown endpoint: {method} {path}")]
    UnknownEndpoint { method: String, path: String },
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Codec(_) => StatusCode::BAD_REQUEST,
            Self::Backend(err) => err.status_code(),
            Self::UnknownEndpoint { .. } => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("root cache error: {0}")]
    RootCache(#[from] RootCacheError),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("backend transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// Cached root describes a longer log than the backend holds
    #[error("root cache is ahead of the backend: cached tree_size {cached}, backend tree_size {backend}")]
    CacheAhead { cached: u64, backend: u64 },

    /// Same tree size, different root: the backend's history is not the cached one
    #[error("root cache disagrees with the backend at tree_size {tree_size}")]
    CacheForked { tree_size: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
