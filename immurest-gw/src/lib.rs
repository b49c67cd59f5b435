//! immurest REST gateway
//!
//! Accepts base64 key/value pairs over HTTP, writes them to a tamper-evident
//! backend over gRPC, and answers whether the backend's proof of the write
//! checks out against the locally trusted root.
//!
//! ## Module Structure
//!
//! - `config` - Command-line / environment configuration
//! - `backend` - Backend capability trait, gRPC client, in-memory log
//! - `handlers` - The safe-set pipeline
//! - `server` - axum router and graceful shutdown
//! - `root_cache` - Trust anchor persistence
//! - `error` - Error types and HTTP status mapping
//! - `logging` - tracing subscriber setup

pub mod backend;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod root_cache;
pub mod server;

pub use backend::{GrpcBackend, MemoryBackend, SafeSetBackend};
pub use error::{BackendError, GatewayError, StartupError};
pub use handlers::{SafeSetHandler, SafeSetResponse};
