//! Gateway configuration
//!
//! Command-line flags with environment fallbacks, validated into a
//! [`GatewayConfig`] before anything is started.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Literal `--backend` value selecting the in-process log.
pub const MEMORY_BACKEND: &str = "memory";

#[derive(Parser, Debug, Clone)]
#[command(name = "immurest-gw")]
#[command(about = "REST gateway for verifiable safe-set writes")]
#[command(version)]
pub struct Args {
    /// HTTP listen address
    #[arg(long, env = "IMMUREST_LISTEN", default_value = "127.0.0.1:3323")]
    pub listen: String,

    /// Backend gRPC endpoint, or `memory` for an in-process log
    #[arg(long, env = "IMMUREST_BACKEND", default_value = "http://127.0.0.1:3322")]
    pub backend: String,

    /// File holding the last verified root across restarts
    #[arg(long, env = "IMMUREST_ROOT_CACHE")]
    pub root_cache: Option<PathBuf>,

    /// Backend connect and request timeout in milliseconds
    #[arg(long, env = "IMMUREST_TIMEOUT_MS", default_value = "5000")]
    pub timeout_ms: u64,

    /// Log level (debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Where safe-set writes are forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendTarget {
    Grpc(String),
    Memory,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub listen: SocketAddr,
    pub backend: BackendTarget,
    pub root_cache: Option<PathBuf>,
    pub timeout: Duration,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to parse listen address '{0}'")]
    Listen(String),

    #[error("backend endpoint '{0}' must be an http:// or https:// URL, or 'memory'")]
    Backend(String),

    #[error("timeout must be greater than zero")]
    Timeout,

    #[error("--root-cache cannot be used with the in-memory backend, which starts empty on every launch")]
    MemoryRootCache,
}

impl GatewayConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let listen = args
            .listen
            .parse()
            .map_err(|_| ConfigError::Listen(args.listen.clone()))?;

        let backend = match args.backend.as_str() {
            MEMORY_BACKEND => BackendTarget::Memory,
            url if url.starts_with("http://") || url.starts_with("https://") => {
                BackendTarget::Grpc(url.to_string())
            }
            other => return Err(ConfigError::Backend(other.to_string())),
        };

        if backend == BackendTarget::Memory && args.root_cache.is_some() {
            return Err(ConfigError::MemoryRootCache);
        }

        if args.timeout_ms == 0 {
            return Err(ConfigError::Timeout);
        }

        Ok(Self {
            listen,
            backend,
            root_cache: args.root_cache.clone(),
            timeout: Duration::from_millis(args.timeout_ms),
        })
    }
}
