//! Backend capability consumed by the safe-set handler.
//!
//! The handler only ever needs two calls from the tamper-evident store, so
//! they are the whole trait. Production uses [`GrpcBackend`]; tests and
//! `--backend memory` use [`MemoryBackend`].

mod grpc;
mod memory;

pub use grpc::GrpcBackend;
pub use memory::MemoryBackend;

use immurest_core::{KeyValue, Root, SafeSetResult};

use crate::error::BackendError;

#[tonic::async_trait]
pub trait SafeSetBackend: Send + Sync {
    /// Append `kv` and prove it, with consistency from the log prefix of
    /// `known.tree_size` entries. One attempt, no retries.
    async fn safe_set(&self, kv: &KeyValue, known: &Root) -> Result<SafeSetResult, BackendError>;

    /// Current root of the log. Only used to seed the trust anchor.
    async fn current_root(&self) -> Result<Root, BackendError>;
}
