//! In-process append-only log.
//!
//! Produces the same RFC 6962 proofs a real backend would, which makes it a
//! drop-in backend for tests and local runs. It can also be served over gRPC
//! through [`ImmuService`], so the tonic client path can be exercised without
//! an external store.

use immurest_core::{merkle, Hash32, KeyValue, Proof, Root, SafeSetResult};
use immurest_grpc::proto::{self, SafeSetRequest, SafeSetResponse};
use immurest_grpc::ImmuService;
use parking_lot::Mutex;
use tonic::{Request, Response, Status};
use tracing::debug;

use super::SafeSetBackend;
use crate::error::BackendError;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    leaves: Mutex<Vec<Hash32>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries written so far.
    pub fn len(&self) -> u64 {
        self.leaves.lock().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Root of the first `tree_size` entries, if the log is that long.
    pub fn root_at(&self, tree_size: u64) -> Option<Root> {
        let leaves = self.leaves.lock();
        let size = usize::try_from(tree_size).ok()?;
        (size <= leaves.len()).then(|| Root::new(tree_size, merkle::root(&leaves[..size])))
    }

    fn append(&self, kv: &KeyValue, known_tree_size: u64) -> Result<SafeSetResult, BackendError> {
        // one lock for append + proof: writes are totally ordered
        let mut leaves = self.leaves.lock();

        // a caller that trusts a longer log than ours is out of sync with us
        let known_size = usize::try_from(known_tree_size)
            .ok()
            .filter(|size| *size <= leaves.len())
            .ok_or_else(|| {
                BackendError::new(
                    tonic::Code::FailedPrecondition,
                    format!(
                        "known tree size {} exceeds log size {}",
                        known_tree_size,
                        leaves.len()
                    ),
                )
            })?;

        let index = leaves.len();
        let leaf = merkle::entry_digest(index as u64, &kv.key, &kv.value);
        leaves.push(leaf);
        let size = leaves.len();

        let inclusion_path = merkle::inclusion_proof(&leaves, index, size).ok_or_else(|| {
            BackendError::new(tonic::Code::Internal, "inclusion proof out of range")
        })?;
        let consistency_path =
            merkle::consistency_proof(&leaves, known_size, size).ok_or_else(|| {
                BackendError::new(tonic::Code::Internal, "consistency proof out of range")
            })?;

        debug!("Appended entry {} (log size {})", index, size);

        Ok(SafeSetResult {
            index: index as u64,
            proof: Proof {
                leaf,
                index: index as u64,
                root: Root::new(size as u64, merkle::root(&leaves)),
                prev_root: Root::new(known_tree_size, merkle::root(&leaves[..known_size])),
                inclusion_path,
                consistency_path,
            },
        })
    }

    fn current(&self) -> Root {
        let leaves = self.leaves.lock();
        Root::new(leaves.len() as u64, merkle::root(&leaves))
    }
}

#[tonic::async_trait]
impl SafeSetBackend for MemoryBackend {
    async fn safe_set(&self, kv: &KeyValue, known: &Root) -> Result<SafeSetResult, BackendError> {
        self.append(kv, known.tree_size)
    }

    async fn current_root(&self) -> Result<Root, BackendError> {
        Ok(self.current())
    }
}

#[tonic::async_trait]
impl ImmuService for MemoryBackend {
    async fn safe_set(
        &self,
        request: Request<SafeSetRequest>,
    ) -> Result<Response<SafeSetResponse>, Status> {
        let req = request.into_inner();
        let kv: KeyValue = req
            .kv
            .ok_or_else(|| Status::invalid_argument("missing kv"))?
            .into();
        if kv.key.is_empty() {
            return Err(Status::invalid_argument("invalid key"));
        }

        let result = self
            .append(&kv, req.known_tree_size)
            .map_err(|e| Status::new(e.code, e.message))?;

        Ok(Response::new(SafeSetResponse::from(&result)))
    }

    async fn current_root(
        &self,
        _request: Request<proto::Empty>,
    ) -> Result<Response<proto::Root>, Status> {
        Ok(Response::new(self.current().into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use immurest_core::{verify, TrustAnchor};

    #[tokio::test]
    async fn proofs_verify_against_the_anchor() {
        let backend = MemoryBackend::new();
        let anchor = TrustAnchor::default();

        for i in 0..6 {
            let kv = KeyValue::new(format!("k{i}"), format!("v{i}"));
            let known = anchor.current();
            let result = SafeSetBackend::safe_set(&backend, &kv, &known).await.unwrap();
            assert_eq!(result.index, i);
            assert!(immurest_core::verify_and_advance(&kv, &result, &known, &anchor));
        }

        assert_eq!(Some(anchor.current()), backend.root_at(6));
        assert_eq!(SafeSetBackend::current_root(&backend).await.unwrap(), anchor.current());
    }

    #[tokio::test]
    async fn stale_known_root_still_gets_a_consistency_path() {
        let backend = MemoryBackend::new();
        let genesis = Root::empty();
        for i in 0..3 {
            let kv = KeyValue::new(format!("k{i}"), "v");
            SafeSetBackend::safe_set(&backend, &kv, &genesis).await.unwrap();
        }

        let known = backend.root_at(1).unwrap();
        let kv = KeyValue::new("late", "v");
        let result = SafeSetBackend::safe_set(&backend, &kv, &known).await.unwrap();
        assert_eq!(result.proof.prev_root, known);
        assert!(verify(&kv, &result, &known));
    }

    #[tokio::test]
    async fn known_size_beyond_log_is_rejected() {
        let backend = MemoryBackend::new();
        let kv = KeyValue::new("k", "v");
        let err = SafeSetBackend::safe_set(&backend, &kv, &Root::new(3, [0; 32]))
            .await
            .unwrap_err();
        assert_eq!(err.code, tonic::Code::FailedPrecondition);
        assert!(backend.is_empty());
    }
}
