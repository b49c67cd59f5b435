//! Safe-set request pipeline.
//!
//! `Received → Decoded → Forwarded → Verified → Responded`. Decoding and
//! forwarding can fail the request; verification cannot, it only decides the
//! `verified` flag. Nothing is written to the client until the outcome of the
//! whole pipeline is known.

use immurest_core::{codec, proof, Root, TrustAnchor};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::backend::SafeSetBackend;
use crate::error::{GatewayError, StartupError};
use crate::root_cache::RootCache;

/// Successful safe-set answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SafeSetResponse {
    pub verified: bool,
}

/// Current trust anchor as exposed over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootResponse {
    pub tree_size: u64,
    pub hash: String,
}

impl From<Root> for RootResponse {
    fn from(root: Root) -> Self {
        Self {
            tree_size: root.tree_size,
            hash: hex::encode(root.hash),
        }
    }
}

/// Shared safe-set handler: backend, trust anchor, optional root cache.
pub struct SafeSetHandler {
    backend: Arc<dyn SafeSetBackend>,
    anchor: Arc<TrustAnchor>,
    root_cache: Option<RootCache>,
}

impl SafeSetHandler {
    pub fn new(backend: Arc<dyn SafeSetBackend>, anchor: Arc<TrustAnchor>) -> Self {
        Self {
            backend,
            anchor,
            root_cache: None,
        }
    }

    pub fn with_root_cache(mut self, cache: RootCache) -> Self {
        self.root_cache = Some(cache);
        self
    }

    /// Build a handler whose anchor comes from `cache` when it holds a root,
    /// otherwise from the backend's current root (which is then cached).
    ///
    /// A cached root is only kept if the backend can still extend it: a
    /// backend whose log is shorter than the cached one, or which has a
    /// different root at the same size, fails startup instead of rejecting
    /// every write afterwards.
    pub async fn bootstrap(
        backend: Arc<dyn SafeSetBackend>,
        cache: Option<RootCache>,
    ) -> Result<Self, StartupError> {
        let cached = match &cache {
            Some(cache) => cache.load()?,
            None => None,
        };
        let current = backend.current_root().await?;

        let root = match cached {
            Some(root) => {
                if current.tree_size < root.tree_size {
                    return Err(StartupError::CacheAhead {
                        cached: root.tree_size,
                        backend: current.tree_size,
                    });
                }
                if current.tree_size == root.tree_size && current.hash != root.hash {
                    return Err(StartupError::CacheForked {
                        tree_size: root.tree_size,
                    });
                }
                info!(
                    "Trust anchor loaded from cache: tree_size={} (backend at {})",
                    root.tree_size, current.tree_size
                );
                root
            }
            None => {
                info!("Trust anchor seeded from backend: tree_size={}", current.tree_size);
                if let Some(cache) = &cache {
                    cache.save(&current)?;
                }
                current
            }
        };

        let handler = Self::new(backend, Arc::new(TrustAnchor::new(root)));
        Ok(match cache {
            Some(cache) => handler.with_root_cache(cache),
            None => handler,
        })
    }

    pub fn anchor(&self) -> &Arc<TrustAnchor> {
        &self.anchor
    }

    /// Run one safe-set request from raw body to response.
    pub async fn safe_set(&self, body: &[u8]) -> Result<SafeSetResponse, GatewayError> {
        let kv = codec::decode(body).map_err(|e| {
            debug!("Rejected safe-set body: {}", e);
            e
        })?;
        debug!("Decoded safe-set: key_len={} value_len={}", kv.key.len(), kv.value.len());

        let known = self.anchor.current();
        let result = self.backend.safe_set(&kv, &known).await.map_err(|e| {
            warn!("Backend safe-set failed ({:?}): {}", e.code, e.message);
            e
        })?;
        debug!(
            "Forwarded safe-set: index={} new_tree_size={}",
            result.index, result.proof.root.tree_size
        );

        let verified = proof::verify_and_advance_with(&kv, &result, &known, &self.anchor, |root| {
            self.persist(root)
        });

        if verified {
            debug!("Verified safe-set: index={}", result.index);
        } else {
            warn!(
                "Safe-set NOT verified: index={} trusted_tree_size={} claimed_prev_tree_size={} claimed_tree_size={}",
                result.index,
                known.tree_size,
                result.proof.prev_root.tree_size,
                result.proof.root.tree_size
            );
        }

        Ok(SafeSetResponse { verified })
    }

    pub fn current_root(&self) -> RootResponse {
        self.anchor.current().into()
    }

    // runs under the anchor lock
    fn persist(&self, root: &Root) {
        if let Some(cache) = &self.root_cache {
            if let Err(e) = cache.save(root) {
                warn!("Failed to persist trust anchor: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use axum::http::StatusCode;

    const BODY: &[u8] = br#"{"kv": {"key": "a2V5", "value": "dmFsdWU="}}"#;

    #[test]
    fn root_response_is_hex() {
        let response = RootResponse::from(Root::new(3, [0xab; 32]));
        assert_eq!(response.tree_size, 3);
        assert_eq!(response.hash, "ab".repeat(32));
    }

    #[tokio::test]
    async fn verified_write_advances_anchor() {
        let backend = Arc::new(MemoryBackend::new());
        let handler = SafeSetHandler::new(backend.clone(), Arc::new(TrustAnchor::default()));

        let response = handler.safe_set(BODY).await.unwrap();
        assert!(response.verified);
        assert_eq!(Some(handler.anchor().current()), backend.root_at(1));
        assert_eq!(handler.anchor().commits(), 1);
    }

    #[tokio::test]
    async fn anchor_ahead_of_backend_is_a_precondition_failure() {
        let backend = Arc::new(MemoryBackend::new());
        let anchor = Arc::new(TrustAnchor::new(Root::new(2, [7; 32])));
        let handler = SafeSetHandler::new(backend.clone(), anchor);

        let err = handler.safe_set(BODY).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::PRECONDITION_FAILED);
        assert_eq!(err.to_string(), "known tree size 2 exceeds log size 0");
        assert!(backend.is_empty());
        assert_eq!(handler.anchor().commits(), 0);
    }
}
