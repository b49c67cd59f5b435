//! On-disk copy of the trust anchor.
//!
//! Stored as `{"tree_size": N, "hash": "<hex>"}`. Writes go to a sibling
//! temp file first and are renamed into place, so a crash never leaves a
//! half-written root behind.

use immurest_core::Root;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RootCacheError {
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed root cache {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },
}

#[derive(Serialize, Deserialize)]
struct StoredRoot {
    tree_size: u64,
    hash: String,
}

/// Persistent root cache at a fixed path.
#[derive(Debug, Clone)]
pub struct RootCache {
    path: PathBuf,
}

impl RootCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the cached root. `Ok(None)` when nothing has been cached yet.
    pub fn load(&self) -> Result<Option<Root>, RootCacheError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(RootCacheError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let stored: StoredRoot =
            serde_json::from_slice(&bytes).map_err(|e| self.malformed(e.to_string()))?;
        let hash = hex::decode(&stored.hash).map_err(|e| self.malformed(e.to_string()))?;
        let hash: [u8; 32] = hash
            .try_into()
            .map_err(|h: Vec<u8>| self.malformed(format!("hash is {} bytes", h.len())))?;

        Ok(Some(Root::new(stored.tree_size, hash)))
    }

    /// Atomically replace the cached root.
    pub fn save(&self, root: &Root) -> Result<(), RootCacheError> {
        let stored = StoredRoot {
            tree_size: root.tree_size,
            hash: hex::encode(root.hash),
        };
        let json = serde_json::to_vec_pretty(&stored).map_err(|e| self.malformed(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)
            .and_then(|()| fs::rename(&tmp, &self.path))
            .map_err(|source| RootCacheError::Io {
                path: self.path.clone(),
                source,
            })
    }

    fn malformed(&self, reason: String) -> RootCacheError {
        RootCacheError::Malformed {
            path: self.path.clone(),
            reason,
        }
    }
}
