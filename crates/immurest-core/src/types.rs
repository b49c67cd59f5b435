//! Data model shared by the codec, the verifier and the backend clients.

use crate::merkle::{self, Hash32};

/// A decoded safe-set request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl KeyValue {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Root of the backend's append-only log after `tree_size` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Root {
    pub tree_size: u64,
    pub hash: Hash32,
}

impl Root {
    pub fn new(tree_size: u64, hash: Hash32) -> Self {
        Self { tree_size, hash }
    }

    /// Root of the empty log.
    pub fn empty() -> Self {
        Self {
            tree_size: 0,
            hash: merkle::empty_root(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tree_size == 0
    }
}

impl Default for Root {
    fn default() -> Self {
        Self::empty()
    }
}

/// Proof returned by the backend for a single safe-set write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    /// Leaf hash the backend stored for the entry
    pub leaf: Hash32,
    /// Position of the entry in the log
    pub index: u64,
    /// Root after the write
    pub root: Root,
    /// Root the consistency path starts from
    pub prev_root: Root,
    /// Audit path of `leaf` within `root`
    pub inclusion_path: Vec<Hash32>,
    /// Consistency path from `prev_root` to `root`
    pub consistency_path: Vec<Hash32>,
}

/// Backend answer to a safe-set call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeSetResult {
    pub index: u64,
    pub proof: Proof,
}
