//! Proto ⇄ core conversions
//!
//! Core → proto is infallible. Proto → core validates what protobuf cannot:
//! required messages are present and every hash is exactly 32 bytes.

use immurest_core::{Hash32, KeyValue, Proof, Root, SafeSetResult};
use thiserror::Error;

use crate::proto;

/// A backend message that does not fit the core model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("{field}: expected 32-byte hash, got {len} bytes")]
    BadHashLength { field: &'static str, len: usize },
}

fn hash32(field: &'static str, bytes: &[u8]) -> Result<Hash32, ConvertError> {
    bytes.try_into().map_err(|_| ConvertError::BadHashLength {
        field,
        len: bytes.len(),
    })
}

fn hash_path(field: &'static str, path: &[Vec<u8>]) -> Result<Vec<Hash32>, ConvertError> {
    path.iter().map(|h| hash32(field, h)).collect()
}

impl From<&KeyValue> for proto::KeyValue {
    fn from(kv: &KeyValue) -> Self {
        Self {
            key: kv.key.clone(),
            value: kv.value.clone(),
        }
    }
}

impl From<proto::KeyValue> for KeyValue {
    fn from(kv: proto::KeyValue) -> Self {
        Self {
            key: kv.key,
            value: kv.value,
        }
    }
}

impl From<Root> for proto::Root {
    fn from(root: Root) -> Self {
        Self {
            tree_size: root.tree_size,
            hash: root.hash.to_vec(),
        }
    }
}

impl TryFrom<proto::Root> for Root {
    type Error = ConvertError;

    fn try_from(root: proto::Root) -> Result<Self, Self::Error> {
        Ok(Root::new(root.tree_size, hash32("root.hash", &root.hash)?))
    }
}

impl From<&SafeSetResult> for proto::SafeSetResponse {
    fn from(result: &SafeSetResult) -> Self {
        let proof = &result.proof;
        Self {
            index: result.index,
            proof: Some(proto::Proof {
                leaf: proof.leaf.to_vec(),
                index: proof.index,
                root: Some(proof.root.into()),
                prev_root: Some(proof.prev_root.into()),
                inclusion_path: proof.inclusion_path.iter().map(|h| h.to_vec()).collect(),
                consistency_path: proof.consistency_path.iter().map(|h| h.to_vec()).collect(),
            }),
        }
    }
}

impl TryFrom<proto::SafeSetResponse> for SafeSetResult {
    type Error = ConvertError;

    fn try_from(resp: proto::SafeSetResponse) -> Result<Self, Self::Error> {
        let proof = resp.proof.ok_or(ConvertError::MissingField("proof"))?;
        let root = proof.root.ok_or(ConvertError::MissingField("proof.root"))?;
        let prev_root = proof
            .prev_root
            .ok_or(ConvertError::MissingField("proof.prev_root"))?;

        Ok(SafeSetResult {
            index: resp.index,
            proof: Proof {
                leaf: hash32("proof.leaf", &proof.leaf)?,
                index: proof.index,
                root: root.try_into()?,
                prev_root: prev_root.try_into()?,
                inclusion_path: hash_path("proof.inclusion_path", &proof.inclusion_path)?,
                consistency_path: hash_path("proof.consistency_path", &proof.consistency_path)?,
            },
        })
    }
}
