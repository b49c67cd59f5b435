//! Safe-set proof verification.
//!
//! A backend answers a safe-set with the entry's position, the log root after
//! the write, and two RFC 6962 paths: one placing the entry under the new
//! root, one proving the new root extends the root the gateway already
//! trusts. Only when both hold, and the trusted root is the one the backend
//! claims to have extended, is the write reported as verified.

use crate::anchor::TrustAnchor;
use crate::merkle;
use crate::types::{KeyValue, Root, SafeSetResult};

/// Check `result` for `entry` against the trusted root `prev`.
///
/// Pure: never touches the anchor.
pub fn verify(entry: &KeyValue, result: &SafeSetResult, prev: &Root) -> bool {
    let proof = &result.proof;

    if result.index != proof.index {
        return false;
    }

    // backend must have extended exactly the root we trust
    if proof.prev_root != *prev {
        return false;
    }

    // the entry is new: it lies after the trusted prefix and inside the new tree
    if proof.index < prev.tree_size || proof.index >= proof.root.tree_size {
        return false;
    }

    if proof.leaf != merkle::entry_digest(proof.index, &entry.key, &entry.value) {
        return false;
    }

    if !merkle::verify_inclusion(
        &proof.leaf,
        proof.index,
        proof.root.tree_size,
        &proof.inclusion_path,
        &proof.root.hash,
    ) {
        return false;
    }

    merkle::verify_consistency(
        prev.tree_size,
        proof.root.tree_size,
        &prev.hash,
        &proof.root.hash,
        &proof.consistency_path,
    )
}

/// Verify against `prev` and, on success, advance `anchor` from `prev` to the
/// proof's root.
///
/// A proof that checks out but loses the compare-and-swap (another request
/// advanced the anchor in between) is reported as not verified and leaves the
/// anchor untouched.
pub fn verify_and_advance(
    entry: &KeyValue,
    result: &SafeSetResult,
    prev: &Root,
    anchor: &TrustAnchor,
) -> bool {
    verify_and_advance_with(entry, result, prev, anchor, |_| {})
}

/// [`verify_and_advance`] with a hook run under the anchor lock on commit.
pub fn verify_and_advance_with<F>(
    entry: &KeyValue,
    result: &SafeSetResult,
    prev: &Root,
    anchor: &TrustAnchor,
    on_commit: F,
) -> bool
where
    F: FnOnce(&Root),
{
    verify(entry, result, prev) && anchor.advance_with(prev, result.proof.root, on_commit)
}
