//! RFC 6962 Merkle hashing for the backend's append-only log.
//!
//! Leaves and interior nodes are domain separated (`0x00` / `0x01`), and a
//! tree of `n > 1` leaves splits at the largest power of two below `n`.
//! Proof generation lives next to verification so the in-memory backend and
//! the tests share one definition of the tree.

use sha2::{Digest, Sha256};

pub type Hash32 = [u8; 32];

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// Root hash of the empty tree.
pub fn empty_root() -> Hash32 {
    Sha256::digest(b"").into()
}

/// Leaf hash of a log entry: `H(0x00 || index || len(key) || key || value)`.
pub fn entry_digest(index: u64, key: &[u8], value: &[u8]) -> Hash32 {
    let mut h = Sha256::new();
    h.update([LEAF_PREFIX]);
    h.update(index.to_be_bytes());
    h.update((key.len() as u64).to_be_bytes());
    h.update(key);
    h.update(value);
    h.finalize().into()
}

/// Interior node hash: `H(0x01 || left || right)`.
pub fn node_hash(left: &Hash32, right: &Hash32) -> Hash32 {
    let mut h = Sha256::new();
    h.update([NODE_PREFIX]);
    h.update(left);
    h.update(right);
    h.finalize().into()
}

fn split_point(n: usize) -> usize {
    debug_assert!(n > 1);
    1usize << (usize::BITS - 1 - (n - 1).leading_zeros())
}

/// Merkle tree hash over already-hashed leaves.
pub fn root(leaves: &[Hash32]) -> Hash32 {
    match leaves.len() {
        0 => empty_root(),
        1 => leaves[0],
        n => {
            let k = split_point(n);
            node_hash(&root(&leaves[..k]), &root(&leaves[k..]))
        }
    }
}

/// Audit path for `index` in the tree formed by the first `tree_size` leaves.
///
/// Returns `None` when `index` is outside the tree.
pub fn inclusion_proof(leaves: &[Hash32], index: usize, tree_size: usize) -> Option<Vec<Hash32>> {
    if tree_size == 0 || tree_size > leaves.len() || index >= tree_size {
        return None;
    }
    Some(inclusion_path(&leaves[..tree_size], index))
}

fn inclusion_path(leaves: &[Hash32], index: usize) -> Vec<Hash32> {
    if leaves.len() <= 1 {
        return Vec::new();
    }
    let k = split_point(leaves.len());
    if index < k {
        let mut path = inclusion_path(&leaves[..k], index);
        path.push(root(&leaves[k..]));
        path
    } else {
        let mut path = inclusion_path(&leaves[k..], index - k);
        path.push(root(&leaves[..k]));
        path
    }
}

/// Consistency path from the tree of `old_size` leaves to that of `new_size`.
///
/// Returns `None` when the sizes are out of range.
pub fn consistency_proof(
    leaves: &[Hash32],
    old_size: usize,
    new_size: usize,
) -> Option<Vec<Hash32>> {
    if old_size > new_size || new_size > leaves.len() {
        return None;
    }
    if old_size == 0 || old_size == new_size {
        return Some(Vec::new());
    }
    Some(consistency_path(&leaves[..new_size], old_size, true))
}

fn consistency_path(leaves: &[Hash32], old_size: usize, complete: bool) -> Vec<Hash32> {
    let n = leaves.len();
    if old_size == n {
        return if complete { Vec::new() } else { vec![root(leaves)] };
    }
    let k = split_point(n);
    if old_size <= k {
        let mut path = consistency_path(&leaves[..k], old_size, complete);
        path.push(root(&leaves[k..]));
        path
    } else {
        let mut path = consistency_path(&leaves[k..], old_size - k, false);
        path.push(root(&leaves[..k]));
        path
    }
}

/// Check that `leaf` sits at `index` in the tree of `tree_size` leaves with
/// root `expected`.
pub fn verify_inclusion(
    leaf: &Hash32,
    index: u64,
    tree_size: u64,
    path: &[Hash32],
    expected: &Hash32,
) -> bool {
    if tree_size == 0 || index >= tree_size {
        return false;
    }

    let mut fn_idx = index;
    let mut sn_idx = tree_size - 1;
    let mut siblings = path.iter();
    let mut hash = *leaf;

    while sn_idx > 0 {
        if fn_idx % 2 == 1 {
            let Some(sibling) = siblings.next() else {
                return false;
            };
            hash = node_hash(sibling, &hash);
        } else if fn_idx < sn_idx {
            let Some(sibling) = siblings.next() else {
                return false;
            };
            hash = node_hash(&hash, sibling);
        }
        fn_idx /= 2;
        sn_idx /= 2;
    }

    siblings.next().is_none() && &hash == expected
}

/// Check that the tree with root `old_root` over `old_size` leaves is a
/// prefix of the tree with root `new_root` over `new_size` leaves.
pub fn verify_consistency(
    old_size: u64,
    new_size: u64,
    old_root: &Hash32,
    new_root: &Hash32,
    path: &[Hash32],
) -> bool {
    if old_size > new_size {
        return false;
    }
    if old_size == 0 {
        return path.is_empty() && *old_root == empty_root();
    }
    if old_size == new_size {
        return path.is_empty() && old_root == new_root;
    }

    let mut fn_idx = old_size - 1;
    let mut sn_idx = new_size - 1;
    while fn_idx & 1 == 1 {
        fn_idx >>= 1;
        sn_idx >>= 1;
    }

    let mut nodes = path.iter();
    // a power-of-two old tree is a complete subtree: its root is not in the path
    let seed = if fn_idx == 0 {
        *old_root
    } else {
        let Some(first) = nodes.next() else {
            return false;
        };
        *first
    };
    let (mut fr, mut sr) = (seed, seed);

    for p in nodes {
        if sn_idx == 0 {
            return false;
        }
        if fn_idx & 1 == 1 || fn_idx == sn_idx {
            fr = node_hash(p, &fr);
            sr = node_hash(p, &sr);
            while fn_idx & 1 == 0 && fn_idx != 0 {
                fn_idx >>= 1;
                sn_idx >>= 1;
            }
        } else {
            sr = node_hash(&sr, p);
        }
        fn_idx >>= 1;
        sn_idx >>= 1;
    }

    sn_idx == 0 && &fr == old_root && &sr == new_root
}
