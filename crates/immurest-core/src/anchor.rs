//! Trust anchor: the last root this process has verified.
//!
//! Shared by every in-flight request. Reads take a snapshot; updates are
//! compare-and-swap against the snapshot the caller verified from, so a
//! request that lost a race can never install a stale root over a newer one.

use parking_lot::Mutex;

use crate::types::Root;

#[derive(Debug)]
struct State {
    root: Root,
    commits: u64,
}

/// Process-wide holder of the last verified [`Root`].
#[derive(Debug)]
pub struct TrustAnchor {
    state: Mutex<State>,
}

impl TrustAnchor {
    pub fn new(root: Root) -> Self {
        Self {
            state: Mutex::new(State { root, commits: 0 }),
        }
    }

    /// Snapshot of the current root.
    pub fn current(&self) -> Root {
        self.state.lock().root
    }

    /// Number of successful advances since construction.
    pub fn commits(&self) -> u64 {
        self.state.lock().commits
    }

    /// Install `new` if the held root is still `old`.
    ///
    /// Fails when another caller advanced the anchor first, or when `new`
    /// describes a shorter log than `old`.
    pub fn advance(&self, old: &Root, new: Root) -> bool {
        self.advance_with(old, new, |_| {})
    }

    /// Like [`advance`](Self::advance), running `on_commit` with the new root
    /// while the lock is still held. Commits observed through the hook are
    /// therefore totally ordered.
    pub fn advance_with<F>(&self, old: &Root, new: Root, on_commit: F) -> bool
    where
        F: FnOnce(&Root),
    {
        let mut state = self.state.lock();
        if state.root != *old || new.tree_size < old.tree_size {
            return false;
        }
        state.root = new;
        state.commits += 1;
        on_commit(&state.root);
        true
    }
}

impl Default for TrustAnchor {
    fn default() -> Self {
        Self::new(Root::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn root(size: u64, byte: u8) -> Root {
        Root::new(size, [byte; 32])
    }

    #[test]
    fn starts_empty_by_default() {
        let anchor = TrustAnchor::default();
        assert_eq!(anchor.current(), Root::empty());
    }

    #[test]
    fn advance_from_current() {
        let anchor = TrustAnchor::new(root(1, 1));
        assert!(anchor.advance(&root(1, 1), root(2, 2)));
        assert_eq!(anchor.current(), root(2, 2));
    }

    #[test]
    fn advance_from_stale_snapshot_fails() {
        let anchor = TrustAnchor::new(root(1, 1));
        assert!(anchor.advance(&root(1, 1), root(3, 3)));
        assert!(!anchor.advance(&root(1, 1), root(2, 2)));
        assert_eq!(anchor.current(), root(3, 3));
        assert_eq!(anchor.commits(), 1);
    }

    #[test]
    fn never_moves_backwards() {
        let anchor = TrustAnchor::new(root(5, 5));
        assert!(!anchor.advance(&root(5, 5), root(4, 4)));
        assert_eq!(anchor.current(), root(5, 5));
    }

    #[test]
    fn hook_runs_only_on_commit() {
        let anchor = TrustAnchor::new(root(1, 1));
        let mut seen = Vec::new();
        assert!(!anchor.advance_with(&root(9, 9), root(10, 10), |r| seen.push(*r)));
        assert!(anchor.advance_with(&root(1, 1), root(2, 2), |r| seen.push(*r)));
        assert_eq!(seen, vec![root(2, 2)]);
    }

    #[test]
    fn concurrent_advances_from_one_snapshot_commit_once() {
        let anchor = Arc::new(TrustAnchor::new(root(1, 1)));
        let handles: Vec<_> = (2..10u8)
            .map(|i| {
                let anchor = anchor.clone();
                thread::spawn(move || anchor.advance(&root(1, 1), root(u64::from(i), i)))
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 1);
        assert_eq!(anchor.commits(), 1);
        assert_ne!(anchor.current(), root(1, 1));
    }
}
