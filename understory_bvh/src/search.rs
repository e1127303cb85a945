// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Branch-and-bound search for the sibling a new leaf should be paired with.
//!
//! Cost model
//! ----------
//! Pairing the new leaf with node `N` creates a parent whose volume is
//! `merged = N ∪ leaf`, and every ancestor of `N` must grow to admit the leaf.
//! Walking down from the root we carry the ancestors' growth as `inherited`:
//!
//! `direct(N) = inherited(N) + vol(merged)`
//!
//! `inherited(child) = inherited(N) + vol(merged) - vol(N)`
//!
//! A node is accepted when its direct cost is `<=` the best found so far, so an
//! equal-cost node visited later (generally deeper) replaces the earlier one.
//! The children of a rejected node are never visited.

use alloc::vec;

use crate::node::{Arena, NodeIdx};
use crate::types::{Aabb3D, Vector3, VectorAcc, le};

/// The chosen attachment point.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Candidate<A> {
    pub(crate) node: NodeIdx,
    pub(crate) cost: A,
    /// Nodes whose cost was evaluated, including rejected ones.
    pub(crate) explored: usize,
}

/// Find the lowest-cost sibling for `leaf` in the subtree rooted at `root`.
///
/// The traversal is root-first pre-order, left before right, over an explicit
/// stack. A single best-so-far record is shared by the whole walk, so a later
/// subtree can still improve on an earlier one.
pub(crate) fn best_sibling<V: Vector3, P>(
    arena: &Arena<V, P>,
    root: NodeIdx,
    leaf: &Aabb3D<V>,
) -> Candidate<VectorAcc<V>> {
    let mut best: Option<(NodeIdx, VectorAcc<V>)> = None;
    let mut explored = 0_usize;
    let mut stack = vec![(root, V::acc_zero())];
    while let Some((idx, inherited)) = stack.pop() {
        let node = arena.get(idx);
        let merged = node.volume.union(leaf).volume();
        let direct = inherited + merged;
        explored += 1;
        if best.is_some_and(|(_, cost)| !le(direct, cost)) {
            continue;
        }
        best = Some((idx, direct));
        if let Some((left, right)) = node.children() {
            let inherited = inherited + (merged - node.volume.volume());
            stack.push((right, inherited));
            stack.push((left, inherited));
        }
    }
    // The root is always accepted, so `best` is set once the walk ends.
    let (node, cost) = best.unwrap_or((root, V::acc_zero()));
    Candidate {
        node,
        cost,
        explored,
    }
}
