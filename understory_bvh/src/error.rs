// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural problems reported by [`Bvh::validate`](crate::Bvh::validate).

use crate::node::LeafId;

/// A broken hierarchy invariant.
///
/// None of the hierarchy operations can fail, so these only ever indicate a bug.
/// Node numbers are arena slot indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    /// The root node still points at a parent.
    #[error("root node has a parent link")]
    RootHasParent,
    /// A child does not point back at the internal node holding it, or is reached twice.
    #[error("node {node} is not linked back to its parent")]
    BrokenParentLink {
        /// The offending child slot.
        node: usize,
    },
    /// An internal node's volume differs from the union of its children.
    #[error("internal node {node} does not bound exactly its children")]
    LooseVolume {
        /// The offending internal slot.
        node: usize,
    },
    /// A leaf that is not a member is reachable from the root.
    #[error("detached leaf {0:?} is reachable from the root")]
    DetachedReachable(LeafId),
    /// A member leaf cannot be reached from the root.
    #[error("member leaf {0:?} is not reachable from the root")]
    MemberUnreachable(LeafId),
    /// The recorded member count disagrees with the reachable leaves.
    #[error("{expected} members recorded but {found} leaves reachable")]
    MemberCount {
        /// Members the tree believes it holds.
        expected: usize,
        /// Leaves actually reachable from the root.
        found: usize,
    },
}
