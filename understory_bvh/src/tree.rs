// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The dynamic hierarchy: leaf lifecycle, insertion, removal, and overlap queries.

use alloc::collections::VecDeque;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use glam::{DVec3, Vec3};
use log::{debug, trace};

use crate::error::Violation;
use crate::node::{Arena, Kind, LeafId, Node, NodeIdx};
use crate::search;
use crate::types::{Aabb3D, Vector3};

/// A dynamic bounding volume hierarchy over 3D AABBs.
///
/// Every internal node has exactly two children and bounds exactly their union.
/// Leaves carry a payload `P` and are addressed by [`LeafId`].
///
/// The hierarchy does no internal synchronization. Mutation needs `&mut self`, so
/// concurrent queries are only possible while no insert or remove is running.
pub struct Bvh<V: Vector3, P> {
    pub(crate) root: Option<NodeIdx>,
    pub(crate) arena: Arena<V, P>,
    members: usize,
}

impl<V: Vector3, P> Default for Bvh<V, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Vector3, P> Bvh<V, P> {
    /// Create an empty hierarchy.
    pub fn new() -> Self {
        Self {
            root: None,
            arena: Arena::default(),
            members: 0,
        }
    }

    /// Create an empty hierarchy with room for `leaves` leaves and their internal nodes.
    pub fn with_capacity(leaves: usize) -> Self {
        Self {
            root: None,
            arena: Arena::with_capacity(leaves.saturating_mul(2)),
            members: 0,
        }
    }

    /// Reserve node storage for at least `leaves` more leaves.
    pub fn reserve(&mut self, leaves: usize) {
        self.arena.reserve(leaves.saturating_mul(2));
    }

    /// Create a detached leaf. It takes part in queries only once [inserted](Self::insert).
    pub fn create_leaf(&mut self, volume: Aabb3D<V>, payload: P) -> LeafId {
        let (idx, _) = self.arena.alloc(Node::leaf(volume, payload));
        self.arena.leaf_id(idx)
    }

    /// Insert a leaf into the hierarchy.
    ///
    /// Returns `false` without touching the tree if the leaf is already a member or
    /// `id` is stale.
    pub fn insert(&mut self, id: LeafId) -> bool {
        let Some(leaf) = self.arena.leaf_mut(id) else {
            return false;
        };
        if leaf.is_member() {
            return false;
        }
        leaf.set_member(true);
        leaf.parent = None;
        let volume = leaf.volume;
        self.members += 1;

        let leaf_idx = id.node();
        let Some(root) = self.root else {
            trace!("bvh insert {id:?}: leaf becomes root");
            self.root = Some(leaf_idx);
            return true;
        };
        let best = search::best_sibling(&self.arena, root, &volume);
        trace!(
            "bvh insert {id:?}: sibling #{} cost {:?} ({} nodes explored)",
            best.node.get(),
            best.cost,
            best.explored
        );
        self.splice(best.node, leaf_idx);
        true
    }

    /// Remove a leaf from the hierarchy.
    ///
    /// The leaf stays alive (detached) and can be reinserted later. Returns `false`
    /// without touching the tree if the leaf is not a member or `id` is stale.
    pub fn remove(&mut self, id: LeafId) -> bool {
        let Some(leaf) = self.arena.leaf_mut(id) else {
            return false;
        };
        if !leaf.is_member() {
            return false;
        }
        leaf.set_member(false);
        let parent = leaf.parent.take();
        self.members -= 1;

        match parent {
            None => {
                debug_assert_eq!(self.root, Some(id.node()), "parentless member must be root");
                trace!("bvh remove {id:?}: root leaf, tree is now empty");
                self.root = None;
            }
            Some(parent) => {
                trace!("bvh remove {id:?}: collapsing parent #{}", parent.get());
                self.collapse(parent, id.node());
            }
        }
        true
    }

    /// Remove the leaf if it is a member, then free it.
    ///
    /// Returns the leaf's volume and payload, or `None` if `id` is stale.
    /// `id` is stale afterwards.
    pub fn release(&mut self, id: LeafId) -> Option<(Aabb3D<V>, P)> {
        self.arena.leaf(id)?;
        self.remove(id);
        let node = self.arena.free(id.node())?;
        match node.kind {
            Kind::Leaf { payload, .. } => Some((node.volume, payload)),
            Kind::Internal { .. } => None,
        }
    }

    /// Empty the hierarchy. Internal nodes are freed; every leaf stays alive, detached.
    pub fn clear(&mut self) {
        debug!("bvh clear: detaching {} members", self.members);
        self.arena.detach_all();
        self.root = None;
        self.members = 0;
    }

    /// Iterate member leaves whose volume overlaps `query`.
    ///
    /// The walk is breadth-first and skips every subtree whose bounds do not overlap
    /// `query`. Treat the result as a set; the order is not part of the contract.
    pub fn intersect(&self, query: Aabb3D<V>) -> Overlaps<'_, V, P> {
        let mut queue = VecDeque::new();
        queue.extend(self.root);
        Overlaps {
            arena: &self.arena,
            query,
            queue,
        }
    }

    /// Whether `id` is a current member.
    pub fn contains(&self, id: LeafId) -> bool {
        self.arena.leaf(id).is_some_and(Node::is_member)
    }

    /// Whether `id` refers to a live (member or detached) leaf.
    pub fn is_alive(&self, id: LeafId) -> bool {
        self.arena.leaf(id).is_some()
    }

    /// The volume of a live leaf.
    pub fn volume(&self, id: LeafId) -> Option<Aabb3D<V>> {
        self.arena.leaf(id).map(|n| n.volume)
    }

    /// The payload of a live leaf.
    pub fn payload(&self, id: LeafId) -> Option<&P> {
        self.arena.leaf(id)?.payload()
    }

    /// The payload of a live leaf, mutably.
    pub fn payload_mut(&mut self, id: LeafId) -> Option<&mut P> {
        self.arena.leaf_mut(id)?.payload_mut()
    }

    /// Number of member leaves.
    pub fn len(&self) -> usize {
        self.members
    }

    /// Whether the hierarchy holds no member leaves.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Bounds of everything in the hierarchy, or `None` when empty.
    pub fn root_volume(&self) -> Option<Aabb3D<V>> {
        self.root.map(|r| self.arena.get(r).volume)
    }

    /// Iterate member leaves in slot order.
    pub fn leaves(&self) -> impl Iterator<Item = (LeafId, &P)> + '_ {
        self.arena.iter().filter_map(|(idx, n)| match &n.kind {
            Kind::Leaf {
                payload,
                member: true,
            } => Some((self.arena.leaf_id(idx), payload)),
            _ => None,
        })
    }

    /// Number of nodes on the longest root-to-leaf path; `0` when empty.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack: Vec<(NodeIdx, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((idx, depth)) = stack.pop() {
            height = height.max(depth);
            if let Some((left, right)) = self.arena.get(idx).children() {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
        height
    }

    /// Check the structural invariants.
    ///
    /// Every child must link back to its parent, every internal volume must equal the
    /// union of its children, and the reachable leaves must be exactly the members.
    pub fn validate(&self) -> Result<(), Violation> {
        let mut seen = vec![false; self.arena.slot_count()];
        let mut reached = 0_usize;
        if let Some(root) = self.root {
            if self.arena.get(root).parent.is_some() {
                return Err(Violation::RootHasParent);
            }
            let mut stack = vec![root];
            while let Some(idx) = stack.pop() {
                if core::mem::replace(&mut seen[idx.get()], true) {
                    return Err(Violation::BrokenParentLink { node: idx.get() });
                }
                let node = self.arena.get(idx);
                match node.kind {
                    Kind::Leaf { member, .. } => {
                        if !member {
                            return Err(Violation::DetachedReachable(self.arena.leaf_id(idx)));
                        }
                        reached += 1;
                    }
                    Kind::Internal { left, right } => {
                        for child in [left, right] {
                            if self.arena.get(child).parent != Some(idx) {
                                return Err(Violation::BrokenParentLink { node: child.get() });
                            }
                        }
                        let tight = self
                            .arena
                            .get(left)
                            .volume
                            .union(&self.arena.get(right).volume);
                        if node.volume != tight {
                            return Err(Violation::LooseVolume { node: idx.get() });
                        }
                        stack.push(right);
                        stack.push(left);
                    }
                }
            }
        }
        if let Some((idx, _)) = self
            .arena
            .iter()
            .find(|(idx, n)| n.is_member() && !seen[idx.get()])
        {
            return Err(Violation::MemberUnreachable(self.arena.leaf_id(idx)));
        }
        if reached != self.members {
            return Err(Violation::MemberCount {
                expected: self.members,
                found: reached,
            });
        }
        Ok(())
    }

    // --- internals ---

    /// Pair `leaf` with `sibling` under a new internal node occupying the sibling's slot.
    fn splice(&mut self, sibling: NodeIdx, leaf: NodeIdx) {
        let sibling_node = self.arena.get(sibling);
        let old_parent = sibling_node.parent;
        let volume = sibling_node.volume.union(&self.arena.get(leaf).volume);
        let (merged, _) = self
            .arena
            .alloc(Node::internal(volume, old_parent, sibling, leaf));
        match old_parent {
            None => self.root = Some(merged),
            Some(p) => self.replace_child(p, sibling, merged),
        }
        self.arena.get_mut(sibling).parent = Some(merged);
        self.arena.get_mut(leaf).parent = Some(merged);
        self.refit_from(old_parent);
    }

    /// Replace `parent` by the other child of `parent` in the grandparent's slot.
    fn collapse(&mut self, parent: NodeIdx, leaf: NodeIdx) {
        let parent_node = self.arena.get(parent);
        let Some((left, right)) = parent_node.children() else {
            unreachable!("a leaf's parent is always internal");
        };
        let sibling = if left == leaf { right } else { left };
        let grandparent = parent_node.parent;
        match grandparent {
            None => self.root = Some(sibling),
            Some(g) => self.replace_child(g, parent, sibling),
        }
        self.arena.get_mut(sibling).parent = grandparent;
        let _ = self.arena.free(parent);
        self.refit_from(grandparent);
    }

    fn replace_child(&mut self, parent: NodeIdx, old: NodeIdx, new: NodeIdx) {
        if let Kind::Internal { left, right } = &mut self.arena.get_mut(parent).kind {
            if *left == old {
                *left = new;
            } else {
                debug_assert_eq!(*right, old, "replaced node must be a child");
                *right = new;
            }
        }
    }

    /// Recompute volumes from `start` up to the root.
    fn refit_from(&mut self, start: Option<NodeIdx>) {
        let mut cursor = start;
        while let Some(idx) = cursor {
            let Some((left, right)) = self.arena.get(idx).children() else {
                unreachable!("ancestors are always internal");
            };
            let volume = self
                .arena
                .get(left)
                .volume
                .union(&self.arena.get(right).volume);
            let node = self.arena.get_mut(idx);
            node.volume = volume;
            cursor = node.parent;
        }
    }
}

impl<V: Vector3, P> fmt::Debug for Bvh<V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bvh")
            .field("members", &self.members)
            .field("arena_slots", &self.arena.slot_count())
            .field("free_slots", &self.arena.free_count())
            .field("root_volume", &self.root_volume())
            .finish_non_exhaustive()
    }
}

/// Breadth-first dump, one node per line: `[parent -> node]`, kind, and bounds.
impl<V: Vector3, P> fmt::Display for Bvh<V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(root) = self.root else {
            return writeln!(f, "empty tree");
        };
        let mut queue = VecDeque::from([root]);
        while let Some(idx) = queue.pop_front() {
            let node = self.arena.get(idx);
            match node.parent {
                Some(p) => write!(f, "[#{} -> #{}] ", p.get(), idx.get())?,
                None => write!(f, "[root #{}] ", idx.get())?,
            }
            match node.children() {
                Some((left, right)) => {
                    write!(f, "internal")?;
                    queue.push_back(left);
                    queue.push_back(right);
                }
                None => write!(f, "leaf {:?}", self.arena.leaf_id(idx))?,
            }
            writeln!(f, " min: {:?} max: {:?}", node.volume.min, node.volume.max)?;
        }
        Ok(())
    }
}

/// Iterator over the member leaves overlapping a query volume.
///
/// Returned by [`Bvh::intersect`].
pub struct Overlaps<'a, V: Vector3, P> {
    arena: &'a Arena<V, P>,
    query: Aabb3D<V>,
    queue: VecDeque<NodeIdx>,
}

impl<'a, V: Vector3, P> Iterator for Overlaps<'a, V, P> {
    type Item = (LeafId, &'a P);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(idx) = self.queue.pop_front() {
            let node = self.arena.get(idx);
            if !node.volume.overlaps(&self.query) {
                continue;
            }
            match &node.kind {
                Kind::Leaf { payload, .. } => return Some((self.arena.leaf_id(idx), payload)),
                Kind::Internal { left, right } => {
                    self.queue.push_back(*left);
                    self.queue.push_back(*right);
                }
            }
        }
        None
    }
}

impl<V: Vector3, P> fmt::Debug for Overlaps<'_, V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overlaps")
            .field("query", &self.query)
            .field("pending", &self.queue.len())
            .finish_non_exhaustive()
    }
}

/// Hierarchy with f32 coordinates and f64 metrics.
pub type BvhF32<P> = Bvh<Vec3, P>;

/// Hierarchy with f64 coordinates and f64 metrics.
pub type BvhF64<P> = Bvh<DVec3, P>;
