// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node representation and the slot arena backing a hierarchy.
//!
//! Nodes reference each other by [`NodeIdx`] rather than by pointer, so the
//! parent/child links never form an ownership cycle. Slots vacated by removals are
//! recycled through a free list.

use alloc::vec::Vec;

use crate::types::Aabb3D;

/// Identifier for a leaf in a [`Bvh`](crate::Bvh).
///
/// This is a small, copyable handle made of a slot index and a generation counter.
///
/// ## Semantics
///
/// - [`Bvh::create_leaf`](crate::Bvh::create_leaf) allocates a slot; a fresh slot starts at generation `1`.
/// - The handle stays valid across any number of insert/remove cycles of the leaf.
/// - [`Bvh::release`](crate::Bvh::release) frees the slot; any existing `LeafId` for it is now stale.
/// - Slots are shared with internal nodes, and every reuse increments the slot's generation,
///   so a stale `LeafId` never aliases a different live leaf.
///
/// `u32` is ample for practical lifetimes; behavior on generation overflow is unspecified.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct LeafId(pub(crate) u32, pub(crate) u32);

impl LeafId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn node(self) -> NodeIdx {
        NodeIdx::new(self.0 as usize)
    }

    /// The generation of the slot this handle refers to.
    pub const fn generation(self) -> u32 {
        self.1
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeIdx(usize);

impl NodeIdx {
    pub(crate) const fn new(i: usize) -> Self {
        Self(i)
    }

    pub(crate) const fn get(self) -> usize {
        self.0
    }
}

/// Leaf/internal tag. Leaves carry the caller's payload, internal nodes their two children.
pub(crate) enum Kind<P> {
    Leaf { payload: P, member: bool },
    Internal { left: NodeIdx, right: NodeIdx },
}

pub(crate) struct Node<V, P> {
    pub(crate) volume: Aabb3D<V>,
    pub(crate) parent: Option<NodeIdx>,
    pub(crate) kind: Kind<P>,
}

impl<V, P> Node<V, P> {
    pub(crate) const fn leaf(volume: Aabb3D<V>, payload: P) -> Self {
        Self {
            volume,
            parent: None,
            kind: Kind::Leaf {
                payload,
                member: false,
            },
        }
    }

    pub(crate) const fn internal(
        volume: Aabb3D<V>,
        parent: Option<NodeIdx>,
        left: NodeIdx,
        right: NodeIdx,
    ) -> Self {
        Self {
            volume,
            parent,
            kind: Kind::Internal { left, right },
        }
    }

    pub(crate) fn children(&self) -> Option<(NodeIdx, NodeIdx)> {
        match self.kind {
            Kind::Internal { left, right } => Some((left, right)),
            Kind::Leaf { .. } => None,
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.kind, Kind::Leaf { .. })
    }

    pub(crate) fn is_member(&self) -> bool {
        matches!(self.kind, Kind::Leaf { member: true, .. })
    }

    pub(crate) fn set_member(&mut self, on: bool) {
        if let Kind::Leaf { member, .. } = &mut self.kind {
            *member = on;
        }
    }

    pub(crate) fn payload(&self) -> Option<&P> {
        match &self.kind {
            Kind::Leaf { payload, .. } => Some(payload),
            Kind::Internal { .. } => None,
        }
    }

    pub(crate) fn payload_mut(&mut self) -> Option<&mut P> {
        match &mut self.kind {
            Kind::Leaf { payload, .. } => Some(payload),
            Kind::Internal { .. } => None,
        }
    }
}

/// Slot storage for nodes. Generations persist across frees.
pub(crate) struct Arena<V, P> {
    slots: Vec<Option<Node<V, P>>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl<V, P> Default for Arena<V, P> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }
}

impl<V, P> Arena<V, P> {
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            slots: Vec::with_capacity(n),
            generations: Vec::with_capacity(n),
            free_list: Vec::new(),
        }
    }

    pub(crate) fn reserve(&mut self, n: usize) {
        self.slots.reserve(n);
        self.generations.reserve(n);
    }

    /// Store `node` in a recycled or new slot. Returns its index and generation.
    pub(crate) fn alloc(&mut self, node: Node<V, P>) -> (NodeIdx, u32) {
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.slots[idx] = Some(node);
            (NodeIdx::new(idx), generation)
        } else {
            let generation = 1_u32;
            self.slots.push(Some(node));
            self.generations.push(generation);
            (NodeIdx::new(self.slots.len() - 1), generation)
        }
    }

    /// Vacate a slot and hand back its node.
    pub(crate) fn free(&mut self, idx: NodeIdx) -> Option<Node<V, P>> {
        let node = self.slots.get_mut(idx.get())?.take()?;
        self.free_list.push(idx.get());
        Some(node)
    }

    /// Access a node; panics if `idx` is dangling.
    pub(crate) fn get(&self, idx: NodeIdx) -> &Node<V, P> {
        self.slots[idx.get()].as_ref().expect("dangling NodeIdx")
    }

    /// Access a node mutably; panics if `idx` is dangling.
    pub(crate) fn get_mut(&mut self, idx: NodeIdx) -> &mut Node<V, P> {
        self.slots[idx.get()].as_mut().expect("dangling NodeIdx")
    }

    /// The leaf addressed by `id`, if the handle is live.
    pub(crate) fn leaf(&self, id: LeafId) -> Option<&Node<V, P>> {
        let idx = id.node().get();
        if self.generations.get(idx) != Some(&id.1) {
            return None;
        }
        self.slots[idx].as_ref().filter(|n| n.is_leaf())
    }

    pub(crate) fn leaf_mut(&mut self, id: LeafId) -> Option<&mut Node<V, P>> {
        let idx = id.node().get();
        if self.generations.get(idx) != Some(&id.1) {
            return None;
        }
        self.slots[idx].as_mut().filter(|n| n.is_leaf())
    }

    pub(crate) fn leaf_id(&self, idx: NodeIdx) -> LeafId {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "LeafId stores 32-bit slot indices."
        )]
        LeafId::new(idx.get() as u32, self.generations[idx.get()])
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (NodeIdx, &Node<V, P>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeIdx::new(i), n)))
    }

    /// Free every internal node and detach every leaf.
    pub(crate) fn detach_all(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            match slot {
                Some(node) if node.is_leaf() => {
                    node.parent = None;
                    node.set_member(false);
                }
                Some(_) => {
                    *slot = None;
                    self.free_list.push(i);
                }
                None => {}
            }
        }
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn free_count(&self) -> usize {
        self.free_list.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn unit() -> Aabb3D<Vec3> {
        Aabb3D::new(Vec3::ZERO, Vec3::ONE)
    }

    #[test]
    fn freed_slots_are_reused_with_newer_generation() {
        let mut arena: Arena<Vec3, u8> = Arena::default();
        let (a, gen_a) = arena.alloc(Node::leaf(unit(), 1));
        let (_b, _) = arena.alloc(Node::leaf(unit(), 2));
        assert!(arena.free(a).is_some());
        assert!(arena.free(a).is_none(), "double free is a no-op");
        let (c, gen_c) = arena.alloc(Node::leaf(unit(), 3));
        assert_eq!(c, a);
        assert!(gen_c > gen_a, "generation must increase on reuse");
        assert_eq!(arena.slot_count(), 2);
        assert_eq!(arena.free_count(), 0);
    }

    #[test]
    fn stale_leaf_handles_are_rejected() {
        let mut arena: Arena<Vec3, u8> = Arena::default();
        let (a, _) = arena.alloc(Node::leaf(unit(), 1));
        let old = arena.leaf_id(a);
        assert!(arena.leaf(old).is_some());
        let _ = arena.free(a);
        assert!(arena.leaf(old).is_none());
        let (b, _) = arena.alloc(Node::internal(unit(), None, a, a));
        assert_eq!(b, a);
        assert!(arena.leaf(old).is_none(), "slot now holds an internal node");
        assert!(arena.leaf(arena.leaf_id(b)).is_none(), "internal nodes are not leaves");
    }

    #[test]
    fn detach_all_keeps_leaves_only() {
        let mut arena: Arena<Vec3, u8> = Arena::default();
        let (l0, _) = arena.alloc(Node::leaf(unit(), 1));
        let (l1, _) = arena.alloc(Node::leaf(unit(), 2));
        let (m, _) = arena.alloc(Node::internal(unit(), None, l0, l1));
        arena.get_mut(l0).parent = Some(m);
        arena.get_mut(l0).set_member(true);
        arena.detach_all();
        assert_eq!(arena.iter().count(), 2);
        assert!(arena.iter().all(|(_, n)| n.is_leaf() && !n.is_member() && n.parent.is_none()));
        assert_eq!(arena.free_count(), 1);
    }
}
