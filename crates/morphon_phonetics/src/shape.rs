//! Phonetic shapes.
//!
//! A [`PhoneticShape`] is the mutable word representation: a doubly linked
//! sequence of segment, boundary, and margin nodes stored in an arena and
//! addressed by [`NodeId`]. Every shape is bounded by exactly one left and
//! one right margin, and holds at most [`PhoneticShape::CAPACITY`] linked
//! nodes, margins included.
//!
//! Removed slots are never reused, so a `NodeId` taken from a shape stays
//! valid (pointing at the same node) in every clone of that shape. The
//! capacity bounds linked nodes only: the arena keeps dead slots until the
//! shape is dropped, and clones copy them along.

use std::fmt;
use std::ops::{Index, IndexMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use morphon_foundation::{CapacityLimit, Error, FeatureBundle, Result};

/// Handle of a node inside one [`PhoneticShape`] arena.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Traversal direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// From the left margin towards the right margin.
    LeftToRight,
    /// From the right margin towards the left margin.
    RightToLeft,
}

impl Direction {
    /// Returns the opposite direction.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::LeftToRight => Self::RightToLeft,
            Self::RightToLeft => Self::LeftToRight,
        }
    }
}

/// Which end of the shape a margin sits at.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MarginSide {
    /// The left edge.
    Left,
    /// The right edge.
    Right,
}

/// What a shape node holds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A segment with its phonetic features.
    Segment(FeatureBundle),
    /// A morpheme boundary with its surface representation.
    Boundary(String),
    /// An edge sentinel.
    Margin(MarginSide),
}

/// A node of a phonetic shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShapeNode {
    /// The node payload.
    pub kind: NodeKind,
    /// The node may be absent (analysis only).
    pub optional: bool,
    /// The node was deleted by a rule and is invisible to matching.
    pub deleted: bool,
    /// The node has not been rewritten by the current simultaneous pass.
    pub clean: bool,
    /// Capture group that produced this node.
    pub partition: Option<usize>,
    /// Index of the morph this node belongs to.
    pub morph: Option<usize>,
}

impl ShapeNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            optional: false,
            deleted: false,
            clean: true,
            partition: None,
            morph: None,
        }
    }

    /// Creates a segment node.
    #[must_use]
    pub fn segment(bundle: FeatureBundle) -> Self {
        Self::new(NodeKind::Segment(bundle))
    }

    /// Creates a boundary node.
    #[must_use]
    pub fn boundary(representation: impl Into<String>) -> Self {
        Self::new(NodeKind::Boundary(representation.into()))
    }

    fn margin(side: MarginSide) -> Self {
        Self::new(NodeKind::Margin(side))
    }

    /// Sets the optional flag.
    #[must_use]
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Sets the partition tag.
    #[must_use]
    pub fn with_partition(mut self, partition: Option<usize>) -> Self {
        self.partition = partition;
        self
    }

    /// Sets the morph tag.
    #[must_use]
    pub fn with_morph(mut self, morph: Option<usize>) -> Self {
        self.morph = morph;
        self
    }

    /// Returns true for segment nodes.
    #[must_use]
    pub fn is_segment(&self) -> bool {
        matches!(self.kind, NodeKind::Segment(_))
    }

    /// Returns true for boundary nodes.
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        matches!(self.kind, NodeKind::Boundary(_))
    }

    /// Returns true for margin nodes.
    #[must_use]
    pub fn is_margin(&self) -> bool {
        matches!(self.kind, NodeKind::Margin(_))
    }

    /// Returns the feature bundle of a segment.
    #[must_use]
    pub fn bundle(&self) -> Option<&FeatureBundle> {
        match &self.kind {
            NodeKind::Segment(bundle) => Some(bundle),
            _ => None,
        }
    }

    /// Returns the feature bundle of a segment for modification.
    pub fn bundle_mut(&mut self) -> Option<&mut FeatureBundle> {
        match &mut self.kind {
            NodeKind::Segment(bundle) => Some(bundle),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
struct Slot {
    node: ShapeNode,
    prev: Option<NodeId>,
    next: Option<NodeId>,
    linked: bool,
}

/// A capacity-bounded doubly linked sequence of shape nodes.
///
/// The arena grows by one slot per insertion and never shrinks.
#[derive(Clone)]
pub struct PhoneticShape {
    slots: Vec<Slot>,
    first: NodeId,
    last: NodeId,
    len: usize,
}

impl PhoneticShape {
    /// Maximum number of linked nodes, margins included.
    pub const CAPACITY: usize = 256;

    /// Creates a shape holding only its two margins.
    #[must_use]
    pub fn new() -> Self {
        let slots = vec![
            Slot {
                node: ShapeNode::margin(MarginSide::Left),
                prev: None,
                next: Some(NodeId(1)),
                linked: true,
            },
            Slot {
                node: ShapeNode::margin(MarginSide::Right),
                prev: Some(NodeId(0)),
                next: None,
                linked: true,
            },
        ];
        Self {
            slots,
            first: NodeId(0),
            last: NodeId(1),
            len: 2,
        }
    }

    /// Builds a shape from nodes, in order.
    ///
    /// # Errors
    ///
    /// Returns a capacity error if the nodes do not fit.
    pub fn from_nodes<I>(nodes: I) -> Result<Self>
    where
        I: IntoIterator<Item = ShapeNode>,
    {
        let mut shape = Self::new();
        for node in nodes {
            shape.push_back(node)?;
        }
        Ok(shape)
    }

    /// Returns the left margin.
    #[must_use]
    pub fn first(&self) -> NodeId {
        self.first
    }

    /// Returns the right margin.
    #[must_use]
    pub fn last(&self) -> NodeId {
        self.last
    }

    /// Returns the margin a traversal in `direction` starts from.
    #[must_use]
    pub fn begin(&self, direction: Direction) -> NodeId {
        match direction {
            Direction::LeftToRight => self.first,
            Direction::RightToLeft => self.last,
        }
    }

    /// Returns the margin a traversal in `direction` ends at.
    #[must_use]
    pub fn end(&self, direction: Direction) -> NodeId {
        self.begin(direction.reverse())
    }

    /// Returns the number of linked nodes, margins included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the shape holds nothing but its margins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 2
    }

    /// Returns true if `id` is linked into this shape.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some_and(|slot| slot.linked)
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots.get(id.0 as usize)
    }

    /// Gets a node.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&ShapeNode> {
        self.slot(id).map(|slot| &slot.node)
    }

    /// Gets a node for modification.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut ShapeNode> {
        self.slots.get_mut(id.0 as usize).map(|slot| &mut slot.node)
    }

    /// Returns the node after `id`.
    #[must_use]
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|slot| slot.next)
    }

    /// Returns the node before `id`.
    #[must_use]
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|slot| slot.prev)
    }

    /// Returns the neighbour of `id` in `direction`.
    #[must_use]
    pub fn step(&self, id: NodeId, direction: Direction) -> Option<NodeId> {
        match direction {
            Direction::LeftToRight => self.next(id),
            Direction::RightToLeft => self.prev(id),
        }
    }

    fn allocate(&mut self, node: ShapeNode) -> Result<NodeId> {
        if self.len >= Self::CAPACITY {
            return Err(Error::capacity_exceeded(CapacityLimit::ShapeNodes {
                limit: Self::CAPACITY,
            }));
        }
        let index = u32::try_from(self.slots.len()).map_err(|_| {
            Error::capacity_exceeded(CapacityLimit::ShapeNodes {
                limit: Self::CAPACITY,
            })
        })?;
        self.slots.push(Slot {
            node,
            prev: None,
            next: None,
            linked: false,
        });
        Ok(NodeId(index))
    }

    fn link_after(&mut self, id: NodeId, anchor: NodeId) {
        let next = self.next(anchor);
        let i = id.0 as usize;
        self.slots[i].prev = Some(anchor);
        self.slots[i].next = next;
        self.slots[i].linked = true;
        self.slots[anchor.0 as usize].next = Some(id);
        if let Some(next) = next {
            self.slots[next.0 as usize].prev = Some(id);
        }
        self.len += 1;
    }

    fn unlink(&mut self, id: NodeId) {
        let i = id.0 as usize;
        let (prev, next) = (self.slots[i].prev, self.slots[i].next);
        if let Some(prev) = prev {
            self.slots[prev.0 as usize].next = next;
        }
        if let Some(next) = next {
            self.slots[next.0 as usize].prev = prev;
        }
        self.slots[i].prev = None;
        self.slots[i].next = None;
        self.slots[i].linked = false;
        self.len -= 1;
    }

    /// Inserts a node after `anchor`.
    ///
    /// # Errors
    ///
    /// Returns a capacity error if the shape is full, or an internal error if
    /// `anchor` is not linked or is the right margin.
    pub fn insert_after(&mut self, anchor: NodeId, node: ShapeNode) -> Result<NodeId> {
        if !self.contains(anchor) || anchor == self.last {
            return Err(Error::new(morphon_foundation::ErrorKind::Internal(format!(
                "cannot insert after {anchor:?}"
            ))));
        }
        let id = self.allocate(node)?;
        self.link_after(id, anchor);
        Ok(id)
    }

    /// Inserts a node before `anchor`.
    ///
    /// # Errors
    ///
    /// Returns a capacity error if the shape is full, or an internal error if
    /// `anchor` is not linked or is the left margin.
    pub fn insert_before(&mut self, anchor: NodeId, node: ShapeNode) -> Result<NodeId> {
        let prev = self.prev(anchor).filter(|_| self.contains(anchor)).ok_or_else(|| {
            Error::new(morphon_foundation::ErrorKind::Internal(format!(
                "cannot insert before {anchor:?}"
            )))
        })?;
        self.insert_after(prev, node)
    }

    /// Appends a node before the right margin.
    ///
    /// # Errors
    ///
    /// Returns a capacity error if the shape is full.
    pub fn push_back(&mut self, node: ShapeNode) -> Result<NodeId> {
        self.insert_before(self.last, node)
    }

    /// Prepends a node after the left margin.
    ///
    /// # Errors
    ///
    /// Returns a capacity error if the shape is full.
    pub fn push_front(&mut self, node: ShapeNode) -> Result<NodeId> {
        self.insert_after(self.first, node)
    }

    /// Unlinks a node. Margins cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.first || id == self.last || !self.contains(id) {
            return false;
        }
        self.unlink(id);
        true
    }

    /// Moves a linked node so it directly follows `anchor`.
    pub fn move_after(&mut self, id: NodeId, anchor: NodeId) -> bool {
        if id == anchor
            || id == self.first
            || id == self.last
            || anchor == self.last
            || !self.contains(id)
            || !self.contains(anchor)
        {
            return false;
        }
        self.unlink(id);
        self.link_after(id, anchor);
        true
    }

    /// Iterates every linked node, margins included, left to right.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(self.first), |&id| self.next(id))
    }

    /// Iterates linked nodes from `start` to `end` inclusive.
    ///
    /// Stops at the right margin if `end` does not follow `start`.
    pub fn span(&self, start: NodeId, end: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(start), move |&id| {
            if id == end { None } else { self.next(id) }
        })
    }

    /// Iterates the ids of segments that are not deleted.
    pub fn segments(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids().filter(|&id| {
            let node = &self[id];
            node.is_segment() && !node.deleted
        })
    }

    /// Iterates the nodes between the margins, skipping deleted ones.
    pub fn visible(&self) -> impl Iterator<Item = &ShapeNode> + '_ {
        self.ids()
            .map(|id| &self[id])
            .filter(|node| !node.is_margin() && !node.deleted)
    }

    /// Copies the nodes from `start` to `end` inclusive.
    #[must_use]
    pub fn copy_span(&self, start: NodeId, end: NodeId) -> Vec<ShapeNode> {
        self.span(start, end)
            .filter(|&id| !self[id].is_margin())
            .map(|id| self[id].clone())
            .collect()
    }

    /// Appends copies of `nodes` before the right margin.
    ///
    /// # Errors
    ///
    /// Returns a capacity error if the nodes do not fit.
    pub fn extend<I>(&mut self, nodes: I) -> Result<()>
    where
        I: IntoIterator<Item = ShapeNode>,
    {
        for node in nodes {
            self.push_back(node)?;
        }
        Ok(())
    }

    /// Marks every node clean again.
    pub fn reset_clean(&mut self) {
        for slot in &mut self.slots {
            slot.node.clean = true;
        }
    }

    /// Returns true if the two shapes hold the same visible nodes.
    ///
    /// Partition and morph tags are ignored.
    #[must_use]
    pub fn same_segments(&self, other: &Self) -> bool {
        self.visible()
            .map(|n| (&n.kind, n.optional))
            .eq(other.visible().map(|n| (&n.kind, n.optional)))
    }

    /// Returns true if some visible segment is optional.
    #[must_use]
    pub fn has_optional(&self) -> bool {
        self.visible().any(|n| n.optional)
    }
}

impl Default for PhoneticShape {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for PhoneticShape {
    fn eq(&self, other: &Self) -> bool {
        self.same_segments(other)
    }
}

impl Eq for PhoneticShape {}

impl Index<NodeId> for PhoneticShape {
    type Output = ShapeNode;

    fn index(&self, id: NodeId) -> &ShapeNode {
        &self.slots[id.0 as usize].node
    }
}

impl IndexMut<NodeId> for PhoneticShape {
    fn index_mut(&mut self, id: NodeId) -> &mut ShapeNode {
        &mut self.slots[id.0 as usize].node
    }
}

impl fmt::Debug for PhoneticShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for id in self.ids() {
            let node = &self[id];
            match &node.kind {
                NodeKind::Margin(MarginSide::Left) => list.entry(&format_args!("<")),
                NodeKind::Margin(MarginSide::Right) => list.entry(&format_args!(">")),
                NodeKind::Boundary(repr) => list.entry(&format_args!("{repr}")),
                NodeKind::Segment(bundle) => {
                    let mark = if node.deleted {
                        "~"
                    } else if node.optional {
                        "?"
                    } else {
                        ""
                    };
                    list.entry(&format_args!("{mark}{bundle:?}"))
                }
            };
        }
        list.finish()
    }
}
