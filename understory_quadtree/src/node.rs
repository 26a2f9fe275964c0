// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node handles and the read-only node view exposed to renderers.

use alloc::vec::Vec;

use crate::types::{Point, Rectangle};

/// Identifier for a node in a [`Quadtree`][crate::Quadtree] (generational).
///
/// The first component is the node's slot in the tree's arena, the second the
/// tree generation it was created in. Slots are never reused within a
/// generation, so a handle refers to the same node for the node's whole life.
/// [`Quadtree::clear`][crate::Quadtree::clear] starts a new generation and
/// makes every older handle stale.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

/// One of the four children of a subdivided node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Quadrant {
    /// Top-left.
    NorthWest = 0,
    /// Top-right.
    NorthEast = 1,
    /// Bottom-left.
    SouthWest = 2,
    /// Bottom-right.
    SouthEast = 3,
}

impl Quadrant {
    /// All quadrants in the order children are tried: NW, NE, SW, SE.
    pub const ALL: [Self; 4] = [
        Self::NorthWest,
        Self::NorthEast,
        Self::SouthWest,
        Self::SouthEast,
    ];

    /// The quadrant of `bounds` that holds `(x, y)` by comparing against the midpoint.
    ///
    /// Unlike testing each child boundary, this always yields an answer.
    pub(crate) fn by_midpoint(bounds: &Rectangle, x: f64, y: f64) -> Self {
        let east = x >= bounds.x + bounds.w / 2.0;
        let south = y >= bounds.y + bounds.h / 2.0;
        match (east, south) {
            (false, false) => Self::NorthWest,
            (true, false) => Self::NorthEast,
            (false, true) => Self::SouthWest,
            (true, true) => Self::SouthEast,
        }
    }
}

/// Leaf or internal contents of a node.
#[derive(Clone, Debug)]
pub enum NodeKind<D> {
    /// Not yet subdivided; holds its points directly.
    Leaf(Vec<Point<D>>),
    /// Subdivided; children ordered NW, NE, SW, SE.
    Internal([NodeId; 4]),
}

/// A region of the tree.
///
/// Nodes are owned by their [`Quadtree`][crate::Quadtree] and addressed by
/// [`NodeId`]. A node's boundary and depth never change; subdivision only
/// turns its [`NodeKind::Leaf`] into [`NodeKind::Internal`].
#[derive(Clone, Debug)]
pub struct Node<D> {
    pub(crate) boundary: Rectangle,
    pub(crate) depth: u32,
    pub(crate) kind: NodeKind<D>,
}

impl<D> Node<D> {
    pub(crate) fn leaf(boundary: Rectangle, depth: u32) -> Self {
        Self {
            boundary,
            depth,
            kind: NodeKind::Leaf(Vec::new()),
        }
    }

    /// Region covered by this node.
    pub fn boundary(&self) -> Rectangle {
        self.boundary
    }

    /// Distance from the root; the root is at depth 0.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Whether this node has been subdivided.
    pub fn is_divided(&self) -> bool {
        matches!(self.kind, NodeKind::Internal(_))
    }

    /// Points held directly by this node. Always empty for internal nodes.
    pub fn points(&self) -> &[Point<D>] {
        match &self.kind {
            NodeKind::Leaf(points) => points,
            NodeKind::Internal(_) => &[],
        }
    }

    /// Children ordered NW, NE, SW, SE, or `None` for a leaf.
    pub fn children(&self) -> Option<[NodeId; 4]> {
        match self.kind {
            NodeKind::Leaf(_) => None,
            NodeKind::Internal(children) => Some(children),
        }
    }

    /// The child in `quadrant`, or `None` for a leaf.
    pub fn child(&self, quadrant: Quadrant) -> Option<NodeId> {
        self.children().map(|c| c[quadrant as usize])
    }

    /// Leaf or internal contents.
    pub fn kind(&self) -> &NodeKind<D> {
        &self.kind
    }
}
