// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Results of range queries and traced lookups.

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;
use thiserror::Error;

use crate::node::NodeId;
use crate::types::{Point, PointKey};

/// Nodes visited by a lookup, ordered from the root downwards.
///
/// Most trees are shallow enough for the path to stay inline.
pub type Path = SmallVec<[NodeId; 8]>;

/// A stored point and the leaf holding it.
#[derive(Debug)]
pub struct Hit<'a, D> {
    /// The stored point.
    pub point: &'a Point<D>,
    /// The leaf whose buffer holds `point`.
    pub leaf: NodeId,
}

impl<D> Clone for Hit<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for Hit<'_, D> {}

/// Result of [`Quadtree::query`][crate::Quadtree::query].
///
/// The matches borrow the tree, so the result must be dropped before the tree
/// is mutated; move [`visited`](Self::visited) out to keep the node ids.
#[derive(Debug)]
pub struct RangeQuery<'a, D> {
    /// Matching points keyed by coordinates.
    ///
    /// Points sharing coordinates collapse to the first one encountered in
    /// NW, NE, SW, SE depth-first order.
    pub found: HashMap<PointKey, Hit<'a, D>>,
    /// Every node whose boundary intersected the range, leaves and internal nodes alike.
    pub visited: HashSet<NodeId>,
}

impl<D> Default for RangeQuery<'_, D> {
    fn default() -> Self {
        Self {
            found: HashMap::new(),
            visited: HashSet::new(),
        }
    }
}

impl<'a, D> RangeQuery<'a, D> {
    /// Number of distinct matching coordinates.
    pub fn len(&self) -> usize {
        self.found.len()
    }

    /// True if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }

    /// The match at `(x, y)`, if any.
    pub fn get(&self, x: f64, y: f64) -> Option<Hit<'a, D>> {
        self.found.get(&PointKey::new(x, y)).copied()
    }

    /// Matching points in unspecified order.
    pub fn points(&self) -> impl Iterator<Item = &'a Point<D>> + '_ {
        self.found.values().map(|hit| hit.point)
    }

    /// Whether `node` was visited.
    pub fn was_visited(&self, node: NodeId) -> bool {
        self.visited.contains(&node)
    }
}

/// Why a lookup came back empty-handed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum Miss {
    /// The coordinate lies outside the boundary of the node where the search started.
    #[error("coordinate lies outside the tree boundary")]
    OutOfBounds,
    /// The leaf covering the coordinate holds no point there.
    #[error("no point stored at the coordinate")]
    Absent,
    /// A subdivided node covers the coordinate but none of its children do.
    ///
    /// This signals floating-point residue between a boundary and its
    /// quadrants, not an ordinary miss.
    #[error("coordinate fell between the quadrants of a subdivided node")]
    BoundaryResidue,
}

/// Result of [`Quadtree::find`][crate::Quadtree::find]: the outcome plus the search path.
#[derive(Debug)]
pub struct Trace<'a, D> {
    /// Nodes examined, from the root to the node where the search ended.
    ///
    /// The path is recorded even when the search fails.
    pub path: Path,
    /// The stored point and its leaf, or why none was found.
    pub outcome: Result<Hit<'a, D>, Miss>,
}

impl<'a, D> Trace<'a, D> {
    /// The hit, if the lookup succeeded.
    pub fn hit(&self) -> Option<Hit<'a, D>> {
        self.outcome.ok()
    }

    /// True if the lookup found a point.
    pub fn is_found(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The node where the search ended.
    pub fn last(&self) -> Option<NodeId> {
        self.path.last().copied()
    }
}
