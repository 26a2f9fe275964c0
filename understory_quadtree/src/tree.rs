// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: arena, insertion and subdivision, traversals.

use alloc::vec::Vec;
use core::fmt;
use core::mem;

use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::config::QuadtreeConfig;
use crate::error::{Error, InsertError};
use crate::node::{Node, NodeId, NodeKind, Quadrant};
use crate::query::{Hit, Miss, Path, RangeQuery, Trace};
use crate::types::{Point, Rectangle};

/// Point quadtree over a fixed rectangular region.
///
/// Leaves hold up to [`capacity`](Self::capacity) points. Inserting into a
/// full leaf subdivides it into four equal quadrants (NW, NE, SW, SE), moves
/// its points down, and turns it into an internal node. Nodes are never
/// removed or recreated, so a [`NodeId`] returned by one call keeps naming the
/// same region for later calls until [`Quadtree::clear`].
///
/// The type parameter `D` is the optional payload carried by each point.
///
/// ## Example
///
/// ```rust
/// use understory_quadtree::{Quadtree, Rectangle};
///
/// let mut tree: Quadtree = Quadtree::new(0.0, 0.0, 100.0, 100.0, 4)?;
/// for i in 1..=5 {
///     let c = f64::from(i) * 10.0;
///     assert!(tree.insert(c, c, None));
/// }
/// assert_eq!(tree.node_count(), 5);
/// assert_eq!(tree.depth(), 1);
///
/// let hits = tree.query(&Rectangle::new(0.0, 0.0, 51.0, 51.0));
/// assert_eq!(hits.len(), 5);
///
/// let trace = tree.find(30.0, 30.0);
/// assert!(trace.is_found());
/// assert_eq!(trace.path.len(), 2);
/// # Ok::<(), understory_quadtree::Error>(())
/// ```
pub struct Quadtree<D = ()> {
    /// Slot 0 is the root; children are appended as nodes subdivide.
    nodes: Vec<Node<D>>,
    generation: u32,
    boundary: Rectangle,
    config: QuadtreeConfig,
    len: usize,
}

impl<D> fmt::Debug for Quadtree<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Quadtree")
            .field("boundary", &self.boundary)
            .field("config", &self.config)
            .field("nodes", &self.nodes.len())
            .field("points", &self.len)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl<D> Quadtree<D> {
    /// Create a tree covering `[x, x + width) × [y, y + height)` with the given leaf capacity.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCapacity`] if `capacity` is 0, and
    /// [`Error::InvalidBoundary`] if the region is not finite with positive size.
    pub fn new(x: f64, y: f64, width: f64, height: f64, capacity: usize) -> Result<Self, Error> {
        Self::with_config(
            Rectangle::new(x, y, width, height),
            QuadtreeConfig::default().with_capacity(capacity),
        )
    }

    /// Create a tree covering `boundary` with explicit options.
    ///
    /// # Errors
    ///
    /// See [`Quadtree::new`].
    pub fn with_config(boundary: Rectangle, config: QuadtreeConfig) -> Result<Self, Error> {
        if config.capacity == 0 {
            return Err(Error::InvalidCapacity(config.capacity));
        }
        if !boundary.is_well_formed() {
            return Err(Error::InvalidBoundary(boundary));
        }
        let mut nodes = Vec::new();
        nodes.push(Node::leaf(boundary, 0));
        Ok(Self {
            nodes,
            generation: 1,
            boundary,
            config,
            len: 0,
        })
    }

    /// Region covered by the root.
    pub fn boundary(&self) -> Rectangle {
        self.boundary
    }

    /// Maximum number of points per leaf before it subdivides.
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Options the tree was built with.
    pub fn config(&self) -> QuadtreeConfig {
        self.config
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no point is stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Handle of the root node.
    pub fn root(&self) -> NodeId {
        NodeId::new(0, self.generation)
    }

    /// Returns true if `id` refers to a node of this tree's current generation.
    pub fn is_alive(&self, id: NodeId) -> bool {
        id.generation() == self.generation && id.idx() < self.nodes.len()
    }

    /// Read-only view of a node, or `None` for stale identifiers.
    pub fn node(&self, id: NodeId) -> Option<&Node<D>> {
        if !self.is_alive(id) {
            return None;
        }
        self.nodes.get(id.idx())
    }

    /// Drop every point and node and start over with an empty root.
    ///
    /// Boundary and options are kept. Identifiers handed out before the call
    /// become stale.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(Node::leaf(self.boundary, 0));
        self.generation = self.generation.wrapping_add(1);
        self.len = 0;
    }

    /// Node at an identifier minted by this tree in the current generation.
    #[inline]
    fn get(&self, id: NodeId) -> &Node<D> {
        &self.nodes[id.idx()]
    }

    fn alloc(&mut self, node: Node<D>) -> NodeId {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId uses 32-bit indices by design."
        )]
        let id = NodeId::new(self.nodes.len() as u32, self.generation);
        self.nodes.push(node);
        id
    }
}

impl<D> Quadtree<D> {
    /// Insert a point at `(x, y)` carrying an optional payload.
    ///
    /// Returns `false` if the coordinate is outside the tree, or if rounding
    /// left it between a node's quadrants. See [`Quadtree::try_insert`] to tell
    /// the two apart and to get the point back.
    pub fn insert(&mut self, x: f64, y: f64, data: Option<D>) -> bool {
        self.try_insert(Point::build(x, y, data)).is_ok()
    }

    /// Insert an existing point.
    pub fn insert_point(&mut self, point: Point<D>) -> bool {
        self.try_insert(point).is_ok()
    }

    /// Insert a point, returning the leaf that stored it.
    ///
    /// Starting at the root, a leaf with room appends the point. A full leaf
    /// first subdivides, moving its points into the new quadrants, and then
    /// the point is offered to the children in NW, NE, SW, SE order; the first
    /// to accept it keeps it. Points on a shared quadrant edge therefore land
    /// in exactly one child, the one whose half-open region includes them.
    ///
    /// # Errors
    ///
    /// [`InsertError::OutOfBounds`] if the point is outside the root; nothing
    /// changes. [`InsertError::BoundaryResidue`] if some node contains the
    /// point but none of its quadrants do.
    pub fn try_insert(&mut self, point: Point<D>) -> Result<NodeId, InsertError<D>> {
        let result = self.insert_into(self.root(), point);
        match &result {
            Ok(_) => self.len += 1,
            Err(InsertError::OutOfBounds(p)) => {
                trace!(x = p.x(), y = p.y(), "rejected point outside tree boundary");
            }
            Err(InsertError::BoundaryResidue(p)) => {
                warn!(
                    x = p.x(),
                    y = p.y(),
                    "point inside a node boundary was rejected by every quadrant"
                );
            }
        }
        result
    }

    fn insert_into(&mut self, id: NodeId, point: Point<D>) -> Result<NodeId, InsertError<D>> {
        let capacity = self.config.capacity;
        let node = &mut self.nodes[id.idx()];
        if !node.boundary.contains(&point) {
            return Err(InsertError::OutOfBounds(point));
        }
        let may_subdivide = self.config.may_subdivide(node.depth);
        let children = match &mut node.kind {
            NodeKind::Leaf(points) if points.len() < capacity || !may_subdivide => {
                points.push(point);
                return Ok(id);
            }
            NodeKind::Leaf(points) => {
                let points = mem::take(points);
                self.subdivide(id, points)
            }
            NodeKind::Internal(children) => *children,
        };
        self.insert_into_children(children, point)
    }

    /// Offer `point` to each child in order; `BoundaryResidue` if none accepts it.
    fn insert_into_children(
        &mut self,
        children: [NodeId; 4],
        mut point: Point<D>,
    ) -> Result<NodeId, InsertError<D>> {
        for child in children {
            match self.insert_into(child, point) {
                Ok(leaf) => return Ok(leaf),
                Err(InsertError::OutOfBounds(p)) => point = p,
                Err(residue) => return Err(residue),
            }
        }
        Err(InsertError::BoundaryResidue(point))
    }

    /// Split the leaf `id`, whose buffer was taken as `points`, into four quadrants.
    fn subdivide(&mut self, id: NodeId, points: Vec<Point<D>>) -> [NodeId; 4] {
        let Node {
            boundary, depth, ..
        } = *self.get(id);
        let children = boundary
            .quadrants()
            .map(|tile| self.alloc(Node::leaf(tile, depth + 1)));
        self.nodes[id.idx()].kind = NodeKind::Internal(children);
        debug!(
            node = id.0,
            depth,
            points = points.len(),
            "subdivided node"
        );

        for point in points {
            let Err(err) = self.insert_into_children(children, point) else {
                continue;
            };
            // The point was inside `boundary`, so keep it in the quadrant the
            // midpoint picks even though that quadrant's boundary misses it.
            let point = err.into_point();
            let quadrant = Quadrant::by_midpoint(&boundary, point.x(), point.y());
            warn!(
                x = point.x(),
                y = point.y(),
                ?quadrant,
                "redistributed point fell between quadrants; placing by midpoint"
            );
            let slot = children[quadrant as usize];
            // Fresh quadrants receive at most `capacity` points, so they are still leaves.
            debug_assert!(!self.get(slot).is_divided(), "fresh quadrant already divided");
            if let NodeKind::Leaf(buf) = &mut self.nodes[slot.idx()].kind {
                buf.push(point);
            }
        }
        children
    }
}

impl<D> Quadtree<D> {
    /// Collect every point inside `range` along with the leaf holding it.
    ///
    /// Nodes whose boundary does not [intersect](Rectangle::intersects) the
    /// range are pruned. Every other node is recorded in
    /// [`RangeQuery::visited`], so callers can show which regions a query
    /// touched. Matching is done with [`Rectangle::contains`], so points on the
    /// range's right or bottom edge are excluded.
    pub fn query(&self, range: &Rectangle) -> RangeQuery<'_, D> {
        let mut out = RangeQuery::default();
        let RangeQuery { found, visited } = &mut out;
        self.visit_range(
            range,
            |id| {
                visited.insert(id);
            },
            |hit| {
                found.entry(hit.point.key()).or_insert(hit);
            },
        );
        out
    }

    /// Visit the range query without allocating result storage.
    ///
    /// Calls `on_node` for every node whose boundary intersects `range` and
    /// `on_hit` for every point inside `range`, depth-first in NW, NE, SW, SE
    /// order. A node is reported before its children and its points.
    pub fn visit_range<'a, V, F>(&'a self, range: &Rectangle, mut on_node: V, mut on_hit: F)
    where
        V: FnMut(NodeId),
        F: FnMut(Hit<'a, D>),
    {
        self.visit_range_from(self.root(), range, &mut on_node, &mut on_hit);
    }

    fn visit_range_from<'a, V, F>(
        &'a self,
        id: NodeId,
        range: &Rectangle,
        on_node: &mut V,
        on_hit: &mut F,
    ) where
        V: FnMut(NodeId),
        F: FnMut(Hit<'a, D>),
    {
        let node = self.get(id);
        if !node.boundary.intersects(range) {
            return;
        }
        on_node(id);
        match &node.kind {
            NodeKind::Leaf(points) => {
                for point in points.iter().filter(|p| range.contains(*p)) {
                    on_hit(Hit { point, leaf: id });
                }
            }
            NodeKind::Internal(children) => {
                for &child in children {
                    self.visit_range_from(child, range, on_node, on_hit);
                }
            }
        }
    }

    /// Look up the point stored exactly at `(x, y)`, recording the search path.
    ///
    /// The search descends through the single child containing the coordinate
    /// at each level, so it costs one step per level. The path always starts at
    /// the root and ends at the node where the search stopped, found or not.
    /// Payloads play no part in matching.
    pub fn find(&self, x: f64, y: f64) -> Trace<'_, D> {
        let (mut path, outcome) = self.find_from(self.root(), x, y);
        // Built leaf-first on the way back up.
        path.reverse();
        Trace { path, outcome }
    }

    /// Look up the point stored at `target`'s coordinates.
    pub fn find_point<E>(&self, target: &Point<E>) -> Trace<'_, D> {
        self.find(target.x(), target.y())
    }

    fn find_from(&self, id: NodeId, x: f64, y: f64) -> (Path, Result<Hit<'_, D>, Miss>) {
        let node = self.get(id);
        let outcome = if !node.boundary.contains_point(x, y) {
            Err(Miss::OutOfBounds)
        } else {
            match &node.kind {
                NodeKind::Leaf(points) => points
                    .iter()
                    .find(|p| p.x() == x && p.y() == y)
                    .map(|point| Hit { point, leaf: id })
                    .ok_or(Miss::Absent),
                NodeKind::Internal(children) => match self.child_containing(children, x, y) {
                    Some(child) => {
                        let (mut path, outcome) = self.find_from(child, x, y);
                        path.push(id);
                        return (path, outcome);
                    }
                    None => {
                        warn!(x, y, depth = node.depth, "lookup fell between quadrants");
                        Err(Miss::BoundaryResidue)
                    }
                },
            }
        };
        let mut path = Path::new();
        path.push(id);
        (path, outcome)
    }

    /// The deepest node whose boundary contains `(x, y)`, whether or not a point is stored there.
    ///
    /// Returns `None` outside the tree. If rounding leaves the coordinate
    /// between the quadrants of a subdivided node, that node itself is
    /// returned: hover feedback should land on some enclosing region rather
    /// than nothing.
    pub fn locate(&self, x: f64, y: f64) -> Option<NodeId> {
        let mut id = self.root();
        if !self.get(id).boundary.contains_point(x, y) {
            return None;
        }
        loop {
            let node = self.get(id);
            match &node.kind {
                NodeKind::Leaf(_) => return Some(id),
                NodeKind::Internal(children) => match self.child_containing(children, x, y) {
                    Some(child) => id = child,
                    None => {
                        warn!(x, y, depth = node.depth, "location fell between quadrants");
                        return Some(id);
                    }
                },
            }
        }
    }

    fn child_containing(&self, children: &[NodeId; 4], x: f64, y: f64) -> Option<NodeId> {
        children
            .iter()
            .copied()
            .find(|&child| self.get(child).boundary.contains_point(x, y))
    }
}

impl<D> Quadtree<D> {
    /// Iterate all nodes depth-first (pre-order), children in NW, NE, SW, SE order.
    pub fn nodes_depth_first(&self) -> DepthFirst<'_, D> {
        self.subtree(self.root())
    }

    /// Iterate `id` and its descendants depth-first (pre-order).
    ///
    /// Yields nothing for stale identifiers.
    pub fn subtree(&self, id: NodeId) -> DepthFirst<'_, D> {
        let mut stack = SmallVec::new();
        if self.is_alive(id) {
            stack.push(id);
        }
        DepthFirst { tree: self, stack }
    }

    /// Whether `pred` holds for `id` or any of its descendants.
    ///
    /// Renderers use this to emphasize the branches leading to highlighted nodes.
    pub fn any_in_subtree<F>(&self, id: NodeId, mut pred: F) -> bool
    where
        F: FnMut(NodeId) -> bool,
    {
        self.subtree(id).any(|(n, _)| pred(n))
    }

    /// Points held under `id`, in pre-order: a node's own points before its children's.
    pub fn collect_points(&self, id: NodeId) -> Vec<&Point<D>> {
        self.subtree(id).flat_map(|(_, n)| n.points()).collect()
    }

    /// Depth of the deepest leaf under `id`, or `None` for stale identifiers.
    pub fn subtree_depth(&self, id: NodeId) -> Option<u32> {
        self.subtree(id)
            .filter(|(_, n)| !n.is_divided())
            .map(|(_, n)| n.depth)
            .max()
    }

    /// Number of nodes under `id`, itself included; 0 for stale identifiers.
    pub fn subtree_node_count(&self, id: NodeId) -> usize {
        self.subtree(id).count()
    }

    /// Every stored point in pre-order.
    pub fn all_points(&self) -> Vec<&Point<D>> {
        self.collect_points(self.root())
    }

    /// Depth of the deepest leaf; 0 while the root is undivided.
    pub fn depth(&self) -> u32 {
        self.subtree_depth(self.root()).unwrap_or(0)
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        // Every arena slot is reachable from the root.
        self.nodes.len()
    }
}

/// Pre-order iterator over a subtree, returned by [`Quadtree::subtree`].
#[derive(Debug)]
pub struct DepthFirst<'a, D> {
    tree: &'a Quadtree<D>,
    stack: SmallVec<[NodeId; 16]>,
}

impl<'a, D> Iterator for DepthFirst<'a, D> {
    type Item = (NodeId, &'a Node<D>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.get(id);
        if let NodeKind::Internal(children) = &node.kind {
            // Reversed so NW comes off the stack first.
            self.stack.extend(children.iter().rev().copied());
        }
        Some((id, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PointKey;
    use alloc::vec;
    use hashbrown::HashSet;
    use rand::{Rng, SeedableRng};

    fn scenario_tree() -> Quadtree<u32> {
        let mut tree = Quadtree::new(0.0, 0.0, 100.0, 100.0, 4).unwrap();
        for (i, c) in [10.0, 20.0, 30.0, 40.0].into_iter().enumerate() {
            assert!(tree.insert(c, c, Some(i as u32)));
        }
        tree
    }

    #[test]
    fn scenario_subdivides_on_fifth_point() {
        let mut tree = scenario_tree();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.depth(), 0);
        assert!(!tree.node(tree.root()).unwrap().is_divided());

        assert!(tree.insert(50.0, 50.0, Some(4)));
        assert_eq!(tree.node_count(), 5);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.all_points().len(), 5);
        assert_eq!(tree.len(), 5);

        let root = tree.node(tree.root()).unwrap();
        assert!(root.is_divided());
        assert!(root.points().is_empty());

        let all = tree.query(&Rectangle::new(0.0, 0.0, 51.0, 51.0));
        assert_eq!(all.len(), 5);

        let none = tree.query(&Rectangle::new(60.0, 60.0, 10.0, 10.0));
        assert!(none.is_empty());
        let se = root.child(Quadrant::SouthEast).unwrap();
        let expected: HashSet<NodeId> = [tree.root(), se].into_iter().collect();
        assert_eq!(none.visited, expected);
    }

    #[test]
    fn capacity_law_keeps_leaf_until_overflow() {
        for capacity in 1..6 {
            let mut tree: Quadtree = Quadtree::new(0.0, 0.0, 64.0, 64.0, capacity).unwrap();
            for i in 0..capacity {
                let c = 1.0 + i as f64 * 7.0;
                assert!(tree.insert(c, 60.0 - c, None));
            }
            assert_eq!(tree.node_count(), 1);
            let before = tree.all_points().len();

            assert!(tree.insert(33.0, 33.0, None));
            // Every quadrant ends up with at most `capacity` points, so no cascade.
            assert_eq!(tree.node_count(), 5);
            assert_eq!(tree.depth(), 1);
            assert_eq!(tree.all_points().len(), before + 1);
            assert!(tree.node(tree.root()).unwrap().points().is_empty());
        }
    }

    #[test]
    fn redistribution_keeps_payloads() {
        let mut tree = scenario_tree();
        assert!(tree.insert(90.0, 90.0, Some(99)));
        let mut payloads: Vec<u32> = tree
            .all_points()
            .into_iter()
            .filter_map(|p| p.data().copied())
            .collect();
        payloads.sort_unstable();
        assert_eq!(payloads, vec![0, 1, 2, 3, 99]);
    }

    #[test]
    fn points_on_quadrant_edges_go_to_the_first_accepting_child() {
        let mut tree: Quadtree = Quadtree::new(0.0, 0.0, 100.0, 100.0, 1).unwrap();
        assert!(tree.insert(0.0, 0.0, None));
        // (50, 50) is the shared corner of all four quadrants; only SE contains it.
        let leaf = tree.try_insert(Point::new(50.0, 50.0)).unwrap();
        let root = tree.node(tree.root()).unwrap();
        assert_eq!(Some(leaf), root.child(Quadrant::SouthEast));
        // (50, 10) sits on the NW/NE edge; NE contains it.
        let leaf = tree.try_insert(Point::new(50.0, 10.0)).unwrap();
        let ne = tree.node(tree.root()).unwrap().child(Quadrant::NorthEast);
        assert_eq!(Some(leaf), ne);
    }

    #[test]
    fn out_of_bounds_leaves_tree_untouched() {
        let mut tree = scenario_tree();
        for (x, y) in [(100.0, 50.0), (50.0, 100.0), (-0.1, 5.0), (f64::NAN, 1.0)] {
            let err = tree.try_insert(Point::with_data(x, y, 7)).unwrap_err();
            assert!(matches!(err, InsertError::OutOfBounds(_)));
            assert_eq!(err.into_point().into_data(), Some(7));
        }
        assert!(!tree.insert(200.0, 200.0, None));
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn construction_is_validated() {
        assert_eq!(
            Quadtree::<()>::new(0.0, 0.0, 10.0, 10.0, 0).unwrap_err(),
            Error::InvalidCapacity(0)
        );
        for (w, h) in [(0.0, 10.0), (10.0, -1.0), (f64::INFINITY, 1.0), (f64::NAN, 1.0)] {
            let err = Quadtree::<()>::new(0.0, 0.0, w, h, 4).unwrap_err();
            assert!(matches!(err, Error::InvalidBoundary(_)));
        }
        assert!(Quadtree::<()>::new(f64::NAN, 0.0, 1.0, 1.0, 4).is_err());
    }

    #[test]
    fn find_round_trips_every_inserted_point() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut tree = Quadtree::new(-50.0, -50.0, 100.0, 100.0, 3).unwrap();
        let mut coords = Vec::new();
        for i in 0..400_u32 {
            let x = rng.random_range(-50.0..50.0);
            let y = rng.random_range(-50.0..50.0);
            assert!(tree.insert(x, y, Some(i)));
            coords.push((x, y));
        }
        for &(x, y) in &coords {
            let trace = tree.find(x, y);
            let hit = trace.hit().expect("inserted point is found");
            assert_eq!((hit.point.x(), hit.point.y()), (x, y));
            let leaf = tree.node(hit.leaf).unwrap();
            assert!(!leaf.is_divided());
            assert!(leaf.points().iter().any(|p| p == hit.point));
            assert_eq!(trace.path[0], tree.root());
            assert_eq!(trace.last(), Some(hit.leaf));
            assert_eq!(trace.path.len() as u32, leaf.depth() + 1);
        }
    }

    #[test]
    fn find_records_path_on_miss() {
        let mut tree = scenario_tree();
        assert!(tree.insert(50.0, 50.0, None));

        let trace = tree.find(75.0, 75.0);
        assert_eq!(trace.outcome.unwrap_err(), Miss::Absent);
        let se = tree
            .node(tree.root())
            .unwrap()
            .child(Quadrant::SouthEast)
            .unwrap();
        assert_eq!(trace.path.as_slice(), &[tree.root(), se]);

        let outside = tree.find(150.0, 0.0);
        assert_eq!(outside.outcome.unwrap_err(), Miss::OutOfBounds);
        assert_eq!(outside.path.as_slice(), &[tree.root()]);

        let empty: Quadtree = Quadtree::new(0.0, 0.0, 1.0, 1.0, 1).unwrap();
        assert_eq!(empty.find(0.5, 0.5).outcome.unwrap_err(), Miss::Absent);
    }

    #[test]
    fn find_ignores_payload() {
        let tree = scenario_tree();
        let trace = tree.find_point(&Point::with_data(20.0, 20.0, "probe"));
        assert_eq!(trace.hit().unwrap().point.data(), Some(&1));
    }

    #[test]
    fn range_query_matches_brute_force() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        for round in 0..20 {
            let mut tree: Quadtree<usize> =
                Quadtree::new(0.0, 0.0, 1000.0, 1000.0, 1 + round % 5).unwrap();
            let mut inserted = Vec::new();
            for i in 0..300 {
                let x = rng.random_range(0.0..1000.0);
                let y = rng.random_range(0.0..1000.0);
                assert!(tree.insert(x, y, Some(i)));
                inserted.push((x, y));
            }
            let range = Rectangle::new(
                rng.random_range(-100.0..900.0),
                rng.random_range(-100.0..900.0),
                rng.random_range(0.0..400.0),
                rng.random_range(0.0..400.0),
            );
            let result = tree.query(&range);
            let expected: HashSet<PointKey> = inserted
                .iter()
                .filter(|&&(x, y)| range.contains_point(x, y))
                .map(|&(x, y)| PointKey::new(x, y))
                .collect();
            let actual: HashSet<PointKey> = result.found.keys().copied().collect();
            assert_eq!(actual, expected, "round {round}, range {range}");

            for (key, hit) in &result.found {
                assert_eq!(hit.point.key(), *key);
                assert!(result.was_visited(hit.leaf));
                assert!(tree.node(hit.leaf).unwrap().points().contains(hit.point));
            }
            for &id in &result.visited {
                assert!(tree.node(id).unwrap().boundary().intersects(&range));
            }
        }
    }

    #[test]
    fn range_query_collapses_duplicate_coordinates_to_first_seen() {
        let mut tree: Quadtree<&str> = Quadtree::new(0.0, 0.0, 10.0, 10.0, 4).unwrap();
        assert!(tree.insert(5.0, 5.0, Some("first")));
        assert!(tree.insert(5.0, 5.0, Some("second")));
        let result = tree.query(&Rectangle::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(result.len(), 1);
        assert_eq!(result.get(5.0, 5.0).unwrap().point.data(), Some(&"first"));
    }

    #[test]
    fn degenerate_range_is_empty_but_visits() {
        let tree = scenario_tree();
        let result = tree.query(&Rectangle::new(10.0, 10.0, 0.0, 0.0));
        assert!(result.is_empty());
        assert!(result.was_visited(tree.root()));
    }

    #[test]
    fn visit_range_reports_nodes_before_children() {
        let mut tree = scenario_tree();
        assert!(tree.insert(50.0, 50.0, None));
        let mut order = Vec::new();
        let mut hits = 0;
        tree.visit_range(
            &Rectangle::new(0.0, 0.0, 100.0, 100.0),
            |id| order.push(id),
            |_| hits += 1,
        );
        let preorder: Vec<NodeId> = tree.nodes_depth_first().map(|(id, _)| id).collect();
        assert_eq!(order, preorder);
        assert_eq!(hits, 5);
    }

    #[test]
    fn locate_returns_deepest_region() {
        let mut tree = scenario_tree();
        assert!(tree.insert(50.0, 50.0, None));
        let root = tree.node(tree.root()).unwrap();
        let nw = root.child(Quadrant::NorthWest).unwrap();
        let se = root.child(Quadrant::SouthEast).unwrap();

        assert_eq!(tree.locate(1.0, 1.0), Some(nw));
        // No point is stored here, but the region still exists.
        assert_eq!(tree.locate(99.0, 99.0), Some(se));
        assert_eq!(tree.locate(100.0, 1.0), None);

        let single: Quadtree = Quadtree::new(0.0, 0.0, 10.0, 10.0, 2).unwrap();
        assert_eq!(single.locate(3.0, 3.0), Some(single.root()));
    }

    #[test]
    fn depth_and_count_track_subdivisions() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let mut tree: Quadtree = Quadtree::new(0.0, 0.0, 256.0, 256.0, 2).unwrap();
        for _ in 0..500 {
            let x = rng.random_range(0.0..256.0);
            let y = rng.random_range(0.0..64.0);
            assert!(tree.insert(x, y, None));

            let subdivisions = tree.nodes_depth_first().filter(|(_, n)| n.is_divided()).count();
            assert_eq!(tree.node_count(), 1 + 4 * subdivisions);
            assert_eq!(tree.subtree_node_count(tree.root()), tree.node_count());
            assert!(tree.depth() as usize <= subdivisions);
        }
        for (id, node) in tree.nodes_depth_first() {
            if let Some(children) = node.children() {
                for child in children {
                    assert_eq!(tree.node(child).unwrap().depth(), node.depth() + 1);
                }
                let tiles = node.boundary().quadrants();
                for (child, tile) in children.iter().zip(tiles) {
                    assert_eq!(tree.node(*child).unwrap().boundary(), tile);
                }
            } else {
                assert!(node.points().len() <= tree.capacity(), "leaf {id:?} overflowed");
            }
        }
    }

    #[test]
    fn subtree_aggregates() {
        let mut tree = scenario_tree();
        assert!(tree.insert(50.0, 50.0, Some(4)));
        let nw = tree
            .node(tree.root())
            .unwrap()
            .child(Quadrant::NorthWest)
            .unwrap();
        assert_eq!(tree.subtree_node_count(nw), 1);
        assert_eq!(tree.subtree_depth(nw), Some(1));
        assert_eq!(tree.collect_points(nw).len(), 4);
        assert!(tree.any_in_subtree(tree.root(), |id| id == nw));
        assert!(!tree.any_in_subtree(nw, |id| id == tree.root()));
    }

    #[test]
    fn clear_resets_and_stales_handles() {
        let mut tree = scenario_tree();
        assert!(tree.insert(50.0, 50.0, None));
        let old_root = tree.root();
        let old_leaf = tree.locate(1.0, 1.0).unwrap();

        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.boundary(), Rectangle::new(0.0, 0.0, 100.0, 100.0));
        assert!(!tree.is_alive(old_root));
        assert!(!tree.is_alive(old_leaf));
        assert!(tree.node(old_leaf).is_none());
        assert_eq!(tree.subtree(old_root).count(), 0);
        assert_eq!(tree.subtree_depth(old_root), None);
        assert!(tree.is_alive(tree.root()));
        assert!(tree.insert(1.0, 1.0, None));
    }

    #[test]
    fn max_depth_bounds_coincident_points() {
        let config = QuadtreeConfig::default().with_capacity(1).with_max_depth(3);
        let mut tree: Quadtree =
            Quadtree::with_config(Rectangle::new(0.0, 0.0, 8.0, 8.0), config).unwrap();
        for _ in 0..10 {
            assert!(tree.insert(1.0, 1.0, None));
        }
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.node_count(), 1 + 4 * 3);
        let leaf = tree.locate(1.0, 1.0).unwrap();
        assert_eq!(tree.node(leaf).unwrap().points().len(), 10);
        assert_eq!(tree.all_points().len(), 10);
    }

    #[test]
    fn unbounded_coincident_points_end_in_residue() {
        let mut tree: Quadtree = Quadtree::new(0.0, 0.0, 1.0, 1.0, 1).unwrap();
        assert!(tree.insert(0.25, 0.25, None));
        // Quadrants keep halving until their width underflows to zero and no
        // child can contain the point any more.
        let err = tree.try_insert(Point::new(0.25, 0.25)).unwrap_err();
        assert!(matches!(err, InsertError::BoundaryResidue(_)));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.all_points().len(), 1);
    }

    // 0.1 + 1.3 rounds up to 1.4000000000000001 while the eastern quadrant
    // ends at 0.75 + 0.65 == 1.4, leaving x == 1.4 inside the root but outside
    // every quadrant.
    fn residue_tree() -> Quadtree {
        Quadtree::new(0.1, 0.0, 1.3, 1.0, 1).unwrap()
    }

    #[test]
    fn residue_on_insert_is_distinct_from_out_of_bounds() {
        let mut tree = residue_tree();
        assert!(tree.boundary().contains_point(1.4, 0.2));
        assert!(tree.insert(0.2, 0.2, None));
        let err = tree.try_insert(Point::new(1.4, 0.2)).unwrap_err();
        assert!(matches!(err, InsertError::BoundaryResidue(_)));
        assert_eq!(tree.len(), 1);

        let trace = tree.find(1.4, 0.2);
        assert_eq!(trace.outcome.unwrap_err(), Miss::BoundaryResidue);
        assert_eq!(trace.path.as_slice(), &[tree.root()]);

        // Point location falls back to the enclosing node.
        assert_eq!(tree.locate(1.4, 0.2), Some(tree.root()));
    }

    #[test]
    fn residue_during_redistribution_loses_nothing() {
        let mut tree = residue_tree();
        assert!(tree.insert(1.4, 0.2, None));
        assert!(tree.insert(0.2, 0.2, None));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.all_points().len(), 2);

        let ne = tree
            .node(tree.root())
            .unwrap()
            .child(Quadrant::NorthEast)
            .unwrap();
        assert_eq!(tree.collect_points(ne).len(), 1);
        assert!(!tree.node(ne).unwrap().is_divided());
        assert_eq!(tree.node_count(), 5);
        let found = tree.query(&Rectangle::new(0.0, 0.0, 2.0, 2.0));
        assert_eq!(found.get(1.4, 0.2).map(|h| h.leaf), Some(ne));
    }

    #[test]
    fn debug_is_concise() {
        let tree = scenario_tree();
        let s = alloc::format!("{tree:?}");
        assert!(s.starts_with("Quadtree {"));
        assert!(s.contains("points: 4"));
    }
}
