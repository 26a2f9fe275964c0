// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Construction options for a [`Quadtree`][crate::Quadtree].

/// Capacity used when none is given.
pub const DEFAULT_CAPACITY: usize = 4;

/// Options fixed at construction time.
///
/// ```
/// use understory_quadtree::{Quadtree, QuadtreeConfig, Rectangle};
///
/// let config = QuadtreeConfig::default().with_capacity(8).with_max_depth(12);
/// let tree: Quadtree = Quadtree::with_config(Rectangle::new(0.0, 0.0, 64.0, 64.0), config)?;
/// assert_eq!(tree.capacity(), 8);
/// # Ok::<(), understory_quadtree::Error>(())
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QuadtreeConfig {
    /// Maximum number of points a leaf holds before it subdivides. Must be at least 1.
    pub capacity: usize,
    /// Depth at which leaves stop subdividing.
    ///
    /// A leaf at this depth accepts points beyond `capacity` instead of
    /// splitting. `None` leaves subdivision unbounded, in which case many
    /// coincident points keep splitting until the boundary degenerates.
    pub max_depth: Option<u32>,
}

impl Default for QuadtreeConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_depth: None,
        }
    }
}

impl QuadtreeConfig {
    /// Set the per-leaf capacity.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Bound the depth of the tree.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Whether a leaf at `depth` is allowed to subdivide.
    pub(crate) fn may_subdivide(&self, depth: u32) -> bool {
        self.max_depth.is_none_or(|max| depth < max)
    }
}
