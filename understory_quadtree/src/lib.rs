// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Quadtree: a point quadtree with bounded leaves.
//!
//! Understory Quadtree indexes 2D points inside a fixed rectangular region.
//!
//! - Insert points with optional payloads; a leaf that outgrows its capacity splits into four
//!   equal quadrants.
//! - Query an axis-aligned range and learn both the matching points and every node the query
//!   touched.
//! - Look up a point by exact coordinates and get the path the search took.
//! - Locate the deepest region containing a coordinate, whether or not a point is stored there.
//!
//! Regions are half-open: a [`Rectangle`] covers `[x, x + w) × [y, y + h)`, so quadrants that
//! share an edge never both claim a point on it. Children are always tried in the fixed order
//! NW, NE, SW, SE.
//!
//! Nodes are addressed by [`NodeId`], a generational handle that stays valid for the node's whole
//! life. Renderers can keep the ids returned by one query (for example the visited set or a
//! located node) and read [`Node`] metadata for them later.
//!
//! ## Example
//!
//! ```rust
//! use understory_quadtree::{Quadtree, Rectangle};
//!
//! let mut tree: Quadtree<&str> = Quadtree::new(0.0, 0.0, 100.0, 100.0, 4)?;
//! tree.insert(10.0, 10.0, Some("a"));
//! tree.insert(60.0, 70.0, Some("b"));
//!
//! // Range query: points plus visited nodes.
//! let result = tree.query(&Rectangle::new(0.0, 0.0, 50.0, 50.0));
//! assert_eq!(result.len(), 1);
//! assert!(result.was_visited(tree.root()));
//!
//! // Exact lookup with path.
//! let trace = tree.find(60.0, 70.0);
//! assert_eq!(trace.hit().unwrap().point.data(), Some(&"b"));
//!
//! // Point location works on empty space too.
//! assert_eq!(tree.locate(99.0, 1.0), Some(tree.root()));
//! # Ok::<(), understory_quadtree::Error>(())
//! ```
//!
//! ## Anomalies
//!
//! Halving a boundary in floating point can leave a sliver at the right or bottom edge that the
//! parent contains but none of its quadrants do. Such coordinates are reported as
//! [`InsertError::BoundaryResidue`] and [`Miss::BoundaryResidue`], never conflated with an ordinary
//! miss, and logged through `tracing`. [`Quadtree::locate`] falls back to the enclosing node.
//!
//! ## Features
//!
//! - `std` *(default)*: enables `std` in dependencies and stamps each [`Point`] with the instant
//!   it was created.
//! - `libm`: math support for `no_std` builds through `kurbo`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod config;
mod error;
mod node;
mod query;
mod tree;
mod types;

pub use config::{DEFAULT_CAPACITY, QuadtreeConfig};
pub use error::{Error, InsertError};
pub use node::{Node, NodeId, NodeKind, Quadrant};
pub use query::{Hit, Miss, Path, RangeQuery, Trace};
pub use tree::{DepthFirst, Quadtree};
pub use types::{Point, PointKey, Rectangle};
