// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use thiserror::Error;

use crate::types::{Point, Rectangle};

/// Errors raised while constructing a [`Quadtree`][crate::Quadtree].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    /// Leaves must be able to hold at least one point.
    #[error("invalid leaf capacity {0}: must be at least 1")]
    InvalidCapacity(usize),

    /// The root boundary must be finite with a strictly positive width and height.
    #[error("invalid root boundary {0}")]
    InvalidBoundary(Rectangle),
}

/// Why a point was not stored. The rejected point is handed back.
#[derive(Clone, Debug, Error)]
pub enum InsertError<D> {
    /// The point lies outside the root boundary. The tree is unchanged.
    #[error("point {0} lies outside the tree boundary")]
    OutOfBounds(Point<D>),

    /// The point lies inside a node's boundary yet none of its children accepted it.
    ///
    /// This means floating-point rounding left a sliver between the parent's
    /// boundary and its quadrants. The node may have been subdivided on the
    /// way, but no point was lost.
    #[error("point {0} fell between the quadrants of a subdivided node")]
    BoundaryResidue(Point<D>),
}

impl<D> InsertError<D> {
    /// Recover the rejected point.
    pub fn into_point(self) -> Point<D> {
        match self {
            Self::OutOfBounds(p) | Self::BoundaryResidue(p) => p,
        }
    }

    /// The rejected point.
    pub fn point(&self) -> &Point<D> {
        match self {
            Self::OutOfBounds(p) | Self::BoundaryResidue(p) => p,
        }
    }
}
