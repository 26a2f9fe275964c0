// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types: half-open rectangles and payload-carrying points.

use core::fmt;

#[cfg(feature = "std")]
use std::time::Instant;

/// Axis-aligned rectangle covering the half-open region `[x, x + w) × [y, y + h)`.
///
/// A coordinate lying exactly on the right or bottom edge is *not* contained,
/// so rectangles that share an edge never both claim a point on it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rectangle {
    /// Left edge (inclusive).
    pub x: f64,
    /// Top edge (inclusive).
    pub y: f64,
    /// Width.
    pub w: f64,
    /// Height.
    pub h: f64,
}

impl Rectangle {
    /// Create a rectangle from its origin and size.
    #[inline(always)]
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Area of the rectangle. Negative sizes yield zero.
    #[inline]
    pub fn area(&self) -> f64 {
        self.w.max(0.0) * self.h.max(0.0)
    }

    /// Whether the coordinate lies inside the half-open region.
    ///
    /// ```
    /// use understory_quadtree::Rectangle;
    ///
    /// let r = Rectangle::new(0.0, 0.0, 10.0, 10.0);
    /// assert!(r.contains_point(0.0, 0.0));
    /// assert!(r.contains_point(9.999, 9.999));
    /// assert!(!r.contains_point(10.0, 5.0));
    /// assert!(!r.contains_point(5.0, 10.0));
    /// ```
    #[inline]
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.x <= x && x < self.x + self.w && self.y <= y && y < self.y + self.h
    }

    /// Whether the point's coordinates lie inside the half-open region.
    #[inline]
    pub fn contains<D>(&self, point: &Point<D>) -> bool {
        self.contains_point(point.x, point.y)
    }

    /// Whether `other` overlaps this rectangle.
    ///
    /// Rectangles are separated when `other` lies entirely at or beyond one of
    /// this rectangle's edges. Consequently, rectangles that merely share an
    /// edge do not intersect, and neither does a zero-area rectangle placed on
    /// an edge.
    ///
    /// ```
    /// use understory_quadtree::Rectangle;
    ///
    /// let a = Rectangle::new(0.0, 0.0, 10.0, 10.0);
    /// assert!(a.intersects(&Rectangle::new(5.0, 5.0, 10.0, 10.0)));
    /// assert!(!a.intersects(&Rectangle::new(10.0, 0.0, 10.0, 10.0)));
    /// assert!(!a.intersects(&Rectangle::new(-10.0, 0.0, 10.0, 10.0)));
    /// ```
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        !(other.x >= self.x + self.w
            || other.x + other.w <= self.x
            || other.y >= self.y + self.h
            || other.y + other.h <= self.y)
    }

    /// The four half-size tiles of this rectangle, ordered NW, NE, SW, SE.
    ///
    /// Each tile has width `w / 2` and height `h / 2`; the eastern and southern
    /// tiles start at `x + w / 2` and `y + h / 2` respectively.
    pub fn quadrants(&self) -> [Self; 4] {
        let w = self.w / 2.0;
        let h = self.h / 2.0;
        [
            Self::new(self.x, self.y, w, h),
            Self::new(self.x + w, self.y, w, h),
            Self::new(self.x, self.y + h, w, h),
            Self::new(self.x + w, self.y + h, w, h),
        ]
    }

    /// True if every component is finite and both sides are strictly positive.
    pub(crate) fn is_well_formed(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.w.is_finite()
            && self.h.is_finite()
            && self.w > 0.0
            && self.h > 0.0
    }

    /// Convert a `kurbo` rectangle, normalizing inverted corners.
    pub fn from_kurbo(rect: kurbo::Rect) -> Self {
        let r = rect.abs();
        Self::new(r.x0, r.y0, r.width(), r.height())
    }

    /// Convert into a `kurbo` rectangle for drawing.
    pub fn to_kurbo(&self) -> kurbo::Rect {
        kurbo::Rect::new(self.x, self.y, self.right(), self.bottom())
    }
}

impl From<kurbo::Rect> for Rectangle {
    fn from(rect: kurbo::Rect) -> Self {
        Self::from_kurbo(rect)
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect[({:.0},{:.0}) W:{:.0} H:{:.0}]",
            self.x, self.y, self.w, self.h
        )
    }
}

/// A stored coordinate with an optional opaque payload.
///
/// Equality only considers `(x, y)`; the payload and creation stamp are
/// carried along but never compared. Points are immutable once built.
#[derive(Clone, Debug)]
pub struct Point<D = ()> {
    x: f64,
    y: f64,
    data: Option<D>,
    #[cfg(feature = "std")]
    created_at: Instant,
}

impl<D> Point<D> {
    /// Create a point without payload.
    pub fn new(x: f64, y: f64) -> Self {
        Self::build(x, y, None)
    }

    /// Create a point carrying `data`.
    pub fn with_data(x: f64, y: f64, data: D) -> Self {
        Self::build(x, y, Some(data))
    }

    pub(crate) fn build(x: f64, y: f64, data: Option<D>) -> Self {
        Self {
            x,
            y,
            data,
            #[cfg(feature = "std")]
            created_at: Instant::now(),
        }
    }

    /// Horizontal coordinate.
    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Vertical coordinate.
    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// The payload, if any.
    pub fn data(&self) -> Option<&D> {
        self.data.as_ref()
    }

    /// Consume the point, returning its payload.
    pub fn into_data(self) -> Option<D> {
        self.data
    }

    /// The instant this point was constructed.
    #[cfg(feature = "std")]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Position as a `kurbo` point.
    pub fn pos(&self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }

    /// Hashable key for this point's coordinates.
    pub fn key(&self) -> PointKey {
        PointKey::new(self.x, self.y)
    }
}

impl<D> PartialEq for Point<D> {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl<D> fmt::Display for Point<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Hashable identity of a coordinate pair.
///
/// Two keys are equal exactly when the coordinates compare equal with `==`;
/// `-0.0` and `0.0` map to the same key. Coordinates stored in a tree are never
/// NaN since no region contains NaN.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PointKey(u64, u64);

impl PointKey {
    /// Build a key from coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self(canonical_bits(x), canonical_bits(y))
    }

    /// Horizontal coordinate.
    pub fn x(self) -> f64 {
        f64::from_bits(self.0)
    }

    /// Vertical coordinate.
    pub fn y(self) -> f64 {
        f64::from_bits(self.1)
    }
}

fn canonical_bits(v: f64) -> u64 {
    // Fold negative zero into positive zero so `==` and the key agree.
    if v == 0.0 { 0.0_f64.to_bits() } else { v.to_bits() }
}
