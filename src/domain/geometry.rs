// SPDX-License-Identifier: MPL-2.0
//! Geometry primitives for the three coordinate spaces the engine juggles.
//!
//! - **Image space**: pixels of the oriented source image, integral
//!   ([`PixelRect`]).
//! - **Logical space**: the content laid out at the current zoom divisor,
//!   pan-independent ([`Rect`], [`Size`]).
//! - **Viewport space**: relative to the top-left corner of the visible
//!   area, after pan and centering ([`Rect`], [`Point`]).

/// A position in logical or viewport space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn is_origin(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// Width and height in logical or viewport space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Returns true when either dimension has no extent.
    #[must_use]
    pub fn is_empty(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// An axis-aligned rectangle in logical or viewport space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    #[must_use]
    pub fn origin(self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    #[must_use]
    pub fn right(self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(self) -> f64 {
        self.y + self.height
    }

    /// Strict overlap test: rectangles that only share an edge do not
    /// intersect, and empty rectangles intersect nothing.
    #[must_use]
    pub fn intersects(self, other: Rect) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && other.width > 0.0
            && other.height > 0.0
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    #[must_use]
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// A rectangle in image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge, saturating instead of wrapping.
    #[must_use]
    pub fn right(self) -> u32 {
        self.x.saturating_add(self.width)
    }

    #[must_use]
    pub fn bottom(self) -> u32 {
        self.y.saturating_add(self.height)
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[must_use]
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Returns true when the rectangle lies inside a `width` x `height` image.
    #[must_use]
    pub fn fits_within(self, width: u32, height: u32) -> bool {
        self.right() <= width && self.bottom() <= height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_touching_rects_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(b));
        assert!(!b.intersects(a));
    }

    #[test]
    fn overlapping_rects_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(9.5, 9.5, 10.0, 10.0);
        assert!(a.intersects(b));
    }

    #[test]
    fn empty_rect_intersects_nothing() {
        let empty = Rect::new(5.0, 5.0, 0.0, 10.0);
        let big = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(!empty.intersects(big));
        assert!(!big.intersects(empty));
    }

    #[test]
    fn size_is_empty_handles_zero_and_negative() {
        assert!(Size::ZERO.is_empty());
        assert!(Size::new(-1.0, 10.0).is_empty());
        assert!(Size::new(10.0, f64::NAN).is_empty());
        assert!(!Size::new(1.0, 1.0).is_empty());
    }

    #[test]
    fn pixel_rect_edges_saturate() {
        let rect = PixelRect::new(u32::MAX - 1, 0, 10, 4);
        assert_eq!(rect.right(), u32::MAX);
        assert_eq!(rect.area(), 40);
        assert!(!rect.fits_within(100, 100));
        assert!(PixelRect::new(0, 0, 100, 100).fits_within(100, 100));
    }

    #[test]
    fn translated_moves_origin_only() {
        let rect = Rect::new(1.0, 2.0, 3.0, 4.0).translated(-1.0, 3.0);
        assert_eq!(rect, Rect::new(0.0, 5.0, 3.0, 4.0));
        assert_eq!(rect.size(), Size::new(3.0, 4.0));
    }
}
