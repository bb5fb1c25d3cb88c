// SPDX-License-Identifier: MPL-2.0
//! Scroll state management
//!
//! A headless [`PannableSurface`]: tracks viewport size, content size and the
//! clamped pan offset. Hosts that own a real scrollable widget mirror its
//! values into this type or implement the trait themselves.

use crate::application::port::PannableSurface;
use crate::domain::{Point, Rect, Size};

/// Last region passed to [`PannableSurface::scroll_to`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollRequest {
    pub region: Rect,
    pub animated: bool,
}

/// Manages viewport and scroll state
#[derive(Debug, Clone, Default)]
pub struct ScrollState {
    /// Current scroll offset
    pub offset: Point,

    /// Previous scroll offset (for delta tracking)
    pub previous_offset: Point,

    viewport: Size,
    content: Size,
    frozen: bool,
    last_scroll: Option<ScrollRequest>,
}

impl ScrollState {
    #[must_use]
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    /// Updates the viewport size, re-clamping the offset.
    /// Returns true if the size changed.
    pub fn resize(&mut self, viewport: Size) -> bool {
        let changed = self.viewport != viewport;
        self.viewport = viewport;
        self.move_to(self.offset);
        changed
    }

    /// Applies a user drag. Ignored while frozen.
    /// Returns true if the offset moved.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> bool {
        if self.frozen {
            return false;
        }
        let before = self.offset;
        self.move_to(Point::new(self.offset.x + dx, self.offset.y + dy));
        self.offset != before
    }

    #[must_use]
    pub fn content_size(&self) -> Size {
        self.content
    }

    /// Largest offset that keeps the viewport inside the content.
    #[must_use]
    pub fn max_offset(&self) -> Point {
        Point::new(
            (self.content.width - self.viewport.width).max(0.0),
            (self.content.height - self.viewport.height).max(0.0),
        )
    }

    /// Checks if the content fits within the viewport.
    #[must_use]
    pub fn content_fits(&self) -> bool {
        self.content.width <= self.viewport.width && self.content.height <= self.viewport.height
    }

    #[must_use]
    pub fn last_scroll(&self) -> Option<ScrollRequest> {
        self.last_scroll
    }

    fn move_to(&mut self, position: Point) {
        let max = self.max_offset();
        self.previous_offset = self.offset;
        self.offset = Point::new(
            clamp_axis(position.x, max.x),
            clamp_axis(position.y, max.y),
        );
    }
}

fn clamp_axis(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max)
    }
}

/// Offset change along one axis that brings `[start, start + len)` into
/// `[offset, offset + view)` with the least movement.
fn reveal_axis(offset: f64, view: f64, start: f64, len: f64) -> f64 {
    if len >= view || start < offset {
        start
    } else if start + len > offset + view {
        start + len - view
    } else {
        offset
    }
}

impl PannableSurface for ScrollState {
    fn viewport_size(&self) -> Size {
        self.viewport
    }

    fn content_position(&self) -> Point {
        self.offset
    }

    fn set_content_position(&mut self, position: Point) {
        self.move_to(position);
    }

    fn set_content_size(&mut self, size: Size) {
        self.content = size;
        self.move_to(self.offset);
    }

    fn freeze(&mut self) {
        self.frozen = true;
    }

    fn unfreeze(&mut self) {
        self.frozen = false;
    }

    fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn scroll_to(&mut self, region: Rect, animated: bool) {
        self.last_scroll = Some(ScrollRequest { region, animated });
        let x = reveal_axis(self.offset.x, self.viewport.width, region.x, region.width);
        let y = reveal_axis(self.offset.y, self.viewport.height, region.y, region.height);
        self.move_to(Point::new(x, y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_abs_diff_eq;

    fn scroll_state() -> ScrollState {
        let mut state = ScrollState::new(Size::new(400.0, 300.0));
        state.set_content_size(Size::new(1000.0, 800.0));
        state
    }

    #[test]
    fn default_state_has_zero_offset() {
        let state = ScrollState::default();
        assert_abs_diff_eq!(state.offset.x, 0.0);
        assert_abs_diff_eq!(state.offset.y, 0.0);
        assert!(!state.is_frozen());
    }

    #[test]
    fn positions_are_clamped_to_content() {
        let mut state = scroll_state();
        state.set_content_position(Point::new(5000.0, -20.0));
        assert_eq!(state.content_position(), Point::new(600.0, 0.0));

        state.set_content_size(Size::new(500.0, 200.0));
        assert_eq!(state.content_position(), Point::new(100.0, 0.0));
    }

    #[test]
    fn pan_tracks_previous_offset() {
        let mut state = scroll_state();
        assert!(state.pan_by(10.0, 5.0));
        assert!(state.pan_by(10.0, 10.0));
        assert_eq!(state.previous_offset, Point::new(10.0, 5.0));
        assert_eq!(state.offset, Point::new(20.0, 15.0));
    }

    #[test]
    fn frozen_surface_ignores_user_pan() {
        let mut state = scroll_state();
        state.freeze();
        assert!(!state.pan_by(50.0, 50.0));
        assert!(state.offset.is_origin());

        // Programmatic moves still apply.
        state.set_content_position(Point::new(30.0, 40.0));
        assert_eq!(state.offset, Point::new(30.0, 40.0));
    }

    #[test]
    fn scroll_to_moves_minimally() {
        let mut state = scroll_state();
        state.scroll_to(Rect::new(350.0, 100.0, 100.0, 50.0), false);
        // Only x needs to move: right edge 450 must reach 400.
        assert_eq!(state.offset, Point::new(50.0, 0.0));

        state.scroll_to(Rect::new(10.0, 500.0, 20.0, 20.0), true);
        assert_eq!(state.offset, Point::new(10.0, 220.0));
        assert_eq!(state.last_scroll().map(|r| r.animated), Some(true));
    }

    #[test]
    fn oversized_region_aligns_to_its_origin() {
        let mut state = scroll_state();
        state.scroll_to(Rect::new(120.0, 90.0, 400.0, 300.0), false);
        assert_eq!(state.offset, Point::new(120.0, 90.0));
    }

    #[test]
    fn content_fits_when_smaller_than_viewport() {
        let mut state = scroll_state();
        assert!(!state.content_fits());
        state.set_content_size(Size::new(300.0, 300.0));
        assert!(state.content_fits());
        assert_eq!(state.max_offset(), Point::ORIGIN);
    }
}
