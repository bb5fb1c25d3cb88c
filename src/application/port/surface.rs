// SPDX-License-Identifier: MPL-2.0
//! Scrollable surface port definition.
//!
//! The engine sizes the scrollable content and reads the pan offset back; it
//! never implements scrolling itself. Momentum, scrollbars and input routing
//! stay with the host.

use crate::domain::{Point, Rect, Size};

/// The scrollable container the viewer lives in.
///
/// Positions are the top-left corner of the visible area in logical content
/// coordinates.
pub trait PannableSurface {
    /// Size of the visible area.
    fn viewport_size(&self) -> Size;

    /// Current pan offset.
    fn content_position(&self) -> Point;

    /// Moves the pan offset; implementations clamp it to the content.
    fn set_content_position(&mut self, position: Point);

    /// Informs the surface of the logical content size.
    fn set_content_size(&mut self, size: Size);

    /// Stops user-driven panning, used while a gesture owns the pan.
    fn freeze(&mut self);

    fn unfreeze(&mut self);

    fn is_frozen(&self) -> bool;

    /// Scrolls the minimal amount that makes `region` visible.
    ///
    /// With `animated` set the surface may glide there instead of jumping.
    fn scroll_to(&mut self, region: Rect, animated: bool);
}
