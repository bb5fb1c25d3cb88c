// SPDX-License-Identifier: MPL-2.0
//! Pinch-zoom bridge.
//!
//! A [`GestureSession`] pins the image point that was under the fingers when
//! the pinch started and, for every move, solves for the zoom and pan that
//! keep it there. Pan that would leave the content is not clamped away but
//! carried as an overflow offset, which a [`Bounce`] eases back to rest once
//! the fingers lift.

use super::animator::{lerp, Timeline};
use crate::domain::{Point, Size, ZoomLimits, ZoomMode};
use std::time::Instant;

/// State kept from gesture start to gesture end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSession {
    start_zoom: f64,
    /// Image-space point pinned under the fingers.
    focal_image: Point,
    /// Last focal point, in viewport coordinates.
    focal_screen: Point,
    /// Out-of-bounds pan from the last move.
    overflow: Point,
}

/// Result of one gesture move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureMove {
    pub zoom: f64,
    pub target: Size,
    /// In-bounds part of the pan.
    pub pan: Point,
    pub focus: Point,
    /// Part of the pan that falls outside the content.
    pub overflow: Point,
}

/// How a released gesture comes to rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settle {
    pub zoom: f64,
    pub target: Size,
    /// New focus, or `None` to keep the current one.
    pub focus: Option<Point>,
    /// Offset the bounce ends on.
    pub offset_end: Point,
}

impl GestureSession {
    /// Starts a session at `focal` (viewport coordinates).
    ///
    /// `region_origin` is the image-space top-left of the visible region,
    /// `margin` the centering offset currently applied and `offset` any
    /// outstanding gesture offset.
    #[must_use]
    pub fn begin(
        zoom: f64,
        focal: Point,
        region_origin: Point,
        margin: Point,
        offset: Point,
    ) -> Self {
        let focal_image = Point::new(
            region_origin.x + (focal.x - margin.x + offset.x) * zoom,
            region_origin.y + (focal.y - margin.y + offset.y) * zoom,
        );
        tracing::debug!(zoom, x = focal_image.x, y = focal_image.y, "gesture started");
        Self {
            start_zoom: zoom,
            focal_image,
            focal_screen: focal,
            overflow: Point::ORIGIN,
        }
    }

    #[must_use]
    pub fn start_zoom(&self) -> f64 {
        self.start_zoom
    }

    #[must_use]
    pub fn focal_image(&self) -> Point {
        self.focal_image
    }

    #[must_use]
    pub fn overflow(&self) -> Point {
        self.overflow
    }

    /// Solves one pinch sample. A non-positive or non-finite `scale` counts
    /// as no scaling.
    pub fn track(
        &mut self,
        focal: Point,
        scale: f64,
        limits: &ZoomLimits,
        image: (u32, u32),
        viewport: Size,
    ) -> GestureMove {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        let zoom = limits.clamp(self.start_zoom / scale);
        let target = ZoomMode::Manual.resolve(image, viewport, zoom).size;

        let (pan_x, over_x) = split_axis(
            self.focal_image.x / zoom - focal.x,
            viewport.width,
            target.width,
        );
        let (pan_y, over_y) = split_axis(
            self.focal_image.y / zoom - focal.y,
            viewport.height,
            target.height,
        );
        let pan = Point::new(pan_x, pan_y);
        let overflow = Point::new(over_x, over_y);

        self.focal_screen = focal;
        self.overflow = overflow;

        GestureMove {
            zoom,
            target,
            pan,
            focus: focus_of(pan, viewport, target),
            overflow,
        }
    }

    /// Decides whether the released gesture needs a bounce.
    ///
    /// `content` is the content size the gesture left behind. Returns `None`
    /// when the content already covers the viewport with no overflow.
    #[must_use]
    pub fn settle(
        &self,
        zoom: f64,
        content: Size,
        image: (u32, u32),
        viewport: Size,
    ) -> Option<Settle> {
        let overflowing = !self.overflow.is_origin();
        let too_narrow = viewport.width > content.width;
        let too_short = viewport.height > content.height;
        if !overflowing && !too_narrow && !too_short {
            return None;
        }

        if too_narrow && too_short {
            let fit = ZoomMode::AutoFitIn.resolve(image, viewport, zoom);
            return Some(Settle {
                zoom: fit.zoom,
                target: fit.size,
                focus: None,
                offset_end: Point::new(
                    centered_offset(fit.size.width, viewport.width),
                    centered_offset(fit.size.height, viewport.height),
                ),
            });
        }

        let settle_axis = |focal_image: f64, focal_screen: f64, view: f64, size: f64| {
            let mut pan = (focal_image / zoom - focal_screen).max(0.0);
            let end = if view > size {
                centered_offset(size, view)
            } else {
                0.0
            };
            if pan + view > size {
                pan = size - view;
            }
            (pan, end)
        };
        let (pan_x, end_x) = settle_axis(
            self.focal_image.x,
            self.focal_screen.x,
            viewport.width,
            content.width,
        );
        let (pan_y, end_y) = settle_axis(
            self.focal_image.y,
            self.focal_screen.y,
            viewport.height,
            content.height,
        );

        Some(Settle {
            zoom,
            target: content,
            focus: Some(focus_of(Point::new(pan_x, pan_y), viewport, content)),
            offset_end: Point::new(end_x, end_y),
        })
    }
}

/// Splits a wanted pan into its in-bounds part and the overflow.
fn split_axis(wanted: f64, view: f64, size: f64) -> (f64, f64) {
    if wanted < 0.0 || view > size {
        (0.0, wanted)
    } else if wanted + view > size {
        (size - view, wanted + view - size)
    } else {
        (wanted, 0.0)
    }
}

/// Gesture offset matching the centering of content smaller than the view.
fn centered_offset(size: f64, view: f64) -> f64 {
    ((size - view) / 2.0).trunc()
}

fn focus_of(pan: Point, viewport: Size, content: Size) -> Point {
    let axis = |pan: f64, view: f64, size: f64| {
        if size > 0.0 {
            (pan + (view / 2.0).floor()) / size
        } else {
            0.5
        }
    };
    Point::new(
        axis(pan.x, viewport.width, content.width),
        axis(pan.y, viewport.height, content.height),
    )
}

/// Eases the gesture offset back to rest after release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounce {
    timeline: Timeline,
    start: Point,
    end: Point,
}

impl Bounce {
    #[must_use]
    pub fn new(timeline: Timeline, start: Point, end: Point) -> Self {
        Self {
            timeline,
            start,
            end,
        }
    }

    /// Offset at eased progress `t`.
    #[must_use]
    pub fn offset_at(&self, t: f64) -> Point {
        Point::new(
            lerp(self.start.x, self.end.x, t),
            lerp(self.start.y, self.end.y, t),
        )
    }

    /// Eased progress at `now`, anchoring the timeline on the first call.
    pub fn advance(&mut self, now: Instant) -> f64 {
        self.timeline.anchor(now);
        self.timeline.progress(now)
    }

    #[must_use]
    pub fn is_finished(&self, now: Instant) -> bool {
        self.timeline.is_finished(now)
    }
}
