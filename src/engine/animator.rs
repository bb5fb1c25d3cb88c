// SPDX-License-Identifier: MPL-2.0
//! Eased zoom transitions.
//!
//! A transition interpolates the logical content size from where it was
//! when the zoom changed to the size the zoom mode asks for, keeping the
//! image point under the viewport center (the normalized focus) in place.

use crate::domain::{Point, Size};
use std::time::{Duration, Instant};

/// Ease-out curve `1 - (1 - t)²`, with `t` clamped to `[0, 1]`.
#[must_use]
pub fn ease_out(t: f64) -> f64 {
    let t = if t.is_nan() { 1.0 } else { t.clamp(0.0, 1.0) };
    let inv = 1.0 - t;
    1.0 - inv * inv
}

#[must_use]
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from * (1.0 - t) + to * t
}

/// A transition of fixed length.
///
/// A timeline built with [`Timeline::new`] is not yet anchored: it reads as
/// progress 0 until [`Timeline::anchor`] pins its start to the first frame
/// after it began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeline {
    start: Option<Instant>,
    duration: Duration,
}

impl Timeline {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            start: None,
            duration,
        }
    }

    #[must_use]
    pub fn starting_at(start: Instant, duration: Duration) -> Self {
        Self {
            start: Some(start),
            duration,
        }
    }

    /// Pins the start to `now` unless already anchored.
    pub fn anchor(&mut self, now: Instant) {
        self.start.get_or_insert(now);
    }

    #[must_use]
    pub fn is_anchored(&self) -> bool {
        self.start.is_some()
    }

    /// Fraction of the duration elapsed at `now`. A zero-length timeline is
    /// always complete.
    #[must_use]
    pub fn linear_progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let Some(start) = self.start else {
            return 0.0;
        };
        let elapsed = now.saturating_duration_since(start).as_secs_f64();
        (elapsed / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Eased progress at `now`.
    #[must_use]
    pub fn progress(&self, now: Instant) -> f64 {
        ease_out(self.linear_progress(now))
    }

    #[must_use]
    pub fn is_finished(&self, now: Instant) -> bool {
        match self.start {
            Some(start) => now >= start + self.duration,
            None => self.duration.is_zero(),
        }
    }
}

/// Clamped pan that puts `focus` (normalized content coordinates) under
/// the viewport center.
#[must_use]
pub fn focus_pan(focus: Point, size: Size, viewport: Size) -> Point {
    let axis = |focus: f64, size: f64, view: f64| {
        let pan = (focus * size - (view / 2.0).floor()).round();
        pan.clamp(0.0, (size - view).max(0.0))
    };
    Point::new(
        axis(focus.x, size.width, viewport.width),
        axis(focus.y, size.height, viewport.height),
    )
}

/// Normalized content coordinate under the viewport center.
///
/// Axes where the viewport is larger than the content focus on the middle.
#[must_use]
pub fn normalized_focus(pan: Point, viewport: Size, content: Size) -> Point {
    let axis = |pan: f64, view: f64, size: f64| {
        if size <= 0.0 || view > size {
            0.5
        } else {
            ((pan + (view / 2.0).floor()) / size).min(1.0)
        }
    };
    Point::new(
        axis(pan.x, viewport.width, content.width),
        axis(pan.y, viewport.height, content.height),
    )
}

/// Content size state: where it is, where it came from, where it goes.
#[derive(Debug, Clone, Default)]
pub struct ZoomAnimator {
    current: Size,
    old: Size,
    target: Size,
    focus: Point,
    timeline: Option<Timeline>,
}

impl ZoomAnimator {
    /// Jumps to `size` with no transition.
    pub fn set_size(&mut self, size: Size) {
        self.current = size;
        self.old = size;
        self.target = size;
        self.timeline = None;
    }

    /// Starts a new leg from the current size toward `target`.
    pub fn retarget(&mut self, target: Size, focus: Point) {
        self.old = self.current;
        self.target = target;
        self.focus = focus;
    }

    /// Restarts the timeline, unanchored until the next frame. Returns true
    /// if no transition was running.
    pub fn start(&mut self, duration: Duration) -> bool {
        let fresh = self.timeline.is_none();
        self.timeline = Some(Timeline::new(duration));
        fresh
    }

    /// Eased progress at `now`, anchoring a fresh timeline there. 1.0 when
    /// idle.
    pub fn advance(&mut self, now: Instant) -> f64 {
        match self.timeline.as_mut() {
            Some(timeline) => {
                timeline.anchor(now);
                timeline.progress(now)
            }
            None => 1.0,
        }
    }

    /// Sets the current size for eased progress `t`. At `t >= 1` the size
    /// snaps exactly to the target.
    pub fn apply(&mut self, t: f64) -> Size {
        self.current = if t >= 1.0 {
            self.target
        } else {
            Size::new(
                lerp(self.old.width, self.target.width, t),
                lerp(self.old.height, self.target.height, t),
            )
        };
        self.current
    }

    /// Stops the timeline. Returns true if one was running.
    pub fn finish(&mut self) -> bool {
        self.timeline.take().is_some()
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.timeline.is_some()
    }

    #[must_use]
    pub fn current(&self) -> Size {
        self.current
    }

    #[must_use]
    pub fn target(&self) -> Size {
        self.target
    }

    #[must_use]
    pub fn focus(&self) -> Point {
        self.focus
    }

    /// Pan keeping the focus under the viewport center at the current size.
    #[must_use]
    pub fn focus_pan(&self, viewport: Size) -> Point {
        focus_pan(self.focus, self.current, viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_abs_diff_eq;

    #[test]
    fn ease_out_hits_endpoints() {
        assert_abs_diff_eq!(ease_out(0.0), 0.0);
        assert_abs_diff_eq!(ease_out(0.5), 0.75);
        assert_abs_diff_eq!(ease_out(1.0), 1.0);
        assert_abs_diff_eq!(ease_out(3.0), 1.0);
        assert_abs_diff_eq!(ease_out(-1.0), 0.0);
    }

    #[test]
    fn timeline_progress_is_eased() {
        let start = Instant::now();
        let timeline = Timeline::starting_at(start, Duration::from_millis(400));
        assert_abs_diff_eq!(timeline.progress(start), 0.0);
        assert_abs_diff_eq!(
            timeline.progress(start + Duration::from_millis(200)),
            0.75,
            epsilon = 1e-9
        );
        assert!(timeline.is_finished(start + Duration::from_millis(400)));
        assert_abs_diff_eq!(timeline.progress(start + Duration::from_secs(5)), 1.0);
    }

    #[test]
    fn unanchored_timeline_waits_for_first_frame() {
        let begin = Instant::now();
        let mut timeline = Timeline::new(Duration::from_millis(400));
        let late = begin + Duration::from_secs(10);
        assert!(!timeline.is_anchored());
        assert!(!timeline.is_finished(late));
        assert_abs_diff_eq!(timeline.progress(late), 0.0);

        timeline.anchor(late);
        timeline.anchor(late + Duration::from_secs(1));
        assert_abs_diff_eq!(timeline.progress(late), 0.0);
        assert_abs_diff_eq!(
            timeline.progress(late + Duration::from_millis(200)),
            0.75,
            epsilon = 1e-9
        );
        assert!(timeline.is_finished(late + Duration::from_millis(400)));
    }

    #[test]
    fn zero_length_timeline_is_complete() {
        let start = Instant::now();
        let timeline = Timeline::starting_at(start, Duration::ZERO);
        assert_abs_diff_eq!(timeline.linear_progress(start), 1.0);
        assert!(timeline.is_finished(start));
        assert!(Timeline::new(Duration::ZERO).is_finished(start));
    }

    #[test]
    fn apply_interpolates_then_snaps() {
        let mut animator = ZoomAnimator::default();
        animator.set_size(Size::new(100.0, 50.0));
        animator.retarget(Size::new(301.0, 151.0), Point::new(0.5, 0.5));

        let mid = animator.apply(0.5);
        assert_abs_diff_eq!(mid.width, 200.5);
        assert_abs_diff_eq!(mid.height, 100.5);

        assert_eq!(animator.apply(1.0), Size::new(301.0, 151.0));
    }

    #[test]
    fn retarget_mid_flight_starts_from_current() {
        let mut animator = ZoomAnimator::default();
        animator.set_size(Size::new(100.0, 100.0));
        animator.retarget(Size::new(200.0, 200.0), Point::new(0.5, 0.5));
        animator.apply(0.5);
        animator.retarget(Size::new(400.0, 400.0), Point::new(0.5, 0.5));
        assert_eq!(animator.apply(0.0), Size::new(150.0, 150.0));
    }

    #[test]
    fn start_reports_fresh_transitions() {
        let mut animator = ZoomAnimator::default();
        assert!(animator.start(Duration::from_millis(10)));
        assert!(!animator.start(Duration::from_millis(10)));
        assert!(animator.finish());
        assert!(!animator.finish());
        assert!(!animator.is_animating());
    }

    #[test]
    fn focus_pan_is_clamped() {
        let viewport = Size::new(400.0, 300.0);
        let size = Size::new(1000.0, 1000.0);
        assert_eq!(focus_pan(Point::new(0.5, 0.5), size, viewport), Point::new(300.0, 350.0));
        assert_eq!(focus_pan(Point::new(0.0, 1.0), size, viewport), Point::new(0.0, 700.0));
        assert_eq!(
            focus_pan(Point::new(0.5, 0.5), Size::new(200.0, 200.0), viewport),
            Point::ORIGIN
        );
    }

    #[test]
    fn focus_centers_when_content_is_small() {
        let focus = normalized_focus(
            Point::new(100.0, 0.0),
            Size::new(400.0, 300.0),
            Size::new(1000.0, 200.0),
        );
        assert_abs_diff_eq!(focus.x, 0.3);
        assert_abs_diff_eq!(focus.y, 0.5);

        let empty = normalized_focus(Point::ORIGIN, Size::new(400.0, 300.0), Size::ZERO);
        assert_eq!(empty, Point::new(0.5, 0.5));
    }

    #[test]
    fn focus_is_capped_at_one() {
        let focus = normalized_focus(
            Point::new(900.0, 0.0),
            Size::new(400.0, 400.0),
            Size::new(1000.0, 1000.0),
        );
        assert_abs_diff_eq!(focus.x, 1.0);
    }
}
