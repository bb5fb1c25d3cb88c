// SPDX-License-Identifier: MPL-2.0
//! The viewer facade.
//!
//! [`Photocam`] owns the zoom state, the two-generation grid set and the
//! tile loader, and drives them from three kinds of input: operations called
//! by the host, decode completions collected in [`Photocam::tick`], and the
//! animation clock passed to the same call.
//!
//! Pan, resize and zoom notifications never recalculate on the spot. They
//! mark one pending pass, which runs at the next tick or on
//! [`Photocam::flush`]. Within a pass, placement runs before culling.
//!
//! # Example
//!
//! ```
//! use photocam::config::EngineConfig;
//! use photocam::domain::{Size, ZoomMode};
//! use photocam::engine::Photocam;
//! use photocam::infrastructure::{ManualDecoder, ScrollState};
//! use photocam::media::ImageSource;
//!
//! let surface = ScrollState::new(Size::new(800.0, 600.0));
//! let mut viewer = Photocam::new(EngineConfig::default(), surface, ManualDecoder::new());
//! viewer.pause_set(true);
//! viewer.zoom_mode_set(ZoomMode::AutoFit);
//! viewer.load(ImageSource::external("scan", 4096, 4096));
//! viewer.flush();
//!
//! assert_eq!(viewer.current_size(), Size::new(600.0, 600.0));
//! ```

use super::animator::{normalized_focus, Timeline, ZoomAnimator};
use super::events::{EventQueue, ViewerEvent};
use super::gesture::{Bounce, GestureSession};
use super::grid::{Grid, GridId, GridSet, GridSpec, Residency, TileState};
use super::loader::{BaseLayer, CompletionOutcome, TileLoader};
use super::placement::{Layout, Placement, ViewportAdapter};
use crate::application::port::{GesturePhase, GestureSource, PannableSurface, TileDecoder};
use crate::config::EngineConfig;
use crate::domain::{grid_divisor, Orientation, PixelRect, Point, Rect, Size, ZoomLimits, ZoomMode};
use crate::error::LoadError;
use crate::media::ImageSource;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Upper bound on recalculation passes run by one [`Photocam::flush`].
const MAX_FLUSH_PASSES: usize = 4;

/// Tiled zoomable image viewer.
pub struct Photocam<S: PannableSurface, D: TileDecoder> {
    config: EngineConfig,
    surface: S,
    decoder: D,
    source: Option<Arc<ImageSource>>,

    zoom: f64,
    mode: ZoomMode,
    limits: ZoomLimits,
    paused: bool,
    gesture_enabled: bool,

    grids: GridSet,
    next_grid_id: u64,
    base: BaseLayer,
    loader: TileLoader,
    animator: ZoomAnimator,
    adapter: ViewportAdapter,

    gesture: Option<GestureSession>,
    gesture_offset: Point,
    bounce: Option<Bounce>,

    main_load_pending: bool,
    resized: bool,
    recalc_pending: bool,
    recalc_passes: u64,
    reported_content: Option<Size>,
    placement: Placement,
    events: EventQueue,
    clock: Instant,
}

impl<S: PannableSurface, D: TileDecoder> Photocam<S, D> {
    /// Creates a viewer with no image.
    #[must_use]
    pub fn new(config: EngineConfig, surface: S, decoder: D) -> Self {
        let config = config.sanitized();
        let limits = ZoomLimits::new(config.min_zoom, config.max_zoom);
        Self {
            zoom: limits.clamp(config.initial_zoom),
            mode: ZoomMode::Manual,
            limits,
            paused: false,
            gesture_enabled: config.gesture_enabled,
            loader: TileLoader::new(config.tile_cache_capacity),
            config,
            surface,
            decoder,
            source: None,
            grids: GridSet::default(),
            next_grid_id: 1,
            base: BaseLayer::default(),
            animator: ZoomAnimator::default(),
            adapter: ViewportAdapter::default(),
            gesture: None,
            gesture_offset: Point::ORIGIN,
            bounce: None,
            main_load_pending: false,
            resized: false,
            recalc_pending: false,
            recalc_passes: 0,
            reported_content: None,
            placement: Placement::default(),
            events: EventQueue::default(),
            clock: Instant::now(),
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Replaces the image. Every outstanding decode of the previous image
    /// is cancelled and its grids dropped.
    pub fn load(&mut self, source: ImageSource) {
        self.finish_bounce();
        self.finish_zoom();
        self.loader.reset(
            &mut self.grids,
            &mut self.base,
            &mut self.decoder,
            &mut self.events,
        );

        let source = Arc::new(source);
        let (width, height) = source.pixel_size();
        tracing::info!(
            source = ?source.id(),
            width,
            height,
            region_decoding = source.supports_region_decoding(),
            "loading image"
        );

        self.animator.set_size(Size::new(
            (f64::from(width) / self.zoom).floor(),
            (f64::from(height) / self.zoom).floor(),
        ));
        self.source = Some(Arc::clone(&source));
        self.events.push(ViewerEvent::Load);

        if source.is_empty() {
            self.main_load_pending = false;
            self.events.push(ViewerEvent::Loaded);
        } else {
            self.main_load_pending = true;
            self.loader.request_base(
                &mut self.base,
                &source,
                &mut self.decoder,
                &mut self.events,
            );
        }

        self.refresh_zoom();
        self.request_recalc();
    }

    /// Opens `path` and loads it.
    ///
    /// # Errors
    ///
    /// Returns the [`LoadError`] from [`ImageSource::open`]; the current
    /// image is kept in that case.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        let source = ImageSource::open(path)?;
        self.load(source);
        Ok(())
    }

    #[must_use]
    pub fn source(&self) -> Option<&Arc<ImageSource>> {
        self.source.as_ref()
    }

    /// Oriented image dimensions, `(0, 0)` with no image.
    #[must_use]
    pub fn image_size_get(&self) -> (u32, u32) {
        self.source
            .as_ref()
            .map_or((0, 0), |source| source.pixel_size())
    }

    // =========================================================================
    // Zoom
    // =========================================================================

    /// Sets the zoom divisor, clamped to the current limits.
    ///
    /// Auto modes replace the divisor with the one they derive.
    pub fn zoom_set(&mut self, zoom: f64) {
        let zoom = self.limits.clamp(zoom);
        if zoom == self.zoom {
            return;
        }
        self.apply_zoom(zoom);
    }

    #[must_use]
    pub fn zoom_get(&self) -> f64 {
        self.zoom
    }

    /// Magnifies by one step and switches to manual zoom.
    pub fn zoom_in(&mut self) {
        self.mode = ZoomMode::Manual;
        self.zoom_set(self.zoom - self.config.zoom_step);
    }

    /// Shrinks by one step and switches to manual zoom.
    pub fn zoom_out(&mut self) {
        self.mode = ZoomMode::Manual;
        self.zoom_set(self.zoom + self.config.zoom_step);
    }

    pub fn zoom_mode_set(&mut self, mode: ZoomMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.refresh_zoom();
    }

    #[must_use]
    pub fn zoom_mode_get(&self) -> ZoomMode {
        self.mode
    }

    /// Sets the smallest divisor allowed, re-clamping the current zoom.
    pub fn zoom_min_set(&mut self, min: f64) {
        self.limits = self.limits.with_min(min);
        self.enforce_limits();
    }

    #[must_use]
    pub fn zoom_min_get(&self) -> f64 {
        self.limits.min()
    }

    /// Sets the largest divisor allowed, `None` for no bound.
    pub fn zoom_max_set(&mut self, max: Option<f64>) {
        self.limits = self.limits.with_max(max);
        self.enforce_limits();
    }

    #[must_use]
    pub fn zoom_max_get(&self) -> Option<f64> {
        self.limits.max()
    }

    /// While paused, zoom changes apply at once without animation.
    /// Pausing completes any transition in flight.
    pub fn pause_set(&mut self, paused: bool) {
        if self.paused == paused {
            return;
        }
        self.paused = paused;
        if paused {
            self.finish_bounce();
            self.finish_zoom();
        }
    }

    #[must_use]
    pub fn pause_get(&self) -> bool {
        self.paused
    }

    fn enforce_limits(&mut self) {
        if self.mode == ZoomMode::Manual {
            self.zoom_set(self.zoom);
        }
    }

    /// Re-applies the current zoom, as after a mode, image or size change.
    fn refresh_zoom(&mut self) {
        self.apply_zoom(self.zoom);
    }

    fn apply_zoom(&mut self, zoom: f64) {
        let previous = self.zoom;
        self.zoom = zoom;

        let viewport = self.surface.viewport_size();
        if viewport.is_empty() {
            return;
        }

        let target = self.mode.resolve(self.image_size_get(), viewport, zoom);
        self.zoom = target.zoom;
        let focus = normalized_focus(
            self.surface.content_position(),
            viewport,
            self.animator.current(),
        );
        self.animator.retarget(target.size, focus);
        tracing::debug!(
            zoom = self.zoom,
            mode = %self.mode,
            width = target.size.width,
            height = target.size.height,
            "zoom target"
        );

        if !self.main_load_pending {
            self.select_grid();
        }

        if self.paused || self.main_load_pending {
            self.animator.finish();
            self.zoom_do(1.0);
        } else if self.animator.start(self.config.zoom_duration()) {
            self.events.push(ViewerEvent::ZoomStart);
        }

        if self.zoom != previous {
            self.events.push(ViewerEvent::ZoomChange);
        }
        self.request_recalc();
    }

    /// Applies eased progress `t` to the content size and pan. Returns
    /// false once the transition is complete.
    fn zoom_do(&mut self, t: f64) -> bool {
        let viewport = self.surface.viewport_size();
        self.animator.apply(t);
        let pan = self.animator.focus_pan(viewport);
        self.adapter
            .request_show(Rect::from_origin_size(pan, viewport));
        self.request_recalc();

        if t >= 1.0 {
            if let Some(grid) = self.grids.retiring.take() {
                self.loader
                    .teardown(grid, &mut self.decoder, &mut self.events);
            }
            return false;
        }
        true
    }

    /// Completes a running zoom transition at its target.
    fn finish_zoom(&mut self) {
        if self.animator.finish() {
            self.zoom_do(1.0);
            self.events.push(ViewerEvent::ZoomStop);
        }
    }

    /// Makes the grid matching the zoom current, keeping the previous one
    /// as the retiring grid.
    fn select_grid(&mut self) {
        let Some(source) = self.source.as_ref().filter(|source| !source.is_empty()) else {
            self.drop_grids();
            return;
        };

        let divisor = grid_divisor(self.zoom);
        if self.grids.current.as_ref().map(Grid::divisor) == Some(divisor) {
            return;
        }
        if self.grids.retiring.as_ref().map(Grid::divisor) == Some(divisor) {
            std::mem::swap(&mut self.grids.current, &mut self.grids.retiring);
            return;
        }

        let (image_width, image_height) = source.pixel_size();
        let spec = GridSpec {
            image_width,
            image_height,
            tile_size: self.config.tile_size,
            max_divisor: self.config.max_grid_divisor,
            region_decoding: source.supports_region_decoding(),
        };

        match Grid::with_grid_divisor(GridId::new(self.next_grid_id), divisor, &spec) {
            Some(grid) => {
                self.next_grid_id += 1;
                if let Some(old) = self.grids.retiring.take() {
                    self.loader
                        .teardown(old, &mut self.decoder, &mut self.events);
                }
                self.grids.retiring = self.grids.current.take();
                self.grids.current = Some(grid);
            }
            None => self.drop_grids(),
        }
    }

    fn drop_grids(&mut self) {
        if let Some(grid) = self.grids.retiring.take() {
            self.loader
                .teardown(grid, &mut self.decoder, &mut self.events);
        }
        if let Some(grid) = self.grids.current.take() {
            self.loader
                .teardown(grid, &mut self.decoder, &mut self.events);
        }
    }

    // =========================================================================
    // Regions
    // =========================================================================

    /// The part of the image currently visible, in oriented image pixels.
    #[must_use]
    pub fn image_region_get(&self) -> PixelRect {
        let (image_w, image_h) = self.image_size_get();
        let pan = self.surface.content_position();
        let viewport = self.surface.viewport_size();
        let content = self.animator.current();

        let axis = |pan: f64, view: f64, size: f64, image: u32| -> (u32, u32) {
            if size <= 0.0 {
                return (0, 0);
            }
            let image = f64::from(image);
            let start = (image * pan / size).floor().clamp(0.0, image);
            let len = (image * view / size).floor().clamp(0.0, image);
            // Both values lie in [0, image], so the casts are exact.
            (start as u32, len as u32)
        };
        let (x, width) = axis(pan.x, viewport.width, content.width, image_w);
        let (y, height) = axis(pan.y, viewport.height, content.height, image_h);
        PixelRect::new(x, y, width, height)
    }

    /// Scrolls so that `region` (oriented image pixels) is visible.
    /// Running transitions complete first.
    pub fn image_region_show(&mut self, region: PixelRect) {
        self.finish_bounce();
        self.finish_zoom();
        if let Some(rect) = self.region_to_content(region) {
            self.adapter.request_show(rect);
            self.request_recalc();
        }
    }

    /// Like [`Self::image_region_show`], but lets the surface animate the
    /// scroll.
    pub fn image_region_bring_in(&mut self, region: PixelRect) {
        self.finish_bounce();
        self.finish_zoom();
        if let Some(rect) = self.region_to_content(region) {
            self.adapter.cancel_show();
            self.sync_content_size();
            self.surface.scroll_to(rect, true);
            self.request_recalc();
        }
    }

    fn region_to_content(&self, region: PixelRect) -> Option<Rect> {
        let (image_w, image_h) = self.image_size_get();
        if image_w == 0 || image_h == 0 {
            return None;
        }
        let content = self.animator.current();
        let axis = |start: u32, len: u32, size: f64, image: u32| {
            let scale = size / f64::from(image);
            let len = (f64::from(len) * scale).floor().max(1.0);
            let mut start = (f64::from(start) * scale).floor();
            if start + len > size {
                start = size - len;
            }
            (start, len)
        };
        let (x, width) = axis(region.x, region.width, content.width, image_w);
        let (y, height) = axis(region.y, region.height, content.height, image_h);
        Some(Rect::new(x, y, width, height))
    }

    // =========================================================================
    // Orientation
    // =========================================================================

    /// Reorients the image without reloading it. All grids are rebuilt.
    pub fn orientation_set(&mut self, orientation: Orientation) {
        let Some(current) = self.source.as_ref() else {
            return;
        };
        let previous = current.orientation();
        if previous == orientation {
            return;
        }

        let source = Arc::new((**current).clone().with_orientation(orientation));
        tracing::debug!(?previous, ?orientation, "reorienting image");

        self.finish_bounce();
        self.finish_zoom();
        self.drop_grids();
        self.loader.clear_cache();

        match self.base.residency() {
            Residency::Resident => {
                let reoriented = self
                    .base
                    .pixels()
                    .map(|pixels| pixels.reoriented(self.base.orientation, orientation));
                match reoriented {
                    Some(Ok(pixels)) => {
                        self.base.state = TileState::Resident(pixels);
                        self.base.orientation = orientation;
                    }
                    _ => self.loader.request_base(
                        &mut self.base,
                        &source,
                        &mut self.decoder,
                        &mut self.events,
                    ),
                }
            }
            Residency::Wanted => self.loader.request_base(
                &mut self.base,
                &source,
                &mut self.decoder,
                &mut self.events,
            ),
            Residency::Idle => {}
        }

        let (width, height) = source.pixel_size();
        self.source = Some(source);
        self.animator.set_size(Size::new(
            (f64::from(width) / self.zoom).floor(),
            (f64::from(height) / self.zoom).floor(),
        ));

        if self.mode.is_auto() {
            self.refresh_zoom();
        } else if !self.main_load_pending {
            self.select_grid();
        }
        self.request_recalc();
    }

    #[must_use]
    pub fn orientation_get(&self) -> Orientation {
        self.source
            .as_ref()
            .map_or(Orientation::Normal, |source| source.orientation())
    }

    // =========================================================================
    // Gestures
    // =========================================================================

    /// Disabling pinch-zoom ends a gesture in progress.
    pub fn gesture_enabled_set(&mut self, enabled: bool) {
        self.gesture_enabled = enabled;
        if !enabled && self.gesture.is_some() && self.bounce.is_none() {
            self.gesture_end();
        }
    }

    #[must_use]
    pub fn gesture_enabled_get(&self) -> bool {
        self.gesture_enabled
    }

    /// Begins a pinch at `focal` (viewport coordinates).
    pub fn gesture_start(&mut self, focal: Point) {
        if !self.gesture_enabled {
            return;
        }
        self.finish_bounce();
        self.finish_zoom();

        let margin = Layout {
            pan: self.surface.content_position(),
            viewport: self.surface.viewport_size(),
            content: self.animator.target(),
            gesture_offset: Point::ORIGIN,
            center_small_content: true,
        }
        .centering_offset();
        let region = self.image_region_get();

        self.surface.freeze();
        self.gesture = Some(GestureSession::begin(
            self.zoom,
            focal,
            Point::new(f64::from(region.x), f64::from(region.y)),
            margin,
            self.gesture_offset,
        ));
        // Centering is off while the gesture runs; carry it as offset.
        self.gesture_offset = Point::new(-margin.x, -margin.y);
    }

    /// Applies a pinch sample. `scale` is relative to the gesture start.
    pub fn gesture_move(&mut self, focal: Point, scale: f64) {
        if self.bounce.is_some() {
            return;
        }
        let viewport = self.surface.viewport_size();
        if viewport.is_empty() {
            return;
        }
        let image = self.image_size_get();
        let Some(session) = self.gesture.as_mut() else {
            return;
        };

        let step = session.track(focal, scale, &self.limits, image, viewport);
        self.mode = ZoomMode::Manual;
        self.zoom = step.zoom;
        self.gesture_offset = step.overflow;
        self.animator.retarget(step.target, step.focus);
        self.zoom_do(1.0);
    }

    /// Releases the pinch, bouncing back into bounds if needed.
    pub fn gesture_end(&mut self) {
        if self.bounce.is_some() {
            return;
        }
        let Some(session) = self.gesture else {
            return;
        };
        let viewport = self.surface.viewport_size();
        let settle = session.settle(
            self.zoom,
            self.animator.current(),
            self.image_size_get(),
            viewport,
        );

        match settle {
            Some(settle) => {
                self.zoom = settle.zoom;
                self.select_grid();
                let focus = settle.focus.unwrap_or(self.animator.focus());
                self.animator.retarget(settle.target, focus);
                let timeline = Timeline::new(self.config.bounce_duration());
                self.bounce = Some(Bounce::new(timeline, self.gesture_offset, settle.offset_end));
                tracing::debug!(
                    x = settle.offset_end.x,
                    y = settle.offset_end.y,
                    "gesture bounce"
                );
            }
            None => {
                self.select_grid();
                self.zoom_do(1.0);
                self.gesture = None;
                self.gesture_offset = Point::ORIGIN;
                self.surface.unfreeze();
            }
        }

        if self.zoom != session.start_zoom() {
            self.events.push(ViewerEvent::ZoomChange);
        }
        self.request_recalc();
    }

    /// Cancelled pinches settle the same way as released ones.
    pub fn gesture_abort(&mut self) {
        self.gesture_end();
    }

    /// Feeds every queued event of `source` to the gesture handlers.
    pub fn pump_gestures<G: GestureSource>(&mut self, source: &mut G) {
        while let Some(event) = source.next_event() {
            match event.phase {
                GesturePhase::Start => self.gesture_start(event.focal),
                GesturePhase::Move => self.gesture_move(event.focal, event.scale),
                GesturePhase::End => self.gesture_end(),
                GesturePhase::Abort => self.gesture_abort(),
            }
        }
    }

    fn step_bounce(&mut self, now: Instant) {
        let Some(bounce) = self.bounce.as_mut() else {
            return;
        };
        let t = bounce.advance(now);
        let finished = bounce.is_finished(now);
        let offset = bounce.offset_at(t);
        if finished {
            self.zoom_do(1.0);
            self.end_bounce();
            return;
        }
        self.gesture_offset = offset;
        self.zoom_do(t);
    }

    /// Jumps a running bounce to its end.
    fn finish_bounce(&mut self) {
        if self.bounce.is_some() {
            self.zoom_do(1.0);
            self.end_bounce();
        }
    }

    fn end_bounce(&mut self) {
        self.bounce = None;
        self.gesture = None;
        self.gesture_offset = Point::ORIGIN;
        self.surface.unfreeze();
        self.request_recalc();
    }

    // =========================================================================
    // Host notifications and the tick
    // =========================================================================

    /// The host resized the surface's viewport.
    pub fn viewport_resized(&mut self) {
        self.resized = true;
        self.request_recalc();
    }

    /// The surface's pan offset moved.
    pub fn pan_changed(&mut self) {
        self.request_recalc();
    }

    /// Advances the engine to `now`: collects decode completions, steps
    /// animations and runs a pending recalculation.
    ///
    /// Returns true while a transition is still running.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.clock = self.clock.max(now);
        self.process_completions();

        if self.animator.is_animating() {
            let t = self.animator.advance(self.clock);
            if !self.zoom_do(t) {
                self.animator.finish();
                self.events.push(ViewerEvent::ZoomStop);
            }
        }
        if self.bounce.is_some() {
            self.step_bounce(self.clock);
        }
        if self.recalc_pending {
            self.recalc();
        }

        self.is_animating()
    }

    /// Collects completions and runs pending recalculation passes now.
    pub fn flush(&mut self) {
        self.process_completions();
        for _ in 0..MAX_FLUSH_PASSES {
            if !self.recalc_pending {
                break;
            }
            self.recalc();
        }
    }

    fn request_recalc(&mut self) {
        self.recalc_pending = true;
    }

    fn process_completions(&mut self) {
        let completions = self.decoder.poll_completions();
        if completions.is_empty() {
            return;
        }

        for completion in completions {
            let outcome = self.loader.complete(
                completion,
                &mut self.grids,
                &mut self.base,
                &mut self.events,
            );
            match outcome {
                CompletionOutcome::BaseLoaded => {
                    tracing::info!("base layer loaded");
                    self.main_load_pending = false;
                    self.select_grid();
                    self.events.push(ViewerEvent::Loaded);
                    self.request_recalc();
                }
                CompletionOutcome::BaseFailed(err) => {
                    self.main_load_pending = false;
                    self.events.push(ViewerEvent::LoadFailed(err));
                }
                CompletionOutcome::TileResident { .. }
                | CompletionOutcome::TileFailed { .. }
                | CompletionOutcome::Stale => {}
            }
        }
        self.placement.sync_residency(self.grids.iter());
    }

    fn sync_content_size(&mut self) {
        let content = self.animator.current();
        if self.reported_content != Some(content) {
            self.reported_content = Some(content);
            self.surface.set_content_size(content);
        }
    }

    /// One recalculation pass: placement, then culling.
    fn recalc(&mut self) {
        self.recalc_pending = false;
        self.recalc_passes += 1;

        if self.resized {
            self.resized = false;
            if self.mode.is_auto() {
                self.refresh_zoom();
            }
        }
        self.sync_content_size();

        let mut placement = self.adapter.place(
            &mut self.surface,
            self.animator.current(),
            self.gesture_offset,
            self.gesture.is_none(),
            self.grids.iter(),
        );

        if let Some(source) = self.source.as_ref() {
            if let Some(grid) = self.grids.current.as_mut() {
                let visibility = placement.visibility_for(grid.id());
                let stats = self.loader.cull(
                    grid,
                    &visibility,
                    true,
                    source,
                    &mut self.decoder,
                    &mut self.events,
                );
                tracing::trace!(
                    grid = grid.id().value(),
                    wanted = stats.wanted,
                    cancelled = stats.cancelled,
                    evicted = stats.evicted,
                    restored = stats.restored,
                    "culled current grid"
                );
            }
            if let Some(grid) = self.grids.retiring.as_mut() {
                let visibility = placement.visibility_for(grid.id());
                let stats = self.loader.cull(
                    grid,
                    &visibility,
                    false,
                    source,
                    &mut self.decoder,
                    &mut self.events,
                );
                tracing::trace!(
                    grid = grid.id().value(),
                    cancelled = stats.cancelled,
                    evicted = stats.evicted,
                    "culled retiring grid"
                );
            }
        }

        placement.sync_residency(self.grids.iter());
        self.placement = placement;
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Placement computed by the last recalculation pass.
    #[must_use]
    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Takes the events emitted since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<ViewerEvent> {
        self.events.drain()
    }

    /// Outstanding decodes, base layer included.
    #[must_use]
    pub fn pending_loads(&self) -> u32 {
        self.loader.pending()
    }

    /// True while a zoom transition or a bounce is running.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animator.is_animating() || self.bounce.is_some()
    }

    /// True when a recalculation pass is waiting for the next tick.
    #[must_use]
    pub fn needs_recalc(&self) -> bool {
        self.recalc_pending
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access for host-driven pans and resizes; follow up with
    /// [`Self::pan_changed`] or [`Self::viewport_resized`].
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[must_use]
    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Mutable access, for hosts that resolve decodes themselves.
    pub fn decoder_mut(&mut self) -> &mut D {
        &mut self.decoder
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Logical content size right now, mid-transition included.
    #[must_use]
    pub fn current_size(&self) -> Size {
        self.animator.current()
    }

    /// Logical content size the running transition ends on.
    #[must_use]
    pub fn target_size(&self) -> Size {
        self.animator.target()
    }

    #[must_use]
    pub fn grid(&self) -> Option<&Grid> {
        self.grids.current.as_ref()
    }

    #[must_use]
    pub fn retiring_grid(&self) -> Option<&Grid> {
        self.grids.retiring.as_ref()
    }

    #[must_use]
    pub fn base(&self) -> &BaseLayer {
        &self.base
    }

    #[must_use]
    pub fn recalc_passes(&self) -> u64 {
        self.recalc_passes
    }

    #[must_use]
    pub fn gesture_active(&self) -> bool {
        self.gesture.is_some()
    }

    #[must_use]
    pub fn gesture_offset(&self) -> Point {
        self.gesture_offset
    }
}

impl<S: PannableSurface, D: TileDecoder> Drop for Photocam<S, D> {
    fn drop(&mut self) {
        self.loader.reset(
            &mut self.grids,
            &mut self.base,
            &mut self.decoder,
            &mut self.events,
        );
    }
}

impl<S: PannableSurface, D: TileDecoder> std::fmt::Debug for Photocam<S, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Photocam")
            .field("zoom", &self.zoom)
            .field("mode", &self.mode)
            .field("image_size", &self.image_size_get())
            .field("current_size", &self.animator.current())
            .field("grids", &self.grids.len())
            .field("pending_loads", &self.loader.pending())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::port::{DecodeCompletion, DecodeHandle, DecodeRequest};
    use crate::infrastructure::{ManualDecoder, ScrollState};
    use crate::media::TilePixels;
    use crate::test_utils::{assert_abs_diff_eq, resolve_all};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    type Viewer = Photocam<ScrollState, ManualDecoder>;

    fn viewer(width: f64, height: f64) -> Viewer {
        let surface = ScrollState::new(Size::new(width, height));
        Photocam::new(EngineConfig::default(), surface, ManualDecoder::new())
    }

    /// Loads an external source and delivers the base layer.
    fn loaded(width: u32, height: u32) -> Viewer {
        let mut viewer = viewer(800.0, 600.0);
        viewer.pause_set(true);
        viewer.load(ImageSource::external("test", width, height));
        resolve_all(viewer.decoder_mut());
        viewer.flush();
        viewer.drain_events();
        viewer
    }

    #[test]
    fn zoom_set_clamps_to_floor() {
        let mut viewer = viewer(800.0, 600.0);
        viewer.zoom_set(0.0001);
        assert_abs_diff_eq!(viewer.zoom_get(), 1.0 / 256.0);
        viewer.zoom_set(3.0);
        assert_abs_diff_eq!(viewer.zoom_get(), 3.0);
    }

    #[test]
    fn zoom_in_and_out_step_and_switch_to_manual() {
        let mut viewer = loaded(1000, 1000);
        viewer.zoom_mode_set(ZoomMode::AutoFit);
        viewer.zoom_out();
        assert_eq!(viewer.zoom_mode_get(), ZoomMode::Manual);
        let fitted = 1000.0 / 600.0;
        assert_abs_diff_eq!(viewer.zoom_get(), fitted + 0.5, epsilon = 1e-9);
        viewer.zoom_in();
        viewer.zoom_in();
        assert_abs_diff_eq!(viewer.zoom_get(), fitted - 0.5, epsilon = 1e-9);
    }

    #[test]
    fn load_emits_load_then_loaded() {
        let mut viewer = viewer(800.0, 600.0);
        viewer.load(ImageSource::external("test", 100, 100));
        assert_eq!(viewer.pending_loads(), 1);

        resolve_all(viewer.decoder_mut());
        viewer.flush();
        let events = viewer.drain_events();
        let load = events.iter().position(|e| *e == ViewerEvent::Load);
        let loaded = events.iter().position(|e| *e == ViewerEvent::Loaded);
        assert!(load.expect("load") < loaded.expect("loaded"));
        assert!(events.contains(&ViewerEvent::LoadDetail));
        assert!(events.contains(&ViewerEvent::LoadedDetail));
    }

    #[test]
    fn base_failure_reports_load_failed() {
        let mut viewer = viewer(800.0, 600.0);
        viewer.load(ImageSource::external("test", 100, 100));
        viewer
            .decoder_mut()
            .resolve_all_with(|_| Err(LoadError::CorruptData("truncated".into()).into()));
        viewer.flush();
        let events = viewer.drain_events();
        assert!(events.contains(&ViewerEvent::LoadFailed(LoadError::CorruptData(
            "truncated".into()
        ))));
        assert_eq!(viewer.pending_loads(), 0);
    }

    #[test]
    fn no_grid_while_base_is_loading() {
        let mut viewer = viewer(800.0, 600.0);
        viewer.load(ImageSource::external("test", 2048, 2048));
        viewer.flush();
        assert!(viewer.grid().is_none());

        resolve_all(viewer.decoder_mut());
        viewer.flush();
        assert_eq!(viewer.grid().map(Grid::divisor), Some(1));
    }

    #[test]
    fn divisor_ceiling_shows_base_only() {
        let mut viewer = loaded(4096, 4096);
        viewer.zoom_set(8.0);
        viewer.flush();
        assert!(viewer.grid().is_none());
        assert!(viewer.retiring_grid().is_none());
        assert_eq!(viewer.current_size(), Size::new(512.0, 512.0));
    }

    #[test]
    fn paused_zoom_applies_without_events() {
        let mut viewer = loaded(2048, 2048);
        viewer.zoom_set(2.0);
        let events = viewer.drain_events();
        assert!(!events.contains(&ViewerEvent::ZoomStart));
        assert!(events.contains(&ViewerEvent::ZoomChange));
        assert_eq!(viewer.current_size(), Size::new(1024.0, 1024.0));
        assert!(!viewer.is_animating());
    }

    #[test]
    fn animated_zoom_snaps_and_retires_previous_grid() {
        let mut viewer = loaded(2048, 2048);
        viewer.pause_set(false);
        let start = Instant::now();
        viewer.tick(start);
        viewer.drain_events();

        viewer.zoom_set(2.0);
        assert!(viewer.is_animating());
        assert_eq!(viewer.drain_events(), vec![ViewerEvent::ZoomStart, ViewerEvent::ZoomChange]);
        assert_eq!(viewer.grid().map(Grid::divisor), Some(2));
        assert_eq!(viewer.retiring_grid().map(Grid::divisor), Some(1));

        viewer.tick(start);
        assert_eq!(viewer.current_size(), Size::new(2048.0, 2048.0));
        viewer.tick(start + Duration::from_millis(250));
        let mid = viewer.current_size();
        assert!(mid.width < 2048.0 && mid.width > 1024.0);

        assert!(!viewer.tick(start + Duration::from_secs(2)));
        assert_eq!(viewer.current_size(), viewer.target_size());
        assert_eq!(viewer.current_size(), Size::new(1024.0, 1024.0));
        assert!(viewer.retiring_grid().is_none());
        assert!(viewer.drain_events().contains(&ViewerEvent::ZoomStop));
    }

    #[test]
    fn zoom_after_idle_gap_still_animates() {
        let mut viewer = loaded(2048, 2048);
        viewer.pause_set(false);
        let start = Instant::now();
        assert!(!viewer.tick(start));

        // The host stopped ticking; the next frame comes much later.
        viewer.zoom_set(2.0);
        let first_frame = start + Duration::from_secs(2);
        assert!(viewer.tick(first_frame));
        assert_eq!(viewer.current_size(), Size::new(2048.0, 2048.0));

        assert!(viewer.tick(first_frame + Duration::from_millis(250)));
        let mid = viewer.current_size();
        assert_abs_diff_eq!(mid.width, 1280.0, epsilon = 1e-9);

        assert!(!viewer.tick(first_frame + Duration::from_millis(500)));
        assert_eq!(viewer.current_size(), Size::new(1024.0, 1024.0));
    }

    #[test]
    fn pause_completes_running_transition() {
        let mut viewer = loaded(2048, 2048);
        viewer.pause_set(false);
        viewer.zoom_set(4.0);
        assert!(viewer.is_animating());

        viewer.pause_set(true);
        assert!(!viewer.is_animating());
        assert_eq!(viewer.current_size(), Size::new(512.0, 512.0));
    }

    #[test]
    fn region_round_trips_through_show() {
        let mut viewer = loaded(4000, 4000);
        viewer.zoom_set(2.0);
        viewer.flush();

        viewer.image_region_show(PixelRect::new(1000, 2000, 1600, 1200));
        viewer.flush();
        assert_eq!(viewer.surface().content_position(), Point::new(500.0, 1000.0));
        assert_eq!(viewer.image_region_get(), PixelRect::new(1000, 2000, 1600, 1200));
    }

    #[test]
    fn region_of_empty_viewer_is_zero() {
        let viewer = viewer(800.0, 600.0);
        assert_eq!(viewer.image_region_get(), PixelRect::default());
    }

    #[test]
    fn bring_in_asks_surface_to_animate() {
        let mut viewer = loaded(4000, 4000);
        viewer.image_region_bring_in(PixelRect::new(3000, 3000, 100, 100));
        let request = viewer.surface().last_scroll().expect("scroll request");
        assert!(request.animated);
    }

    #[test]
    fn orientation_swaps_dimensions_and_rebuilds_grids() {
        let mut viewer = loaded(2000, 1000);
        let before = viewer.grid().map(Grid::id);

        viewer.orientation_set(Orientation::Rotate90);
        viewer.flush();
        assert_eq!(viewer.image_size_get(), (1000, 2000));
        assert_eq!(viewer.orientation_get(), Orientation::Rotate90);
        assert_ne!(viewer.grid().map(Grid::id), before);
        assert_eq!(viewer.current_size(), Size::new(1000.0, 2000.0));
        let base = viewer.base().pixels().expect("base stays resident");
        assert_eq!((base.width, base.height), (1, 1));
    }

    #[test]
    fn replacing_source_cancels_outstanding_decodes() {
        let mut viewer = loaded(4096, 4096);
        assert!(viewer.pending_loads() > 0);
        let outstanding = viewer.decoder().outstanding_handles();

        viewer.load(ImageSource::external("other", 64, 64));
        assert_eq!(viewer.pending_loads(), 1);
        for handle in outstanding {
            assert!(viewer.decoder().cancelled().contains(&handle));
        }
    }

    #[test]
    fn visible_tiles_are_requested_after_load() {
        let viewer = loaded(4096, 4096);
        let grid = viewer.grid().expect("grid");
        let wanted = grid.count(Residency::Wanted);
        // 800x600 at 1:1 over 512px tiles touches a 2x2 block.
        assert_eq!(wanted, 4);
        assert_eq!(viewer.pending_loads(), 4);
        assert_eq!(viewer.placement().visible_tiles().count(), 4);
    }

    #[test]
    fn pan_moves_residency() {
        let mut viewer = loaded(4096, 4096);
        resolve_all(viewer.decoder_mut());
        viewer.flush();
        assert_eq!(viewer.grid().map(|g| g.count(Residency::Resident)), Some(4));

        viewer.surface_mut().pan_by(2048.0, 0.0);
        viewer.pan_changed();
        viewer.flush();
        let grid = viewer.grid().expect("grid");
        assert_eq!(grid.count(Residency::Resident), 0);
        assert_eq!(grid.count(Residency::Wanted), 4);
    }

    #[test]
    fn gesture_ignored_when_disabled() {
        let mut viewer = loaded(2000, 2000);
        viewer.gesture_start(Point::new(100.0, 100.0));
        assert!(!viewer.gesture_active());
        assert!(!viewer.surface().is_frozen());
    }

    #[test]
    fn pinch_zooms_around_focal_point() {
        let mut viewer = loaded(2000, 2000);
        viewer.gesture_enabled_set(true);
        viewer.gesture_start(Point::new(400.0, 300.0));
        assert!(viewer.surface().is_frozen());

        viewer.gesture_move(Point::new(400.0, 300.0), 2.0);
        viewer.flush();
        assert_abs_diff_eq!(viewer.zoom_get(), 0.5);
        assert_eq!(viewer.current_size(), Size::new(4000.0, 4000.0));
        // Image point (400, 300) stays under the fingers at double size.
        assert_eq!(viewer.surface().content_position(), Point::new(400.0, 300.0));

        viewer.gesture_end();
        assert!(!viewer.gesture_active());
        assert!(!viewer.surface().is_frozen());
    }

    /// Keeps the cancelled handles readable after the viewer is dropped.
    #[derive(Debug, Default)]
    struct RecordingDecoder {
        inner: ManualDecoder,
        cancelled: Rc<RefCell<Vec<DecodeHandle>>>,
    }

    impl TileDecoder for RecordingDecoder {
        fn request(&mut self, request: DecodeRequest) -> DecodeHandle {
            self.inner.request(request)
        }

        fn cancel(&mut self, handle: DecodeHandle) {
            self.inner.cancel(handle);
            self.cancelled.borrow_mut().push(handle);
        }

        fn poll_completions(&mut self) -> Vec<DecodeCompletion> {
            self.inner.poll_completions()
        }
    }

    #[test]
    fn drop_cancels_everything() {
        let decoder = RecordingDecoder::default();
        let cancelled = Rc::clone(&decoder.cancelled);
        let surface = ScrollState::new(Size::new(800.0, 600.0));
        let mut viewer = Photocam::new(EngineConfig::default(), surface, decoder);
        viewer.pause_set(true);
        viewer.load(ImageSource::external("test", 4096, 4096));
        resolve_all(&mut viewer.decoder_mut().inner);
        viewer.flush();

        let mut outstanding = viewer.decoder().inner.outstanding_handles();
        assert!(!outstanding.is_empty());
        assert!(cancelled.borrow().is_empty());

        drop(viewer);
        let mut recorded = cancelled.borrow().clone();
        outstanding.sort();
        recorded.sort();
        assert_eq!(recorded, outstanding);
    }

    #[test]
    fn resize_refits_in_auto_mode() {
        let mut viewer = loaded(4096, 4096);
        viewer.zoom_mode_set(ZoomMode::AutoFit);
        viewer.flush();
        assert_eq!(viewer.current_size(), Size::new(600.0, 600.0));

        viewer.surface_mut().resize(Size::new(400.0, 1000.0));
        viewer.viewport_resized();
        viewer.flush();
        assert_eq!(viewer.current_size(), Size::new(400.0, 400.0));
    }

    #[test]
    fn empty_source_loads_without_decoding() {
        let mut viewer = viewer(800.0, 600.0);
        viewer.load(ImageSource::external("empty", 0, 0));
        viewer.flush();
        assert_eq!(viewer.pending_loads(), 0);
        assert!(viewer.grid().is_none());
        assert!(viewer.placement().tiles.is_empty());
        assert!(viewer.drain_events().contains(&ViewerEvent::Loaded));
        assert!(viewer.decoder().outstanding().next().is_none());
    }

    #[test]
    fn resolved_base_is_blank_pixels() {
        let viewer = loaded(300, 200);
        assert_eq!(viewer.base().pixels(), Some(&TilePixels::blank(1, 1)));
    }
}
