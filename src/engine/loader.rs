// SPDX-License-Identifier: MPL-2.0
//! Visibility-driven tile residency.
//!
//! Every recalculation pass hands [`TileLoader::cull`] the visibility of each
//! tile. Visible idle tiles get a decode, hidden wanted tiles get cancelled and
//! hidden resident tiles drop their pixels. Every outstanding decode, base
//! layer included, counts toward a single pending counter whose edges emit
//! [`ViewerEvent::LoadDetail`] and [`ViewerEvent::LoadedDetail`].

use super::events::{EventQueue, ViewerEvent};
use super::grid::{Grid, GridId, GridSet, Residency, TileIndex, TileState};
use crate::application::port::{DecodeCompletion, DecodeHandle, DecodeRequest, TileDecoder};
use crate::domain::Orientation;
use crate::error::LoadError;
use crate::media::{ImageSource, TileCache, TileCacheKey, TilePixels};
use std::collections::HashMap;
use std::sync::Arc;

/// Number of outstanding decodes. Never negative.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PendingCounter(u32);

impl PendingCounter {
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Returns true when loading starts (0 → 1).
    pub fn increment(&mut self) -> bool {
        self.0 = self.0.saturating_add(1);
        self.0 == 1
    }

    /// Returns true when loading settles (1 → 0). Decrementing at zero
    /// is logged and ignored.
    pub fn decrement(&mut self) -> bool {
        if self.0 == 0 {
            tracing::warn!("pending load counter decremented at zero");
            return false;
        }
        self.0 -= 1;
        self.0 == 0
    }
}

/// The full-image layer shown beneath the tiles.
#[derive(Debug, Clone)]
pub struct BaseLayer {
    pub state: TileState,
    /// Orientation the pixels were decoded with.
    pub orientation: Orientation,
}

impl Default for BaseLayer {
    fn default() -> Self {
        Self {
            state: TileState::Idle,
            orientation: Orientation::Normal,
        }
    }
}

impl BaseLayer {
    #[must_use]
    pub fn residency(&self) -> Residency {
        match self.state {
            TileState::Idle => Residency::Idle,
            TileState::Wanted(_) => Residency::Wanted,
            TileState::Resident(_) => Residency::Resident,
        }
    }

    #[must_use]
    pub fn handle(&self) -> Option<DecodeHandle> {
        match self.state {
            TileState::Wanted(handle) => Some(handle),
            _ => None,
        }
    }

    #[must_use]
    pub fn pixels(&self) -> Option<&TilePixels> {
        match &self.state {
            TileState::Resident(pixels) => Some(pixels),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadTarget {
    Base,
    Tile { grid: GridId, index: TileIndex },
}

/// What a decode completion changed.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// The handle was cancelled or belongs to a torn-down grid.
    Stale,
    BaseLoaded,
    BaseFailed(LoadError),
    TileResident { grid: GridId, index: TileIndex },
    TileFailed { grid: GridId, index: TileIndex },
}

/// Transitions made by one cull.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CullStats {
    pub wanted: usize,
    pub cancelled: usize,
    pub evicted: usize,
    /// Tiles made resident from the tile cache without a decode.
    pub restored: usize,
}

#[derive(Debug)]
pub struct TileLoader {
    pending: PendingCounter,
    in_flight: HashMap<DecodeHandle, LoadTarget>,
    cache: TileCache,
}

impl TileLoader {
    #[must_use]
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            pending: PendingCounter::default(),
            in_flight: HashMap::new(),
            cache: TileCache::new(cache_capacity),
        }
    }

    #[must_use]
    pub fn pending(&self) -> u32 {
        self.pending.get()
    }

    #[must_use]
    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn track<D: TileDecoder>(
        &mut self,
        decoder: &mut D,
        request: DecodeRequest,
        target: LoadTarget,
        events: &mut EventQueue,
    ) -> DecodeHandle {
        let handle = decoder.request(request);
        self.in_flight.insert(handle, target);
        if self.pending.increment() {
            events.push(ViewerEvent::LoadDetail);
        }
        handle
    }

    fn untrack(&mut self, handle: DecodeHandle, events: &mut EventQueue) -> Option<LoadTarget> {
        let target = self.in_flight.remove(&handle)?;
        if self.pending.decrement() {
            events.push(ViewerEvent::LoadedDetail);
        }
        debug_assert_eq!(self.pending.get() as usize, self.in_flight.len());
        Some(target)
    }

    fn abandon<D: TileDecoder>(
        &mut self,
        decoder: &mut D,
        handle: DecodeHandle,
        events: &mut EventQueue,
    ) {
        decoder.cancel(handle);
        self.untrack(handle, events);
    }

    /// Requests the full image for the base layer, replacing any
    /// outstanding base request.
    pub fn request_base<D: TileDecoder>(
        &mut self,
        base: &mut BaseLayer,
        source: &Arc<ImageSource>,
        decoder: &mut D,
        events: &mut EventQueue,
    ) {
        if let Some(handle) = base.handle() {
            self.abandon(decoder, handle, events);
        }
        let request = DecodeRequest::full(Arc::clone(source));
        let handle = self.track(decoder, request, LoadTarget::Base, events);
        base.state = TileState::Wanted(handle);
        base.orientation = source.orientation();
    }

    /// Cancels or drops the base layer.
    pub fn release_base<D: TileDecoder>(
        &mut self,
        base: &mut BaseLayer,
        decoder: &mut D,
        events: &mut EventQueue,
    ) {
        if let Some(handle) = base.handle() {
            self.abandon(decoder, handle, events);
        }
        base.state = TileState::Idle;
    }

    /// Reconciles a grid's residency with `visibility`, indexed like
    /// [`Grid::tiles`]. With `admit` unset no new decode is requested.
    pub fn cull<D: TileDecoder>(
        &mut self,
        grid: &mut Grid,
        visibility: &[bool],
        admit: bool,
        source: &Arc<ImageSource>,
        decoder: &mut D,
        events: &mut EventQueue,
    ) -> CullStats {
        let mut stats = CullStats::default();
        let grid_id = grid.id();
        let divisor = grid.divisor();

        for (position, tile) in grid.tiles_mut().iter_mut().enumerate() {
            let visible = visibility.get(position).copied().unwrap_or(false);
            let key = TileCacheKey {
                divisor,
                row: tile.index.row,
                col: tile.index.col,
            };

            match (tile.residency(), visible) {
                (Residency::Idle, true) if admit => {
                    if let Some(pixels) = self.cache.take(&key) {
                        tile.state = TileState::Resident(pixels);
                        stats.restored += 1;
                        continue;
                    }
                    let request =
                        DecodeRequest::tile(Arc::clone(source), tile.source_rect, divisor);
                    let target = LoadTarget::Tile {
                        grid: grid_id,
                        index: tile.index,
                    };
                    let handle = self.track(decoder, request, target, events);
                    tile.state = TileState::Wanted(handle);
                    stats.wanted += 1;
                }
                (Residency::Wanted, false) => {
                    if let Some(handle) = tile.handle() {
                        self.abandon(decoder, handle, events);
                    }
                    tile.state = TileState::Idle;
                    stats.cancelled += 1;
                }
                (Residency::Resident, false) => {
                    if let TileState::Resident(pixels) =
                        std::mem::replace(&mut tile.state, TileState::Idle)
                    {
                        self.cache.insert(key, pixels);
                    }
                    stats.evicted += 1;
                }
                _ => {}
            }
        }

        stats
    }

    /// Applies a decode completion. Completions for handles no longer
    /// tracked change nothing.
    pub fn complete(
        &mut self,
        completion: DecodeCompletion,
        grids: &mut GridSet,
        base: &mut BaseLayer,
        events: &mut EventQueue,
    ) -> CompletionOutcome {
        let DecodeCompletion { handle, result } = completion;
        let Some(target) = self.untrack(handle, events) else {
            tracing::trace!(handle = handle.value(), "discarding stale completion");
            return CompletionOutcome::Stale;
        };

        match target {
            LoadTarget::Base => {
                if base.handle() != Some(handle) {
                    return CompletionOutcome::Stale;
                }
                match result {
                    Ok(pixels) => {
                        base.state = TileState::Resident(pixels);
                        CompletionOutcome::BaseLoaded
                    }
                    Err(err) => {
                        tracing::warn!(%err, "base layer decode failed");
                        base.state = TileState::Idle;
                        CompletionOutcome::BaseFailed(err.into_load_error())
                    }
                }
            }
            LoadTarget::Tile { grid, index } => {
                let Some(tile) = grids.find_mut(grid).and_then(|g| g.tile_mut(index)) else {
                    return CompletionOutcome::Stale;
                };
                if tile.handle() != Some(handle) {
                    return CompletionOutcome::Stale;
                }
                match result {
                    Ok(pixels) => {
                        tile.state = TileState::Resident(pixels);
                        CompletionOutcome::TileResident { grid, index }
                    }
                    Err(error) => {
                        tracing::warn!(
                            grid = grid.value(),
                            row = index.row,
                            col = index.col,
                            %error,
                            "tile decode failed"
                        );
                        tile.state = TileState::Idle;
                        events.push(ViewerEvent::TileDecodeFailed { grid, index, error });
                        CompletionOutcome::TileFailed { grid, index }
                    }
                }
            }
        }
    }

    /// Cancels a grid's outstanding decodes and releases its pixels.
    pub fn teardown<D: TileDecoder>(
        &mut self,
        grid: Grid,
        decoder: &mut D,
        events: &mut EventQueue,
    ) {
        let id = grid.id();
        let divisor = grid.divisor();
        let mut cancelled = 0usize;

        for tile in grid.into_tiles() {
            match tile.state {
                TileState::Wanted(handle) => {
                    self.abandon(decoder, handle, events);
                    cancelled += 1;
                }
                TileState::Resident(pixels) => {
                    let key = TileCacheKey {
                        divisor,
                        row: tile.index.row,
                        col: tile.index.col,
                    };
                    self.cache.insert(key, pixels);
                }
                TileState::Idle => {}
            }
        }

        tracing::debug!(grid = id.value(), divisor, cancelled, "tore down grid");
    }

    /// Drops every grid and the base layer.
    pub fn reset<D: TileDecoder>(
        &mut self,
        grids: &mut GridSet,
        base: &mut BaseLayer,
        decoder: &mut D,
        events: &mut EventQueue,
    ) {
        if let Some(grid) = grids.retiring.take() {
            self.teardown(grid, decoder, events);
        }
        if let Some(grid) = grids.current.take() {
            self.teardown(grid, decoder, events);
        }
        self.release_base(base, decoder, events);
        self.cache.clear();
    }
}
