// SPDX-License-Identifier: MPL-2.0
//! Notifications emitted by the viewer.
//!
//! Events are queued while the engine works and handed out in order by
//! [`crate::engine::Photocam::drain_events`].

use super::grid::{GridId, TileIndex};
use crate::error::{DecodeError, LoadError};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    /// A new image source was accepted and its base layer requested.
    Load,
    /// The base layer finished decoding.
    Loaded,
    /// The base layer could not be decoded.
    LoadFailed(LoadError),
    /// The pending decode count went from zero to one.
    LoadDetail,
    /// The pending decode count returned to zero.
    LoadedDetail,
    /// A zoom transition started from rest.
    ZoomStart,
    /// A zoom transition reached its target.
    ZoomStop,
    /// The effective zoom divisor changed.
    ZoomChange,
    /// A tile decode failed; the tile will be retried when next visible.
    TileDecodeFailed {
        grid: GridId,
        index: TileIndex,
        error: DecodeError,
    },
}

#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<ViewerEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: ViewerEvent) {
        tracing::trace!(?event, "viewer event");
        self.events.push(event);
    }

    /// Takes every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<ViewerEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewerEvent> {
        self.events.iter()
    }
}
