// SPDX-License-Identifier: MPL-2.0
//! Tile decoding port definition.
//!
//! This module defines the [`TileDecoder`] trait. The engine issues requests
//! and cancellations, then collects finished work with
//! [`TileDecoder::poll_completions`] from its own tick, so completions are
//! always handled on the engine's execution context.

use crate::domain::PixelRect;
use crate::error::DecodeError;
use crate::media::{ImageSource, TilePixels};
use std::sync::Arc;

/// Identifies one outstanding decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecodeHandle(u64);

impl DecodeHandle {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// What to decode.
#[derive(Debug, Clone)]
pub struct DecodeRequest {
    pub source: Arc<ImageSource>,
    /// Area of the oriented image, `None` for the whole image.
    pub region: Option<PixelRect>,
    /// Downscale factor applied to the region (power of two, at least 1).
    pub divisor: u32,
}

impl DecodeRequest {
    /// Request for the full image at full resolution, used for the base layer.
    #[must_use]
    pub fn full(source: Arc<ImageSource>) -> Self {
        Self {
            source,
            region: None,
            divisor: 1,
        }
    }

    /// Request for one tile of a grid.
    #[must_use]
    pub fn tile(source: Arc<ImageSource>, region: PixelRect, divisor: u32) -> Self {
        Self {
            source,
            region: Some(region),
            divisor: divisor.max(1),
        }
    }

    /// Pixel dimensions the decoded output will have.
    #[must_use]
    pub fn output_size(&self) -> (u32, u32) {
        let (width, height) = match self.region {
            Some(region) => (region.width, region.height),
            None => self.source.pixel_size(),
        };
        let divisor = self.divisor.max(1);
        ((width / divisor).max(1), (height / divisor).max(1))
    }
}

/// Finished decode, successful or not.
#[derive(Debug, Clone)]
pub struct DecodeCompletion {
    pub handle: DecodeHandle,
    pub result: Result<TilePixels, DecodeError>,
}

/// Asynchronous decoding collaborator.
///
/// A cancelled handle must never be reported by a later poll; if it is,
/// the engine ignores it.
pub trait TileDecoder {
    /// Starts decoding and returns a handle unique for this decoder.
    fn request(&mut self, request: DecodeRequest) -> DecodeHandle;

    /// Abandons an outstanding decode. Unknown handles are ignored.
    fn cancel(&mut self, handle: DecodeHandle);

    /// Returns every decode that finished since the last poll.
    fn poll_completions(&mut self) -> Vec<DecodeCompletion>;
}
