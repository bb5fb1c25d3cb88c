// SPDX-License-Identifier: MPL-2.0
//! Image sources and pixel handling.
//!
//! This module owns everything that touches encoded or decoded pixels: the
//! [`ImageSource`] value handed to the viewer, decoding helpers over the
//! `image` crate, and the optional cache of evicted tiles.

pub mod decode;
pub mod pixels;
pub mod source;
pub mod tile_cache;

// Re-export commonly used types
pub use decode::{decode_region, load_oriented, OrientedImageCache};
pub use pixels::TilePixels;
pub use source::{ImageSource, SourceId, SourceLocator};
pub use tile_cache::{TileCache, TileCacheKey, TileCacheStats};
