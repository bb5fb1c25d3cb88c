// SPDX-License-Identifier: MPL-2.0
//! Test utilities for float comparisons and other common test helpers.
//!
//! This module re-exports the `approx` crate's assertion macros for float comparison,
//! which properly handle floating-point precision issues that `assert_eq!` cannot.

// Re-export approx macros for convenient use in tests
pub use approx::{assert_abs_diff_eq, assert_relative_eq};

use crate::infrastructure::ManualDecoder;
use crate::media::TilePixels;

/// Completes every outstanding request with a 1x1 blank tile.
///
/// Keeps engine tests independent of real pixel sizes.
pub fn resolve_all(decoder: &mut ManualDecoder) -> usize {
    decoder.resolve_all_with(|_| Ok(TilePixels::blank(1, 1)))
}
