// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all engine configuration constants.
//!
//! This module serves as the single source of truth for default values
//! used across the engine. Constants are organized by category.
//!
//! # Categories
//!
//! - **Zoom**: Zoom divisor bounds and keyboard step
//! - **Grid**: Tile size and level-of-detail ceiling
//! - **Animation**: Zoom and bounce-back durations
//! - **Tile Cache**: Optional LRU of evicted tile pixels

// ==========================================================================
// Zoom Defaults
// ==========================================================================

/// Default zoom divisor when the engine starts (1.0 = one image pixel per
/// logical pixel, larger values shrink the image).
pub const DEFAULT_ZOOM: f64 = 1.0;

/// Smallest zoom divisor accepted (256x magnification).
pub const MIN_ZOOM: f64 = 1.0 / 256.0;

/// Divisor step applied by `zoom_in` / `zoom_out`.
pub const DEFAULT_ZOOM_STEP: f64 = 0.5;

/// Minimum divisor step.
pub const MIN_ZOOM_STEP: f64 = 0.01;

/// Maximum divisor step.
pub const MAX_ZOOM_STEP: f64 = 16.0;

// ==========================================================================
// Grid Defaults
// ==========================================================================

/// Default tile edge length in logical pixels.
pub const DEFAULT_TILE_SIZE: u32 = 512;

/// Minimum tile edge length.
pub const MIN_TILE_SIZE: u32 = 16;

/// Maximum tile edge length.
pub const MAX_TILE_SIZE: u32 = 4096;

/// Grid divisors at or above this value fall back to the base image only.
pub const DEFAULT_MAX_GRID_DIVISOR: u32 = 8;

/// Lowest accepted grid ceiling (2 keeps at least the 1:1 grid).
pub const MIN_MAX_GRID_DIVISOR: u32 = 2;

/// Highest accepted grid ceiling.
pub const MAX_MAX_GRID_DIVISOR: u32 = 256;

// ==========================================================================
// Animation Defaults
// ==========================================================================

/// Default zoom transition duration (in seconds).
pub const DEFAULT_ZOOM_DURATION_SECS: f64 = 0.5;

/// Default post-gesture bounce duration (in seconds).
pub const DEFAULT_BOUNCE_DURATION_SECS: f64 = 0.5;

/// Maximum duration of either transition (in seconds).
pub const MAX_ANIMATION_DURATION_SECS: f64 = 10.0;

// ==========================================================================
// Tile Cache Defaults
// ==========================================================================

/// Default number of evicted tiles kept in memory (0 = disabled).
pub const DEFAULT_TILE_CACHE_CAPACITY: usize = 0;

/// Maximum number of evicted tiles kept in memory.
pub const MAX_TILE_CACHE_CAPACITY: usize = 1024;
