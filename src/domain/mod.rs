// SPDX-License-Identifier: MPL-2.0
//! Domain layer - Core viewer math with no I/O.
//!
//! This module contains pure value types and rules shared by every other
//! layer. Nothing here touches files, threads or clocks.
//!
//! # Modules
//!
//! - [`geometry`]: Coordinate types ([`Point`], [`Size`], [`Rect`], [`PixelRect`])
//! - [`orientation`]: EXIF orientations ([`Orientation`])
//! - [`zoom`]: Zoom divisor rules ([`ZoomMode`], [`ZoomLimits`], [`grid_divisor`])

pub mod geometry;
pub mod orientation;
pub mod zoom;

pub use geometry::{PixelRect, Point, Rect, Size};
pub use orientation::Orientation;
pub use zoom::{grid_divisor, nearest_pow2, ZoomLimits, ZoomMode, ZoomTarget};
