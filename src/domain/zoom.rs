// SPDX-License-Identifier: MPL-2.0
//! Zoom domain types.
//!
//! The zoom value is a *divisor*: image pixels per logical pixel. A divisor
//! of 1 shows the image 1:1, 2 shows it at half size, 0.5 at double size.
//! This module handles:
//! - Divisor bounds ([`ZoomLimits`])
//! - Zoom modes and their target size rules ([`ZoomMode`])
//! - Level-of-detail selection ([`grid_divisor`], [`nearest_pow2`])

use super::geometry::Size;
use std::fmt;
use std::str::FromStr;

pub use crate::config::MIN_ZOOM;

/// Bounds applied to every zoom divisor the engine accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    min: f64,
    max: Option<f64>,
}

impl ZoomLimits {
    /// Creates limits, raising `min` to [`MIN_ZOOM`] and `max` to `min`.
    #[must_use]
    pub fn new(min: f64, max: Option<f64>) -> Self {
        let min = if min.is_finite() {
            min.max(MIN_ZOOM)
        } else {
            MIN_ZOOM
        };
        let max = max.filter(|max| max.is_finite()).map(|max| max.max(min));
        Self { min, max }
    }

    #[must_use]
    pub fn min(self) -> f64 {
        self.min
    }

    #[must_use]
    pub fn max(self) -> Option<f64> {
        self.max
    }

    #[must_use]
    pub fn with_min(self, min: f64) -> Self {
        Self::new(min, self.max)
    }

    #[must_use]
    pub fn with_max(self, max: Option<f64>) -> Self {
        Self::new(self.min, max)
    }

    /// Pulls a divisor into range. NaN maps to the minimum.
    #[must_use]
    pub fn clamp(self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return self.min;
        }
        let zoom = zoom.clamp(self.min, f64::MAX);
        match self.max {
            Some(max) => zoom.min(max),
            None => zoom,
        }
    }
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self::new(MIN_ZOOM, None)
    }
}

/// How the zoom divisor is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ZoomMode {
    /// The caller sets the divisor.
    #[default]
    Manual,
    /// Whole image visible, letterboxed.
    AutoFit,
    /// Viewport fully covered, image may overflow.
    AutoFill,
    /// Like [`ZoomMode::AutoFit`] but never enlarges past 1:1.
    AutoFitIn,
}

/// Divisor and logical content size produced by a [`ZoomMode`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTarget {
    pub zoom: f64,
    pub size: Size,
}

impl ZoomMode {
    /// Computes the content size for an image of `image` pixels shown in
    /// `viewport`. `zoom` is used as-is in [`ZoomMode::Manual`] and returned
    /// unchanged for an empty image.
    #[must_use]
    pub fn resolve(self, image: (u32, u32), viewport: Size, zoom: f64) -> ZoomTarget {
        let (image_w, image_h) = (f64::from(image.0), f64::from(image.1));
        if image.0 == 0 || image.1 == 0 {
            return ZoomTarget {
                zoom,
                size: Size::ZERO,
            };
        }

        match self {
            Self::Manual => ZoomTarget {
                zoom,
                size: Size::new((image_w / zoom).floor(), (image_h / zoom).floor()),
            },
            Self::AutoFit => aspect_fit(image_w, image_h, viewport, false),
            Self::AutoFill => aspect_fit(image_w, image_h, viewport, true),
            Self::AutoFitIn => {
                if image_w < viewport.width && image_h < viewport.height {
                    ZoomTarget {
                        zoom: 1.0,
                        size: Size::new(image_w, image_h),
                    }
                } else {
                    aspect_fit(image_w, image_h, viewport, false)
                }
            }
        }
    }

    #[must_use]
    pub fn is_auto(self) -> bool {
        self != Self::Manual
    }
}

/// Fits (or covers, when `cover` is set) the viewport while keeping the
/// image aspect ratio. The divisor follows the image's longer side.
fn aspect_fit(image_w: f64, image_h: f64, viewport: Size, cover: bool) -> ZoomTarget {
    let (view_w, view_h) = (viewport.width.floor(), viewport.height.floor());
    let mut height = (image_h * view_w / image_w).floor();
    let width;

    let swap = if cover { height < view_h } else { height > view_h };
    if swap {
        width = (image_w * view_h / image_h).floor();
        height = view_h;
    } else {
        width = view_w;
    }

    let zoom = if image_w > image_h {
        image_w / width.max(1.0)
    } else {
        image_h / height.max(1.0)
    };

    ZoomTarget {
        zoom,
        size: Size::new(width, height),
    }
}

impl fmt::Display for ZoomMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Manual => "manual",
            Self::AutoFit => "fit",
            Self::AutoFill => "fill",
            Self::AutoFitIn => "fit-in",
        };
        f.write_str(name)
    }
}

impl FromStr for ZoomMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "fit" | "auto-fit" => Ok(Self::AutoFit),
            "fill" | "auto-fill" => Ok(Self::AutoFill),
            "fit-in" | "auto-fit-in" => Ok(Self::AutoFitIn),
            other => Err(format!("unknown zoom mode '{other}'")),
        }
    }
}

/// Smallest power of two greater than or equal to `value`; 0 maps to 1.
#[must_use]
pub fn nearest_pow2(value: u32) -> u32 {
    value
        .max(1)
        .checked_next_power_of_two()
        .unwrap_or(1 << 31)
}

/// Level-of-detail divisor for a zoom divisor: rounded, then raised to a
/// power of two. Magnifying zooms use the 1:1 grid.
#[must_use]
pub fn grid_divisor(zoom: f64) -> u32 {
    let rounded = zoom.round();
    if !(rounded >= 1.0) {
        return 1;
    }
    // Saturating float to int cast.
    nearest_pow2(rounded as u32)
}
