// SPDX-License-Identifier: MPL-2.0
//! Pixel decoding over the `image` crate.
//!
//! A region decode loads the whole oriented image once, then crops and
//! downsamples the requested area. [`OrientedImageCache`] keeps the last
//! loaded image so that the tiles of one grid share a single full decode.

use crate::domain::{Orientation, PixelRect};
use crate::error::DecodeError;
use crate::media::source::{ImageSource, SourceId, SourceLocator};
use crate::media::TilePixels;
use image_rs::imageops::FilterType;
use image_rs::DynamicImage;
use std::sync::Arc;

/// Transforms stored pixels into their displayed orientation.
#[must_use]
pub fn apply_orientation(image: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => image,
        Orientation::Rotate90 => image.rotate90(),
        Orientation::Rotate180 => image.rotate180(),
        Orientation::Rotate270 => image.rotate270(),
        Orientation::FlipHorizontal => image.fliph(),
        Orientation::FlipVertical => image.flipv(),
        Orientation::Transpose => image.rotate90().fliph(),
        Orientation::Transverse => image.rotate270().fliph(),
    }
}

/// Fully decodes a source and applies its orientation.
///
/// # Errors
///
/// Returns [`DecodeError::UnsupportedLocator`] for external sources and
/// [`DecodeError::Source`] when the pixel data cannot be decoded.
pub fn load_oriented(source: &ImageSource) -> Result<DynamicImage, DecodeError> {
    let image = match source.locator() {
        SourceLocator::File(path) => image_rs::open(path)?,
        SourceLocator::Encoded(bytes) => image_rs::load_from_memory(bytes)?,
        SourceLocator::Rgba(pixels) => DynamicImage::ImageRgba8(pixels.as_ref().clone()),
        SourceLocator::External(key) => {
            return Err(DecodeError::UnsupportedLocator(key.clone()));
        }
    };
    Ok(apply_orientation(image, source.orientation()))
}

/// Crops `region` (the whole image when `None`) and shrinks it by `divisor`.
///
/// Output dimensions are `region / divisor`, never below one pixel.
pub fn decode_region(
    image: &DynamicImage,
    region: Option<PixelRect>,
    divisor: u32,
) -> Result<TilePixels, DecodeError> {
    let (image_width, image_height) = (image.width(), image.height());
    let region = region.unwrap_or(PixelRect::new(0, 0, image_width, image_height));
    if region.is_empty() || !region.fits_within(image_width, image_height) {
        return Err(DecodeError::RegionOutOfBounds {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
            image_width,
            image_height,
        });
    }

    let cropped = image.crop_imm(region.x, region.y, region.width, region.height);
    let divisor = divisor.max(1);
    let scaled = if divisor > 1 {
        let width = (region.width / divisor).max(1);
        let height = (region.height / divisor).max(1);
        cropped.resize_exact(width, height, FilterType::Triangle)
    } else {
        cropped
    };

    Ok(TilePixels::from_image(scaled.to_rgba8()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    source: SourceId,
    orientation: Orientation,
}

/// Remembers the most recently decoded source.
#[derive(Debug, Default)]
pub struct OrientedImageCache {
    entry: Option<(CacheKey, Arc<DynamicImage>)>,
    loads: u64,
}

impl OrientedImageCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the oriented image for `source`, decoding it on a miss.
    pub fn get_or_load(&mut self, source: &ImageSource) -> Result<Arc<DynamicImage>, DecodeError> {
        let key = CacheKey {
            source: source.id(),
            orientation: source.orientation(),
        };
        if let Some((cached, image)) = &self.entry {
            if *cached == key {
                return Ok(Arc::clone(image));
            }
        }

        let image = Arc::new(load_oriented(source)?);
        self.loads += 1;
        tracing::debug!(width = image.width(), height = image.height(), "decoded full image");
        self.entry = Some((key, Arc::clone(&image)));
        Ok(image)
    }

    /// Number of full decodes performed so far.
    #[must_use]
    pub fn loads(&self) -> u64 {
        self.loads
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

/// Decodes one request without any caching.
pub fn decode_request(
    source: &ImageSource,
    region: Option<PixelRect>,
    divisor: u32,
) -> Result<TilePixels, DecodeError> {
    let image = load_oriented(source)?;
    decode_region(&image, region, divisor)
}
