// SPDX-License-Identifier: MPL-2.0
//! Decoded RGBA pixel buffers handed from decoders to the engine.

use crate::domain::Orientation;
use crate::error::DecodeError;
use crate::media::decode::apply_orientation;
use std::sync::Arc;

/// RGBA8 pixels of one decoded tile or of the base image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePixels {
    pub width: u32,
    pub height: u32,
    /// Stored in Arc to avoid expensive cloning.
    rgba_bytes: Arc<Vec<u8>>,
}

impl TilePixels {
    /// Wraps RGBA pixels; the buffer length must be `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, DecodeError> {
        let expected = u64::from(width) * u64::from(height) * 4;
        if pixels.len() as u64 != expected {
            return Err(DecodeError::Worker(format!(
                "pixel buffer holds {} bytes, {width}x{height} RGBA needs {expected}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba_bytes: Arc::new(pixels),
        })
    }

    /// An opaque black buffer.
    #[must_use]
    pub fn blank(width: u32, height: u32) -> Self {
        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        for alpha in pixels.iter_mut().skip(3).step_by(4) {
            *alpha = u8::MAX;
        }
        Self {
            width,
            height,
            rgba_bytes: Arc::new(pixels),
        }
    }

    pub(crate) fn from_image(image: image_rs::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            rgba_bytes: Arc::new(image.into_vec()),
        }
    }

    #[must_use]
    pub fn rgba_bytes(&self) -> &[u8] {
        &self.rgba_bytes
    }

    /// Memory held by the pixel buffer.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.rgba_bytes.len()
    }

    /// Re-expresses pixels decoded under `from` as if decoded under `to`,
    /// in memory.
    pub fn reoriented(&self, from: Orientation, to: Orientation) -> Result<Self, DecodeError> {
        if from == to {
            return Ok(self.clone());
        }

        let image = image_rs::RgbaImage::from_raw(self.width, self.height, self.rgba_bytes.to_vec())
            .ok_or_else(|| DecodeError::Worker("pixel buffer does not match its size".into()))?;
        let stored = apply_orientation(image_rs::DynamicImage::ImageRgba8(image), from.inverse());
        let target = apply_orientation(stored, to);
        Ok(Self::from_image(target.to_rgba8()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_rejects_wrong_length() {
        assert!(TilePixels::from_rgba(2, 2, vec![0; 15]).is_err());
        let pixels = TilePixels::from_rgba(2, 2, vec![0; 16]).expect("valid buffer");
        assert_eq!(pixels.size_bytes(), 16);
    }

    #[test]
    fn blank_is_opaque() {
        let pixels = TilePixels::blank(3, 1);
        assert_eq!(pixels.rgba_bytes(), &[0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255]);
    }

    #[test]
    fn reoriented_swaps_dimensions_for_quarter_turn() {
        let mut pixels = vec![0u8; 4 * 2 * 4];
        // Mark top-left pixel red.
        pixels[0] = 255;
        pixels[3] = 255;
        let tile = TilePixels::from_rgba(4, 2, pixels).expect("valid buffer");

        let rotated = tile
            .reoriented(Orientation::Normal, Orientation::Rotate90)
            .expect("rotation succeeds");
        assert_eq!((rotated.width, rotated.height), (2, 4));
        // Top-left moves to the top-right corner after a clockwise turn.
        let top_right = (rotated.width as usize - 1) * 4;
        assert_eq!(rotated.rgba_bytes()[top_right], 255);

        let back = rotated
            .reoriented(Orientation::Rotate90, Orientation::Normal)
            .expect("rotation succeeds");
        assert_eq!(back, tile);
    }
}
