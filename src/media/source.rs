// SPDX-License-Identifier: MPL-2.0
//! Image sources: where the pixels live and how they are oriented.
//!
//! Constructing a source probes the container for its format and dimensions
//! without decoding any pixels. Decoding is left to a
//! [`crate::application::port::TileDecoder`].

use crate::domain::Orientation;
use crate::error::LoadError;
use image_rs::{ImageReader, RgbaImage};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of the pixel data behind a source, shared by its clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u64);

impl SourceId {
    fn next() -> Self {
        Self(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Where the backing pixel data can be found.
#[derive(Debug, Clone)]
pub enum SourceLocator {
    File(PathBuf),
    /// An encoded image (PNG, JPEG, ...) held in memory.
    Encoded(Arc<Vec<u8>>),
    /// Already decoded RGBA pixels, stored unoriented.
    Rgba(Arc<RgbaImage>),
    /// An opaque key only a host-provided decoder knows how to resolve.
    External(String),
}

/// The image being viewed.
#[derive(Debug, Clone)]
pub struct ImageSource {
    id: SourceId,
    locator: SourceLocator,
    raw_width: u32,
    raw_height: u32,
    orientation: Orientation,
    region_decoding: bool,
}

impl ImageSource {
    /// Opens an image file, reading its dimensions and EXIF orientation.
    ///
    /// # Errors
    ///
    /// - [`LoadError::NotFound`] / [`LoadError::PermissionDenied`] when the
    ///   file cannot be opened
    /// - [`LoadError::UnsupportedFormat`] when the format is not recognized
    /// - [`LoadError::CorruptData`] when the header cannot be parsed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let (width, height) = probe_dimensions(reader)?;

        let orientation = File::open(path)
            .ok()
            .and_then(|file| read_exif_orientation(&mut BufReader::new(file)))
            .unwrap_or_default();

        tracing::info!(
            path = %path.display(),
            width,
            height,
            ?orientation,
            "opened image source"
        );
        Ok(Self::with_locator(
            SourceLocator::File(path.to_path_buf()),
            width,
            height,
            orientation,
        ))
    }

    /// Wraps an encoded image held in memory.
    pub fn from_encoded(bytes: Vec<u8>) -> Result<Self, LoadError> {
        let reader = ImageReader::new(Cursor::new(bytes.as_slice())).with_guessed_format()?;
        let (width, height) = probe_dimensions(reader)?;
        let orientation =
            read_exif_orientation(&mut Cursor::new(bytes.as_slice())).unwrap_or_default();

        Ok(Self::with_locator(
            SourceLocator::Encoded(Arc::new(bytes)),
            width,
            height,
            orientation,
        ))
    }

    /// Wraps a buffer received from a stream. Such buffers cannot be
    /// decoded piecewise, so the viewer uses a single tile.
    pub fn streamed(bytes: Vec<u8>) -> Result<Self, LoadError> {
        Ok(Self::from_encoded(bytes)?.with_region_decoding(false))
    }

    /// Wraps already decoded RGBA pixels.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, LoadError> {
        let image = RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
            LoadError::CorruptData(format!("pixel buffer does not hold {width}x{height} RGBA"))
        })?;
        Ok(Self::with_locator(
            SourceLocator::Rgba(Arc::new(image)),
            width,
            height,
            Orientation::Normal,
        ))
    }

    /// Describes pixels that a custom decoder resolves from `key`.
    #[must_use]
    pub fn external(key: impl Into<String>, width: u32, height: u32) -> Self {
        Self::with_locator(SourceLocator::External(key.into()), width, height, Orientation::Normal)
    }

    fn with_locator(
        locator: SourceLocator,
        width: u32,
        height: u32,
        orientation: Orientation,
    ) -> Self {
        Self {
            id: SourceId::next(),
            locator,
            raw_width: width,
            raw_height: height,
            orientation,
            region_decoding: true,
        }
    }

    #[must_use]
    pub fn with_region_decoding(mut self, enabled: bool) -> Self {
        self.region_decoding = enabled;
        self
    }

    #[must_use]
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    #[must_use]
    pub fn id(&self) -> SourceId {
        self.id
    }

    #[must_use]
    pub fn locator(&self) -> &SourceLocator {
        &self.locator
    }

    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    #[must_use]
    pub fn supports_region_decoding(&self) -> bool {
        self.region_decoding
    }

    /// Stored dimensions, before orientation.
    #[must_use]
    pub fn raw_size(&self) -> (u32, u32) {
        (self.raw_width, self.raw_height)
    }

    /// Displayed dimensions, after orientation.
    #[must_use]
    pub fn pixel_size(&self) -> (u32, u32) {
        self.orientation.apply_to_size(self.raw_width, self.raw_height)
    }

    #[must_use]
    pub fn pixel_width(&self) -> u32 {
        self.pixel_size().0
    }

    #[must_use]
    pub fn pixel_height(&self) -> u32 {
        self.pixel_size().1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw_width == 0 || self.raw_height == 0
    }
}

fn probe_dimensions<R: BufRead + Seek>(reader: ImageReader<R>) -> Result<(u32, u32), LoadError> {
    if reader.format().is_none() {
        return Err(LoadError::UnsupportedFormat);
    }
    Ok(reader.into_dimensions()?)
}

/// Reads the EXIF `Orientation` tag, if the container carries one.
fn read_exif_orientation<R: BufRead + Seek>(reader: &mut R) -> Option<Orientation> {
    let exif = exif::Reader::new().read_from_container(reader).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    field.value.get_uint(0).and_then(Orientation::from_exif)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, image_rs::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image_rs::ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    #[test]
    fn open_reads_dimensions_without_exif() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let path = temp_dir.path().join("tiny.png");
        std::fs::write(&path, encode_png(40, 30)).expect("write png");

        let source = ImageSource::open(&path).expect("open png");
        assert_eq!(source.pixel_size(), (40, 30));
        assert_eq!(source.orientation(), Orientation::Normal);
        assert!(source.supports_region_decoding());
        assert!(matches!(source.locator(), SourceLocator::File(p) if p == &path));
    }

    #[test]
    fn open_missing_file_is_not_found() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let err = ImageSource::open(temp_dir.path().join("absent.png")).unwrap_err();
        assert_eq!(err, LoadError::NotFound);
    }

    #[test]
    fn open_garbage_is_unsupported() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let path = temp_dir.path().join("notes.txt");
        std::fs::write(&path, b"definitely not an image").expect("write text");

        assert_eq!(ImageSource::open(&path).unwrap_err(), LoadError::UnsupportedFormat);
    }

    #[test]
    fn orientation_swaps_pixel_size() {
        let source =
            ImageSource::external("slide-7", 400, 300).with_orientation(Orientation::Rotate270);
        assert_eq!(source.raw_size(), (400, 300));
        assert_eq!(source.pixel_size(), (300, 400));
        assert_eq!(source.pixel_width(), 300);
    }

    #[test]
    fn streamed_sources_disable_region_decoding() {
        let source = ImageSource::streamed(encode_png(8, 8)).expect("decode header");
        assert!(!source.supports_region_decoding());
        assert_eq!(source.pixel_size(), (8, 8));
    }

    #[test]
    fn from_rgba_validates_buffer() {
        assert!(ImageSource::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            ImageSource::from_rgba(2, 2, vec![0; 3]),
            Err(LoadError::CorruptData(_))
        ));
    }

    #[test]
    fn clones_share_identity() {
        let source = ImageSource::external("a", 1, 1);
        let other = ImageSource::external("a", 1, 1);
        assert_eq!(source.clone().id(), source.id());
        assert_ne!(source.id(), other.id());
    }
}
