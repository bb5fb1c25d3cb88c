// SPDX-License-Identifier: MPL-2.0
//! Image orientation domain type.
//!
//! Covers the eight EXIF orientations: the four quarter-turn rotations and
//! the four mirrored variants.

/// How the stored pixels must be transformed for display.
///
/// # Example
///
/// ```
/// use photocam::domain::Orientation;
///
/// let orientation = Orientation::default();
/// assert_eq!(orientation.degrees(), 0);
///
/// let rotated = orientation.rotate_clockwise();
/// assert_eq!(rotated, Orientation::Rotate90);
/// assert_eq!(rotated.apply_to_size(400, 300), (300, 400));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    Normal,
    /// 90° clockwise.
    Rotate90,
    Rotate180,
    /// 270° clockwise.
    Rotate270,
    /// Mirrored left to right.
    FlipHorizontal,
    /// Mirrored top to bottom.
    FlipVertical,
    /// Mirrored along the top-left to bottom-right diagonal.
    Transpose,
    /// Mirrored along the top-right to bottom-left diagonal.
    Transverse,
}

impl Orientation {
    /// Maps an EXIF `Orientation` tag value (1-8).
    #[must_use]
    pub fn from_exif(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Normal),
            2 => Some(Self::FlipHorizontal),
            3 => Some(Self::Rotate180),
            4 => Some(Self::FlipVertical),
            5 => Some(Self::Transpose),
            6 => Some(Self::Rotate90),
            7 => Some(Self::Transverse),
            8 => Some(Self::Rotate270),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_exif(self) -> u32 {
        match self {
            Self::Normal => 1,
            Self::FlipHorizontal => 2,
            Self::Rotate180 => 3,
            Self::FlipVertical => 4,
            Self::Transpose => 5,
            Self::Rotate90 => 6,
            Self::Transverse => 7,
            Self::Rotate270 => 8,
        }
    }

    /// Rotation component in degrees; mirrored variants report 0.
    #[must_use]
    pub fn degrees(self) -> u16 {
        match self {
            Self::Rotate90 => 90,
            Self::Rotate180 => 180,
            Self::Rotate270 => 270,
            _ => 0,
        }
    }

    #[must_use]
    pub fn is_mirrored(self) -> bool {
        matches!(
            self,
            Self::FlipHorizontal | Self::FlipVertical | Self::Transpose | Self::Transverse
        )
    }

    /// Returns true if width and height swap when displayed.
    #[must_use]
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Self::Rotate90 | Self::Rotate270 | Self::Transpose | Self::Transverse
        )
    }

    /// Displayed dimensions of a `width` x `height` stored image.
    #[must_use]
    pub fn apply_to_size(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// The orientation that undoes this one.
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            Self::Rotate90 => Self::Rotate270,
            Self::Rotate270 => Self::Rotate90,
            other => other,
        }
    }

    /// Rotates 90° clockwise. Mirrored variants drop their mirroring.
    #[must_use]
    pub fn rotate_clockwise(self) -> Self {
        match self.degrees() {
            0 => Self::Rotate90,
            90 => Self::Rotate180,
            180 => Self::Rotate270,
            _ => Self::Normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Orientation; 8] = [
        Orientation::Normal,
        Orientation::Rotate90,
        Orientation::Rotate180,
        Orientation::Rotate270,
        Orientation::FlipHorizontal,
        Orientation::FlipVertical,
        Orientation::Transpose,
        Orientation::Transverse,
    ];

    #[test]
    fn exif_values_round_trip() {
        for orientation in ALL {
            assert_eq!(Orientation::from_exif(orientation.to_exif()), Some(orientation));
        }
        assert_eq!(Orientation::from_exif(0), None);
        assert_eq!(Orientation::from_exif(9), None);
    }

    #[test]
    fn quarter_turns_and_diagonals_swap_dimensions() {
        assert_eq!(Orientation::Rotate90.apply_to_size(4, 3), (3, 4));
        assert_eq!(Orientation::Transpose.apply_to_size(4, 3), (3, 4));
        assert_eq!(Orientation::Transverse.apply_to_size(4, 3), (3, 4));
        assert_eq!(Orientation::Rotate180.apply_to_size(4, 3), (4, 3));
        assert_eq!(Orientation::FlipVertical.apply_to_size(4, 3), (4, 3));
    }

    #[test]
    fn inverse_composes_to_identity_size() {
        for orientation in ALL {
            let (w, h) = orientation.apply_to_size(7, 5);
            assert_eq!(orientation.inverse().apply_to_size(w, h), (7, 5));
        }
        assert_eq!(Orientation::Rotate90.inverse(), Orientation::Rotate270);
        assert_eq!(Orientation::Transpose.inverse(), Orientation::Transpose);
    }

    #[test]
    fn rotate_clockwise_cycles() {
        let full = Orientation::Normal
            .rotate_clockwise()
            .rotate_clockwise()
            .rotate_clockwise()
            .rotate_clockwise();
        assert_eq!(full, Orientation::Normal);
    }

    #[test]
    fn mirrored_variants_are_flagged() {
        assert!(Orientation::FlipHorizontal.is_mirrored());
        assert!(Orientation::Transverse.is_mirrored());
        assert!(!Orientation::Rotate270.is_mirrored());
    }
}
