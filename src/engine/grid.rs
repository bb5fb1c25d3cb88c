// SPDX-License-Identifier: MPL-2.0
//! Level-of-detail grids.
//!
//! A [`Grid`] cuts the image into square tiles at one power-of-two divisor.
//! The engine keeps at most two alive: the current grid and the one it is
//! zooming away from ([`GridSet`]).

use crate::application::port::DecodeHandle;
use crate::domain::{grid_divisor, PixelRect};
use crate::media::TilePixels;

/// Unique id of a grid generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridId(u64);

impl GridId {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileIndex {
    pub row: u32,
    pub col: u32,
}

impl TileIndex {
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Residency of a tile, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Residency {
    Idle,
    Wanted,
    Resident,
}

#[derive(Debug, Clone)]
pub enum TileState {
    Idle,
    /// A decode is outstanding.
    Wanted(DecodeHandle),
    Resident(TilePixels),
}

#[derive(Debug, Clone)]
pub struct Tile {
    pub index: TileIndex,
    /// Area of the oriented image covered by the tile.
    pub source_rect: PixelRect,
    /// Placement within the grid's logical space.
    pub dest_rect: PixelRect,
    pub state: TileState,
}

impl Tile {
    #[must_use]
    pub fn residency(&self) -> Residency {
        match self.state {
            TileState::Idle => Residency::Idle,
            TileState::Wanted(_) => Residency::Wanted,
            TileState::Resident(_) => Residency::Resident,
        }
    }

    #[must_use]
    pub fn handle(&self) -> Option<DecodeHandle> {
        match self.state {
            TileState::Wanted(handle) => Some(handle),
            _ => None,
        }
    }

    #[must_use]
    pub fn pixels(&self) -> Option<&TilePixels> {
        match &self.state {
            TileState::Resident(pixels) => Some(pixels),
            _ => None,
        }
    }
}

/// Inputs for building a grid.
#[derive(Debug, Clone, Copy)]
pub struct GridSpec {
    pub image_width: u32,
    pub image_height: u32,
    pub tile_size: u32,
    /// Divisors at or above this build no grid.
    pub max_divisor: u32,
    /// Without region decoding a grid is one tile covering the whole image.
    pub region_decoding: bool,
}

#[derive(Debug, Clone)]
pub struct Grid {
    id: GridId,
    divisor: u32,
    tile_size: u32,
    logical_width: u32,
    logical_height: u32,
    cols: u32,
    rows: u32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Builds the grid matching a zoom divisor, if one should exist.
    #[must_use]
    pub fn for_divisor(id: GridId, zoom: f64, spec: &GridSpec) -> Option<Self> {
        Self::with_grid_divisor(id, grid_divisor(zoom), spec)
    }

    /// Builds a grid at an exact power-of-two divisor.
    ///
    /// Returns `None` when `divisor >= spec.max_divisor`; the base image
    /// alone is shown then.
    #[must_use]
    pub fn with_grid_divisor(id: GridId, divisor: u32, spec: &GridSpec) -> Option<Self> {
        let divisor = divisor.max(1);
        if divisor >= spec.max_divisor {
            return None;
        }

        let tile_size = spec.tile_size.max(1);
        let logical_width = spec.image_width / divisor;
        let logical_height = spec.image_height / divisor;

        let (cols, rows) = if logical_width == 0 || logical_height == 0 {
            (0, 0)
        } else if spec.region_decoding {
            (
                logical_width.div_ceil(tile_size),
                logical_height.div_ceil(tile_size),
            )
        } else {
            (1, 1)
        };

        let mut tiles = Vec::with_capacity(cols as usize * rows as usize);
        for row in 0..rows {
            for col in 0..cols {
                let (source_rect, dest_rect) = if spec.region_decoding {
                    let x = col * tile_size;
                    let y = row * tile_size;
                    let w = tile_size.min(logical_width - x);
                    let h = tile_size.min(logical_height - y);
                    (
                        PixelRect::new(x * divisor, y * divisor, w * divisor, h * divisor),
                        PixelRect::new(x, y, w, h),
                    )
                } else {
                    (
                        PixelRect::new(0, 0, spec.image_width, spec.image_height),
                        PixelRect::new(0, 0, logical_width, logical_height),
                    )
                };
                tiles.push(Tile {
                    index: TileIndex::new(row, col),
                    source_rect,
                    dest_rect,
                    state: TileState::Idle,
                });
            }
        }

        tracing::debug!(
            grid = id.value(),
            divisor,
            cols,
            rows,
            logical_width,
            logical_height,
            "built grid"
        );

        Some(Self {
            id,
            divisor,
            tile_size,
            logical_width,
            logical_height,
            cols,
            rows,
            tiles,
        })
    }

    #[must_use]
    pub fn id(&self) -> GridId {
        self.id
    }

    #[must_use]
    pub fn divisor(&self) -> u32 {
        self.divisor
    }

    #[must_use]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Size of the image at this grid's divisor.
    #[must_use]
    pub fn logical_size(&self) -> (u32, u32) {
        (self.logical_width, self.logical_height)
    }

    #[must_use]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    #[must_use]
    pub fn into_tiles(self) -> Vec<Tile> {
        self.tiles
    }

    #[must_use]
    pub fn tile(&self, index: TileIndex) -> Option<&Tile> {
        self.position(index).map(|i| &self.tiles[i])
    }

    pub fn tile_mut(&mut self, index: TileIndex) -> Option<&mut Tile> {
        self.position(index).map(move |i| &mut self.tiles[i])
    }

    /// Number of tiles in the given state.
    #[must_use]
    pub fn count(&self, residency: Residency) -> usize {
        self.tiles
            .iter()
            .filter(|tile| tile.residency() == residency)
            .count()
    }

    fn position(&self, index: TileIndex) -> Option<usize> {
        (index.row < self.rows && index.col < self.cols)
            .then(|| index.row as usize * self.cols as usize + index.col as usize)
    }
}

/// The current grid and the grid being zoomed away from.
#[derive(Debug, Default)]
pub struct GridSet {
    pub current: Option<Grid>,
    pub retiring: Option<Grid>,
}

impl GridSet {
    pub fn find_mut(&mut self, id: GridId) -> Option<&mut Grid> {
        [self.current.as_mut(), self.retiring.as_mut()]
            .into_iter()
            .flatten()
            .find(|grid| grid.id() == id)
    }

    /// Alive grids, current first.
    pub fn iter(&self) -> impl Iterator<Item = &Grid> {
        self.current.iter().chain(self.retiring.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.retiring.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(width: u32, height: u32) -> GridSpec {
        GridSpec {
            image_width: width,
            image_height: height,
            tile_size: 512,
            max_divisor: 8,
            region_decoding: true,
        }
    }

    #[test]
    fn tiles_partition_image_exactly() {
        let grid = Grid::for_divisor(GridId::new(1), 1.0, &spec(1000, 700)).expect("grid");
        assert_eq!((grid.cols(), grid.rows()), (2, 2));
        assert_eq!(grid.tiles().len(), 4);

        let last = grid.tile(TileIndex::new(1, 1)).expect("tile");
        assert_eq!(last.dest_rect, PixelRect::new(512, 512, 488, 188));
        assert_eq!(last.source_rect, last.dest_rect);

        let area: u64 = grid.tiles().iter().map(|t| t.source_rect.area()).sum();
        assert_eq!(area, 1000 * 700);
    }

    #[test]
    fn source_rects_scale_with_divisor() {
        let grid = Grid::for_divisor(GridId::new(1), 2.2, &spec(4096, 3000)).expect("grid");
        assert_eq!(grid.divisor(), 2);
        assert_eq!(grid.logical_size(), (2048, 1500));
        assert_eq!((grid.cols(), grid.rows()), (4, 3));

        let tile = grid.tile(TileIndex::new(2, 3)).expect("tile");
        assert_eq!(tile.dest_rect, PixelRect::new(1536, 1024, 512, 476));
        assert_eq!(tile.source_rect, PixelRect::new(3072, 2048, 1024, 952));
    }

    #[test]
    fn divisor_at_ceiling_builds_no_grid() {
        assert!(Grid::for_divisor(GridId::new(1), 6.0, &spec(4096, 4096)).is_none());
        assert!(Grid::with_grid_divisor(GridId::new(1), 8, &spec(4096, 4096)).is_none());
        assert!(Grid::with_grid_divisor(GridId::new(1), 4, &spec(4096, 4096)).is_some());
    }

    #[test]
    fn without_region_decoding_grid_is_single_tile() {
        let spec = GridSpec {
            region_decoding: false,
            ..spec(3000, 2000)
        };
        let grid = Grid::with_grid_divisor(GridId::new(1), 2, &spec).expect("grid");
        assert_eq!(grid.tiles().len(), 1);
        let tile = &grid.tiles()[0];
        assert_eq!(tile.source_rect, PixelRect::new(0, 0, 3000, 2000));
        assert_eq!(tile.dest_rect, PixelRect::new(0, 0, 1500, 1000));
    }

    #[test]
    fn empty_image_has_no_tiles() {
        let grid = Grid::for_divisor(GridId::new(1), 1.0, &spec(0, 100)).expect("grid");
        assert!(grid.tiles().is_empty());
        assert_eq!(grid.count(Residency::Idle), 0);
    }

    #[test]
    fn tile_lookup_rejects_out_of_range() {
        let grid = Grid::for_divisor(GridId::new(1), 1.0, &spec(600, 600)).expect("grid");
        assert!(grid.tile(TileIndex::new(1, 1)).is_some());
        assert!(grid.tile(TileIndex::new(2, 0)).is_none());
    }

    #[test]
    fn grid_set_finds_by_id() {
        let mut set = GridSet {
            current: Grid::for_divisor(GridId::new(2), 1.0, &spec(100, 100)),
            retiring: Grid::for_divisor(GridId::new(1), 2.0, &spec(100, 100)),
        };
        assert_eq!(set.len(), 2);
        assert_eq!(set.find_mut(GridId::new(1)).map(|g| g.divisor()), Some(2));
        assert!(set.find_mut(GridId::new(3)).is_none());
    }
}
