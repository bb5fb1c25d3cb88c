// SPDX-License-Identifier: MPL-2.0
//! Screen placement of the base image and tiles.
//!
//! Placement is recomputed from scratch on every pass from the pan offset,
//! the viewport size, the animated content size and the gesture offset. Tile
//! rectangles are stored pan-independent in their grid and scaled here by
//! `content_size / grid_logical_size`, so a grid keeps lining up with the
//! content while the size animates.

use super::grid::{Grid, GridId, Residency, TileIndex};
use crate::application::port::PannableSurface;
use crate::domain::{PixelRect, Point, Rect, Size};

/// Inputs of one placement pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub pan: Point,
    pub viewport: Size,
    pub content: Size,
    /// Out-of-bounds pan carried by a gesture or bounce.
    pub gesture_offset: Point,
    /// Centers content smaller than the viewport. Off during gestures.
    pub center_small_content: bool,
}

impl Layout {
    /// Offset that centers content narrower or shorter than the viewport.
    #[must_use]
    pub fn centering_offset(&self) -> Point {
        if !self.center_small_content {
            return Point::ORIGIN;
        }
        let axis = |view: f64, content: f64| {
            if view > content {
                ((view - content) / 2.0).floor()
            } else {
                0.0
            }
        };
        Point::new(
            axis(self.viewport.width, self.content.width),
            axis(self.viewport.height, self.content.height),
        )
    }

    /// Viewport position of the content's top-left corner.
    #[must_use]
    pub fn content_origin(&self) -> Point {
        let center = self.centering_offset();
        Point::new(
            center.x - self.pan.x - self.gesture_offset.x,
            center.y - self.pan.y - self.gesture_offset.y,
        )
    }

    #[must_use]
    pub fn viewport_rect(&self) -> Rect {
        Rect::from_origin_size(Point::ORIGIN, self.viewport)
    }

    /// Viewport rectangle of a grid-space rectangle.
    #[must_use]
    pub fn project(&self, dest: PixelRect, grid_size: (u32, u32)) -> Rect {
        let (grid_w, grid_h) = grid_size;
        let scale_x = if grid_w == 0 {
            0.0
        } else {
            self.content.width / f64::from(grid_w)
        };
        let scale_y = if grid_h == 0 {
            0.0
        } else {
            self.content.height / f64::from(grid_h)
        };
        let origin = self.content_origin();
        Rect::new(
            origin.x + f64::from(dest.x) * scale_x,
            origin.y + f64::from(dest.y) * scale_y,
            f64::from(dest.width) * scale_x,
            f64::from(dest.height) * scale_y,
        )
    }

    /// Places the base image and every tile of `grids`.
    #[must_use]
    pub fn place<'a>(&self, grids: impl IntoIterator<Item = &'a Grid>) -> Placement {
        let viewport = self.viewport_rect();
        let base = Rect::from_origin_size(self.content_origin(), self.content);

        let mut tiles = Vec::new();
        for grid in grids {
            let grid_size = grid.logical_size();
            tiles.extend(grid.tiles().iter().map(|tile| {
                let screen_rect = self.project(tile.dest_rect, grid_size);
                TilePlacement {
                    grid: grid.id(),
                    index: tile.index,
                    screen_rect,
                    visible: screen_rect.intersects(viewport),
                    residency: tile.residency(),
                }
            }));
        }

        Placement {
            viewport,
            base,
            tiles,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TilePlacement {
    pub grid: GridId,
    pub index: TileIndex,
    pub screen_rect: Rect,
    pub visible: bool,
    pub residency: Residency,
}

/// Result of a placement pass, in viewport coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placement {
    pub viewport: Rect,
    /// Where the base image is drawn.
    pub base: Rect,
    /// Tiles of the current grid first, then of the retiring grid.
    pub tiles: Vec<TilePlacement>,
}

impl Placement {
    /// Visibility of a grid's tiles, in [`Grid::tiles`] order.
    #[must_use]
    pub fn visibility_for(&self, grid: GridId) -> Vec<bool> {
        self.tiles
            .iter()
            .filter(|tile| tile.grid == grid)
            .map(|tile| tile.visible)
            .collect()
    }

    /// Refreshes residency after the loader has run.
    pub fn sync_residency<'a>(&mut self, grids: impl IntoIterator<Item = &'a Grid>) {
        for grid in grids {
            for placed in self.tiles.iter_mut().filter(|tile| tile.grid == grid.id()) {
                if let Some(tile) = grid.tile(placed.index) {
                    placed.residency = tile.residency();
                }
            }
        }
    }

    pub fn visible_tiles(&self) -> impl Iterator<Item = &TilePlacement> {
        self.tiles.iter().filter(|tile| tile.visible)
    }

    pub fn resident_tiles(&self) -> impl Iterator<Item = &TilePlacement> {
        self.tiles
            .iter()
            .filter(|tile| tile.residency == Residency::Resident)
    }
}

/// Bridges placement and the scrollable surface.
///
/// Holds the one-shot "show this region" request that the next pass hands
/// to the surface before reading the pan back.
#[derive(Debug, Default)]
pub struct ViewportAdapter {
    pending_show: Option<Rect>,
}

impl ViewportAdapter {
    /// Replaces any earlier pending request.
    pub fn request_show(&mut self, region: Rect) {
        self.pending_show = Some(region);
    }

    #[must_use]
    pub fn pending_show(&self) -> Option<Rect> {
        self.pending_show
    }

    pub fn cancel_show(&mut self) {
        self.pending_show = None;
    }

    /// Consumes the pending region, then places everything at the
    /// surface's resulting pan offset.
    pub fn place<'a, S: PannableSurface>(
        &mut self,
        surface: &mut S,
        content: Size,
        gesture_offset: Point,
        center_small_content: bool,
        grids: impl IntoIterator<Item = &'a Grid>,
    ) -> Placement {
        if let Some(region) = self.pending_show.take() {
            surface.scroll_to(region, false);
        }
        let layout = Layout {
            pan: surface.content_position(),
            viewport: surface.viewport_size(),
            content,
            gesture_offset,
            center_small_content,
        };
        layout.place(grids)
    }
}
