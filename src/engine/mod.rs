// SPDX-License-Identifier: MPL-2.0
//! The viewer engine.
//!
//! # Modules
//!
//! - [`viewer`]: The [`Photocam`] facade hosts drive
//! - [`grid`]: Level-of-detail tile grids ([`Grid`], [`GridSet`])
//! - [`loader`]: Decode bookkeeping and culling ([`TileLoader`])
//! - [`placement`]: Screen placement of base image and tiles ([`Placement`])
//! - [`animator`]: Eased zoom transitions ([`ZoomAnimator`])
//! - [`gesture`]: Pinch-zoom tracking and bounce-back ([`GestureSession`])
//! - [`events`]: Notifications for the host ([`ViewerEvent`])

pub mod animator;
pub mod events;
pub mod gesture;
pub mod grid;
pub mod loader;
pub mod placement;
pub mod viewer;

pub use animator::{ease_out, Timeline, ZoomAnimator};
pub use events::{EventQueue, ViewerEvent};
pub use gesture::{Bounce, GestureSession};
pub use grid::{Grid, GridId, GridSet, GridSpec, Residency, Tile, TileIndex, TileState};
pub use loader::{BaseLayer, CompletionOutcome, CullStats, TileLoader};
pub use placement::{Layout, Placement, TilePlacement, ViewportAdapter};
pub use viewer::Photocam;
