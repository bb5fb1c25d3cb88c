// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! This module contains concrete implementations of the port traits defined in
//! `application::port`.
//!
//! # Available Adapters
//!
//! - [`decoder`]: Decoding over the `image` crate ([`ThreadedDecoder`],
//!   [`DeferredDecoder`]) and host-driven decoding ([`ManualDecoder`]),
//!   all implementing [`TileDecoder`]
//! - [`scroll`]: A headless scrollable surface ([`ScrollState`], implements
//!   [`PannableSurface`])
//!
//! [`TileDecoder`]: crate::application::port::TileDecoder
//! [`PannableSurface`]: crate::application::port::PannableSurface

pub mod decoder;
pub mod scroll;

// Re-export main types for convenience
pub use decoder::{DeferredDecoder, ManualDecoder, ThreadedDecoder};
pub use scroll::{ScrollRequest, ScrollState};
