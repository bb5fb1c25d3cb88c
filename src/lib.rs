// SPDX-License-Identifier: MPL-2.0
//! `photocam` is a tiled, zoomable image viewer engine.
//!
//! It shows images far larger than the screen by cutting them into tiles at
//! power-of-two levels of detail, decoding only what the viewport touches,
//! and animating between zoom levels with a pinch-zoom bridge on top. The
//! engine owns no window: drawing, scrolling and decoding go through the
//! ports in [`application::port`].

#![doc(html_root_url = "https://docs.rs/photocam/0.1.0")]

pub mod application;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod infrastructure;
pub mod media;

#[cfg(test)]
pub(crate) mod test_utils;

pub use engine::{Photocam, ViewerEvent};
pub use error::{DecodeError, Error, LoadError};
