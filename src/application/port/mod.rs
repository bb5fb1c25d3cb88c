// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! The engine never owns a window, a thread pool or an input device. It talks
//! to them through these traits, injected at construction.
//!
//! # Available Ports
//!
//! - [`surface`]: The scrollable container hosting the content
//! - [`decoder`]: Asynchronous pixel decoding
//! - [`gesture`]: Pinch-zoom input
//!
//! # Design Notes
//!
//! - Every call happens on the engine's own execution context
//! - Decoders report completions by being polled, never by callback
//! - Methods never fail; failures travel inside completions
//!
//! # Example
//!
//! ```ignore
//! use photocam::application::port::TileDecoder;
//!
//! fn drain(decoder: &mut impl TileDecoder) -> usize {
//!     decoder.poll_completions().len()
//! }
//! ```

pub mod decoder;
pub mod gesture;
pub mod surface;

// Re-export main types for convenience
pub use decoder::{DecodeCompletion, DecodeHandle, DecodeRequest, TileDecoder};
pub use gesture::{GestureEvent, GesturePhase, GestureSource};
pub use surface::PannableSurface;
