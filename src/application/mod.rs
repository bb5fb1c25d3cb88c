// SPDX-License-Identifier: MPL-2.0
//! Application layer - Collaborator contracts of the viewer engine.
//!
//! - [`port`]: Trait definitions (interfaces) for dependency inversion
//!
//! # Dependency Rule
//!
//! - Application layer depends on domain and media value types
//! - Infrastructure layer implements application layer ports
//! - The engine consumes the ports, never the concrete adapters
//!
//! # Example
//!
//! ```ignore
//! use photocam::application::port::{PannableSurface, TileDecoder};
//!
//! // Infrastructure implements the port traits
//! struct GpuUploader { /* ... */ }
//! impl TileDecoder for GpuUploader { /* ... */ }
//!
//! // The engine is generic over both collaborators
//! let viewer = Photocam::new(config, surface, GpuUploader::new());
//! ```

pub mod port;
