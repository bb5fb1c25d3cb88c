// SPDX-License-Identifier: MPL-2.0
//! This module handles the engine configuration, including loading and saving
//! tunables to an `engine.toml` file.
//!
//! # Examples
//!
//! ```no_run
//! use photocam::config::{self, EngineConfig};
//!
//! // Load existing configuration
//! let mut config = config::load().unwrap_or_default();
//!
//! // Modify a setting
//! config.tile_size = 256;
//!
//! // Save the modified configuration
//! config::save(&config).expect("Failed to save config");
//! ```

pub mod defaults;

pub use defaults::*;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "engine.toml";
const APP_NAME: &str = "photocam";

/// Tunables passed to [`crate::engine::Photocam`] at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tile edge length in logical pixels.
    pub tile_size: u32,
    /// Grid divisors at or above this value use the base image only.
    pub max_grid_divisor: u32,
    pub zoom_duration_secs: f64,
    pub bounce_duration_secs: f64,
    /// Divisor step for `zoom_in` / `zoom_out`.
    pub zoom_step: f64,
    pub initial_zoom: f64,
    /// Lower bound on the zoom divisor (strongest magnification).
    pub min_zoom: f64,
    /// Upper bound on the zoom divisor, unbounded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
    /// Evicted tiles kept for reuse, 0 disables the cache.
    pub tile_cache_capacity: usize,
    pub gesture_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            max_grid_divisor: DEFAULT_MAX_GRID_DIVISOR,
            zoom_duration_secs: DEFAULT_ZOOM_DURATION_SECS,
            bounce_duration_secs: DEFAULT_BOUNCE_DURATION_SECS,
            zoom_step: DEFAULT_ZOOM_STEP,
            initial_zoom: DEFAULT_ZOOM,
            min_zoom: MIN_ZOOM,
            max_zoom: None,
            tile_cache_capacity: DEFAULT_TILE_CACHE_CAPACITY,
            gesture_enabled: false,
        }
    }
}

impl EngineConfig {
    /// Returns a copy with every value pulled into its valid range.
    ///
    /// Non-finite durations and steps fall back to their defaults.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let min_zoom = finite_or(self.min_zoom, MIN_ZOOM).max(MIN_ZOOM);
        let max_zoom = self
            .max_zoom
            .filter(|max| max.is_finite())
            .map(|max| max.max(min_zoom));

        Self {
            tile_size: self.tile_size.clamp(MIN_TILE_SIZE, MAX_TILE_SIZE),
            max_grid_divisor: self
                .max_grid_divisor
                .clamp(MIN_MAX_GRID_DIVISOR, MAX_MAX_GRID_DIVISOR),
            zoom_duration_secs: finite_or(self.zoom_duration_secs, DEFAULT_ZOOM_DURATION_SECS)
                .clamp(0.0, MAX_ANIMATION_DURATION_SECS),
            bounce_duration_secs: finite_or(
                self.bounce_duration_secs,
                DEFAULT_BOUNCE_DURATION_SECS,
            )
            .clamp(0.0, MAX_ANIMATION_DURATION_SECS),
            zoom_step: finite_or(self.zoom_step, DEFAULT_ZOOM_STEP)
                .clamp(MIN_ZOOM_STEP, MAX_ZOOM_STEP),
            initial_zoom: finite_or(self.initial_zoom, DEFAULT_ZOOM).max(min_zoom),
            min_zoom,
            max_zoom,
            tile_cache_capacity: self.tile_cache_capacity.min(MAX_TILE_CACHE_CAPACITY),
            gesture_enabled: self.gesture_enabled,
        }
    }

    #[must_use]
    pub fn zoom_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.zoom_duration_secs).unwrap_or(Duration::ZERO)
    }

    #[must_use]
    pub fn bounce_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.bounce_duration_secs).unwrap_or(Duration::ZERO)
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

pub fn load() -> Result<EngineConfig> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(EngineConfig::default())
}

pub fn save(config: &EngineConfig) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Reads a config file; unparsable content yields the defaults.
pub fn load_from_path(path: &Path) -> Result<EngineConfig> {
    let content = fs::read_to_string(path)?;
    match toml::from_str::<EngineConfig>(&content) {
        Ok(config) => Ok(config.sanitized()),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "invalid engine config, using defaults");
            Ok(EngineConfig::default())
        }
    }
}

pub fn save_to_path(config: &EngineConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_abs_diff_eq;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip_preserves_values() {
        let config = EngineConfig {
            tile_size: 256,
            max_grid_divisor: 16,
            zoom_duration_secs: 0.25,
            max_zoom: Some(32.0),
            tile_cache_capacity: 12,
            gesture_enabled: true,
            ..EngineConfig::default()
        };
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("engine.toml");

        save_to_path(&config, &config_path).expect("failed to save config");
        let loaded = load_from_path(&config_path).expect("failed to load config");

        assert_eq!(loaded, config);
    }

    #[test]
    fn load_from_path_returns_default_on_invalid_toml() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("engine.toml");
        fs::write(&config_path, "not = valid = toml").expect("failed to write invalid toml");

        let loaded = load_from_path(&config_path).expect("load should not error");
        assert_eq!(loaded, EngineConfig::default());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("engine.toml");
        fs::write(&config_path, "tile_size = 128\n").expect("failed to write partial toml");

        let loaded = load_from_path(&config_path).expect("load should not error");
        assert_eq!(loaded.tile_size, 128);
        assert_eq!(loaded.max_grid_divisor, DEFAULT_MAX_GRID_DIVISOR);
        assert!(loaded.max_zoom.is_none());
    }

    #[test]
    fn save_to_path_creates_parent_directories() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("deep").join("path").join("engine.toml");

        save_to_path(&EngineConfig::default(), &config_path)
            .expect("save should create directories");
        assert!(config_path.exists());
    }

    #[test]
    fn sanitized_clamps_out_of_range_values() {
        let config = EngineConfig {
            tile_size: 1,
            max_grid_divisor: 100_000,
            zoom_duration_secs: -3.0,
            bounce_duration_secs: f64::NAN,
            zoom_step: 0.0,
            initial_zoom: 0.0,
            min_zoom: 0.0,
            max_zoom: Some(-1.0),
            tile_cache_capacity: usize::MAX,
            gesture_enabled: false,
        }
        .sanitized();

        assert_eq!(config.tile_size, MIN_TILE_SIZE);
        assert_eq!(config.max_grid_divisor, MAX_MAX_GRID_DIVISOR);
        assert_abs_diff_eq!(config.zoom_duration_secs, 0.0);
        assert_abs_diff_eq!(config.bounce_duration_secs, DEFAULT_BOUNCE_DURATION_SECS);
        assert_abs_diff_eq!(config.zoom_step, MIN_ZOOM_STEP);
        assert_abs_diff_eq!(config.min_zoom, MIN_ZOOM);
        assert_abs_diff_eq!(config.initial_zoom, MIN_ZOOM);
        assert_eq!(config.max_zoom, Some(MIN_ZOOM));
        assert_eq!(config.tile_cache_capacity, MAX_TILE_CACHE_CAPACITY);
    }

    #[test]
    fn durations_convert_from_seconds() {
        let config = EngineConfig::default();
        assert_eq!(config.zoom_duration(), Duration::from_millis(500));
        assert_eq!(config.bounce_duration(), Duration::from_millis(500));
    }
}
