//! # Engine Configuration
//!
//! Runtime settings loaded from a JSON file. Every field has a default, so a config file only
//! needs to name what it changes:
//!
//! ```json
//! { "world_size": "Small", "render_distance": "Medium", "worker_count": 2 }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::rendering::world_renderer::{
    render_radius_in_super_chunks, DrawParameters, DEFAULT_LIGHT_POSITION, DEFAULT_LIGHT_POWER,
};
use super::voxels::world_generation::{noise_layer::NoiseSettings, DEFAULT_PALETTE_HEIGHT};

/// Errors raised while loading an [`EngineConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON for an [`EngineConfig`].
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A field parsed but holds an unusable value.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// World edge length in super-chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum WorldSize {
    Small = 4,
    #[default]
    Medium = 16,
    High = 32,
    Extreme = 64,
    Insane = 128,
    Ludicrous = 256,
}

impl WorldSize {
    pub fn super_chunks(self) -> i32 {
        self as i32
    }

    /// Super-chunks generated on each side of the origin along x and z.
    pub fn half_size(self) -> i32 {
        self.super_chunks() / 2
    }
}

/// View distance in 32³ sub-chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum RenderDistance {
    #[default]
    Small = 16,
    Medium = 24,
    High = 32,
    Extreme = 64,
    Insane = 128,
}

impl RenderDistance {
    pub fn sub_chunks(self) -> i32 {
        self as i32
    }
}

/// Light used by the voxel material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    pub position: [f32; 3],
    pub power: f32,
}

impl Default for LightSettings {
    fn default() -> Self {
        LightSettings {
            position: DEFAULT_LIGHT_POSITION,
            power: DEFAULT_LIGHT_POWER,
        }
    }
}

/// Top-level engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub world_size: WorldSize,
    pub render_distance: RenderDistance,
    /// Background mesher threads.
    pub worker_count: usize,
    /// Settings of the terrain height layer.
    pub terrain: NoiseSettings,
    /// Height that divides the world into the three colour bands.
    pub palette_height: f64,
    pub light: LightSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            world_size: WorldSize::default(),
            render_distance: RenderDistance::default(),
            worker_count: 4,
            terrain: NoiseSettings::terrain(),
            palette_height: DEFAULT_PALETTE_HEIGHT,
            light: LightSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EngineConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Parses and validates a JSON config held in memory.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            serde_json::from_str(text).map_err(|source| ConfigError::Parse {
                path: PathBuf::from("<memory>"),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::InvalidValue {
                field: "worker_count",
                reason: "at least one worker is needed".to_string(),
            });
        }
        if self.terrain.octaves == 0 {
            return Err(ConfigError::InvalidValue {
                field: "terrain.octaves",
                reason: "at least one octave is needed".to_string(),
            });
        }
        if self.terrain.scale <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "terrain.scale",
                reason: format!("must be positive, got {}", self.terrain.scale),
            });
        }
        let (min, max) = (self.terrain.min, self.terrain.max);
        if min.is_nan() || max.is_nan() || min > max {
            return Err(ConfigError::InvalidValue {
                field: "terrain.min",
                reason: format!("must not exceed terrain.max, got min {} and max {}", min, max),
            });
        }
        if self.palette_height <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "palette_height",
                reason: format!("must be positive, got {}", self.palette_height),
            });
        }
        Ok(())
    }

    /// Search radius of the renderer around the player, in super-chunks.
    pub fn render_radius_in_super_chunks(&self) -> i32 {
        render_radius_in_super_chunks(self.render_distance.sub_chunks())
    }

    /// Draw parameters carrying this config's light and identity camera matrices.
    pub fn draw_parameters(&self) -> DrawParameters {
        DrawParameters {
            light_position: self.light.position.into(),
            light_power: self.light.power,
            ..DrawParameters::default()
        }
    }
}
