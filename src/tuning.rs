//! Data-driven game balance
//!
//! Every number that shapes how the game plays lives here so it can be
//! tweaked from JSON without a rebuild. Missing fields fall back to the
//! defaults, so a tuning file only needs the values it changes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ms_to_ticks;

/// Upper bound for either solver iteration count
pub const MAX_ITERATIONS: u32 = 1000;

/// Problems loading or validating a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read tuning file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f32 },
    #[error("preview_sizes must not be empty")]
    NoPreviewSizes,
    #[error("preview size {size} cannot be dropped: merging at or above max_radius {max_radius}")]
    PreviewTooLarge { size: f32, max_radius: f32 },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f32 },
    #[error("{field} must be at least 1")]
    ZeroIterations { field: &'static str },
    #[error("{field} must be at most {max} (got {value})")]
    TooManyIterations {
        field: &'static str,
        value: u32,
        max: u32,
    },
}

/// Game balance values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Radius added when two equal balls merge
    pub merge_growth: f32,
    /// Merges reaching this radius clear both balls instead
    pub max_radius: f32,
    /// Flash time before a merge resolves (ms)
    pub merge_delay_ms: u32,
    /// Time between accepted drops (ms)
    pub spawn_cooldown_ms: u32,
    /// Drops are accepted only at or above this y
    pub spawn_zone_height: f32,
    /// Radii the preview ball is drawn from
    pub preview_sizes: Vec<f32>,
    /// Density = density_factor * r^2
    pub density_factor: f32,
    pub friction: f32,
    pub restitution: f32,
    /// Downward acceleration (px/s^2)
    pub gravity: f32,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            merge_growth: 15.0,
            max_radius: 110.0,
            merge_delay_ms: 100,
            spawn_cooldown_ms: 1000,
            spawn_zone_height: crate::consts::SPAWN_ZONE_HEIGHT,
            preview_sizes: vec![20.0, 35.0, 50.0],
            density_factor: 0.001,
            friction: 0.001,
            restitution: 0.0,
            gravity: 1000.0,
            velocity_iterations: 100,
            position_iterations: 100,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from a JSON string
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file on disk
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_file(path: &str) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path).map_err(|source| TuningError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Check that the values describe a playable game
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("merge_growth", self.merge_growth),
            ("max_radius", self.max_radius),
            ("spawn_zone_height", self.spawn_zone_height),
            ("density_factor", self.density_factor),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(TuningError::NotPositive { field, value });
            }
        }

        let non_negative = [
            ("friction", self.friction),
            ("restitution", self.restitution),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) {
                return Err(TuningError::Negative { field, value });
            }
        }

        if self.preview_sizes.is_empty() {
            return Err(TuningError::NoPreviewSizes);
        }
        for &size in &self.preview_sizes {
            if !(size > 0.0) {
                return Err(TuningError::NotPositive {
                    field: "preview_sizes",
                    value: size,
                });
            }
            if size >= self.max_radius {
                return Err(TuningError::PreviewTooLarge {
                    size,
                    max_radius: self.max_radius,
                });
            }
        }

        let iterations = [
            ("velocity_iterations", self.velocity_iterations),
            ("position_iterations", self.position_iterations),
        ];
        for (field, value) in iterations {
            if value == 0 {
                return Err(TuningError::ZeroIterations { field });
            }
            if value > MAX_ITERATIONS {
                return Err(TuningError::TooManyIterations {
                    field,
                    value,
                    max: MAX_ITERATIONS,
                });
            }
        }

        Ok(())
    }

    /// Merge delay in simulation ticks
    pub fn merge_delay_ticks(&self) -> u32 {
        ms_to_ticks(self.merge_delay_ms)
    }

    /// Spawn cooldown in simulation ticks
    pub fn spawn_cooldown_ticks(&self) -> u32 {
        ms_to_ticks(self.spawn_cooldown_ms)
    }
}
