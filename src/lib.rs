//! Merge Drop - drop balls into a box, matching sizes merge into bigger ones
//!
//! Core modules:
//! - `sim`: Deterministic simulation (rigid bodies, merge rules, game state)
//! - `renderer`: WebGPU rendering pipeline
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences
//! - `highscores`: Best scores leaderboard

pub mod highscores;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::HighScores;
pub use settings::{QualityPreset, Settings};
pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
///
/// World coordinates match the canvas: origin top-left, y grows downward.
pub mod consts {
    /// Fixed simulation timestep (120 Hz for stable stacking)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Playfield dimensions (pixels)
    pub const WORLD_WIDTH: f32 = 300.0;
    pub const WORLD_HEIGHT: f32 = 600.0;

    /// Box walls: thickness and the height of the side walls
    pub const WALL_THICKNESS: f32 = 20.0;
    pub const SIDE_WALL_HEIGHT: f32 = 400.0;

    /// Spawn zone box drawn across the top of the playfield
    pub const SPAWN_ZONE_HEIGHT: f32 = 100.0;

    /// Where the preview ball sits inside the spawn zone
    pub const PREVIEW_X: f32 = 150.0;
    pub const PREVIEW_Y: f32 = 25.0;

    /// Balls further than this below the floor are dropped from the world
    pub const CULL_MARGIN: f32 = 200.0;
}

/// Axis-aligned box corners from a center point and full size
#[inline]
pub fn rect_from_center(center: Vec2, size: Vec2) -> (Vec2, Vec2) {
    let half = size * 0.5;
    (center - half, center + half)
}

/// Convert a duration in milliseconds to whole simulation ticks (rounded)
#[inline]
pub fn ms_to_ticks(ms: u32) -> u32 {
    ((ms as f32 / 1000.0) / consts::SIM_DT).round() as u32
}

/// Midpoint of two positions
#[inline]
pub fn midpoint(a: Vec2, b: Vec2) -> Vec2 {
    (a + b) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_from_center() {
        let (min, max) = rect_from_center(Vec2::new(150.0, 600.0), Vec2::new(300.0, 20.0));
        assert_eq!(min, Vec2::new(0.0, 590.0));
        assert_eq!(max, Vec2::new(300.0, 610.0));
    }

    #[test]
    fn test_ms_to_ticks() {
        assert_eq!(ms_to_ticks(1000), 120);
        assert_eq!(ms_to_ticks(100), 12);
        assert_eq!(ms_to_ticks(0), 0);
    }
}
