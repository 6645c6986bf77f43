//! Turn a game state into a triangle list
//!
//! Draw order: background, walls and spawn zone, balls, preview, guide.

use glam::Vec2;

use super::shapes;
use super::vertex::{Vertex, colors};
use crate::consts::*;
use crate::settings::Settings;
use crate::sim::{BallColor, GameState};

/// Rim width as a fraction of ball radius
const OUTLINE_FRACTION: f32 = 0.08;

/// Build all vertices for one frame
pub fn build(state: &GameState, settings: &Settings) -> Vec<Vertex> {
    let segments = settings.quality.circle_segments();
    let (background, wall_color) = if settings.high_contrast {
        (colors::HIGH_CONTRAST_BACKGROUND, colors::HIGH_CONTRAST_WALL)
    } else {
        (colors::BACKGROUND, colors::WALL)
    };

    let mut vertices = Vec::with_capacity((state.world.balls.len() + 2) * segments as usize * 9);

    vertices.extend(shapes::rect(
        Vec2::ZERO,
        Vec2::new(WORLD_WIDTH, WORLD_HEIGHT),
        background,
    ));

    for wall in &state.world.walls {
        let color = if wall.is_solid() {
            wall_color
        } else {
            colors::SPAWN_ZONE
        };
        vertices.extend(shapes::rect(wall.min, wall.max, color));
    }

    let flash = settings.effective_merge_flash();
    for ball in &state.world.balls {
        let color = if ball.merging && flash {
            BallColor::White
        } else {
            BallColor::for_radius(ball.radius)
        };
        push_ball(&mut vertices, ball.pos, ball.radius, color.rgba(), settings, segments);
    }

    // Preview dims while the drop cooldown runs
    let preview_color = if state.spawn_cooldown_ticks > 0 {
        colors::shade(state.preview.color().rgba(), 0.6)
    } else {
        state.preview.color().rgba()
    };
    push_ball(
        &mut vertices,
        state.preview.pos,
        state.preview.radius,
        preview_color,
        settings,
        segments,
    );

    if settings.spawn_guide {
        vertices.extend(shapes::dashed_hline(
            state.tuning.spawn_zone_height,
            0.0,
            WORLD_WIDTH,
            2.0,
            8.0,
            colors::SPAWN_GUIDE,
        ));
    }

    vertices
}

fn push_ball(
    vertices: &mut Vec<Vertex>,
    pos: Vec2,
    radius: f32,
    color: [f32; 4],
    settings: &Settings,
    segments: u32,
) {
    vertices.extend(shapes::circle(pos, radius, color, segments));
    if settings.quality.outlines_enabled() {
        let rim = radius * OUTLINE_FRACTION;
        vertices.extend(shapes::ring(
            pos,
            radius - rim,
            radius,
            colors::OUTLINE,
            segments,
        ));
    }
}
