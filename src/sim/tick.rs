//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use glam::Vec2;

use super::merge::{MergeRequest, is_merge_candidate};
use super::state::{GameEvent, GamePhase, GameState};
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Drop a ball here (from click/tap, world coordinates)
    pub spawn_at: Option<Vec2>,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // Handle pause toggle
    if input.pause {
        state.phase = match state.phase {
            GamePhase::Playing => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Playing,
        };
        log::info!("Phase: {:?}", state.phase);
    }

    if state.phase == GamePhase::Paused {
        return;
    }

    state.time_ticks += 1;
    state.spawn_cooldown_ticks = state.spawn_cooldown_ticks.saturating_sub(1);

    if let Some(point) = input.spawn_at {
        if state.spawn_ball(point).is_none() {
            log::debug!(
                "Drop at ({:.0}, {:.0}) rejected (cooldown {} ticks)",
                point.x,
                point.y,
                state.spawn_cooldown_ticks
            );
        }
    }

    // Resolve the pending merge before stepping so its delay counts whole ticks
    {
        let (merger, world, ids, tuning, events) = state.merge_parts();
        if let Some(done) = merger.advance(world, ids, tuning, events) {
            state.score += done.radius as u64;
        }
    }

    let starts = state.world.step(dt);

    for start in starts {
        let Some((a, b)) = start.balls() else {
            continue;
        };
        let candidate = match (state.world.ball(a), state.world.ball(b)) {
            (Some(ball_a), Some(ball_b)) => is_merge_candidate(ball_a, ball_b),
            _ => false,
        };
        if !candidate {
            continue;
        }

        let (merger, world, _, tuning, events) = state.merge_parts();
        if let MergeRequest::Cleared { radius } = merger.request(world, a, b, tuning, events) {
            state.score += radius as u64;
        }
    }

    cull_lost_balls(state);
}

/// Drop balls that fell out of the world
fn cull_lost_balls(state: &mut GameState) {
    let limit = WORLD_HEIGHT + CULL_MARGIN;
    let lost: Vec<u32> = state
        .world
        .balls
        .iter()
        .filter(|b| b.pos.y - b.radius > limit)
        .map(|b| b.id)
        .collect();

    for id in lost {
        state.world.remove_ball(id);
        log::debug!("Ball {id} fell out of the world");
        state.events.push(GameEvent::BallLost { id });
    }
}

/// Restart with a new seed, keeping the current tuning
pub fn restart(state: &mut GameState, seed: u64) {
    let tuning = state.tuning.clone();
    *state = GameState::with_tuning(seed, tuning);
    log::info!("Game restarted with seed: {}", seed);
}
