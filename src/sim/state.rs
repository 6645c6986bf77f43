//! Game state and core simulation types

use glam::Vec2;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::body::{Ball, CollisionFilter, build_box, category};
use super::merge::Merger;
use super::palette::BallColor;
use super::physics::World;
use crate::consts::*;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
}

/// Something that happened during a tick, for logging and the HUD
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A dropped ball entered the world
    Spawned { id: u32, radius: f32 },
    /// Two equal balls started their merge flash
    MergeStarted { a: u32, b: u32 },
    /// A merge finished: `a` and `b` became `id`
    Merged {
        a: u32,
        b: u32,
        id: u32,
        radius: f32,
        pos: (f32, f32),
    },
    /// Two balls at the size ceiling were removed
    Cleared { a: u32, b: u32, radius: f32 },
    /// A merge request arrived while another was in flight
    MergeIgnored { a: u32, b: u32 },
    /// A pending merge lost one of its balls
    MergeCancelled { a: u32, b: u32 },
    /// A ball fell out of the world
    BallLost { id: u32 },
}

/// Monotonic entity id source
#[derive(Debug, Clone)]
pub struct IdGen {
    next: u32,
}

impl IdGen {
    pub fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// The ball waiting in the spawn zone. It is drawn but never collides with
/// the balls in play.
#[derive(Debug, Clone)]
pub struct Preview {
    pub pos: Vec2,
    pub radius: f32,
    pub filter: CollisionFilter,
}

impl Preview {
    pub fn new(radius: f32) -> Self {
        Self {
            pos: Vec2::new(PREVIEW_X, PREVIEW_Y),
            radius,
            filter: CollisionFilter::new(category::PREVIEW, !category::DEFAULT),
        }
    }

    pub fn color(&self) -> BallColor {
        BallColor::for_radius(self.radius)
    }
}

/// Complete game state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Current phase
    pub phase: GamePhase,
    /// Physics world: balls and the box
    pub world: World,
    /// In-flight merge and its guard
    pub merger: Merger,
    /// Next ball to drop
    pub preview: Preview,
    /// Ticks until another drop is accepted
    pub spawn_cooldown_ticks: u32,
    /// Sum of merged radii
    pub score: u64,
    /// Balls dropped this run
    pub drops: u32,
    /// Events produced since the last drain
    pub events: Vec<GameEvent>,
    /// Game balance
    pub tuning: Tuning,
    rng: Pcg32,
    ids: IdGen,
}

impl GameState {
    /// Create a new game with default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    /// Create a new game with the given tuning
    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let mut ids = IdGen::starting_at(1);
        let walls = build_box(ids.next_id());
        // build_box hands out consecutive ids after the first
        for _ in 1..walls.len() {
            ids.next_id();
        }

        let world = World::new(walls, &tuning);
        let mut rng = Pcg32::seed_from_u64(seed);
        let first = roll_preview_size(&mut rng, &tuning);

        let mut state = Self {
            seed,
            time_ticks: 0,
            phase: GamePhase::Playing,
            world,
            merger: Merger::new(),
            preview: Preview::new(first),
            spawn_cooldown_ticks: 0,
            score: 0,
            drops: 0,
            events: Vec::new(),
            tuning,
            rng,
            ids,
        };

        // The preview is rolled once more right after setup
        state.reroll_preview();
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        self.ids.next_id()
    }

    /// Pick a fresh preview size
    pub fn reroll_preview(&mut self) {
        self.preview.radius = roll_preview_size(&mut self.rng, &self.tuning);
    }

    /// Whether a drop at `point` would be accepted right now
    pub fn can_spawn_at(&self, point: Vec2) -> bool {
        self.phase == GamePhase::Playing
            && self.spawn_cooldown_ticks == 0
            && point.y <= self.tuning.spawn_zone_height
    }

    /// Drop a ball of the preview's size at `point`.
    ///
    /// Returns the new ball id, or `None` if the drop was rejected
    /// (cooldown running, or the point is below the spawn zone).
    pub fn spawn_ball(&mut self, point: Vec2) -> Option<u32> {
        if !self.can_spawn_at(point) {
            return None;
        }

        let id = self.ids.next_id();
        let radius = self.preview.radius;
        self.world
            .add_ball(Ball::new(id, point, radius, &self.tuning));
        self.spawn_cooldown_ticks = self.tuning.spawn_cooldown_ticks();
        self.drops += 1;
        self.reroll_preview();

        self.events.push(GameEvent::Spawned { id, radius });
        Some(id)
    }

    /// Split borrows for the merge coordinator
    pub(crate) fn merge_parts(
        &mut self,
    ) -> (&mut Merger, &mut World, &mut IdGen, &Tuning, &mut Vec<GameEvent>) {
        (
            &mut self.merger,
            &mut self.world,
            &mut self.ids,
            &self.tuning,
            &mut self.events,
        )
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Largest ball currently in play
    pub fn largest_radius(&self) -> Option<f32> {
        self.world
            .balls
            .iter()
            .map(|b| b.radius)
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }
}

fn roll_preview_size(rng: &mut Pcg32, tuning: &Tuning) -> f32 {
    // Tuning::validate guarantees at least one size; fall back to the
    // smallest default if an unvalidated tuning slipped through.
    tuning.preview_sizes.choose(rng).copied().unwrap_or(20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = GameState::new(42);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.world.balls.is_empty());
        assert_eq!(state.world.walls.len(), 4);
        assert!([20.0, 35.0, 50.0].contains(&state.preview.radius));
        assert_eq!(state.preview.pos, Vec2::new(150.0, 25.0));
    }

    #[test]
    fn test_preview_never_collides_with_balls() {
        let state = GameState::new(42);
        let ball = Ball::new(99, Vec2::ZERO, 20.0, &state.tuning);
        assert!(!state.preview.filter.can_collide(&ball.filter));
    }

    #[test]
    fn test_spawn_uses_preview_radius_and_rerolls() {
        let mut state = GameState::new(7);
        let radius = state.preview.radius;

        let id = state.spawn_ball(Vec2::new(120.0, 40.0)).unwrap();

        let ball = state.world.ball(id).unwrap();
        assert_eq!(ball.radius, radius);
        assert_eq!(ball.pos, Vec2::new(120.0, 40.0));
        assert_eq!(ball.vel, Vec2::ZERO);
        assert_eq!(state.spawn_cooldown_ticks, 120);
        assert_eq!(state.drops, 1);
        assert_eq!(state.drain_events(), vec![GameEvent::Spawned { id, radius }]);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_spawn_rejected_below_zone() {
        let mut state = GameState::new(7);
        assert!(state.spawn_ball(Vec2::new(150.0, 100.5)).is_none());
        assert!(state.world.balls.is_empty());
        // Edge of the zone is accepted
        assert!(state.spawn_ball(Vec2::new(150.0, 100.0)).is_some());
    }

    #[test]
    fn test_spawn_rejected_during_cooldown() {
        let mut state = GameState::new(7);
        let preview_before = state.spawn_ball(Vec2::new(150.0, 50.0)).map(|_| state.preview.radius);
        assert!(preview_before.is_some());

        assert!(state.spawn_ball(Vec2::new(150.0, 50.0)).is_none());
        assert_eq!(state.world.balls.len(), 1);
        // Rejected drops leave the preview alone
        assert_eq!(Some(state.preview.radius), preview_before);
    }

    #[test]
    fn test_preview_sequence_is_seeded() {
        let mut a = GameState::new(1234);
        let mut b = GameState::new(1234);
        for _ in 0..20 {
            a.reroll_preview();
            b.reroll_preview();
            assert_eq!(a.preview.radius, b.preview.radius);
        }
    }

    #[test]
    fn test_ids_do_not_collide_with_walls() {
        let mut state = GameState::new(1);
        let wall_ids: Vec<u32> = state.world.walls.iter().map(|w| w.id).collect();
        let id = state.next_entity_id();
        assert!(!wall_ids.contains(&id));
    }
}
