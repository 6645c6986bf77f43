//! Merge rules
//!
//! Two balls merge when they start touching and have the same radius. The
//! pair flashes white for a short delay, then both are replaced by one ball
//! `merge_growth` larger at their midpoint. A merge that would reach
//! `max_radius` removes both balls on the spot instead.
//!
//! Only one merge is ever in flight. Requests arriving while one is pending
//! are dropped, not queued.

use super::body::Ball;
use super::physics::World;
use super::state::{GameEvent, IdGen};
use crate::midpoint;
use crate::tuning::Tuning;

/// Whether two touching balls should merge.
///
/// Radii only ever come from the preview sizes plus whole growth steps, so
/// equal sizes compare exactly.
pub fn is_merge_candidate(a: &Ball, b: &Ball) -> bool {
    a.id != b.id && a.radius == b.radius
}

/// Radius produced by merging two balls of `radius`, or `None` when the
/// result would reach the ceiling
pub fn merged_radius(radius: f32, tuning: &Tuning) -> Option<f32> {
    let grown = radius + tuning.merge_growth;
    if grown >= tuning.max_radius {
        None
    } else {
        Some(grown)
    }
}

/// A merge waiting out its flash delay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingMerge {
    pub a: u32,
    pub b: u32,
    pub radius: f32,
    pub ticks_left: u32,
}

/// What happened to a merge request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MergeRequest {
    /// Another merge is in flight, or the balls are gone
    Ignored,
    /// Both balls removed at the ceiling
    Cleared { radius: f32 },
    /// Flash started; resolves after the delay
    Started,
}

/// A merge that finished this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeResolved {
    pub id: u32,
    pub radius: f32,
}

/// Merge coordinator with its re-entrancy flag
#[derive(Debug, Clone, Default)]
pub struct Merger {
    combining: bool,
    pending: Option<PendingMerge>,
}

impl Merger {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a merge is in flight
    pub fn is_combining(&self) -> bool {
        self.combining
    }

    #[cfg(test)]
    pub fn pending(&self) -> Option<&PendingMerge> {
        self.pending.as_ref()
    }

    /// Ask to merge two touching balls
    pub fn request(
        &mut self,
        world: &mut World,
        a: u32,
        b: u32,
        tuning: &Tuning,
        events: &mut Vec<GameEvent>,
    ) -> MergeRequest {
        if self.combining {
            log::debug!("Merge {a}+{b} ignored: merge already in flight");
            events.push(GameEvent::MergeIgnored { a, b });
            return MergeRequest::Ignored;
        }

        let Some(radius) = world.ball(a).map(|ball| ball.radius) else {
            return MergeRequest::Ignored;
        };
        if world.ball(b).is_none() {
            return MergeRequest::Ignored;
        }

        self.combining = true;

        let Some(new_radius) = merged_radius(radius, tuning) else {
            world.remove_ball(a);
            world.remove_ball(b);
            self.combining = false;
            log::debug!("Balls {a}+{b} cleared at ceiling (radius {radius})");
            events.push(GameEvent::Cleared {
                a,
                b,
                radius: tuning.max_radius,
            });
            return MergeRequest::Cleared {
                radius: tuning.max_radius,
            };
        };

        for id in [a, b] {
            if let Some(ball) = world.ball_mut(id) {
                ball.merging = true;
            }
        }

        self.pending = Some(PendingMerge {
            a,
            b,
            radius: new_radius,
            ticks_left: tuning.merge_delay_ticks(),
        });
        events.push(GameEvent::MergeStarted { a, b });
        MergeRequest::Started
    }

    /// Count down the pending merge and resolve it when the delay is over
    pub fn advance(
        &mut self,
        world: &mut World,
        ids: &mut IdGen,
        tuning: &Tuning,
        events: &mut Vec<GameEvent>,
    ) -> Option<MergeResolved> {
        let pending = self.pending.as_mut()?;
        pending.ticks_left = pending.ticks_left.saturating_sub(1);
        if pending.ticks_left > 0 {
            return None;
        }

        let PendingMerge { a, b, radius, .. } = *pending;
        self.pending = None;
        self.combining = false;

        let positions = world.ball(a).map(|ball| ball.pos).zip(world.ball(b).map(|ball| ball.pos));
        let Some((pos_a, pos_b)) = positions else {
            // One side left the world during the flash
            for id in [a, b] {
                if let Some(ball) = world.ball_mut(id) {
                    ball.merging = false;
                }
            }
            log::debug!("Merge {a}+{b} cancelled");
            events.push(GameEvent::MergeCancelled { a, b });
            return None;
        };

        let pos = midpoint(pos_a, pos_b);
        world.remove_ball(a);
        world.remove_ball(b);

        let id = ids.next_id();
        world.add_ball(Ball::new(id, pos, radius, tuning));

        log::debug!("Merged {a}+{b} into {id} (radius {radius})");
        events.push(GameEvent::Merged {
            a,
            b,
            id,
            radius,
            pos: (pos.x, pos.y),
        });
        Some(MergeResolved { id, radius })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::build_box;
    use glam::Vec2;
    use proptest::prelude::*;

    struct Fixture {
        world: World,
        ids: IdGen,
        tuning: Tuning,
        events: Vec<GameEvent>,
        merger: Merger,
    }

    impl Fixture {
        fn new() -> Self {
            let tuning = Tuning::default();
            let world = World::new(build_box(1), &tuning);
            Self {
                world,
                ids: IdGen::starting_at(100),
                tuning,
                events: Vec::new(),
                merger: Merger::new(),
            }
        }

        fn add(&mut self, x: f32, y: f32, radius: f32) -> u32 {
            let id = self.ids.next_id();
            self.world
                .add_ball(Ball::new(id, Vec2::new(x, y), radius, &self.tuning));
            id
        }

        fn request(&mut self, a: u32, b: u32) -> MergeRequest {
            self.merger
                .request(&mut self.world, a, b, &self.tuning, &mut self.events)
        }

        fn advance(&mut self) -> Option<MergeResolved> {
            self.merger
                .advance(&mut self.world, &mut self.ids, &self.tuning, &mut self.events)
        }

        fn advance_until_resolved(&mut self) -> Option<MergeResolved> {
            for _ in 0..self.tuning.merge_delay_ticks() {
                if let Some(done) = self.advance() {
                    return Some(done);
                }
            }
            None
        }
    }

    #[test]
    fn test_candidate_requires_equal_radius() {
        let tuning = Tuning::default();
        let a = Ball::new(1, Vec2::ZERO, 20.0, &tuning);
        let b = Ball::new(2, Vec2::ZERO, 20.0, &tuning);
        let c = Ball::new(3, Vec2::ZERO, 35.0, &tuning);
        assert!(is_merge_candidate(&a, &b));
        assert!(!is_merge_candidate(&a, &c));
        assert!(!is_merge_candidate(&a, &a));
    }

    #[test]
    fn test_merged_radius_growth_and_ceiling() {
        let tuning = Tuning::default();
        assert_eq!(merged_radius(20.0, &tuning), Some(35.0));
        assert_eq!(merged_radius(80.0, &tuning), Some(95.0));
        // 95 + 15 = 110 hits the ceiling
        assert_eq!(merged_radius(95.0, &tuning), None);
    }

    #[test]
    fn test_merge_spawns_bigger_ball_at_midpoint_after_delay() {
        let mut fx = Fixture::new();
        let a = fx.add(100.0, 500.0, 20.0);
        let b = fx.add(140.0, 520.0, 20.0);

        assert_eq!(fx.request(a, b), MergeRequest::Started);
        assert!(fx.merger.is_combining());
        assert!(fx.world.ball(a).unwrap().merging);
        assert!(fx.world.ball(b).unwrap().merging);

        // Nothing happens before the delay runs out
        for _ in 0..fx.tuning.merge_delay_ticks() - 1 {
            assert!(fx.advance().is_none());
        }
        assert_eq!(fx.world.balls.len(), 2);

        let done = fx.advance().expect("merge should resolve");
        assert_eq!(done.radius, 35.0);
        assert!(!fx.merger.is_combining());
        assert!(fx.world.ball(a).is_none());
        assert!(fx.world.ball(b).is_none());

        let merged = fx.world.ball(done.id).unwrap();
        assert_eq!(merged.pos, Vec2::new(120.0, 510.0));
        assert_eq!(merged.vel, Vec2::ZERO);
        assert!(!merged.merging);
    }

    #[test]
    fn test_midpoint_uses_positions_at_resolution() {
        let mut fx = Fixture::new();
        let a = fx.add(100.0, 500.0, 20.0);
        let b = fx.add(140.0, 500.0, 20.0);
        fx.request(a, b);

        fx.world.ball_mut(a).unwrap().pos = Vec2::new(100.0, 540.0);
        fx.world.ball_mut(b).unwrap().pos = Vec2::new(140.0, 540.0);

        let done = fx.advance_until_resolved().unwrap();
        assert_eq!(fx.world.ball(done.id).unwrap().pos, Vec2::new(120.0, 540.0));
    }

    #[test]
    fn test_second_request_is_dropped_while_combining() {
        let mut fx = Fixture::new();
        let a = fx.add(60.0, 500.0, 20.0);
        let b = fx.add(100.0, 500.0, 20.0);
        let c = fx.add(200.0, 500.0, 35.0);
        let d = fx.add(240.0, 500.0, 35.0);

        assert_eq!(fx.request(a, b), MergeRequest::Started);
        assert_eq!(fx.request(c, d), MergeRequest::Ignored);
        assert!(!fx.world.ball(c).unwrap().merging);
        assert!(
            fx.events
                .contains(&GameEvent::MergeIgnored { a: c, b: d })
        );

        fx.advance_until_resolved().unwrap();

        // Dropped, not queued: c and d are untouched once the first resolves
        assert!(fx.merger.pending().is_none());
        assert!(fx.world.ball(c).is_some());
        assert!(fx.world.ball(d).is_some());
        assert_eq!(fx.request(c, d), MergeRequest::Started);
    }

    #[test]
    fn test_ceiling_clears_both_immediately() {
        let mut fx = Fixture::new();
        let a = fx.add(100.0, 400.0, 95.0);
        let b = fx.add(200.0, 400.0, 95.0);

        assert_eq!(fx.request(a, b), MergeRequest::Cleared { radius: 110.0 });
        assert!(fx.world.balls.is_empty());
        assert!(!fx.merger.is_combining());
        assert!(fx.advance().is_none());
    }

    #[test]
    fn test_cancelled_when_ball_disappears() {
        let mut fx = Fixture::new();
        let a = fx.add(100.0, 500.0, 20.0);
        let b = fx.add(140.0, 500.0, 20.0);
        fx.request(a, b);

        fx.world.remove_ball(b);
        assert!(fx.advance_until_resolved().is_none());

        assert!(!fx.merger.is_combining());
        assert!(fx.merger.pending().is_none());
        assert!(!fx.world.ball(a).unwrap().merging);
        assert!(
            fx.events
                .contains(&GameEvent::MergeCancelled { a, b })
        );
    }

    #[test]
    fn test_request_for_missing_ball_does_not_lock() {
        let mut fx = Fixture::new();
        let a = fx.add(100.0, 500.0, 20.0);
        assert_eq!(fx.request(a, 9999), MergeRequest::Ignored);
        assert!(!fx.merger.is_combining());
    }

    proptest! {
        #[test]
        fn prop_merged_radius_below_ceiling(radius in 1.0f32..200.0) {
            let tuning = Tuning::default();
            match merged_radius(radius, &tuning) {
                Some(grown) => {
                    prop_assert!(grown < tuning.max_radius);
                    prop_assert!((grown - radius - tuning.merge_growth).abs() < 1e-3);
                }
                None => prop_assert!(radius + tuning.merge_growth >= tuning.max_radius),
            }
        }
    }
}
