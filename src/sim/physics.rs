//! Rigid-body world for balls inside a static box
//!
//! Each step runs:
//! 1. gravity and position integration (semi-implicit Euler)
//! 2. contact gathering, honoring collision filters
//! 3. velocity iterations (sequential impulses, normal + Coulomb friction)
//! 4. position iterations (split overlap by inverse mass)
//! 5. pair tracking, reporting pairs that started touching this step
//!
//! Balls never rotate, so there is no angular state to solve.

use std::collections::BTreeSet;

use glam::Vec2;
use super::body::{Ball, Wall};
use super::collision::{Contact, box_circle, circle_circle};
use crate::tuning::Tuning;

/// Overlap allowed to persist so resting contacts stay detected
const POSITION_SLOP: f32 = 0.05;
/// Fraction of remaining overlap removed per position iteration
const POSITION_FACTOR: f32 = 0.2;
/// Closing speeds below this never bounce
const BOUNCE_THRESHOLD: f32 = 1.0;

/// A body in the world, by id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BodyRef {
    Ball(u32),
    Wall(u32),
}

/// Two bodies that began touching during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionStart {
    pub a: BodyRef,
    pub b: BodyRef,
}

impl CollisionStart {
    /// Ball ids if both bodies are balls
    pub fn balls(&self) -> Option<(u32, u32)> {
        match (self.a, self.b) {
            (BodyRef::Ball(a), BodyRef::Ball(b)) => Some((a, b)),
            _ => None,
        }
    }
}

type PairKey = (BodyRef, BodyRef);

fn pair_key(a: BodyRef, b: BodyRef) -> PairKey {
    if a <= b { (a, b) } else { (b, a) }
}

/// What the second ball of a contact is pressed against
#[derive(Debug, Clone, Copy)]
enum Anchor {
    Ball(usize),
    Wall(usize),
}

/// A contact being solved this step. `ball` is always dynamic; the normal
/// points from the anchor toward it.
#[derive(Debug, Clone)]
struct Constraint {
    anchor: Anchor,
    ball: usize,
    normal: Vec2,
    friction: f32,
    bounce: f32,
    normal_impulse: f32,
    tangent_impulse: f32,
}

/// Mutable access to two distinct balls
fn pair_mut(balls: &mut [Ball], i: usize, j: usize) -> (&mut Ball, &mut Ball) {
    debug_assert!(i != j);
    if i < j {
        let (left, right) = balls.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = balls.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}

/// The physics world
#[derive(Debug, Clone)]
pub struct World {
    /// Dynamic balls (sorted by id for determinism)
    pub balls: Vec<Ball>,
    /// Static walls (sorted by id)
    pub walls: Vec<Wall>,
    pub gravity: Vec2,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    /// Pairs touching at the end of the last step
    active_pairs: BTreeSet<PairKey>,
}

impl World {
    pub fn new(walls: Vec<Wall>, tuning: &Tuning) -> Self {
        let mut walls = walls;
        walls.sort_by_key(|w| w.id);
        Self {
            balls: Vec::new(),
            walls,
            gravity: Vec2::new(0.0, tuning.gravity),
            velocity_iterations: tuning.velocity_iterations,
            position_iterations: tuning.position_iterations,
            active_pairs: BTreeSet::new(),
        }
    }

    /// Add a ball, keeping id order
    pub fn add_ball(&mut self, ball: Ball) {
        let idx = self.balls.partition_point(|b| b.id < ball.id);
        self.balls.insert(idx, ball);
    }

    /// Remove a ball and forget any pairs it was part of
    pub fn remove_ball(&mut self, id: u32) -> Option<Ball> {
        let idx = self.balls.iter().position(|b| b.id == id)?;
        let body = BodyRef::Ball(id);
        self.active_pairs.retain(|(a, b)| *a != body && *b != body);
        Some(self.balls.remove(idx))
    }

    pub fn ball(&self, id: u32) -> Option<&Ball> {
        self.balls.iter().find(|b| b.id == id)
    }

    pub fn ball_mut(&mut self, id: u32) -> Option<&mut Ball> {
        self.balls.iter_mut().find(|b| b.id == id)
    }

    /// Whether two bodies were touching at the end of the last step
    #[cfg(test)]
    pub fn is_touching(&self, a: BodyRef, b: BodyRef) -> bool {
        self.active_pairs.contains(&pair_key(a, b))
    }

    /// Advance the world by `dt` seconds and report new contacts
    pub fn step(&mut self, dt: f32) -> Vec<CollisionStart> {
        for ball in &mut self.balls {
            ball.vel += self.gravity * dt;
            ball.pos += ball.vel * dt;
        }

        let mut constraints = self.gather_contacts();

        for _ in 0..self.velocity_iterations {
            self.solve_velocities(&mut constraints);
        }
        for _ in 0..self.position_iterations {
            self.solve_positions(&constraints);
        }

        self.track_pairs(&constraints)
    }

    fn contact_with(&self, anchor: Anchor, ball: usize) -> Contact {
        let b = &self.balls[ball];
        match anchor {
            Anchor::Ball(i) => {
                let a = &self.balls[i];
                circle_circle(a.pos, a.radius, b.pos, b.radius)
            }
            Anchor::Wall(w) => {
                let wall = &self.walls[w];
                box_circle(wall.min, wall.max, b.pos, b.radius)
            }
        }
    }

    fn gather_contacts(&self) -> Vec<Constraint> {
        let mut constraints = Vec::new();

        for (j, ball) in self.balls.iter().enumerate() {
            for (w, wall) in self.walls.iter().enumerate() {
                if !ball.filter.can_collide(&wall.filter) {
                    continue;
                }
                let contact = box_circle(wall.min, wall.max, ball.pos, ball.radius);
                if contact.hit {
                    constraints.push(self.constraint(Anchor::Wall(w), j, &contact));
                }
            }

            for (i, other) in self.balls[..j].iter().enumerate() {
                if !other.filter.can_collide(&ball.filter) {
                    continue;
                }
                let contact = circle_circle(other.pos, other.radius, ball.pos, ball.radius);
                if contact.hit {
                    constraints.push(self.constraint(Anchor::Ball(i), j, &contact));
                }
            }
        }

        constraints
    }

    fn constraint(&self, anchor: Anchor, ball: usize, contact: &Contact) -> Constraint {
        let b = &self.balls[ball];
        let (anchor_vel, friction, restitution) = match anchor {
            Anchor::Ball(i) => {
                let a = &self.balls[i];
                (a.vel, a.friction.min(b.friction), a.restitution.max(b.restitution))
            }
            Anchor::Wall(w) => (Vec2::ZERO, self.walls[w].friction.min(b.friction), b.restitution),
        };

        let closing = (b.vel - anchor_vel).dot(contact.normal);
        let bounce = if closing < -BOUNCE_THRESHOLD {
            -restitution * closing
        } else {
            0.0
        };

        Constraint {
            anchor,
            ball,
            normal: contact.normal,
            // Negative coefficients would invert the clamp range below
            friction: friction.max(0.0),
            bounce,
            normal_impulse: 0.0,
            tangent_impulse: 0.0,
        }
    }

    fn solve_velocities(&mut self, constraints: &mut [Constraint]) {
        for c in constraints.iter_mut() {
            let n = c.normal;
            let t = Vec2::new(-n.y, n.x);

            match c.anchor {
                Anchor::Ball(i) => {
                    let (a, b) = pair_mut(&mut self.balls, i, c.ball);
                    let inv_a = a.inverse_mass();
                    let inv_b = b.inverse_mass();
                    let k = inv_a + inv_b;
                    if k <= 0.0 {
                        continue;
                    }

                    let vn = (b.vel - a.vel).dot(n);
                    let total = (c.normal_impulse + (c.bounce - vn) / k).max(0.0);
                    let dj = total - c.normal_impulse;
                    c.normal_impulse = total;
                    a.vel -= n * dj * inv_a;
                    b.vel += n * dj * inv_b;

                    let vt = (b.vel - a.vel).dot(t);
                    let limit = c.friction * c.normal_impulse;
                    let total_t = (c.tangent_impulse - vt / k).clamp(-limit, limit);
                    let djt = total_t - c.tangent_impulse;
                    c.tangent_impulse = total_t;
                    a.vel -= t * djt * inv_a;
                    b.vel += t * djt * inv_b;
                }
                Anchor::Wall(_) => {
                    let b = &mut self.balls[c.ball];
                    let k = b.inverse_mass();
                    if k <= 0.0 {
                        continue;
                    }

                    let vn = b.vel.dot(n);
                    let total = (c.normal_impulse + (c.bounce - vn) / k).max(0.0);
                    let dj = total - c.normal_impulse;
                    c.normal_impulse = total;
                    b.vel += n * dj * k;

                    let vt = b.vel.dot(t);
                    let limit = c.friction * c.normal_impulse;
                    let total_t = (c.tangent_impulse - vt / k).clamp(-limit, limit);
                    let djt = total_t - c.tangent_impulse;
                    c.tangent_impulse = total_t;
                    b.vel += t * djt * k;
                }
            }
        }
    }

    fn solve_positions(&mut self, constraints: &[Constraint]) {
        for c in constraints {
            let contact = self.contact_with(c.anchor, c.ball);
            if !contact.hit {
                continue;
            }
            let depth = (contact.penetration - POSITION_SLOP).max(0.0) * POSITION_FACTOR;
            if depth <= 0.0 {
                continue;
            }
            let n = contact.normal;

            match c.anchor {
                Anchor::Ball(i) => {
                    let (a, b) = pair_mut(&mut self.balls, i, c.ball);
                    let inv_a = a.inverse_mass();
                    let inv_b = b.inverse_mass();
                    let k = inv_a + inv_b;
                    if k <= 0.0 {
                        continue;
                    }
                    a.pos -= n * depth * (inv_a / k);
                    b.pos += n * depth * (inv_b / k);
                }
                Anchor::Wall(_) => {
                    self.balls[c.ball].pos += n * depth;
                }
            }
        }
    }

    fn track_pairs(&mut self, constraints: &[Constraint]) -> Vec<CollisionStart> {
        let touching: BTreeSet<PairKey> = constraints
            .iter()
            .map(|c| {
                let ball = BodyRef::Ball(self.balls[c.ball].id);
                let anchor = match c.anchor {
                    Anchor::Ball(i) => BodyRef::Ball(self.balls[i].id),
                    Anchor::Wall(w) => BodyRef::Wall(self.walls[w].id),
                };
                pair_key(anchor, ball)
            })
            .collect();

        let started = touching
            .difference(&self.active_pairs)
            .map(|&(a, b)| CollisionStart { a, b })
            .collect();

        self.active_pairs = touching;
        started
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::body::build_box;

    fn world() -> (World, Tuning) {
        let tuning = Tuning::default();
        (World::new(build_box(1), &tuning), tuning)
    }

    fn run(world: &mut World, seconds: f32) -> Vec<CollisionStart> {
        let steps = (seconds / SIM_DT) as usize;
        let mut starts = Vec::new();
        for _ in 0..steps {
            starts.extend(world.step(SIM_DT));
        }
        starts
    }

    #[test]
    fn test_ball_comes_to_rest_on_floor() {
        let (mut world, tuning) = world();
        world.add_ball(Ball::new(10, Vec2::new(150.0, 300.0), 20.0, &tuning));

        let starts = run(&mut world, 3.0);

        let ball = world.ball(10).unwrap();
        assert!((ball.pos.y - 570.0).abs() < 1.0, "y = {}", ball.pos.y);
        assert!(ball.vel.length() < 5.0, "vel = {:?}", ball.vel);

        // Exactly one start event: ball meets floor (wall id 3)
        assert_eq!(starts.len(), 1);
        assert_eq!(
            pair_key(starts[0].a, starts[0].b),
            pair_key(BodyRef::Ball(10), BodyRef::Wall(3))
        );
        assert!(world.is_touching(BodyRef::Wall(3), BodyRef::Ball(10)));
    }

    #[test]
    fn test_spawn_zone_does_not_block_balls() {
        let (mut world, tuning) = world();
        // Start inside the spawn zone box
        world.add_ball(Ball::new(10, Vec2::new(150.0, 50.0), 20.0, &tuning));

        run(&mut world, 0.5);

        let ball = world.ball(10).unwrap();
        assert!(ball.pos.y > 100.0);
        assert!(!world.is_touching(BodyRef::Wall(4), BodyRef::Ball(10)));
    }

    #[test]
    fn test_stacked_balls_report_ball_pair() {
        let (mut world, tuning) = world();
        world.add_ball(Ball::new(10, Vec2::new(150.0, 560.0), 20.0, &tuning));
        world.add_ball(Ball::new(11, Vec2::new(150.0, 450.0), 20.0, &tuning));

        let starts = run(&mut world, 2.0);

        let ball_pairs: Vec<_> = starts.iter().filter_map(CollisionStart::balls).collect();
        assert_eq!(ball_pairs, vec![(10, 11)]);

        let lower = world.ball(10).unwrap().pos;
        let upper = world.ball(11).unwrap().pos;
        assert!(upper.y < lower.y);
        assert!((lower - upper).length() > 39.0);
    }

    #[test]
    fn test_walls_keep_balls_inside() {
        let (mut world, tuning) = world();
        let mut ball = Ball::new(10, Vec2::new(250.0, 500.0), 20.0, &tuning);
        ball.vel = Vec2::new(800.0, 0.0);
        world.add_ball(ball);

        run(&mut world, 1.0);

        let ball = world.ball(10).unwrap();
        assert!(ball.pos.x + ball.radius <= 290.0 + 1.0, "x = {}", ball.pos.x);
    }

    #[test]
    fn test_remove_ball_forgets_pairs() {
        let (mut world, tuning) = world();
        world.add_ball(Ball::new(10, Vec2::new(150.0, 565.0), 20.0, &tuning));
        run(&mut world, 0.2);
        assert!(world.is_touching(BodyRef::Ball(10), BodyRef::Wall(3)));

        let removed = world.remove_ball(10).unwrap();
        assert_eq!(removed.id, 10);
        assert!(!world.is_touching(BodyRef::Ball(10), BodyRef::Wall(3)));
        assert!(world.remove_ball(10).is_none());
    }

    #[test]
    fn test_add_ball_keeps_id_order() {
        let (mut world, tuning) = world();
        world.add_ball(Ball::new(12, Vec2::new(50.0, 300.0), 20.0, &tuning));
        world.add_ball(Ball::new(10, Vec2::new(150.0, 300.0), 20.0, &tuning));
        world.add_ball(Ball::new(11, Vec2::new(250.0, 300.0), 20.0, &tuning));
        let ids: Vec<u32> = world.balls.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }

    #[test]
    fn test_step_is_deterministic() {
        let (mut a, tuning) = world();
        let (mut b, _) = world();
        for (i, x) in [60.0, 100.0, 140.0, 180.0].into_iter().enumerate() {
            let ball = Ball::new(10 + i as u32, Vec2::new(x, 150.0 + i as f32 * 30.0), 20.0, &tuning);
            a.add_ball(ball.clone());
            b.add_ball(ball);
        }

        let starts_a = run(&mut a, 2.0);
        let starts_b = run(&mut b, 2.0);

        assert_eq!(starts_a, starts_b);
        for (ba, bb) in a.balls.iter().zip(&b.balls) {
            assert_eq!(ba.pos, bb.pos);
        }
    }

    #[test]
    fn test_negative_friction_does_not_invert_clamp() {
        // Tuning built by hand skips validation
        let tuning = Tuning {
            friction: -0.5,
            ..Tuning::default()
        };
        let mut world = World::new(build_box(1), &tuning);
        let mut ball = Ball::new(10, Vec2::new(150.0, 500.0), 20.0, &tuning);
        ball.vel = Vec2::new(200.0, 0.0);
        world.add_ball(ball);
        world.add_ball(Ball::new(11, Vec2::new(150.0, 400.0), 20.0, &tuning));

        run(&mut world, 2.0);

        assert!(world.balls.iter().all(|b| b.pos.is_finite()));
    }

    #[test]
    fn test_cloned_world_keeps_resting_pairs() {
        let (mut world, tuning) = world();
        world.add_ball(Ball::new(10, Vec2::new(150.0, 560.0), 20.0, &tuning));
        world.add_ball(Ball::new(11, Vec2::new(150.0, 450.0), 20.0, &tuning));
        run(&mut world, 2.0);

        let mut copy = world.clone();
        let starts = run(&mut copy, 0.5);
        assert!(starts.is_empty(), "resting pairs fired again: {:?}", starts);
    }
}
