//! Rigid bodies: dynamic balls and static box walls

use glam::Vec2;

use crate::consts::*;
use crate::rect_from_center;
use crate::tuning::Tuning;

/// Collision category bits
pub mod category {
    /// Balls and the box walls
    pub const DEFAULT: u32 = 0x0001;
    /// The spawn zone drawn across the top
    pub const SPAWN_ZONE: u32 = 0x0002;
    /// The preview ball waiting to be dropped
    pub const PREVIEW: u32 = 0x0004;
    pub const ALL: u32 = u32::MAX;
}

/// Which bodies may touch which
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionFilter {
    pub category: u32,
    pub mask: u32,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            category: category::DEFAULT,
            mask: category::ALL,
        }
    }
}

impl CollisionFilter {
    pub const fn new(category: u32, mask: u32) -> Self {
        Self { category, mask }
    }

    /// Both sides must accept the other's category
    #[inline]
    pub fn can_collide(&self, other: &CollisionFilter) -> bool {
        (self.mask & other.category) != 0 && (other.mask & self.category) != 0
    }
}

/// A dynamic ball
#[derive(Debug, Clone)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub mass: f32,
    pub friction: f32,
    pub restitution: f32,
    /// Flashing white while waiting to merge
    pub merging: bool,
    pub filter: CollisionFilter,
}

impl Ball {
    /// Build a ball at rest. Heavier balls grow with the fourth power of
    /// radius: density scales with r^2 on top of the area.
    pub fn new(id: u32, pos: Vec2, radius: f32, tuning: &Tuning) -> Self {
        let density = tuning.density_factor * radius * radius;
        let area = std::f32::consts::PI * radius * radius;
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            radius,
            mass: density * area,
            friction: tuning.friction,
            restitution: tuning.restitution,
            merging: false,
            filter: CollisionFilter::new(category::DEFAULT, category::DEFAULT),
        }
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 }
    }
}

/// A static axis-aligned box
#[derive(Debug, Clone)]
pub struct Wall {
    pub id: u32,
    pub min: Vec2,
    pub max: Vec2,
    pub friction: f32,
    pub filter: CollisionFilter,
}

impl Wall {
    pub fn from_center(id: u32, center: Vec2, size: Vec2, filter: CollisionFilter) -> Self {
        let (min, max) = rect_from_center(center, size);
        Self {
            id,
            min,
            max,
            friction: 0.1,
            filter,
        }
    }

    /// Whether this wall takes part in collisions with ordinary balls
    pub fn is_solid(&self) -> bool {
        CollisionFilter::new(category::DEFAULT, category::DEFAULT).can_collide(&self.filter)
    }
}

/// The open-topped box plus the spawn zone across the top.
///
/// Walls take ids starting at `first_id`; returns the walls in id order.
pub fn build_box(first_id: u32) -> Vec<Wall> {
    let solid = CollisionFilter::default();
    let spawn_zone = CollisionFilter::new(category::SPAWN_ZONE, category::ALL);

    let wall_center_y = WORLD_HEIGHT - SIDE_WALL_HEIGHT / 2.0;
    let side = Vec2::new(WALL_THICKNESS, SIDE_WALL_HEIGHT);

    vec![
        // Left
        Wall::from_center(first_id, Vec2::new(0.0, wall_center_y), side, solid),
        // Right
        Wall::from_center(
            first_id + 1,
            Vec2::new(WORLD_WIDTH, wall_center_y),
            side,
            solid,
        ),
        // Floor
        Wall::from_center(
            first_id + 2,
            Vec2::new(WORLD_WIDTH / 2.0, WORLD_HEIGHT),
            Vec2::new(WORLD_WIDTH, WALL_THICKNESS),
            solid,
        ),
        // Spawn zone (visual only for balls)
        Wall::from_center(
            first_id + 3,
            Vec2::new(WORLD_WIDTH / 2.0, SPAWN_ZONE_HEIGHT / 2.0),
            Vec2::new(WORLD_WIDTH, SPAWN_ZONE_HEIGHT),
            spawn_zone,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ball_mass_grows_with_fourth_power() {
        let tuning = Tuning::default();
        let small = Ball::new(1, Vec2::ZERO, 20.0, &tuning);
        let big = Ball::new(2, Vec2::ZERO, 40.0, &tuning);
        let ratio = big.mass / small.mass;
        assert!((ratio - 16.0).abs() < 0.01);
    }

    #[test]
    fn test_filters() {
        let ball = CollisionFilter::new(category::DEFAULT, category::DEFAULT);
        let wall = CollisionFilter::default();
        let zone = CollisionFilter::new(category::SPAWN_ZONE, category::ALL);
        let preview = CollisionFilter::new(category::PREVIEW, !category::DEFAULT);

        assert!(ball.can_collide(&ball));
        assert!(ball.can_collide(&wall));
        assert!(!ball.can_collide(&zone));
        assert!(!ball.can_collide(&preview));
    }

    #[test]
    fn test_box_layout() {
        let walls = build_box(1);
        assert_eq!(walls.len(), 4);

        let left = &walls[0];
        assert_eq!(left.min, Vec2::new(-10.0, 200.0));
        assert_eq!(left.max, Vec2::new(10.0, 600.0));

        let floor = &walls[2];
        assert_eq!(floor.min, Vec2::new(0.0, 590.0));
        assert_eq!(floor.max, Vec2::new(300.0, 610.0));

        assert!(walls[..3].iter().all(Wall::is_solid));
        assert!(!walls[3].is_solid());
    }
}
