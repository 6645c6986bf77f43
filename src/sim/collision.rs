//! Contact tests for circles against circles and boxes
//!
//! Every test returns the contact normal pointing from the first shape
//! toward the second, plus how deep they overlap.

use glam::Vec2;

/// Result of a contact check
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    /// Whether the shapes overlap
    pub hit: bool,
    /// Unit normal from the first shape toward the second
    pub normal: Vec2,
    /// Penetration depth
    pub penetration: f32,
}

impl Contact {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check overlap between two circles.
///
/// Touching exactly (distance == sum of radii) counts as a contact so that
/// resting stacks keep reporting the pair.
pub fn circle_circle(pos_a: Vec2, radius_a: f32, pos_b: Vec2, radius_b: f32) -> Contact {
    let delta = pos_b - pos_a;
    let dist_sq = delta.length_squared();
    let sum = radius_a + radius_b;

    if dist_sq > sum * sum {
        return Contact::miss();
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > 1e-6 {
        delta / dist
    } else {
        // Centers coincide: push b upward (screen y grows down)
        Vec2::new(0.0, -1.0)
    };

    Contact {
        hit: true,
        normal,
        penetration: sum - dist,
    }
}

/// Check overlap between an axis-aligned box and a circle.
///
/// The normal points from the box toward the circle center.
pub fn box_circle(min: Vec2, max: Vec2, pos: Vec2, radius: f32) -> Contact {
    let closest = pos.clamp(min, max);
    let delta = pos - closest;
    let dist_sq = delta.length_squared();

    if dist_sq > 1e-12 {
        if dist_sq > radius * radius {
            return Contact::miss();
        }
        let dist = dist_sq.sqrt();
        return Contact {
            hit: true,
            normal: delta / dist,
            penetration: radius - dist,
        };
    }

    // Center is inside the box: leave through the nearest face
    let to_left = pos.x - min.x;
    let to_right = max.x - pos.x;
    let to_top = pos.y - min.y;
    let to_bottom = max.y - pos.y;

    let nearest = to_left.min(to_right).min(to_top).min(to_bottom);
    let normal = if nearest == to_left {
        Vec2::NEG_X
    } else if nearest == to_right {
        Vec2::X
    } else if nearest == to_top {
        Vec2::NEG_Y
    } else {
        Vec2::Y
    };

    Contact {
        hit: true,
        normal,
        penetration: nearest + radius,
    }
}
