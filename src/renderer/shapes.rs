//! Shape generation for 2D primitives
//!
//! All shapes are emitted as triangle lists in world coordinates.

use glam::Vec2;
use std::f32::consts::PI;

use super::vertex::Vertex;

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(
            center.x + radius * theta1.cos(),
            center.y + radius * theta1.sin(),
            color,
        ));
        vertices.push(Vertex::new(
            center.x + radius * theta2.cos(),
            center.y + radius * theta2.sin(),
            color,
        ));
    }

    vertices
}

/// Generate vertices for a ring (hollow circle)
pub fn ring(
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    color: [f32; 4],
    segments: u32,
) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 6) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        let dir1 = Vec2::new(theta1.cos(), theta1.sin());
        let dir2 = Vec2::new(theta2.cos(), theta2.sin());

        let inner1 = center + dir1 * inner_radius;
        let outer1 = center + dir1 * outer_radius;
        let inner2 = center + dir2 * inner_radius;
        let outer2 = center + dir2 * outer_radius;

        // Two triangles per segment
        vertices.push(Vertex::new(inner1.x, inner1.y, color));
        vertices.push(Vertex::new(outer1.x, outer1.y, color));
        vertices.push(Vertex::new(inner2.x, inner2.y, color));

        vertices.push(Vertex::new(inner2.x, inner2.y, color));
        vertices.push(Vertex::new(outer1.x, outer1.y, color));
        vertices.push(Vertex::new(outer2.x, outer2.y, color));
    }

    vertices
}

/// Generate vertices for an axis-aligned filled rectangle
pub fn rect(min: Vec2, max: Vec2, color: [f32; 4]) -> Vec<Vertex> {
    vec![
        Vertex::new(min.x, min.y, color),
        Vertex::new(max.x, min.y, color),
        Vertex::new(min.x, max.y, color),
        Vertex::new(min.x, max.y, color),
        Vertex::new(max.x, min.y, color),
        Vertex::new(max.x, max.y, color),
    ]
}

/// Generate vertices for a horizontal dashed line
pub fn dashed_hline(
    y: f32,
    x_start: f32,
    x_end: f32,
    thickness: f32,
    dash: f32,
    color: [f32; 4],
) -> Vec<Vertex> {
    let mut vertices = Vec::new();
    if dash <= 0.0 {
        return vertices;
    }

    let half = thickness / 2.0;
    let mut x = x_start;
    while x < x_end {
        let end = (x + dash).min(x_end);
        vertices.extend(rect(
            Vec2::new(x, y - half),
            Vec2::new(end, y + half),
            color,
        ));
        x += dash * 2.0;
    }

    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_vertex_count_and_extent() {
        let verts = circle(Vec2::new(10.0, 20.0), 5.0, [1.0; 4], 16);
        assert_eq!(verts.len(), 48);
        for v in &verts {
            let p = Vec2::from(v.position);
            assert!((p - Vec2::new(10.0, 20.0)).length() <= 5.0 + 1e-4);
        }
    }

    #[test]
    fn test_ring_vertex_count() {
        let verts = ring(Vec2::ZERO, 4.0, 5.0, [1.0; 4], 8);
        assert_eq!(verts.len(), 48);
    }

    #[test]
    fn test_rect_is_two_triangles() {
        let verts = rect(Vec2::ZERO, Vec2::new(2.0, 1.0), [1.0; 4]);
        assert_eq!(verts.len(), 6);
    }

    #[test]
    fn test_dashed_line_dash_count() {
        // 0..100 with 10px dashes and 10px gaps: dashes at 0, 20, ..., 80
        let verts = dashed_hline(50.0, 0.0, 100.0, 2.0, 10.0, [1.0; 4]);
        assert_eq!(verts.len(), 5 * 6);
        assert!(dashed_hline(50.0, 0.0, 100.0, 2.0, 0.0, [1.0; 4]).is_empty());
    }
}
