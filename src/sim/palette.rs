//! Ball colors by size

/// Fill color of a ball
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    /// Merge flash
    White,
}

impl BallColor {
    /// Color band for a radius. Bands are inclusive upper bounds; anything
    /// past the last band wraps back to red.
    pub fn for_radius(radius: f32) -> Self {
        if radius <= 20.0 {
            BallColor::Red
        } else if radius <= 35.0 {
            BallColor::Orange
        } else if radius <= 50.0 {
            BallColor::Yellow
        } else if radius <= 65.0 {
            BallColor::Green
        } else if radius <= 80.0 {
            BallColor::Blue
        } else if radius <= 85.0 {
            BallColor::Purple
        } else if radius <= 100.0 {
            BallColor::Pink
        } else {
            BallColor::Red
        }
    }

    /// Linear RGBA for rendering
    pub fn rgba(self) -> [f32; 4] {
        match self {
            BallColor::Red => [1.0, 0.0, 0.0, 1.0],
            BallColor::Orange => [1.0, 0.65, 0.0, 1.0],
            BallColor::Yellow => [1.0, 1.0, 0.0, 1.0],
            BallColor::Green => [0.0, 0.5, 0.0, 1.0],
            BallColor::Blue => [0.0, 0.0, 1.0, 1.0],
            BallColor::Purple => [0.5, 0.0, 0.5, 1.0],
            BallColor::Pink => [1.0, 0.75, 0.8, 1.0],
            BallColor::White => [1.0, 1.0, 1.0, 1.0],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BallColor::Red => "red",
            BallColor::Orange => "orange",
            BallColor::Yellow => "yellow",
            BallColor::Green => "green",
            BallColor::Blue => "blue",
            BallColor::Purple => "purple",
            BallColor::Pink => "pink",
            BallColor::White => "white",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_merge_chain_colors() {
        // Sizes reachable from the smallest drop
        let expected = [
            (20.0, BallColor::Red),
            (35.0, BallColor::Orange),
            (50.0, BallColor::Yellow),
            (65.0, BallColor::Green),
            (80.0, BallColor::Blue),
            (95.0, BallColor::Pink),
        ];
        for (radius, color) in expected {
            assert_eq!(BallColor::for_radius(radius), color, "radius {radius}");
        }
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(BallColor::for_radius(85.0), BallColor::Purple);
        assert_eq!(BallColor::for_radius(85.1), BallColor::Pink);
        assert_eq!(BallColor::for_radius(100.0), BallColor::Pink);
        assert_eq!(BallColor::for_radius(101.0), BallColor::Red);
    }

    proptest! {
        #[test]
        fn prop_never_white(radius in 0.0f32..500.0) {
            prop_assert_ne!(BallColor::for_radius(radius), BallColor::White);
        }

        #[test]
        fn prop_small_balls_are_red(radius in 0.0f32..=20.0) {
            prop_assert_eq!(BallColor::for_radius(radius), BallColor::Red);
        }
    }
}
