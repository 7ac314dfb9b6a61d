//! Geometry and numeric helpers shared by every subsystem.

use std::f32::consts::PI;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Size of the drawing surface in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl CanvasSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// A configured number that is either fixed or drawn uniformly from a range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeValue {
    Fixed(f32),
    Range { min: f32, max: f32 },
}

impl RangeValue {
    pub fn min(&self) -> f32 {
        match *self {
            Self::Fixed(value) => value,
            Self::Range { min, max } => min.min(max),
        }
    }

    pub fn max(&self) -> f32 {
        match *self {
            Self::Fixed(value) => value,
            Self::Range { min, max } => min.max(max),
        }
    }

    /// Resolves the value, rolling the generator only for proper ranges.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        random_in_range(rng, self.min(), self.max())
    }
}

impl Default for RangeValue {
    fn default() -> Self {
        Self::Fixed(0.0)
    }
}

impl From<f32> for RangeValue {
    fn from(value: f32) -> Self {
        Self::Fixed(value)
    }
}

/// Uniform sample from `[min, max)`; the bounds may be given in either order.
pub fn random_in_range<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    if hi - lo <= f32::EPSILON {
        return lo;
    }
    lo + rng.gen::<f32>() * (hi - lo)
}

/// Signed offsets and euclidean distance from `to` to `from`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distances {
    pub dx: f32,
    pub dy: f32,
    pub distance: f32,
}

pub fn get_distances(from: Vec2, to: Vec2) -> Distances {
    let dx = from.x - to.x;
    let dy = from.y - to.y;
    Distances {
        dx,
        dy,
        distance: (dx * dx + dy * dy).sqrt(),
    }
}

/// Builds a vector from polar coordinates.
pub fn from_polar(length: f32, angle: f32) -> Vec2 {
    Vec2::new(angle.cos() * length, angle.sin() * length)
}

/// Angle of the vector in radians, `atan2(y, x)`.
pub fn angle_of(vector: Vec2) -> f32 {
    vector.y.atan2(vector.x)
}

/// Rotates `vector` to `angle` while keeping its length.
pub fn with_angle(vector: Vec2, angle: f32) -> Vec2 {
    from_polar(vector.length(), angle)
}

/// Rescales `vector` to `length` while keeping its angle.
pub fn with_length(vector: Vec2, length: f32) -> Vec2 {
    from_polar(length, angle_of(vector))
}

pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Edges of the axis-aligned box of a circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

pub fn calculate_bounds(point: Vec2, radius: f32) -> Bounds {
    Bounds {
        top: point.y - radius,
        right: point.x + radius,
        bottom: point.y + radius,
        left: point.x - radius,
    }
}

/// Boundary sides tested by the out-of-bounds stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutModeDirection {
    Bottom,
    Left,
    Right,
    Top,
}

impl OutModeDirection {
    pub const ALL: [OutModeDirection; 4] = [Self::Bottom, Self::Left, Self::Right, Self::Top];
}

/// Whether a circle at `point` still overlaps the canvas. With a direction
/// only that side is tested.
pub fn is_point_inside(
    point: Vec2,
    size: CanvasSize,
    offset: Vec2,
    radius: f32,
    direction: Option<OutModeDirection>,
) -> bool {
    are_bounds_inside(calculate_bounds(point, radius), size, offset, direction)
}

pub fn are_bounds_inside(
    bounds: Bounds,
    size: CanvasSize,
    offset: Vec2,
    direction: Option<OutModeDirection>,
) -> bool {
    let tests = |side: OutModeDirection| direction.map_or(true, |d| d == side);
    let mut inside = true;

    if tests(OutModeDirection::Bottom) {
        inside = bounds.top < size.height + offset.y;
    }
    if inside && tests(OutModeDirection::Left) {
        inside = bounds.right > -offset.x;
    }
    if inside && tests(OutModeDirection::Right) {
        inside = bounds.left < size.width + offset.x;
    }
    if inside && tests(OutModeDirection::Top) {
        inside = bounds.bottom > -offset.y;
    }

    inside
}

/// Named easing curves over `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    #[default]
    EaseOutQuad,
    EaseOutCubic,
    EaseOutQuart,
    EaseOutQuint,
    EaseOutExpo,
    EaseOutSine,
    EaseOutBack,
    EaseOutCirc,
}

impl Easing {
    pub fn apply(self, value: f32) -> f32 {
        match self {
            Self::Linear => value,
            Self::EaseOutQuad => 1.0 - (1.0 - value).powi(2),
            Self::EaseOutCubic => 1.0 - (1.0 - value).powi(3),
            Self::EaseOutQuart => 1.0 - (1.0 - value).powi(4),
            Self::EaseOutQuint => 1.0 - (1.0 - value).powi(5),
            Self::EaseOutExpo => {
                if value >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f32.powf(-10.0 * value)
                }
            }
            Self::EaseOutSine => (value * PI / 2.0).sin(),
            Self::EaseOutBack => {
                let c1 = 1.70158;
                let c3 = c1 + 1.0;
                1.0 + c3 * (value - 1.0).powi(3) + c1 * (value - 1.0).powi(2)
            }
            Self::EaseOutCirc => (1.0 - (value - 1.0).powi(2)).max(0.0).sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn range_values_stay_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = RangeValue::Range { min: 5.0, max: 2.0 };
        for _ in 0..100 {
            let value = range.pick(&mut rng);
            assert!((2.0..5.0).contains(&value));
        }
        assert_eq!(RangeValue::Fixed(3.0).pick(&mut rng), 3.0);
    }

    #[test]
    fn parses_fixed_and_ranged_values() {
        let fixed: RangeValue = serde_json::from_str("4").unwrap();
        let ranged: RangeValue = serde_json::from_str(r#"{"min":1,"max":3}"#).unwrap();
        assert_eq!(fixed, RangeValue::Fixed(4.0));
        assert_eq!(ranged.max(), 3.0);
    }

    #[test]
    fn point_inside_respects_direction() {
        let size = CanvasSize::new(100.0, 100.0);
        let past_right = Vec2::new(120.0, 50.0);

        assert!(!is_point_inside(past_right, size, Vec2::ZERO, 5.0, None));
        assert!(!is_point_inside(
            past_right,
            size,
            Vec2::ZERO,
            5.0,
            Some(OutModeDirection::Right)
        ));
        assert!(is_point_inside(
            past_right,
            size,
            Vec2::ZERO,
            5.0,
            Some(OutModeDirection::Left)
        ));
    }

    #[test]
    fn easings_hit_their_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::EaseOutQuad,
            Easing::EaseOutCubic,
            Easing::EaseOutSine,
            Easing::EaseOutCirc,
        ] {
            assert!(easing.apply(0.0).abs() < 1e-5, "{easing:?}");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-5, "{easing:?}");
        }
    }

    #[test]
    fn polar_helpers_round_trip_angle() {
        let v = from_polar(2.0, PI / 2.0);
        assert!((angle_of(v) - PI / 2.0).abs() < 1e-5);
        assert!((with_length(v, 4.0).length() - 4.0).abs() < 1e-5);
    }
}
