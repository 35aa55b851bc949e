//! Planar geometry for area-of-effect targeting.
//!
//! All functions are pure. Angles are radians; [`Facing`] keeps them
//! normalized to `[0, 2π)` so repeated rotations never accumulate drift from
//! out-of-range inputs.

use std::f64::consts::TAU;

use arrayvec::ArrayVec;

use crate::error::{ErrorSeverity, GameError};
use crate::state::Position;

/// Upper bound on polygon corners; skill shapes use four.
pub const MAX_REGION_POINTS: usize = 8;

/// Orientation in radians, normalized to `[0, 2π)`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Facing(f64);

impl Facing {
    pub fn from_radians(radians: f64) -> Self {
        if !radians.is_finite() {
            return Self(0.0);
        }
        let normalized = radians.rem_euclid(TAU);
        // rem_euclid can round up to exactly TAU for tiny negative inputs.
        Self(if normalized >= TAU { 0.0 } else { normalized })
    }

    /// Converts the 0-255 network direction byte.
    pub fn from_byte(direction: u8) -> Self {
        Self::from_radians(f64::from(direction) / 255.0 * TAU)
    }

    pub fn radians(self) -> f64 {
        self.0
    }

    pub fn to_byte(self) -> u8 {
        (self.0 / TAU * 255.0).round() as u8
    }

    /// Direction from `from` towards `to`; zero when the points coincide.
    pub fn between(from: Point, to: Point) -> Self {
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        if dx == 0.0 && dy == 0.0 {
            return Self(0.0);
        }
        Self::from_radians(dy.atan2(dx))
    }
}

/// Floating point world coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Rounds to the nearest integer world position.
    pub fn to_position(self) -> Position {
        Position::new(self.x.round() as i32, self.y.round() as i32)
    }
}

impl From<Position> for Point {
    fn from(position: Position) -> Self {
        Self::new(f64::from(position.x), f64::from(position.y))
    }
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("polygon needs at least 3 points, got {0}")]
    TooFewPoints(usize),

    #[error("polygon exceeds {MAX_REGION_POINTS} points")]
    TooManyPoints,

    #[error("polygon point {0:?} is not finite")]
    NonFinite(Point),
}

impl GameError for GeometryError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::TooFewPoints(_) => "GEOMETRY_TOO_FEW_POINTS",
            Self::TooManyPoints => "GEOMETRY_TOO_MANY_POINTS",
            Self::NonFinite(_) => "GEOMETRY_NON_FINITE",
        }
    }
}

/// Rotates `point` around `pivot` by `angle` radians (counter-clockwise).
pub fn rotate_point(point: Point, pivot: Point, angle: f64) -> Point {
    let (sin, cos) = angle.sin_cos();
    let dx = point.x - pivot.x;
    let dy = point.y - pivot.y;
    Point {
        x: cos * dx - sin * dy + pivot.x,
        y: sin * dx + cos * dy + pivot.y,
    }
}

/// Point `distance` units away from `origin` along `facing`.
pub fn relative(origin: Point, facing: Facing, distance: f64) -> Point {
    let (sin, cos) = facing.radians().sin_cos();
    Point {
        x: origin.x + cos * distance,
        y: origin.y + sin * distance,
    }
}

/// Moves `target` away from `source` by `distance`.
///
/// When both coincide the target is pushed along `fallback`.
pub fn shove(source: Point, target: Point, distance: f64, fallback: Facing) -> Point {
    let direction = if source.distance(target) == 0.0 {
        fallback
    } else {
        Facing::between(source, target)
    };
    relative(target, direction, distance)
}

/// Oriented polygon used once per cast to select targets.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackRegion {
    points: ArrayVec<Point, MAX_REGION_POINTS>,
    pivot: Point,
}

impl AttackRegion {
    /// Builds a region from corners in winding order.
    ///
    /// The pivot defaults to the vertex centroid.
    pub fn from_points(points: &[Point]) -> Result<Self, GeometryError> {
        if points.len() < 3 {
            return Err(GeometryError::TooFewPoints(points.len()));
        }
        let mut stored = ArrayVec::new();
        for point in points {
            if !point.is_finite() {
                return Err(GeometryError::NonFinite(*point));
            }
            stored
                .try_push(*point)
                .map_err(|_| GeometryError::TooManyPoints)?;
        }
        let count = stored.len() as f64;
        let pivot = Point {
            x: stored.iter().map(|p| p.x).sum::<f64>() / count,
            y: stored.iter().map(|p| p.y).sum::<f64>() / count,
        };
        Ok(Self {
            points: stored,
            pivot,
        })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Center the shape was built around.
    pub fn pivot(&self) -> Point {
        self.pivot
    }

    /// Even-odd ray casting test.
    pub fn contains(&self, point: Point) -> bool {
        let mut inside = false;
        let count = self.points.len();
        let mut j = count - 1;
        for i in 0..count {
            let (a, b) = (self.points[i], self.points[j]);
            if (a.y > point.y) != (b.y > point.y)
                && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Axis-aligned bounds as `(min, max)` corners.
    pub fn bounds(&self) -> (Point, Point) {
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for point in &self.points {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }
        (min, max)
    }
}

/// Rectangle of `length` × `width` centered `forward_offset` units ahead of
/// `origin`, with its length running along `facing`.
pub fn build_attack_region(
    origin: Point,
    facing: Facing,
    forward_offset: f64,
    length: f64,
    width: f64,
) -> Result<AttackRegion, GeometryError> {
    let pivot = relative(origin, facing, forward_offset);
    let (half_length, half_width) = (length / 2.0, width / 2.0);
    let corners = [
        Point::new(pivot.x - half_length, pivot.y - half_width),
        Point::new(pivot.x + half_length, pivot.y - half_width),
        Point::new(pivot.x + half_length, pivot.y + half_width),
        Point::new(pivot.x - half_length, pivot.y + half_width),
    ]
    .map(|corner| rotate_point(corner, pivot, facing.radians()));

    let mut region = AttackRegion::from_points(&corners)?;
    region.pivot = pivot;
    Ok(region)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use proptest::prelude::*;

    use super::*;

    const EPSILON: f64 = 1e-6;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON
    }

    #[test]
    fn facing_wraps_into_one_turn() {
        let wrapped = Facing::from_radians(-FRAC_PI_2).radians();
        assert!((wrapped - 3.0 * FRAC_PI_2).abs() < EPSILON);
        assert!(Facing::from_radians(TAU * 3.0).radians().abs() < EPSILON);
        assert_eq!(Facing::from_byte(0).radians(), 0.0);
        assert_eq!(Facing::from_byte(255).radians(), 0.0);
        assert_eq!(Facing::from_byte(64).to_byte(), 64);
    }

    #[test]
    fn quarter_turn_rotation() {
        let rotated = rotate_point(Point::new(2.0, 1.0), Point::new(1.0, 1.0), FRAC_PI_2);
        assert!(close(rotated, Point::new(1.0, 2.0)));
    }

    #[test]
    fn region_faces_along_heading() {
        let region = build_attack_region(
            Point::new(0.0, 0.0),
            Facing::from_radians(0.0),
            800.0,
            1400.0,
            200.0,
        )
        .unwrap();
        assert!(close(region.pivot(), Point::new(800.0, 0.0)));
        assert!(region.contains(Point::new(110.0, 0.0)));
        assert!(region.contains(Point::new(1_490.0, 90.0)));
        assert!(!region.contains(Point::new(1_510.0, 0.0)));
        assert!(!region.contains(Point::new(800.0, 150.0)));
        assert!(!region.contains(Point::new(-50.0, 0.0)));
    }

    #[test]
    fn region_turned_north_covers_the_y_axis() {
        let region = build_attack_region(
            Point::new(100.0, 100.0),
            Facing::from_radians(FRAC_PI_2),
            800.0,
            1400.0,
            200.0,
        )
        .unwrap();
        assert!(region.contains(Point::new(100.0, 1_400.0)));
        assert!(!region.contains(Point::new(900.0, 100.0)));
    }

    #[test]
    fn polygon_requires_three_points() {
        let err = AttackRegion::from_points(&[Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        assert_eq!(err, Err(GeometryError::TooFewPoints(2)));
    }

    #[test]
    fn shove_pushes_away_from_source() {
        let moved = shove(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            720.0,
            Facing::default(),
        );
        assert!(close(moved, Point::new(730.0, 0.0)));
        let stacked = shove(
            Point::new(5.0, 5.0),
            Point::new(5.0, 5.0),
            10.0,
            Facing::from_radians(PI),
        );
        assert!(close(stacked, Point::new(-5.0, 5.0)));
    }

    proptest! {
        #[test]
        fn rotation_round_trips(
            x in -5_000.0f64..5_000.0,
            y in -5_000.0f64..5_000.0,
            px in -5_000.0f64..5_000.0,
            py in -5_000.0f64..5_000.0,
            angle in -4.0 * PI..4.0 * PI,
        ) {
            let point = Point::new(x, y);
            let pivot = Point::new(px, py);
            let back = rotate_point(rotate_point(point, pivot, angle), pivot, -angle);
            prop_assert!((back.x - point.x).abs() < 1e-6);
            prop_assert!((back.y - point.y).abs() < 1e-6);
        }

        #[test]
        fn region_corners_round_trip_and_contain_pivot(
            ox in -10_000.0f64..10_000.0,
            oy in -10_000.0f64..10_000.0,
            angle in -4.0 * PI..4.0 * PI,
        ) {
            let facing = Facing::from_radians(angle);
            let region =
                build_attack_region(Point::new(ox, oy), facing, 800.0, 1400.0, 200.0).unwrap();
            prop_assert_eq!(region.points().len(), 4);
            prop_assert!(region.contains(region.pivot()));
            for corner in region.points() {
                let back = rotate_point(
                    rotate_point(*corner, region.pivot(), facing.radians()),
                    region.pivot(),
                    -facing.radians(),
                );
                prop_assert!((back.x - corner.x).abs() < 1e-6);
                prop_assert!((back.y - corner.y).abs() < 1e-6);
            }
        }

        #[test]
        fn facing_is_normalized(angle in -1.0e6f64..1.0e6) {
            let radians = Facing::from_radians(angle).radians();
            prop_assert!((0.0..TAU).contains(&radians));
        }
    }
}
