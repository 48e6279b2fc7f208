//! Curved movement paths
//!
//! A path is a Bézier curve through randomly perturbed control points. The
//! first and last control points are the requested endpoints, so the curve
//! always starts and ends exactly there.

use std::f64::consts::FRAC_PI_2;

use crate::input::Point;
use crate::profile::MouseMovementProfile;
use crate::stealth::Humanizer;

/// Interior control points are added one per this many pixels of distance
const PIXELS_PER_CONTROL_POINT: f64 = 300.0;
const MIN_CONTROL_POINTS: usize = 3;
const MAX_CONTROL_POINTS: usize = 5;
/// Cap on perpendicular deviation of an interior control point
const MAX_DEVIATION_PX: f64 = 100.0;

/// Ordered control points of one curve, endpoints included
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPointSet {
    points: Vec<(f64, f64)>,
}

impl ControlPointSet {
    /// Perturbed control points between `start` and `end`.
    ///
    /// Interior points sit on the straight line at even spacing, then get
    /// pushed perpendicular to it (up to 40% of the distance times
    /// `jitter_factor`, capped at 100px) and along it (±10% of the distance).
    pub fn generate(start: Point, end: Point, jitter_factor: f64, humanizer: &mut Humanizer) -> Self {
        let dx = f64::from(end.x) - f64::from(start.x);
        let dy = f64::from(end.y) - f64::from(start.y);
        let distance = (dx * dx + dy * dy).sqrt();
        let angle = dy.atan2(dx);

        let count = ((distance / PIXELS_PER_CONTROL_POINT) as usize + MIN_CONTROL_POINTS)
            .clamp(MIN_CONTROL_POINTS, MAX_CONTROL_POINTS);

        let mut points = Vec::with_capacity(count);
        points.push((f64::from(start.x), f64::from(start.y)));

        let perpendicular = angle + FRAC_PI_2;
        let max_deviation = MAX_DEVIATION_PX.min(distance * 0.4 * jitter_factor);

        for i in 1..count - 1 {
            let t = i as f64 / (count - 1) as f64;
            let base_x = f64::from(start.x) + t * dx;
            let base_y = f64::from(start.y) + t * dy;

            let deviation = humanizer.uniform(-max_deviation, max_deviation);
            let along = humanizer.uniform(-0.1, 0.1) * distance;

            points.push((
                base_x + deviation * perpendicular.cos() + along * angle.cos(),
                base_y + deviation * perpendicular.sin() + along * angle.sin(),
            ));
        }

        points.push((f64::from(end.x), f64::from(end.y)));
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Evaluate the curve at `t` in `[0, 1]` with Bernstein weights
    pub fn evaluate(&self, t: f64) -> (f64, f64) {
        let n = self.points.len().saturating_sub(1);
        self.points
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(x, y), (j, &(px, py))| {
                let weight = bernstein(j, n, t);
                (x + weight * px, y + weight * py)
            })
    }

    /// `samples` evenly spaced points from t = 0 to t = 1, rounded to pixels
    pub fn sample(&self, samples: usize) -> Vec<Point> {
        match samples {
            0 => Vec::new(),
            1 => vec![round_point(self.evaluate(0.0))],
            _ => (0..samples)
                .map(|i| round_point(self.evaluate(i as f64 / (samples - 1) as f64)))
                .collect(),
        }
    }
}

/// Path of `profile.smoothness()` points from `start` to `end`.
///
/// A zero-length move yields the single point `start`.
pub fn generate_path(
    start: Point,
    end: Point,
    profile: &MouseMovementProfile,
    humanizer: &mut Humanizer,
) -> Vec<Point> {
    sample_path(start, end, profile.jitter_factor(), profile.smoothness(), humanizer)
}

/// Path of exactly `points` points, or the single point `start` for a zero-length move
pub fn sample_path(
    start: Point,
    end: Point,
    jitter_factor: f64,
    points: usize,
    humanizer: &mut Humanizer,
) -> Vec<Point> {
    if start == end {
        return vec![start];
    }
    ControlPointSet::generate(start, end, jitter_factor, humanizer).sample(points)
}

/// n choose k via the multiplicative formula
pub fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (1..=k as u64).fold(1u64, |acc, i| acc * (n as u64 + 1 - i) / i)
}

fn bernstein(j: usize, n: usize, t: f64) -> f64 {
    binomial(n, j) as f64 * t.powi(j as i32) * (1.0 - t).powi((n - j) as i32)
}

fn round_point((x, y): (f64, f64)) -> Point {
    Point::new(x.round() as i32, y.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stealth::ManualClock;
    use std::sync::Arc;

    fn humanizer(seed: u64) -> Humanizer {
        Humanizer::seeded(seed, Arc::new(ManualClock::new()))
    }

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(0, 0), 1);
        assert_eq!(binomial(4, 0), 1);
        assert_eq!(binomial(4, 2), 6);
        assert_eq!(binomial(5, 2), 10);
        assert_eq!(binomial(5, 5), 1);
        assert_eq!(binomial(3, 4), 0);
        assert_eq!(binomial(20, 10), 184_756);
    }

    #[test]
    fn test_control_point_count_grows_with_distance() {
        let mut h = humanizer(1);
        let origin = Point::new(0, 0);

        let short = ControlPointSet::generate(origin, Point::new(200, 0), 1.0, &mut h);
        let medium = ControlPointSet::generate(origin, Point::new(450, 0), 1.0, &mut h);
        let long = ControlPointSet::generate(origin, Point::new(2000, 0), 1.0, &mut h);

        assert_eq!(short.len(), 3);
        assert_eq!(medium.len(), 4);
        assert_eq!(long.len(), 5);
    }

    #[test]
    fn test_control_point_endpoints_are_exact() {
        let mut h = humanizer(2);
        let set = ControlPointSet::generate(Point::new(-30, 12), Point::new(640, 480), 2.0, &mut h);
        assert_eq!(set.points().first(), Some(&(-30.0, 12.0)));
        assert_eq!(set.points().last(), Some(&(640.0, 480.0)));
    }

    #[test]
    fn test_path_length_and_endpoints() {
        let mut h = humanizer(3);
        let pairs = [
            (Point::new(0, 0), Point::new(100, 100)),
            (Point::new(800, 20), Point::new(10, 700)),
            (Point::new(5, 5), Point::new(6, 5)),
            (Point::new(0, 0), Point::new(3000, -1200)),
        ];

        for preset in crate::profile::MousePreset::ALL {
            let profile = preset.profile();
            for (start, end) in pairs {
                let path = generate_path(start, end, &profile, &mut h);
                assert_eq!(path.len(), profile.smoothness());
                assert_eq!(path.first(), Some(&start));
                assert_eq!(path.last(), Some(&end));
            }
        }
    }

    #[test]
    fn test_far_apart_endpoints() {
        let mut h = humanizer(5);
        let start = Point::new(i32::MIN, i32::MIN);
        let end = Point::new(i32::MAX, i32::MAX);
        let path = sample_path(start, end, 1.0, 12, &mut h);
        assert_eq!(path.len(), 12);
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&end));
    }

    #[test]
    fn test_degenerate_path() {
        let mut h = humanizer(4);
        let p = Point::new(42, 42);
        let path = generate_path(p, p, &MouseMovementProfile::default(), &mut h);
        assert_eq!(path, vec![p]);
    }

    #[test]
    fn test_same_seed_same_path() {
        let profile = MouseMovementProfile::default();
        let a = generate_path(Point::new(0, 0), Point::new(500, 300), &profile, &mut humanizer(9));
        let b = generate_path(Point::new(0, 0), Point::new(500, 300), &profile, &mut humanizer(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_straight_line_with_two_points() {
        let set = ControlPointSet {
            points: vec![(0.0, 0.0), (10.0, 0.0)],
        };
        assert_eq!(
            set.sample(3),
            vec![Point::new(0, 0), Point::new(5, 0), Point::new(10, 0)]
        );
    }
}
