//! Humanized mouse movement
//!
//! Turns a target position into a timed walk along a curved path:
//! - the path comes from [`curve::generate_path`]
//! - per-point delays follow an accelerate/decelerate speed curve with ±10% jitter
//! - long moves sometimes overshoot the target and correct back

pub mod curve;

use std::sync::Arc;
use std::time::Duration;

use crate::input::{Held, HeldInputs, InputBackend, InputError, MouseButton, Point};
use crate::profile::MouseMovementProfile;
use crate::stealth::Humanizer;

pub use curve::{generate_path, sample_path, ControlPointSet};

/// Default speed factor at the start of a movement
pub const DEFAULT_START_SPEED: f64 = 0.8;
/// Default speed factor at the end of a movement
pub const DEFAULT_END_SPEED: f64 = 0.7;

/// Moves shorter than this are skipped
const MIN_MOVE_DISTANCE: f64 = 5.0;
/// Seconds between path points at speed factor 1.0
const BASE_POINT_DELAY: f64 = 0.005;
/// Floor for the speed curve so a zero start speed cannot divide by zero
const MIN_CURVE_SPEED: f64 = 0.05;
const MAX_OVERSHOOT_BASE_PROBABILITY: f64 = 0.3;
/// Pixels of distance per unit of overshoot base probability
const OVERSHOOT_DISTANCE_SCALE: f64 = 500.0;
/// Length of the correction after an overshoot, relative to the first leg
const CORRECTION_DURATION_SHARE: f64 = 0.3;
/// Fewest points a correction leg is sampled with
const MIN_CORRECTION_POINTS: usize = 2;

/// A point on a movement and the pause taken before moving there
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedPoint {
    pub point: Point,
    pub delay: Duration,
}

/// Parameters of a click; missing coordinates mean "where the cursor is"
#[derive(Debug, Clone, PartialEq)]
pub struct ClickRequest {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub button: MouseButton,
    pub clicks: u32,
    /// Pause between clicks; drawn from 0.05-0.15s when absent
    pub interval: Option<Duration>,
    /// Duration of the move to the click position
    pub duration: Option<Duration>,
}

impl Default for ClickRequest {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            button: MouseButton::Left,
            clicks: 1,
            interval: None,
            duration: None,
        }
    }
}

impl ClickRequest {
    /// Single left click at a position
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }
}

/// Probability that a move of `distance` pixels overshoots.
///
/// Grows with distance up to a base of 0.3, then scales by the profile's
/// overshoot factor.
pub fn overshoot_probability(distance: f64, overshoot_factor: f64) -> f64 {
    (distance / OVERSHOOT_DISTANCE_SCALE).min(MAX_OVERSHOOT_BASE_PROBABILITY) * overshoot_factor
}

/// Running totals over the movements a [`MouseSynthesizer`] performed
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementStats {
    /// Moves that reached the backend
    pub moves: u64,
    pub overshoots: u64,
    /// Moves dropped for being under 5px
    pub skipped_short_moves: u64,
    pub points_visited: u64,
    /// Fastest single step, in pixels per second
    pub max_velocity: f64,
    velocity_sum: f64,
    velocity_samples: u64,
}

impl MovementStats {
    /// Mean step velocity in pixels per second, or 0 before any timed step
    pub fn average_velocity(&self) -> f64 {
        if self.velocity_samples == 0 {
            0.0
        } else {
            self.velocity_sum / self.velocity_samples as f64
        }
    }

    fn record_step(&mut self, distance: f64, delay: Duration) {
        self.points_visited += 1;
        let seconds = delay.as_secs_f64();
        if seconds > 0.0 {
            let velocity = distance / seconds;
            self.velocity_sum += velocity;
            self.velocity_samples += 1;
            self.max_velocity = self.max_velocity.max(velocity);
        }
    }
}

/// Drives an [`InputBackend`] with humanized mouse movement
pub struct MouseSynthesizer {
    backend: Arc<dyn InputBackend>,
    profile: MouseMovementProfile,
    last_position: Option<Point>,
    stats: MovementStats,
}

impl MouseSynthesizer {
    /// Synthesizer driving `backend` with `profile`
    pub fn new(backend: Arc<dyn InputBackend>, profile: MouseMovementProfile) -> Self {
        Self {
            backend,
            profile,
            last_position: None,
            stats: MovementStats::default(),
        }
    }

    /// Profile used for the next movement
    pub fn profile(&self) -> &MouseMovementProfile {
        &self.profile
    }

    /// Replace the profile; takes effect on the next movement
    pub fn set_profile(&mut self, profile: MouseMovementProfile) {
        log::debug!(
            "Mouse profile set: speed={}, jitter={}, overshoot={}, acceleration={}, smoothness={}",
            profile.speed_factor(),
            profile.jitter_factor(),
            profile.overshoot_factor(),
            profile.acceleration_factor(),
            profile.smoothness()
        );
        self.profile = profile;
    }

    /// Where the last completed move ended
    pub fn last_position(&self) -> Option<Point> {
        self.last_position
    }

    /// Cursor position as the backend reports it
    pub fn position(&self) -> Result<Point, InputError> {
        self.backend.cursor_position()
    }

    pub fn stats(&self) -> MovementStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = MovementStats::default();
    }

    /// Timed points for one sub-movement, without touching the backend.
    ///
    /// With an explicit `duration` the delays are rescaled so they sum to it.
    pub fn plan_movement(
        &self,
        humanizer: &mut Humanizer,
        start: Point,
        end: Point,
        duration: Option<Duration>,
        start_speed: f64,
        end_speed: f64,
    ) -> Vec<TimedPoint> {
        let points = self.profile.smoothness();
        self.plan_points(humanizer, start, end, points, duration, start_speed, end_speed)
    }

    #[allow(clippy::too_many_arguments)]
    fn plan_points(
        &self,
        humanizer: &mut Humanizer,
        start: Point,
        end: Point,
        points: usize,
        duration: Option<Duration>,
        start_speed: f64,
        end_speed: f64,
    ) -> Vec<TimedPoint> {
        let path = sample_path(start, end, self.profile.jitter_factor(), points, humanizer);
        let mut delays = self.acceleration_delays(humanizer, &path, start_speed, end_speed);

        if let Some(duration) = duration {
            let total: f64 = delays.iter().sum();
            if total > 0.0 {
                let factor = duration.as_secs_f64() / total;
                delays.iter_mut().for_each(|d| *d *= factor);
            }
        }

        path.into_iter()
            .zip(delays)
            .map(|(point, delay)| TimedPoint {
                point,
                delay: Duration::from_secs_f64(delay.max(0.0)),
            })
            .collect()
    }

    /// Seconds to wait before each path point; the first is always zero
    fn acceleration_delays(
        &self,
        humanizer: &mut Humanizer,
        path: &[Point],
        start_speed: f64,
        end_speed: f64,
    ) -> Vec<f64> {
        let n = path.len();
        if n < 2 {
            return vec![0.0; n];
        }

        let base_delay = BASE_POINT_DELAY / self.profile.speed_factor();
        let accel = self.profile.acceleration_factor();
        let segments: Vec<f64> = path.windows(2).map(|w| w[0].distance_to(w[1])).collect();
        let average = segments.iter().sum::<f64>() / (n - 1) as f64;

        let mut delays = Vec::with_capacity(n);
        delays.push(0.0);

        for (i, segment) in segments.iter().enumerate() {
            let t = if n > 2 { i as f64 / (n - 2) as f64 } else { 0.5 };

            let speed = if t < 0.5 {
                start_speed + (1.0 - start_speed) * (t * 2.0).powf(accel)
            } else {
                1.0 + (end_speed - 1.0) * ((t - 0.5) * 2.0).powf(accel)
            };

            let distance_factor = if average > 0.0 { segment / average } else { 1.0 };
            let delay = base_delay * distance_factor / speed.max(MIN_CURVE_SPEED);
            delays.push(humanizer.jitter(delay, 0.1));
        }

        delays
    }

    /// Move to `target` with the default speed curve
    pub fn move_to(
        &mut self,
        humanizer: &mut Humanizer,
        target: Point,
        duration: Option<Duration>,
    ) -> Result<(), InputError> {
        self.move_with_speeds(humanizer, target, duration, DEFAULT_START_SPEED, DEFAULT_END_SPEED)
    }

    /// Move to `target`, possibly overshooting first.
    ///
    /// Targets closer than 5px are treated as reached. An overshooting move
    /// splits both `duration` and the profile's point count between the
    /// outbound leg and the correction, so the totals match a direct move.
    pub fn move_with_speeds(
        &mut self,
        humanizer: &mut Humanizer,
        target: Point,
        duration: Option<Duration>,
        start_speed: f64,
        end_speed: f64,
    ) -> Result<(), InputError> {
        let start = self.backend.cursor_position()?;
        let distance = start.distance_to(target);
        if distance < MIN_MOVE_DISTANCE {
            self.stats.skipped_short_moves += 1;
            return Ok(());
        }

        self.last_position = Some(start);
        self.stats.moves += 1;

        let probability = overshoot_probability(distance, self.profile.overshoot_factor());
        let overshoot = if humanizer.chance(probability) {
            Some(overshoot_point(humanizer, start, target)).filter(|p| *p != target)
        } else {
            None
        };

        match overshoot {
            Some(overshoot) => {
                log::debug!("Overshooting {} via {}", target, overshoot);
                self.stats.overshoots += 1;

                let total_points = self.profile.smoothness();
                let correction_points = ((total_points as f64 * CORRECTION_DURATION_SHARE
                    / (1.0 + CORRECTION_DURATION_SHARE))
                    .round() as usize)
                    .max(MIN_CORRECTION_POINTS);
                let first_points = total_points.saturating_sub(correction_points);

                let first_duration = duration.map(|d| d.div_f64(1.0 + CORRECTION_DURATION_SHARE));
                let correction_duration = duration.map(|d| {
                    d.mul_f64(CORRECTION_DURATION_SHARE / (1.0 + CORRECTION_DURATION_SHARE))
                });

                let outbound = self.plan_points(
                    humanizer,
                    start,
                    overshoot,
                    first_points,
                    first_duration,
                    start_speed,
                    1.0,
                );
                // The correction starts on the overshoot point, which the outbound leg already visited
                let correction = self.plan_points(
                    humanizer,
                    overshoot,
                    target,
                    correction_points + 1,
                    correction_duration,
                    0.5,
                    end_speed,
                );

                self.execute_plan(humanizer, start, &outbound)?;
                self.execute_plan(humanizer, overshoot, correction.get(1..).unwrap_or_default())?;
            }
            None => {
                let plan = self.plan_movement(humanizer, start, target, duration, start_speed, end_speed);
                self.execute_plan(humanizer, start, &plan)?;
            }
        }

        self.last_position = Some(target);
        Ok(())
    }

    fn execute_plan(&mut self, humanizer: &Humanizer, from: Point, plan: &[TimedPoint]) -> Result<(), InputError> {
        let mut previous = from;
        for step in plan {
            humanizer.pause(step.delay.as_secs_f64());
            self.backend.move_cursor(step.point)?;
            self.stats.record_step(previous.distance_to(step.point), step.delay);
            previous = step.point;
        }
        Ok(())
    }

    /// Move to the click position, then click with a small positional jitter
    pub fn click(&mut self, humanizer: &mut Humanizer, request: &ClickRequest) -> Result<(), InputError> {
        let target = match (request.x, request.y) {
            (Some(x), Some(y)) => Point::new(x, y),
            (x, y) => {
                let current = self.backend.cursor_position()?;
                Point::new(x.unwrap_or(current.x), y.unwrap_or(current.y))
            }
        };

        self.move_to(humanizer, target, request.duration)?;

        let interval = match request.interval {
            Some(interval) => interval.as_secs_f64(),
            None => humanizer.uniform(0.05, 0.15),
        };
        let jitter = self.profile.jitter_factor().clamp(1.0, 3.0) as i32;

        for i in 0..request.clicks {
            let jittered = Point::new(
                target.x.saturating_add(humanizer.int_between(-jitter, jitter)),
                target.y.saturating_add(humanizer.int_between(-jitter, jitter)),
            );
            self.backend.move_cursor(jittered)?;
            self.backend.click(request.button)?;

            if i + 1 < request.clicks {
                let pause = humanizer.jitter(interval, 0.1);
                humanizer.pause(pause);
            }
        }

        Ok(())
    }

    /// Hold `button` while moving to `target`.
    ///
    /// The button is released on every path out of this call.
    pub fn drag_to(
        &mut self,
        humanizer: &mut Humanizer,
        target: Point,
        button: MouseButton,
        duration: Option<Duration>,
    ) -> Result<(), InputError> {
        let mut held = HeldInputs::new(Arc::clone(&self.backend));
        held.press(Held::Button(button))?;

        self.move_to(humanizer, target, duration)?;

        held.release_last().unwrap_or(Ok(()))
    }
}

/// A point 5-15% of the distance past `end`, nudged sideways by up to ±10%
fn overshoot_point(humanizer: &mut Humanizer, start: Point, end: Point) -> Point {
    let mut dx = f64::from(end.x) - f64::from(start.x);
    let mut dy = f64::from(end.y) - f64::from(start.y);
    let distance = (dx * dx + dy * dy).sqrt();

    if distance > 0.0 {
        dx /= distance;
        dy /= distance;
    }

    let overshoot = distance * humanizer.uniform(0.05, 0.15);
    let (perp_x, perp_y) = (-dy, dx);
    let sideways = humanizer.uniform(-0.1, 0.1) * distance;

    Point::new(
        (f64::from(end.x) + dx * overshoot + perp_x * sideways).round() as i32,
        (f64::from(end.y) + dy * overshoot + perp_y * sideways).round() as i32,
    )
}
