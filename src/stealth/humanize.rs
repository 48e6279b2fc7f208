//! Human behavior simulation primitives
//!
//! Every random decision the synthesizers make (jitter, probabilities,
//! typo selection) and every pause they take goes through one [`Humanizer`].
//! Seed it to make a whole run reproducible.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use super::clock::{Clock, SystemClock};

/// Spread applied by [`Humanizer::variability_factor`] per unit of variability
const VARIABILITY_SPREAD: f64 = 0.3;

/// Random source and pacer shared by all synthesizers
pub struct Humanizer {
    rng: StdRng,
    clock: Arc<dyn Clock>,
}

impl Default for Humanizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Humanizer {
    /// Create a humanizer seeded from the OS, sleeping on the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    /// Create an OS-seeded humanizer on a custom clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            clock,
        }
    }

    /// Create a deterministic humanizer
    pub fn seeded(seed: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            clock,
        }
    }

    /// Uniform sample in `[low, high)`; returns `low` for an empty range
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.random_range(low..high)
    }

    /// Uniform integer in `[low, high]`
    pub fn int_between(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        self.rng.random_range(low..=high)
    }

    /// True with probability `probability`
    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.random::<f64>() < probability
    }

    /// Multiplier in `1 ± 0.3 * variability`
    pub fn variability_factor(&mut self, variability: f64) -> f64 {
        let spread = VARIABILITY_SPREAD * variability;
        self.uniform(1.0 - spread, 1.0 + spread)
    }

    /// Scale `value` by a uniform factor in `1 ± fraction`
    pub fn jitter(&mut self, value: f64, fraction: f64) -> f64 {
        value * self.uniform(1.0 - fraction, 1.0 + fraction)
    }

    /// Pick one item uniformly
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    /// Suspend the calling thread for `seconds`.
    ///
    /// Non-positive and non-finite durations are skipped.
    pub fn pause(&self, seconds: f64) {
        if !seconds.is_finite() || seconds <= 0.0 {
            return;
        }
        self.clock.sleep(Duration::from_secs_f64(seconds));
    }

    /// Suspend for a uniformly drawn duration in `[low, high)` seconds
    pub fn pause_between(&mut self, low: f64, high: f64) {
        let seconds = self.uniform(low, high);
        self.pause(seconds);
    }

    /// Current time on the humanizer's clock
    pub fn now(&self) -> Duration {
        self.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stealth::ManualClock;

    fn seeded(seed: u64) -> (Humanizer, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (Humanizer::seeded(seed, clock.clone()), clock)
    }

    #[test]
    fn test_uniform_bounds() {
        let (mut h, _) = seeded(1);
        for _ in 0..1000 {
            let v = h.uniform(0.5, 2.0);
            assert!((0.5..2.0).contains(&v));
        }
        assert_eq!(h.uniform(3.0, 3.0), 3.0);
        assert_eq!(h.int_between(4, 4), 4);
    }

    #[test]
    fn test_chance_extremes() {
        let (mut h, _) = seeded(2);
        for _ in 0..200 {
            assert!(!h.chance(0.0));
            assert!(h.chance(1.0));
        }
    }

    #[test]
    fn test_variability_factor_spread() {
        let (mut h, _) = seeded(3);
        let mut min_seen = f64::MAX;
        let mut max_seen = f64::MIN;
        for _ in 0..1000 {
            let f = h.variability_factor(1.0);
            assert!((0.7..1.3).contains(&f));
            min_seen = min_seen.min(f);
            max_seen = max_seen.max(f);
        }

        // Should see variance in both directions
        assert!(min_seen < 0.9);
        assert!(max_seen > 1.1);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let (mut a, _) = seeded(42);
        let (mut b, _) = seeded(42);
        for _ in 0..50 {
            assert_eq!(a.uniform(0.0, 1.0), b.uniform(0.0, 1.0));
        }
    }

    #[test]
    fn test_pause_skips_invalid_durations() {
        let (h, clock) = seeded(4);
        h.pause(-1.0);
        h.pause(0.0);
        h.pause(f64::NAN);
        h.pause(f64::INFINITY);
        assert!(clock.sleeps().is_empty());

        h.pause(0.25);
        assert_eq!(clock.total_slept(), Duration::from_millis(250));
    }

    #[test]
    fn test_choose() {
        let (mut h, _) = seeded(5);
        let empty: [char; 0] = [];
        assert!(h.choose(&empty).is_none());
        let items = ['a', 'b', 'c'];
        for _ in 0..20 {
            assert!(items.contains(h.choose(&items).unwrap()));
        }
    }
}
