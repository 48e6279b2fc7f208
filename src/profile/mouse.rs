//! Mouse movement profile

use std::fmt;
use std::str::FromStr;

use super::{clamp, UnknownPreset};

/// Shapes how the mouse synthesizer moves
#[derive(Debug, Clone, PartialEq)]
pub struct MouseMovementProfile {
    speed_factor: f64,
    jitter_factor: f64,
    overshoot_factor: f64,
    acceleration_factor: f64,
    smoothness: usize,
}

impl MouseMovementProfile {
    /// Build a profile, clamping every value into its supported range.
    ///
    /// * `speed_factor` - higher is faster, [0.1, 5.0]
    /// * `jitter_factor` - path deviation, [0.1, 5.0]
    /// * `overshoot_factor` - overshoot likelihood, [0.0, 5.0]
    /// * `acceleration_factor` - sharpness of the speed curve, [0.1, 5.0]
    /// * `smoothness` - points per sub-movement, [10, 200]
    pub fn new(
        speed_factor: f64,
        jitter_factor: f64,
        overshoot_factor: f64,
        acceleration_factor: f64,
        smoothness: usize,
    ) -> Self {
        Self {
            speed_factor: clamp(speed_factor, 0.1, 5.0),
            jitter_factor: clamp(jitter_factor, 0.1, 5.0),
            overshoot_factor: clamp(overshoot_factor, 0.0, 5.0),
            acceleration_factor: clamp(acceleration_factor, 0.1, 5.0),
            smoothness: smoothness.clamp(10, 200),
        }
    }

    /// Profile for a preset name, falling back to human for unknown names
    pub fn create_profile(name: &str) -> Self {
        match name.parse::<MousePreset>() {
            Ok(preset) => preset.profile(),
            Err(e) => {
                log::warn!("{}, using 'human' mouse profile", e);
                MousePreset::Human.profile()
            }
        }
    }

    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }

    pub fn jitter_factor(&self) -> f64 {
        self.jitter_factor
    }

    pub fn overshoot_factor(&self) -> f64 {
        self.overshoot_factor
    }

    pub fn acceleration_factor(&self) -> f64 {
        self.acceleration_factor
    }

    pub fn smoothness(&self) -> usize {
        self.smoothness
    }
}

impl Default for MouseMovementProfile {
    fn default() -> Self {
        MousePreset::Human.profile()
    }
}

/// Named mouse presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MousePreset {
    Human,
    Fast,
    Precise,
    Erratic,
    Smooth,
}

impl MousePreset {
    pub const ALL: [MousePreset; 5] = [
        MousePreset::Human,
        MousePreset::Fast,
        MousePreset::Precise,
        MousePreset::Erratic,
        MousePreset::Smooth,
    ];

    pub fn profile(self) -> MouseMovementProfile {
        match self {
            MousePreset::Human => MouseMovementProfile::new(1.0, 1.0, 1.0, 1.0, 50),
            MousePreset::Fast => MouseMovementProfile::new(2.0, 0.7, 1.2, 1.5, 30),
            MousePreset::Precise => MouseMovementProfile::new(0.8, 0.3, 0.2, 0.7, 80),
            MousePreset::Erratic => MouseMovementProfile::new(1.5, 2.5, 2.0, 2.0, 40),
            MousePreset::Smooth => MouseMovementProfile::new(0.9, 0.2, 0.1, 0.5, 100),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MousePreset::Human => "human",
            MousePreset::Fast => "fast",
            MousePreset::Precise => "precise",
            MousePreset::Erratic => "erratic",
            MousePreset::Smooth => "smooth",
        }
    }
}

impl fmt::Display for MousePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MousePreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MousePreset::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}
