//! Keyboard profile

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::layout::AdjacencyMap;
use super::{clamp, UnknownPreset};

/// Shapes keystroke timing and typo behaviour
#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardProfile {
    typing_speed: f64,
    typing_variability: f64,
    error_rate: f64,
    key_hold_time: f64,
    key_hold_variability: f64,
    adjacency: Arc<AdjacencyMap>,
}

impl KeyboardProfile {
    /// Build a profile on the QWERTY adjacency map.
    ///
    /// * `typing_speed` - higher is faster, [0.1, 5.0]
    /// * `typing_variability` - spread of inter-key delays, [0.1, 5.0]
    /// * `error_rate` - typo probability per character, [0.0, 0.1]
    /// * `key_hold_time` - base hold in seconds, [0.01, 0.2]
    /// * `key_hold_variability` - spread of hold times, [0.1, 5.0]
    pub fn new(
        typing_speed: f64,
        typing_variability: f64,
        error_rate: f64,
        key_hold_time: f64,
        key_hold_variability: f64,
    ) -> Self {
        Self {
            typing_speed: clamp(typing_speed, 0.1, 5.0),
            typing_variability: clamp(typing_variability, 0.1, 5.0),
            error_rate: clamp(error_rate, 0.0, 0.1),
            key_hold_time: clamp(key_hold_time, 0.01, 0.2),
            key_hold_variability: clamp(key_hold_variability, 0.1, 5.0),
            adjacency: AdjacencyMap::qwerty(),
        }
    }

    /// Same profile on a different layout
    pub fn with_adjacency(mut self, adjacency: Arc<AdjacencyMap>) -> Self {
        self.adjacency = adjacency;
        self
    }

    /// Profile for a preset name, falling back to human for unknown names
    pub fn create_profile(name: &str) -> Self {
        match name.parse::<KeyboardPreset>() {
            Ok(preset) => preset.profile(),
            Err(e) => {
                log::warn!("{}, using 'human' keyboard profile", e);
                KeyboardPreset::Human.profile()
            }
        }
    }

    pub fn typing_speed(&self) -> f64 {
        self.typing_speed
    }

    pub fn typing_variability(&self) -> f64 {
        self.typing_variability
    }

    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    pub fn key_hold_time(&self) -> f64 {
        self.key_hold_time
    }

    pub fn key_hold_variability(&self) -> f64 {
        self.key_hold_variability
    }

    pub fn adjacency(&self) -> &AdjacencyMap {
        &self.adjacency
    }

    /// Bypasses the error-rate ceiling so tests can force a typo on every key
    #[cfg(test)]
    pub(crate) fn with_unclamped_error_rate(mut self, error_rate: f64) -> Self {
        self.error_rate = error_rate;
        self
    }
}

impl Default for KeyboardProfile {
    fn default() -> Self {
        KeyboardPreset::Human.profile()
    }
}

/// Named keyboard presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyboardPreset {
    Human,
    Fast,
    Precise,
    Erratic,
    Slow,
}

impl KeyboardPreset {
    pub const ALL: [KeyboardPreset; 5] = [
        KeyboardPreset::Human,
        KeyboardPreset::Fast,
        KeyboardPreset::Precise,
        KeyboardPreset::Erratic,
        KeyboardPreset::Slow,
    ];

    pub fn profile(self) -> KeyboardProfile {
        match self {
            KeyboardPreset::Human => KeyboardProfile::new(1.0, 1.0, 0.03, 0.05, 1.0),
            KeyboardPreset::Fast => KeyboardProfile::new(2.0, 0.7, 0.05, 0.03, 0.7),
            KeyboardPreset::Precise => KeyboardProfile::new(0.9, 0.5, 0.0, 0.05, 0.5),
            KeyboardPreset::Erratic => KeyboardProfile::new(1.2, 2.0, 0.08, 0.04, 2.0),
            KeyboardPreset::Slow => KeyboardProfile::new(0.5, 1.5, 0.02, 0.08, 1.2),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            KeyboardPreset::Human => "human",
            KeyboardPreset::Fast => "fast",
            KeyboardPreset::Precise => "precise",
            KeyboardPreset::Erratic => "erratic",
            KeyboardPreset::Slow => "slow",
        }
    }
}

impl fmt::Display for KeyboardPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyboardPreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyboardPreset::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}
