//! User settings
//!
//! Every field is optional in the JSON form. Numeric overrides go through
//! the clamping profile constructors, so out-of-range values are pulled
//! into range rather than rejected.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::profile::{ActionSequenceProfile, KeyboardProfile, MouseMovementProfile};
use crate::stealth::{Clock, Humanizer};

/// Main settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Action sequence preset the overrides start from
    pub preset: String,
    /// Pacing overrides
    pub sequence: Option<SequenceOverrides>,
    /// Mouse profile overrides
    pub mouse: Option<MouseOverrides>,
    /// Keyboard profile overrides
    pub keyboard: Option<KeyboardOverrides>,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preset: "human".to_string(),
            sequence: None,
            mouse: None,
            keyboard: None,
            seed: None,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// The preset's profile with every override applied
    pub fn build_profile(&self) -> ActionSequenceProfile {
        let base = ActionSequenceProfile::create_profile(&self.preset);

        let mouse = match &self.mouse {
            Some(overrides) => overrides.apply(base.mouse()),
            None => base.mouse().clone(),
        };
        let keyboard = match &self.keyboard {
            Some(overrides) => overrides.apply(base.keyboard()),
            None => base.keyboard().clone(),
        };

        match &self.sequence {
            Some(overrides) => overrides.apply(&base, mouse, keyboard),
            None => base.with_mouse(mouse).with_keyboard(keyboard),
        }
    }

    /// Humanizer on `clock`, seeded when a seed is configured
    pub fn humanizer(&self, clock: Arc<dyn Clock>) -> Humanizer {
        match self.seed {
            Some(seed) => Humanizer::seeded(seed, clock),
            None => Humanizer::with_clock(clock),
        }
    }
}

/// Action sequence pacing overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceOverrides {
    pub action_delay_factor: Option<f64>,
    pub action_delay_variability: Option<f64>,
    pub think_probability: Option<f64>,
    pub think_duration_factor: Option<f64>,
    pub fatigue_rate: Option<f64>,
}

impl SequenceOverrides {
    fn apply(
        &self,
        base: &ActionSequenceProfile,
        mouse: MouseMovementProfile,
        keyboard: KeyboardProfile,
    ) -> ActionSequenceProfile {
        ActionSequenceProfile::new(
            self.action_delay_factor.unwrap_or(base.action_delay_factor()),
            self.action_delay_variability
                .unwrap_or(base.action_delay_variability()),
            self.think_probability.unwrap_or(base.think_probability()),
            self.think_duration_factor.unwrap_or(base.think_duration_factor()),
            self.fatigue_rate.unwrap_or(base.fatigue_rate()),
            mouse,
            keyboard,
        )
    }
}

/// Mouse profile overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MouseOverrides {
    /// Mouse preset to start from instead of the sequence preset's
    pub preset: Option<String>,
    pub speed_factor: Option<f64>,
    pub jitter_factor: Option<f64>,
    pub overshoot_factor: Option<f64>,
    pub acceleration_factor: Option<f64>,
    /// Points per movement
    pub smoothness: Option<usize>,
}

impl MouseOverrides {
    fn apply(&self, base: &MouseMovementProfile) -> MouseMovementProfile {
        let base = match &self.preset {
            Some(name) => MouseMovementProfile::create_profile(name),
            None => base.clone(),
        };
        MouseMovementProfile::new(
            self.speed_factor.unwrap_or(base.speed_factor()),
            self.jitter_factor.unwrap_or(base.jitter_factor()),
            self.overshoot_factor.unwrap_or(base.overshoot_factor()),
            self.acceleration_factor.unwrap_or(base.acceleration_factor()),
            self.smoothness.unwrap_or(base.smoothness()),
        )
    }
}

/// Keyboard profile overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardOverrides {
    /// Keyboard preset to start from instead of the sequence preset's
    pub preset: Option<String>,
    pub typing_speed: Option<f64>,
    pub typing_variability: Option<f64>,
    /// Typo probability per character (at most 0.1)
    pub error_rate: Option<f64>,
    /// Base key hold in seconds
    pub key_hold_time: Option<f64>,
    pub key_hold_variability: Option<f64>,
}

impl KeyboardOverrides {
    fn apply(&self, base: &KeyboardProfile) -> KeyboardProfile {
        let base = match &self.preset {
            Some(name) => KeyboardProfile::create_profile(name),
            None => base.clone(),
        };
        KeyboardProfile::new(
            self.typing_speed.unwrap_or(base.typing_speed()),
            self.typing_variability.unwrap_or(base.typing_variability()),
            self.error_rate.unwrap_or(base.error_rate()),
            self.key_hold_time.unwrap_or(base.key_hold_time()),
            self.key_hold_variability.unwrap_or(base.key_hold_variability()),
        )
    }
}
