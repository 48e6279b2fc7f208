//! Action sequence profile

use std::fmt;
use std::str::FromStr;

use super::keyboard::{KeyboardPreset, KeyboardProfile};
use super::mouse::{MousePreset, MouseMovementProfile};
use super::{clamp, UnknownPreset};

/// Pacing between actions, plus the profiles handed to both synthesizers
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSequenceProfile {
    action_delay_factor: f64,
    action_delay_variability: f64,
    think_probability: f64,
    think_duration_factor: f64,
    fatigue_rate: f64,
    mouse: MouseMovementProfile,
    keyboard: KeyboardProfile,
}

impl ActionSequenceProfile {
    /// Build a profile, clamping every value into its supported range.
    ///
    /// * `action_delay_factor` - scales pre-action delays, [0.1, 5.0]
    /// * `action_delay_variability` - spread of those delays, [0.1, 5.0]
    /// * `think_probability` - chance of a think pause between actions, [0.0, 0.5]
    /// * `think_duration_factor` - scales think pauses, [0.1, 5.0]
    /// * `fatigue_rate` - slowdown per elapsed minute, [0.0, 0.1]
    pub fn new(
        action_delay_factor: f64,
        action_delay_variability: f64,
        think_probability: f64,
        think_duration_factor: f64,
        fatigue_rate: f64,
        mouse: MouseMovementProfile,
        keyboard: KeyboardProfile,
    ) -> Self {
        Self {
            action_delay_factor: clamp(action_delay_factor, 0.1, 5.0),
            action_delay_variability: clamp(action_delay_variability, 0.1, 5.0),
            think_probability: clamp(think_probability, 0.0, 0.5),
            think_duration_factor: clamp(think_duration_factor, 0.1, 5.0),
            fatigue_rate: clamp(fatigue_rate, 0.0, 0.1),
            mouse,
            keyboard,
        }
    }

    /// Profile for a preset name, falling back to human for unknown names
    pub fn create_profile(name: &str) -> Self {
        match name.parse::<SequencePreset>() {
            Ok(preset) => preset.profile(),
            Err(e) => {
                log::warn!("{}, using 'human' action sequence profile", e);
                SequencePreset::Human.profile()
            }
        }
    }

    /// Same pacing with a different mouse profile
    pub fn with_mouse(mut self, mouse: MouseMovementProfile) -> Self {
        self.mouse = mouse;
        self
    }

    /// Same pacing with a different keyboard profile
    pub fn with_keyboard(mut self, keyboard: KeyboardProfile) -> Self {
        self.keyboard = keyboard;
        self
    }

    pub fn action_delay_factor(&self) -> f64 {
        self.action_delay_factor
    }

    pub fn action_delay_variability(&self) -> f64 {
        self.action_delay_variability
    }

    pub fn think_probability(&self) -> f64 {
        self.think_probability
    }

    pub fn think_duration_factor(&self) -> f64 {
        self.think_duration_factor
    }

    pub fn fatigue_rate(&self) -> f64 {
        self.fatigue_rate
    }

    pub fn mouse(&self) -> &MouseMovementProfile {
        &self.mouse
    }

    pub fn keyboard(&self) -> &KeyboardProfile {
        &self.keyboard
    }
}

impl Default for ActionSequenceProfile {
    fn default() -> Self {
        SequencePreset::Human.profile()
    }
}

/// Named action sequence presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequencePreset {
    Human,
    Fast,
    Precise,
    Erratic,
    Tired,
}

impl SequencePreset {
    pub const ALL: [SequencePreset; 5] = [
        SequencePreset::Human,
        SequencePreset::Fast,
        SequencePreset::Precise,
        SequencePreset::Erratic,
        SequencePreset::Tired,
    ];

    pub fn profile(self) -> ActionSequenceProfile {
        let (delay, variability, think, think_duration, fatigue, mouse, keyboard) = match self {
            SequencePreset::Human => (
                1.0,
                1.0,
                0.1,
                1.0,
                0.001,
                MousePreset::Human,
                KeyboardPreset::Human,
            ),
            SequencePreset::Fast => (
                0.5,
                0.7,
                0.05,
                0.5,
                0.0005,
                MousePreset::Fast,
                KeyboardPreset::Fast,
            ),
            SequencePreset::Precise => (
                1.2,
                0.5,
                0.02,
                0.7,
                0.0,
                MousePreset::Precise,
                KeyboardPreset::Precise,
            ),
            SequencePreset::Erratic => (
                0.8,
                2.0,
                0.2,
                1.5,
                0.002,
                MousePreset::Erratic,
                KeyboardPreset::Erratic,
            ),
            SequencePreset::Tired => (
                1.5,
                1.8,
                0.15,
                2.0,
                0.005,
                MousePreset::Human,
                KeyboardPreset::Slow,
            ),
        };

        ActionSequenceProfile::new(
            delay,
            variability,
            think,
            think_duration,
            fatigue,
            mouse.profile(),
            keyboard.profile(),
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            SequencePreset::Human => "human",
            SequencePreset::Fast => "fast",
            SequencePreset::Precise => "precise",
            SequencePreset::Erratic => "erratic",
            SequencePreset::Tired => "tired",
        }
    }
}

impl fmt::Display for SequencePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SequencePreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SequencePreset::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}
