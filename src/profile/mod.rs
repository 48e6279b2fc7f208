//! Parameter bundles for the synthesizers
//!
//! Profiles are immutable once built. Every constructor clamps its inputs
//! into the supported range, so any combination of values is safe to use.
//!
//! Presets can be obtained two ways:
//! - `create_profile(name)` never fails; an unknown name logs a warning and
//!   yields the human preset
//! - parsing the preset enum (`"fast".parse::<MousePreset>()`) is strict and
//!   returns [`UnknownPreset`]

pub mod keyboard;
pub mod layout;
pub mod mouse;
pub mod sequence;

pub use keyboard::{KeyboardPreset, KeyboardProfile};
pub use layout::AdjacencyMap;
pub use mouse::{MousePreset, MouseMovementProfile};
pub use sequence::{ActionSequenceProfile, SequencePreset};

/// A preset name that matches no known preset
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown preset: {0:?}")]
pub struct UnknownPreset(pub String);

pub(crate) fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.clamp(min, max)
}
