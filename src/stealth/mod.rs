//! Randomness and pacing
//!
//! This module provides the pieces that make synthesized input look human:
//! - A single seedable random source for every jitter and probability roll
//! - A clock abstraction so pauses can run on real or virtual time

pub mod clock;
pub mod humanize;

pub use clock::{Clock, ManualClock, SystemClock};
pub use humanize::Humanizer;
