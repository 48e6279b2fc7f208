//! Ghost Hand - human-looking mouse and keyboard input synthesis
//!
//! This library turns high-level intents ("move here", "click that",
//! "type this") into timed streams of low-level input events that look
//! like a person produced them: curved cursor paths with acceleration and
//! overshoot, per-key timing and correctable typos, and pacing between
//! actions with think pauses and fatigue.
//!
//! ## Layout
//!
//! - [`input`] - the backend seam the synthesizers drive
//! - [`stealth`] - the injected random source and clock
//! - [`profile`] - parameter bundles and their named presets
//! - [`mouse`] / [`keyboard`] - the two synthesizers
//! - [`sequence`] - actions and the sequencer that paces them
//! - [`config`] - JSON settings
//!
//! ```no_run
//! use std::sync::Arc;
//! use ghost_hand::input::DryRunBackend;
//! use ghost_hand::profile::ActionSequenceProfile;
//! use ghost_hand::sequence::ActionSequencer;
//!
//! let profile = ActionSequenceProfile::create_profile("human");
//! let mut sequencer = ActionSequencer::new(profile, Arc::new(DryRunBackend::default()));
//! sequencer.move_to(640, 360, None)?;
//! sequencer.type_string("hello", true)?;
//! # Ok::<(), ghost_hand::sequence::ActionError>(())
//! ```

pub mod config;
pub mod input;
pub mod keyboard;
pub mod mouse;
pub mod profile;
pub mod sequence;
pub mod stealth;

pub use config::Settings;
pub use input::{InputBackend, InputError, MouseButton, Point};
pub use sequence::{Action, ActionError, ActionSequencer};
pub use stealth::Humanizer;
