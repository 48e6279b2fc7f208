//! Input backend seam
//!
//! The synthesizers never touch the OS directly. They drive an
//! [`InputBackend`], which moves the cursor and emits button/key events.
//! Two backends ship with the crate:
//! - [`RecordingBackend`] keeps every event in memory (tests, embedding)
//! - [`DryRunBackend`] logs every event and tracks a virtual cursor

pub mod dry_run;
pub mod guard;
pub mod recording;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use dry_run::DryRunBackend;
pub use guard::{Held, HeldInputs};
pub use recording::{InputEvent, RecordingBackend};

/// A screen coordinate in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: Point) -> f64 {
        let dx = f64::from(other.x) - f64::from(self.x);
        let dy = f64::from(other.y) - f64::from(self.y);
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Mouse buttons understood by every backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn as_str(&self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MouseButton {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            other => Err(InputError::InvalidButton(other.to_string())),
        }
    }
}

/// Errors raised by an input backend or by a synthesizer driving one
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("invalid key: {0:?}")]
    InvalidKey(String),
    #[error("invalid mouse button: {0:?}")]
    InvalidButton(String),
}

/// Low-level input primitives.
///
/// Every call is synchronous and reports failure through its `Result`; the
/// synthesis layer never retries inside a call. Implementations are expected
/// to serialize access to the physical devices themselves.
pub trait InputBackend: Send + Sync {
    /// Moves the cursor to an absolute position.
    fn move_cursor(&self, to: Point) -> Result<(), InputError>;

    /// Reads the current cursor position.
    fn cursor_position(&self) -> Result<Point, InputError>;

    /// Presses a mouse button without releasing it.
    fn mouse_down(&self, button: MouseButton) -> Result<(), InputError>;

    /// Releases a mouse button.
    fn mouse_up(&self, button: MouseButton) -> Result<(), InputError>;

    /// Full press-and-release of a mouse button at the current position.
    fn click(&self, button: MouseButton) -> Result<(), InputError>;

    /// Presses a key by name (`"a"`, `"backspace"`, `"ctrl"`, ...).
    fn key_down(&self, key: &str) -> Result<(), InputError>;

    /// Releases a key by name.
    fn key_up(&self, key: &str) -> Result<(), InputError>;
}
