//! In-memory input backend.
//!
//! `RecordingBackend` performs no OS calls. Every primitive is appended to an
//! ordered event log that callers can inspect afterwards, and the cursor
//! position is tracked so move logic sees a consistent world.
//!
//! Failures can be injected per concern:
//! - [`RecordingBackend::fail_everything`] makes every call fail
//! - [`RecordingBackend::fail_moves`] makes cursor moves fail
//! - [`RecordingBackend::fail_key_down`] makes pressing one key fail
//!
//! Failed calls are not recorded.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{InputBackend, InputError, MouseButton, Point};
use crate::keyboard::BACKSPACE;

/// One recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Move(Point),
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
    Click(MouseButton),
    KeyDown(String),
    KeyUp(String),
}

/// Backend that records calls instead of performing them
#[derive(Debug, Default)]
pub struct RecordingBackend {
    events: Mutex<Vec<InputEvent>>,
    position: Mutex<Point>,
    fail_all: AtomicBool,
    fail_moves: AtomicBool,
    failing_keys: Mutex<HashSet<String>>,
}

impl RecordingBackend {
    /// Creates a backend with the cursor at the origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend with the cursor at `position`.
    pub fn at(position: Point) -> Self {
        let backend = Self::default();
        *lock(&backend.position) = position;
        backend
    }

    pub fn fail_everything(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn fail_moves(&self, fail: bool) {
        self.fail_moves.store(fail, Ordering::SeqCst);
    }

    pub fn fail_key_down(&self, key: &str) {
        lock(&self.failing_keys).insert(key.to_string());
    }

    /// Snapshot of every recorded event, oldest first
    pub fn events(&self) -> Vec<InputEvent> {
        lock(&self.events).clone()
    }

    pub fn clear(&self) {
        lock(&self.events).clear();
    }

    /// Every cursor position visited, in order
    pub fn moves(&self) -> Vec<Point> {
        self.filter(|e| match e {
            InputEvent::Move(p) => Some(*p),
            _ => None,
        })
    }

    pub fn key_downs(&self) -> Vec<String> {
        self.filter(|e| match e {
            InputEvent::KeyDown(k) => Some(k.clone()),
            _ => None,
        })
    }

    pub fn key_ups(&self) -> Vec<String> {
        self.filter(|e| match e {
            InputEvent::KeyUp(k) => Some(k.clone()),
            _ => None,
        })
    }

    pub fn clicks(&self) -> Vec<MouseButton> {
        self.filter(|e| match e {
            InputEvent::Click(b) => Some(*b),
            _ => None,
        })
    }

    /// Replays the key-down stream into a text buffer, honouring backspace.
    ///
    /// Only single-character keys and `backspace` affect the buffer.
    pub fn typed_text(&self) -> String {
        let mut buffer = String::new();
        for key in self.key_downs() {
            if key == BACKSPACE {
                buffer.pop();
            } else {
                let mut chars = key.chars();
                if let (Some(c), None) = (chars.next(), chars.next()) {
                    buffer.push(c);
                }
            }
        }
        buffer
    }

    fn filter<T>(&self, f: impl Fn(&InputEvent) -> Option<T>) -> Vec<T> {
        lock(&self.events).iter().filter_map(f).collect()
    }

    fn check(&self) -> Result<(), InputError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(InputError::Backend("injected failure".into()));
        }
        Ok(())
    }

    fn record(&self, event: InputEvent) {
        lock(&self.events).push(event);
    }
}

// A poisoned lock only means a test thread panicked mid-push; the data is still usable.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InputBackend for RecordingBackend {
    fn move_cursor(&self, to: Point) -> Result<(), InputError> {
        self.check()?;
        if self.fail_moves.load(Ordering::SeqCst) {
            return Err(InputError::Backend("injected move failure".into()));
        }
        *lock(&self.position) = to;
        self.record(InputEvent::Move(to));
        Ok(())
    }

    fn cursor_position(&self) -> Result<Point, InputError> {
        self.check()?;
        Ok(*lock(&self.position))
    }

    fn mouse_down(&self, button: MouseButton) -> Result<(), InputError> {
        self.check()?;
        self.record(InputEvent::ButtonDown(button));
        Ok(())
    }

    fn mouse_up(&self, button: MouseButton) -> Result<(), InputError> {
        self.check()?;
        self.record(InputEvent::ButtonUp(button));
        Ok(())
    }

    fn click(&self, button: MouseButton) -> Result<(), InputError> {
        self.check()?;
        self.record(InputEvent::Click(button));
        Ok(())
    }

    fn key_down(&self, key: &str) -> Result<(), InputError> {
        self.check()?;
        if lock(&self.failing_keys).contains(key) {
            return Err(InputError::Backend(format!("injected failure on {key}")));
        }
        self.record(InputEvent::KeyDown(key.to_string()));
        Ok(())
    }

    fn key_up(&self, key: &str) -> Result<(), InputError> {
        self.check()?;
        self.record(InputEvent::KeyUp(key.to_string()));
        Ok(())
    }
}
