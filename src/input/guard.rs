//! Scoped release of held keys and buttons
//!
//! A key or button pressed through [`HeldInputs`] is released when the guard
//! is dropped, on every exit path, unless it was already released explicitly.

use std::sync::Arc;

use super::{InputBackend, InputError, MouseButton};

/// Something that stays pressed until released
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Held {
    Key(String),
    Button(MouseButton),
}

impl Held {
    fn press(&self, backend: &dyn InputBackend) -> Result<(), InputError> {
        match self {
            Held::Key(key) => backend.key_down(key),
            Held::Button(button) => backend.mouse_down(*button),
        }
    }

    fn release(&self, backend: &dyn InputBackend) -> Result<(), InputError> {
        match self {
            Held::Key(key) => backend.key_up(key),
            Held::Button(button) => backend.mouse_up(*button),
        }
    }
}

/// Tracks pressed inputs and releases whatever is left on drop
pub struct HeldInputs {
    backend: Arc<dyn InputBackend>,
    held: Vec<Held>,
}

impl HeldInputs {
    pub fn new(backend: Arc<dyn InputBackend>) -> Self {
        Self {
            backend,
            held: Vec::new(),
        }
    }

    /// Presses `input`. It is only tracked once the press succeeded.
    pub fn press(&mut self, input: Held) -> Result<(), InputError> {
        input.press(self.backend.as_ref())?;
        self.held.push(input);
        Ok(())
    }

    /// Releases the most recently pressed input.
    ///
    /// On failure the input stays tracked, so drop gets one more attempt.
    pub fn release_last(&mut self) -> Option<Result<(), InputError>> {
        let input = self.held.last()?;
        let result = input.release(self.backend.as_ref());
        if result.is_ok() {
            self.held.pop();
        }
        Some(result)
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }
}

impl Drop for HeldInputs {
    fn drop(&mut self) {
        while let Some(input) = self.held.pop() {
            if let Err(e) = input.release(self.backend.as_ref()) {
                log::warn!("Failed to release {:?} during cleanup: {}", input, e);
            }
        }
    }
}
