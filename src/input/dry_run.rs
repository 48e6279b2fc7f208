//! Backend that only logs what it would do

use std::sync::Mutex;

use super::{InputBackend, InputError, MouseButton, Point};

/// Logs every input event at debug level and tracks a virtual cursor.
///
/// Used by the `ghosthand` binary to preview scripts without touching the
/// real devices.
pub struct DryRunBackend {
    position: Mutex<Point>,
}

impl DryRunBackend {
    pub fn new(start: Point) -> Self {
        Self {
            position: Mutex::new(start),
        }
    }

    fn position(&self) -> Result<std::sync::MutexGuard<'_, Point>, InputError> {
        self.position
            .lock()
            .map_err(|e| InputError::Backend(format!("cursor lock poisoned: {e}")))
    }
}

impl Default for DryRunBackend {
    fn default() -> Self {
        Self::new(Point::default())
    }
}

impl InputBackend for DryRunBackend {
    fn move_cursor(&self, to: Point) -> Result<(), InputError> {
        *self.position()? = to;
        log::trace!("move {}", to);
        Ok(())
    }

    fn cursor_position(&self) -> Result<Point, InputError> {
        Ok(*self.position()?)
    }

    fn mouse_down(&self, button: MouseButton) -> Result<(), InputError> {
        log::debug!("{} button down at {}", button, *self.position()?);
        Ok(())
    }

    fn mouse_up(&self, button: MouseButton) -> Result<(), InputError> {
        log::debug!("{} button up at {}", button, *self.position()?);
        Ok(())
    }

    fn click(&self, button: MouseButton) -> Result<(), InputError> {
        log::debug!("{} click at {}", button, *self.position()?);
        Ok(())
    }

    fn key_down(&self, key: &str) -> Result<(), InputError> {
        log::debug!("key down {:?}", key);
        Ok(())
    }

    fn key_up(&self, key: &str) -> Result<(), InputError> {
        log::debug!("key up {:?}", key);
        Ok(())
    }
}
