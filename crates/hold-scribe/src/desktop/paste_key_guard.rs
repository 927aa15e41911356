use hold_scribe_core::{InsertionError, InsertionResult};

use std::panic::Location;

use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use error_location::ErrorLocation;

/// Returns the platform-specific paste modifier key.
///
/// macOS uses Cmd (Meta), Windows and Linux use Ctrl.
pub(crate) fn paste_modifier() -> Key {
    #[cfg(target_os = "macos")]
    {
        Key::Meta
    }
    #[cfg(not(target_os = "macos"))]
    {
        Key::Control
    }
}

/// RAII guard that guarantees the paste modifier key is released when dropped.
///
/// Owns the `Enigo` instance so all keyboard operations go through it. On
/// drop the modifier is released best-effort; if that fails the OS resets
/// modifier state on the next physical key event.
pub struct PasteKeyGuard {
    enigo: Enigo,
    modifier: Key,
}

impl PasteKeyGuard {
    /// Press the paste modifier and return a guard that will release it on drop.
    #[track_caller]
    pub(crate) fn press() -> InsertionResult<Self> {
        let modifier = paste_modifier();

        let mut enigo =
            Enigo::new(&Settings::default()).map_err(|e| InsertionError::InjectionBlocked {
                reason: format!("Failed to create Enigo: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        enigo
            .key(modifier, Direction::Press)
            .map_err(|e| InsertionError::InjectionBlocked {
                reason: format!("Failed to press paste modifier: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self { enigo, modifier })
    }

    /// Click `key` while the modifier is held.
    #[track_caller]
    pub(crate) fn click(&mut self, key: Key) -> InsertionResult<()> {
        self.enigo
            .key(key, Direction::Click)
            .map_err(|e| InsertionError::InjectionBlocked {
                reason: format!("Failed to click {:?}: {}", key, e),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

impl Drop for PasteKeyGuard {
    fn drop(&mut self) {
        let _ = self.enigo.key(self.modifier, Direction::Release);
    }
}
