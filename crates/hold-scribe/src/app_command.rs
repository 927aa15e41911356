use hold_scribe_core::HotkeyEvent;

/// Commands sent to the main application loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// The push-to-talk chord went down or came up.
    Hotkey(HotkeyEvent),
    /// Request application shutdown.
    Shutdown,
}
