//! Push-to-talk state machine.

mod notice;
mod ptt;
mod state;

pub use {
    notice::{Earcons, Notifier},
    ptt::{Collaborators, ControllerOptions, HotkeyEvent, PressOutcome, PttController},
    state::{RecordingState, StateChange},
};
