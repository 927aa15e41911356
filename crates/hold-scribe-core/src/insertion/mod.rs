//! Clipboard-based text insertion.
//!
//! The transcript is written to the system clipboard, a paste chord is
//! synthesized, and the user's previous clipboard contents are put back after
//! a short delay unless the user copied something else in the meantime.

mod clipboard;
mod service;
mod synthesizer;

pub use {
    clipboard::{ClipboardBackend, ClipboardEntry, ClipboardSnapshot, EntryFormat},
    service::{ClipboardInserter, InsertOutcome, InsertionOptions},
    synthesizer::InputSynthesizer,
};
