//! `arboard`-backed clipboard.
//!
//! Snapshots capture plain text and one RGBA image. `arboard` writes one
//! representation at a time, so a restore writes the image when there is one
//! and the text otherwise.

use hold_scribe_core::{
    ClipboardBackend, ClipboardEntry, EntryFormat, InsertionError, InsertionResult,
};

use std::{borrow::Cow, panic::Location};

use arboard::{Clipboard, ImageData};
use error_location::ErrorLocation;
use tracing::{debug, instrument, warn};

/// System clipboard through `arboard`.
pub struct ArboardClipboard {
    clipboard: Clipboard,
}

impl ArboardClipboard {
    /// Open the system clipboard.
    #[instrument]
    pub fn new() -> InsertionResult<Self> {
        let clipboard = Clipboard::new().map_err(|e| clipboard_error("initialize", e))?;
        debug!("Clipboard opened");
        Ok(Self { clipboard })
    }
}

#[track_caller]
fn clipboard_error(action: &str, e: arboard::Error) -> InsertionError {
    InsertionError::ClipboardError {
        reason: format!("Failed to {} clipboard: {}", action, e),
        location: ErrorLocation::from(Location::caller()),
    }
}

impl ClipboardBackend for ArboardClipboard {
    fn read_entries(&mut self) -> InsertionResult<Vec<ClipboardEntry>> {
        let mut entries = Vec::new();

        if let Some(text) = self.read_text()? {
            entries.push(ClipboardEntry::text(&text));
        }

        match self.clipboard.get_image() {
            Ok(image) => entries.push(ClipboardEntry {
                format: EntryFormat::Rgba {
                    width: image.width,
                    height: image.height,
                },
                payload: image.bytes.into_owned(),
            }),
            Err(arboard::Error::ContentNotAvailable) => {}
            Err(e) => warn!(error = %e, "Could not read clipboard image, skipping it"),
        }

        Ok(entries)
    }

    fn read_text(&mut self) -> InsertionResult<Option<String>> {
        match self.clipboard.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(clipboard_error("read", e)),
        }
    }

    fn clear(&mut self) -> InsertionResult<()> {
        self.clipboard
            .clear()
            .map_err(|e| clipboard_error("clear", e))
    }

    fn write_text(&mut self, text: &str) -> InsertionResult<()> {
        self.clipboard
            .set_text(text)
            .map_err(|e| clipboard_error("write", e))
    }

    fn write_entries(&mut self, entries: &[ClipboardEntry]) -> InsertionResult<()> {
        let dropped = unwritable_entries(entries);
        if dropped > 0 {
            debug!(
                dropped,
                total = entries.len(),
                "Clipboard holds more than arboard can restore, keeping one entry"
            );
        }

        let image = entries.iter().find_map(|entry| match entry.format {
            EntryFormat::Rgba { width, height } => Some(ImageData {
                width,
                height,
                bytes: Cow::Borrowed(entry.payload.as_slice()),
            }),
            EntryFormat::PlainText => None,
        });

        if let Some(image) = image {
            return self
                .clipboard
                .set_image(image)
                .map_err(|e| clipboard_error("restore image to", e));
        }

        let text = entries
            .iter()
            .find(|entry| entry.format == EntryFormat::PlainText);

        match text {
            Some(entry) => self
                .clipboard
                .set_text(String::from_utf8_lossy(&entry.payload).into_owned())
                .map_err(|e| clipboard_error("restore text to", e)),
            None => Ok(()),
        }
    }
}

/// Entries `write_entries` leaves out: everything but the first image, or
/// everything but the first text when there is no image.
pub(crate) fn unwritable_entries(entries: &[ClipboardEntry]) -> usize {
    entries.len().saturating_sub(1)
}
