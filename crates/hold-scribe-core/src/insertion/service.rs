use crate::{
    InsertionError, InsertionResult,
    insertion::{ClipboardBackend, ClipboardSnapshot, InputSynthesizer},
};

use std::{
    panic::Location,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use error_location::ErrorLocation;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Default delay before the previous clipboard contents are put back.
pub(crate) const DEFAULT_RESTORE_DELAY: Duration = Duration::from_millis(500);

/// Default delay between the clipboard write and the paste chord.
///
/// Gives the OS clipboard manager time to publish the write before the
/// receiving application reads it.
pub(crate) const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

type SharedClipboard = Arc<Mutex<Box<dyn ClipboardBackend>>>;
type SnapshotSlot = Arc<Mutex<Option<ClipboardSnapshot>>>;

/// Behaviour switches for [`ClipboardInserter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionOptions {
    /// Synthesize the paste chord. When off, the transcript is only copied.
    pub auto_paste: bool,
    /// Put the previous clipboard contents back after pasting.
    pub restore_clipboard: bool,
    /// How long to wait before restoring.
    pub restore_delay: Duration,
    /// How long to wait between the clipboard write and the paste chord.
    pub settle_delay: Duration,
}

impl Default for InsertionOptions {
    fn default() -> Self {
        Self {
            auto_paste: true,
            restore_clipboard: true,
            restore_delay: DEFAULT_RESTORE_DELAY,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// What an [`ClipboardInserter::insert`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Empty text; the clipboard was not touched.
    Skipped,
    /// Text copied to the clipboard without pasting.
    CopiedOnly,
    /// Text pasted at the cursor.
    Pasted {
        /// Whether a clipboard restore is pending.
        restore_scheduled: bool,
    },
}

struct PendingRestore {
    text: String,
    snapshot: SnapshotSlot,
    task: JoinHandle<()>,
}

/// Inserts text at the cursor through the system clipboard.
///
/// The only component allowed to mutate the clipboard. Every mutation is
/// treated as racing with the user: restore only happens if the clipboard
/// still holds exactly the text that was inserted.
pub struct ClipboardInserter {
    clipboard: SharedClipboard,
    synthesizer: Arc<dyn InputSynthesizer>,
    options: InsertionOptions,
    pending: Option<PendingRestore>,
}

impl ClipboardInserter {
    /// Create an inserter over `clipboard` that pastes with `synthesizer`.
    pub fn new(
        clipboard: Box<dyn ClipboardBackend>,
        synthesizer: Arc<dyn InputSynthesizer>,
        options: InsertionOptions,
    ) -> Self {
        Self {
            clipboard: Arc::new(Mutex::new(clipboard)),
            synthesizer,
            options,
            pending: None,
        }
    }

    /// Current options.
    pub fn options(&self) -> &InsertionOptions {
        &self.options
    }

    /// Whether a delayed restore is scheduled and has not fired yet.
    pub fn has_pending_restore(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.task.is_finished())
    }

    /// Insert `text` at the cursor. Empty text is a no-op.
    ///
    /// The clipboard write is read back before the paste chord is posted, so the
    /// receiving application never pastes stale content. If pasting fails the
    /// transcript is left on the clipboard and no restore is scheduled.
    ///
    /// # Errors
    ///
    /// Clipboard failures and paste refusals from the synthesizer.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn insert(&mut self, text: &str) -> InsertionResult<InsertOutcome> {
        if text.is_empty() {
            debug!("Empty text, clipboard untouched");
            return Ok(InsertOutcome::Skipped);
        }

        let carried = self.cancel_pending_restore();

        if !self.options.auto_paste {
            self.write_text(text)?;
            info!("Text copied to clipboard (auto-paste disabled)");
            return Ok(InsertOutcome::CopiedOnly);
        }

        let snapshot = if self.options.restore_clipboard {
            match carried {
                Some(snapshot) => Some(snapshot),
                None => Some(ClipboardSnapshot::from(lock(&self.clipboard).read_entries()?)),
            }
        } else {
            None
        };

        if let Err(e) = self.write_text(text) {
            self.put_back(snapshot.as_ref());
            return Err(e);
        }

        if !self.options.settle_delay.is_zero() {
            tokio::time::sleep(self.options.settle_delay).await;
        }

        let live = lock(&self.clipboard).read_text();
        let observed = match live {
            Ok(live) => live.as_deref() == Some(text),
            Err(e) => {
                self.put_back(snapshot.as_ref());
                return Err(e);
            }
        };
        if !observed {
            self.put_back(snapshot.as_ref());
            return Err(InsertionError::ClipboardError {
                reason: "Clipboard write was not observable before paste".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if let Err(e) = self.synthesizer.post_paste_chord().await {
            warn!(error = %e, "Paste failed, transcript left on clipboard");
            return Err(e);
        }

        let restore_scheduled = match snapshot {
            Some(snapshot) => {
                self.schedule_restore(text, snapshot);
                true
            }
            None => false,
        };

        info!(restore_scheduled, "Text pasted");

        Ok(InsertOutcome::Pasted { restore_scheduled })
    }

    fn write_text(&self, text: &str) -> InsertionResult<()> {
        let mut clipboard = lock(&self.clipboard);
        clipboard.clear()?;
        clipboard.write_text(text)
    }

    /// Best-effort return of the user's contents after a write that never
    /// reached the paste.
    fn put_back(&self, snapshot: Option<&ClipboardSnapshot>) {
        let Some(snapshot) = snapshot else {
            return;
        };

        match replace_entries(&mut **lock(&self.clipboard), snapshot) {
            Ok(()) => debug!(
                entries = snapshot.entries().len(),
                "Clipboard put back after failed write"
            ),
            Err(e) => warn!(error = %e, "Could not put clipboard back after failed write"),
        }
    }

    fn schedule_restore(&mut self, text: &str, snapshot: ClipboardSnapshot) {
        let slot: SnapshotSlot = Arc::new(Mutex::new(Some(snapshot)));
        let task = tokio::spawn(restore_after(
            Arc::clone(&self.clipboard),
            text.to_string(),
            Arc::clone(&slot),
            self.options.restore_delay,
        ));

        self.pending = Some(PendingRestore {
            text: text.to_string(),
            snapshot: slot,
            task,
        });
    }

    /// Abort a restore that has not fired yet.
    ///
    /// Returns its snapshot when the clipboard still holds the text that
    /// restore was waiting to replace, so the user's original contents are the
    /// ones eventually restored.
    fn cancel_pending_restore(&mut self) -> Option<ClipboardSnapshot> {
        let pending = self.pending.take()?;
        pending.task.abort();

        // Same order as `restore_after`: clipboard, then slot.
        let mut clipboard = lock(&self.clipboard);
        let snapshot = pending
            .snapshot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()?;

        match clipboard.read_text() {
            Ok(Some(live)) if live == pending.text => {
                debug!("Cancelled pending restore, carrying its snapshot forward");
                Some(snapshot)
            }
            Ok(_) => {
                debug!("Cancelled pending restore, clipboard changed since");
                None
            }
            Err(e) => {
                warn!(error = %e, "Could not read clipboard while cancelling restore");
                None
            }
        }
    }
}

fn lock(clipboard: &SharedClipboard) -> MutexGuard<'_, Box<dyn ClipboardBackend>> {
    clipboard.lock().unwrap_or_else(|e| e.into_inner())
}

async fn restore_after(
    clipboard: SharedClipboard,
    text: String,
    slot: SnapshotSlot,
    delay: Duration,
) {
    tokio::time::sleep(delay).await;

    // Held across the slot take and the restore so a concurrent cancel sees
    // either a finished restore or an untouched snapshot.
    let mut clipboard = lock(&clipboard);
    let Some(snapshot) = slot.lock().unwrap_or_else(|e| e.into_inner()).take() else {
        return;
    };

    match clipboard.read_text() {
        Ok(Some(live)) if live == text => {}
        Ok(_) => {
            debug!("Clipboard changed since insertion, dropping snapshot");
            return;
        }
        Err(e) => {
            warn!(error = %e, "Could not read clipboard before restore");
            return;
        }
    }

    match replace_entries(&mut **clipboard, &snapshot) {
        Ok(()) => debug!(entries = snapshot.entries().len(), "Clipboard restored"),
        Err(e) => warn!(error = %e, "Clipboard restore failed"),
    }
}

fn replace_entries(
    clipboard: &mut dyn ClipboardBackend,
    snapshot: &ClipboardSnapshot,
) -> InsertionResult<()> {
    clipboard.clear()?;
    clipboard.write_entries(snapshot.entries())
}
