use crate::InsertionResult;

/// Type tag of one clipboard representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryFormat {
    /// UTF-8 plain text.
    PlainText,
    /// Raw RGBA8 pixels.
    Rgba {
        /// Image width in pixels.
        width: usize,
        /// Image height in pixels.
        height: usize,
    },
}

/// One clipboard representation: a type tag and its raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardEntry {
    /// What the payload holds.
    pub format: EntryFormat,
    /// Raw bytes, owned and disconnected from the live clipboard.
    pub payload: Vec<u8>,
}

impl ClipboardEntry {
    /// A plain-text entry.
    pub fn text(text: &str) -> Self {
        Self {
            format: EntryFormat::PlainText,
            payload: text.as_bytes().to_vec(),
        }
    }
}

/// Deep copy of every clipboard entry, taken before the clipboard is mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardSnapshot {
    entries: Vec<ClipboardEntry>,
}

impl ClipboardSnapshot {
    /// Entries in the order they were read.
    pub fn entries(&self) -> &[ClipboardEntry] {
        &self.entries
    }

    /// Whether the clipboard was empty when the snapshot was taken.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<ClipboardEntry>> for ClipboardSnapshot {
    fn from(entries: Vec<ClipboardEntry>) -> Self {
        Self { entries }
    }
}

/// Access to the system clipboard.
///
/// Calls are synchronous and short; the insertion service never holds the
/// backend across an await point.
pub trait ClipboardBackend: Send {
    /// Read every representation currently on the clipboard.
    fn read_entries(&mut self) -> InsertionResult<Vec<ClipboardEntry>>;

    /// Read the plain-text representation, `None` if there is none.
    fn read_text(&mut self) -> InsertionResult<Option<String>>;

    /// Remove all representations.
    fn clear(&mut self) -> InsertionResult<()>;

    /// Write `text` as a plain-text entry.
    fn write_text(&mut self, text: &str) -> InsertionResult<()>;

    /// Write previously captured entries back.
    fn write_entries(&mut self, entries: &[ClipboardEntry]) -> InsertionResult<()>;
}
