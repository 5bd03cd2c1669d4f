//! The console transcript.
//!
//! Every command typed into the ontological console, and everything the engine
//! says back, lands here as an append-only list of entries. Streaming
//! responses (the AI fallback, backend passthroughs) update a single entry in
//! place, keyed by the stable id minted when the stream starts.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

/// Classification of a transcript entry, mirrored by the UI for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Echo of a typed command.
    Input,
    /// Normal command output.
    Output,
    Error,
    /// Engine status chatter (dispatch notices, passthrough banners).
    System,
    Info,
    Success,
    /// Notice that the AI fallback took the query.
    Ai,
    /// Retrieval context sources for a fallback answer.
    Source,
}

/// One line (or one growing streamed block) of the transcript.
#[derive(Debug, Clone, Serialize)]
pub struct ConsoleEntry {
    pub id: u64,
    pub kind: EntryKind,
    pub text: String,
    /// True while a streamed response is still being appended to this entry.
    pub streaming: bool,
}

/// Append-only transcript with in-place updates for streaming entries.
#[derive(Debug, Default)]
pub struct Console {
    entries: Vec<ConsoleEntry>,
    next_id: u64,
}

/// Placeholder text shown while a streamed entry has received no chunks yet.
const STREAM_PENDING: &str = "...";

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Append a finished entry and return its id.
    pub fn push(&mut self, kind: EntryKind, text: impl Into<String>) -> u64 {
        let id = self.mint_id();
        self.entries.push(ConsoleEntry {
            id,
            kind,
            text: text.into(),
            streaming: false,
        });
        id
    }

    /// Start a streamed entry. It shows a pending marker until the first
    /// chunk arrives, and keeps its id for the lifetime of the stream.
    pub fn begin_stream(&mut self, kind: EntryKind) -> u64 {
        let id = self.mint_id();
        self.entries.push(ConsoleEntry {
            id,
            kind,
            text: STREAM_PENDING.to_string(),
            streaming: true,
        });
        id
    }

    /// Append a chunk to a streamed entry. Unknown ids are ignored.
    pub fn append_chunk(&mut self, id: u64, chunk: &str) {
        if let Some(entry) = self.entry_mut(id) {
            if entry.text == STREAM_PENDING {
                entry.text.clear();
            }
            entry.text.push_str(chunk);
        }
    }

    /// Mark a streamed entry as complete.
    pub fn end_stream(&mut self, id: u64) {
        if let Some(entry) = self.entry_mut(id) {
            entry.streaming = false;
        }
    }

    /// Replace a streamed entry with an error message and close it.
    pub fn fail_stream(&mut self, id: u64, message: &str) {
        if let Some(entry) = self.entry_mut(id) {
            entry.kind = EntryKind::Error;
            entry.text = format!("Error: {message}");
            entry.streaming = false;
        }
    }

    fn entry_mut(&mut self, id: u64) -> Option<&mut ConsoleEntry> {
        self.entries.iter_mut().rev().find(|e| e.id == id)
    }

    pub fn entries(&self) -> &[ConsoleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared handle to the transcript.
///
/// The scene mutation API, the command router, and the host all write to the
/// same transcript; the engine is single-threaded, so a `Rc<RefCell<..>>` is
/// the whole story.
#[derive(Clone, Default)]
pub struct ConsoleHandle(Rc<RefCell<Console>>);

impl ConsoleHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, kind: EntryKind, text: impl Into<String>) -> u64 {
        self.0.borrow_mut().push(kind, text)
    }

    pub fn begin_stream(&self, kind: EntryKind) -> u64 {
        self.0.borrow_mut().begin_stream(kind)
    }

    pub fn append_chunk(&self, id: u64, chunk: &str) {
        self.0.borrow_mut().append_chunk(id, chunk);
    }

    pub fn end_stream(&self, id: u64) {
        self.0.borrow_mut().end_stream(id);
    }

    pub fn fail_stream(&self, id: u64, message: &str) {
        self.0.borrow_mut().fail_stream(id, message);
    }

    /// Run a closure over the current entries without cloning them.
    pub fn with_entries<R>(&self, f: impl FnOnce(&[ConsoleEntry]) -> R) -> R {
        f(self.0.borrow().entries())
    }

    /// Clone the entries appended at or after `from` (by index).
    pub fn entries_since(&self, from: usize) -> Vec<ConsoleEntry> {
        self.0.borrow().entries().get(from..).unwrap_or(&[]).to_vec()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}
