//! Persistent log journal.
//!
//! The badge keeps its last few warnings and errors in a small JSON file so
//! they survive a reboot. [`JournalLayer`] is a [`tracing_subscriber::Layer`]
//! that records every event at or above a minimum level into a [`Journal`],
//! which rewrites the file after each record.

use std::{
    collections::VecDeque,
    fmt,
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{Layer, layer};

/// Entries kept by default.
pub const DEFAULT_MAX_ENTRIES: usize = 20;

/// Journal write errors.
#[derive(Debug, Error)]
pub enum JournalError {
    /// File could not be written.
    #[error("cannot write journal: {0}")]
    Io(#[from] io::Error),

    /// Entries could not be encoded.
    #[error("cannot encode journal: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One recorded log event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Level name, `ERROR` through `TRACE`
    pub level: String,
    /// Log message
    pub message: String,
    /// Remaining event fields (error, panic payload), if any
    pub traceback: Option<String>,
}

/// Bounded list of entries backed by a JSON file.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    max_entries: usize,
    entries: VecDeque<JournalEntry>,
}

impl Journal {
    /// Open the journal at `path`, keeping at most `max_entries`.
    ///
    /// A missing or unreadable file starts an empty journal.
    pub fn open(path: impl Into<PathBuf>, max_entries: usize) -> Self {
        let path = path.into();
        let mut entries: VecDeque<JournalEntry> = fs::read(&path)
            .ok()
            .and_then(|raw| serde_json::from_slice(&raw).ok())
            .unwrap_or_default();
        let max_entries = max_entries.max(1);
        while entries.len() > max_entries {
            entries.pop_front();
        }
        Self { path, max_entries, entries }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append `entry`, dropping the oldest beyond the bound, and rewrite the
    /// file.
    pub fn record(&mut self, entry: JournalEntry) -> Result<(), JournalError> {
        self.entries.push_back(entry);
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
        fs::write(&self.path, serde_json::to_vec(&self.entries)?)?;
        Ok(())
    }
}

/// Tracing layer feeding a [`Journal`].
#[derive(Debug)]
pub struct JournalLayer {
    journal: Mutex<Journal>,
    min_level: Level,
}

impl JournalLayer {
    /// Record events at `min_level` or more severe into `journal`.
    pub fn new(journal: Journal, min_level: Level) -> Self {
        Self { journal: Mutex::new(journal), min_level }
    }
}

impl<S: Subscriber> Layer<S> for JournalLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: layer::Context<'_, S>) {
        let level = *event.metadata().level();
        if level > self.min_level {
            return;
        }

        let mut fields = EntryVisitor::default();
        event.record(&mut fields);
        let entry = JournalEntry {
            level: level.to_string(),
            message: fields.message,
            traceback: (!fields.rest.is_empty()).then(|| fields.rest.join(", ")),
        };

        let mut journal = self.journal.lock().unwrap_or_else(PoisonError::into_inner);
        // Logging the failure here would re-enter this layer.
        let _ = journal.record(entry);
    }
}

#[derive(Default)]
struct EntryVisitor {
    message: String,
    rest: Vec<String>,
}

impl Visit for EntryVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            value.clone_into(&mut self.message);
        } else {
            self.rest.push(format!("{}={value}", field.name()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.rest.push(format!("{}={value:?}", field.name()));
        }
    }
}
