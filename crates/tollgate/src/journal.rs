//! # Event Journal
//!
//! Append-only record of committed guard events.
//!
//! Entries are stored in JSONL format (one JSON object per line) with a
//! sequence number that starts at 0 and increases by one per entry, so a
//! missing or reordered line is detected on read.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use tollgate::journal::EventJournal;
//! use tollgate_core::types::GuardEvent;
//! use tollgate_core::Address;
//!
//! let mut journal = EventJournal::open(Path::new("/var/lib/tollgate/events.jsonl"))?;
//! journal.append(&[GuardEvent::TokenVerified { token: Address::ZERO }])?;
//!
//! let entries = EventJournal::read(journal.path())?;
//! assert_eq!(entries.last().map(|e| e.seq), Some(journal.next_seq() - 1));
//! # Ok::<(), tollgate::journal::JournalError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tollgate_core::types::GuardEvent;

/// One line of the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position in the journal, starting at 0.
    pub seq: u64,

    /// The committed change.
    pub event: GuardEvent,
}

/// Errors that can occur while writing or reading the journal.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// I/O error during file operations.
    #[error("IO error ({context}): {source}")]
    Io {
        /// What was being done.
        context: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An entry could not be encoded.
    #[error("Failed to serialize entry: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A line could not be decoded.
    #[error("Malformed entry at line {line}: {message}")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// Decoder message.
        message: String,
    },

    /// Sequence numbers are not contiguous.
    #[error("Sequence mismatch: expected {expected}, got {found}")]
    SequenceGap {
        /// The sequence number that should have come next.
        expected: u64,
        /// The sequence number found.
        found: u64,
    },
}

impl JournalError {
    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Writer for a JSONL event journal.
#[derive(Debug)]
pub struct EventJournal {
    path: PathBuf,
    next_seq: u64,
    writer: BufWriter<File>,
}

impl EventJournal {
    /// Open the journal at `path`, creating it and its directory if needed.
    ///
    /// Existing entries are checked and appending continues after the last
    /// one.
    ///
    /// # Errors
    ///
    /// [`JournalError::Io`] if the file cannot be created or opened, or any
    /// error of [`EventJournal::read`] for an existing file.
    pub fn open(path: &Path) -> Result<Self, JournalError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| JournalError::io(format!("creating {}", parent.display()), e))?;
        }
        let next_seq = Self::read(path)?
            .last()
            .map_or(0, |entry| entry.seq + 1);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| JournalError::io(format!("opening {}", path.display()), e))?;

        tracing::debug!(path = %path.display(), next_seq, "event journal opened");
        Ok(Self {
            path: path.to_path_buf(),
            next_seq,
            writer: BufWriter::new(file),
        })
    }

    /// Path of the journal file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sequence number the next entry will get.
    #[must_use]
    pub const fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Append `events` in order and flush.
    ///
    /// # Errors
    ///
    /// [`JournalError::Serialization`] or [`JournalError::Io`].
    pub fn append(&mut self, events: &[GuardEvent]) -> Result<(), JournalError> {
        let mut seq = self.next_seq;
        for event in events {
            let entry = JournalEntry {
                seq,
                event: event.clone(),
            };
            serde_json::to_writer(&mut self.writer, &entry)?;
            self.writer
                .write_all(b"\n")
                .map_err(|e| JournalError::io("writing entry", e))?;
            seq += 1;
        }
        self.writer
            .flush()
            .map_err(|e| JournalError::io("flushing journal", e))?;
        self.next_seq = seq;
        Ok(())
    }

    /// Read every entry of the journal at `path`. A missing file reads as
    /// empty.
    ///
    /// # Errors
    ///
    /// [`JournalError::Malformed`] for a line that does not decode,
    /// [`JournalError::SequenceGap`] if sequence numbers are not contiguous.
    pub fn read(path: &Path) -> Result<Vec<JournalEntry>, JournalError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file =
            File::open(path).map_err(|e| JournalError::io(format!("opening {}", path.display()), e))?;

        let mut entries = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| JournalError::io("reading journal", e))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: JournalEntry =
                serde_json::from_str(&line).map_err(|e| JournalError::Malformed {
                    line: index + 1,
                    message: e.to_string(),
                })?;

            let expected = entries.len() as u64;
            if entry.seq != expected {
                return Err(JournalError::SequenceGap {
                    expected,
                    found: entry.seq,
                });
            }
            entries.push(entry);
        }
        Ok(entries)
    }
}
