//! # Mood History
//!
//! Append-only record of past mood decisions, persisted in SQLite.
//!
//! ## Storage layout
//!
//! History lives in a small key-value table under a single namespaced key:
//!
//! ```text
//! kv(key TEXT PRIMARY KEY, value TEXT NOT NULL)
//! "moodtune.moodHistory" -> {"version":1,"entries":[{"mood":"happy","confidence":0.7,"timestamp":"..."}]}
//! ```
//!
//! A bare JSON array of entries (the unversioned layout) is still accepted
//! on load and rewritten in the versioned form on the next change.
//!
//! ## Lifecycle
//!
//! Construct one [`MoodHistory`] at startup and pass it by reference to
//! whatever needs it. Entries are held in memory and written through on
//! every mutation.

use crate::error::{MoodError, Result};
use crate::mood::{AggregatedMood, Emotion};
use chrono::{DateTime, Utc};
use log::{debug, info, trace, warn};
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Key the history is stored under.
pub const HISTORY_KEY: &str = "moodtune.moodHistory";

/// Current persisted layout version.
pub const HISTORY_VERSION: u32 = 1;

/// One persisted mood decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub mood: Emotion,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    #[must_use]
    pub fn new(mood: &AggregatedMood, timestamp: DateTime<Utc>) -> Self {
        Self {
            mood: mood.label,
            confidence: mood.confidence,
            timestamp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct HistoryRecord {
    version: u32,
    entries: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredHistory {
    Versioned(HistoryRecord),
    Legacy(Vec<serde_json::Value>),
}

/// Create the key-value table if it is missing.
pub fn ensure_kv_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        (),
    )?;
    Ok(())
}

/// Read the raw value under `key`.
pub fn kv_get(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
        .optional()?;
    Ok(value)
}

/// Insert or replace the value under `key`.
pub fn kv_set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (key, value),
    )?;
    Ok(())
}

/// Decode a stored history value, accepting the unversioned layout.
///
/// Unversioned entries that do not parse (an empty mood or a `null`
/// confidence from a failed capture) are skipped.
///
/// # Errors
///
/// [`MoodError::UnsupportedHistoryVersion`] for a version newer than
/// [`HISTORY_VERSION`]; [`MoodError::Serialization`] for anything unparsable.
pub fn decode_history(raw: &str) -> Result<Vec<HistoryEntry>> {
    match serde_json::from_str::<StoredHistory>(raw)? {
        StoredHistory::Versioned(record) if record.version > HISTORY_VERSION => {
            Err(MoodError::UnsupportedHistoryVersion(record.version))
        }
        StoredHistory::Versioned(record) => Ok(record.entries),
        StoredHistory::Legacy(raw_entries) => {
            let total = raw_entries.len();
            let entries: Vec<HistoryEntry> = raw_entries
                .into_iter()
                .filter_map(|value| match serde_json::from_value(value) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!("Skipping unreadable unversioned history entry: {e}");
                        None
                    }
                })
                .collect();
            debug!("Upgrading {} of {total} unversioned history entries", entries.len());
            Ok(entries)
        }
    }
}

/// Encode entries in the current versioned layout.
pub fn encode_history(entries: &[HistoryEntry]) -> Result<String> {
    let record = HistoryRecord {
        version: HISTORY_VERSION,
        entries: entries.to_vec(),
    };
    Ok(serde_json::to_string(&record)?)
}

/// History service backed by one SQLite connection.
#[derive(Debug)]
pub struct MoodHistory {
    conn: Connection,
    entries: Vec<HistoryEntry>,
}

impl MoodHistory {
    /// Open (or create) the history database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let history = Self::from_connection(conn)?;
        info!("Loaded {} mood history entries from {}", history.len(), path.display());
        Ok(history)
    }

    /// Throwaway history for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        ensure_kv_table(&conn)?;
        let entries = match kv_get(&conn, HISTORY_KEY)? {
            Some(raw) => decode_history(&raw)?,
            None => Vec::new(),
        };
        Ok(Self { conn, entries })
    }

    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Append `entry` and persist. On a write failure the entry is not kept.
    pub fn add_entry(&mut self, entry: HistoryEntry) -> Result<()> {
        trace!("Appending history entry {entry:?}");
        self.entries.push(entry);
        if let Err(e) = self.persist() {
            self.entries.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Append a decision stamped with the current time.
    ///
    /// The stamp never goes backwards relative to the latest entry, so the
    /// sequence stays chronological even if the wall clock steps back.
    pub fn record(&mut self, mood: &AggregatedMood) -> Result<HistoryEntry> {
        let now = Utc::now();
        let timestamp = match self.latest() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };
        let entry = HistoryEntry::new(mood, timestamp);
        self.add_entry(entry.clone())?;
        Ok(entry)
    }

    /// Drop every entry.
    pub fn clear(&mut self) -> Result<()> {
        let previous = std::mem::take(&mut self.entries);
        if let Err(e) = self.persist() {
            self.entries = previous;
            return Err(e);
        }
        info!("Cleared {} mood history entries", previous.len());
        Ok(())
    }

    /// How often each emotion was recorded, in [`Emotion::ALL`] order,
    /// omitting emotions never seen.
    #[must_use]
    pub fn mood_counts(&self) -> Vec<(Emotion, usize)> {
        Emotion::ALL
            .into_iter()
            .map(|emotion| {
                let count = self.entries.iter().filter(|e| e.mood == emotion).count();
                (emotion, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    fn persist(&self) -> Result<()> {
        kv_set(&self.conn, HISTORY_KEY, &encode_history(&self.entries)?)
    }
}
