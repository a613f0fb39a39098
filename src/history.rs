//! Recent text-to-speech requests.
//!
//! The list is newest-first, capped at [`HISTORY_LIMIT`], and stored as a
//! JSON array under the `ttsHistory` key of a [`KeyValueStore`].

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::QuotePosition;
use crate::storage::{KeyValueStore, StorageError};

pub const HISTORY_KEY: &str = "ttsHistory";
pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub text: String,
    pub timestamp: String,
    pub include_quote: bool,
    pub quote_position: QuotePosition,
}

impl HistoryEntry {
    pub fn new(
        text: impl Into<String>,
        include_quote: bool,
        quote_position: QuotePosition,
    ) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            include_quote,
            quote_position,
        }
    }

    /// One-line listing: `HH:MM:SS  [quote]  text...`.
    pub fn summary(&self, max_len: usize) -> String {
        // HH:MM:SS out of an RFC 3339 timestamp
        let time = self.timestamp.get(11..19).unwrap_or(self.timestamp.as_str());
        let quote = if self.include_quote {
            format!("quote@{}", self.quote_position)
        } else {
            "no quote".to_string()
        };
        format!("{time}  [{quote}]  {}", truncate(&self.text, max_len))
    }
}

fn truncate(text: &str, max_len: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_len {
        flat
    } else {
        let head: String = flat.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

/// Persistence seam for the history list.
pub trait HistoryStore {
    fn load(&self) -> Result<Vec<HistoryEntry>, StorageError>;
    fn save(&self, entries: &[HistoryEntry]) -> Result<(), StorageError>;
}

/// History kept under [`HISTORY_KEY`] in any key-value store.
pub struct KeyValueHistory<S> {
    store: S,
}

impl<S: KeyValueStore> KeyValueHistory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: KeyValueStore> HistoryStore for KeyValueHistory<S> {
    fn load(&self) -> Result<Vec<HistoryEntry>, StorageError> {
        match self.store.get_item(HISTORY_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, entries: &[HistoryEntry]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(entries)?;
        self.store.set_item(HISTORY_KEY, &raw)
    }
}

pub struct History {
    entries: Vec<HistoryEntry>,
    store: Box<dyn HistoryStore>,
}

impl History {
    /// Read the stored list once. Unreadable history starts empty.
    pub fn load(store: Box<dyn HistoryStore>) -> Self {
        let mut entries = match store.load() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to load speech history: {e}, starting empty");
                Vec::new()
            }
        };
        entries.truncate(HISTORY_LIMIT);
        debug!("Loaded {} history entries", entries.len());
        Self { entries, store }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prepend `entry`, evict past the limit, persist.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_LIMIT);
        if let Err(e) = self.store.save(&self.entries) {
            warn!("Failed to persist speech history: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    fn entry(text: &str) -> HistoryEntry {
        HistoryEntry::new(text, false, QuotePosition::Start)
    }

    #[test]
    fn eleventh_record_evicts_oldest() {
        let store = Arc::new(MemoryStore::new());
        let mut history = History::load(Box::new(KeyValueHistory::new(store.clone())));

        for i in 0..11 {
            history.record(entry(&format!("message {i}")));
        }

        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.entries()[0].text, "message 10");
        assert_eq!(history.entries()[9].text, "message 1");

        let persisted = KeyValueHistory::new(store).load().unwrap();
        assert_eq!(persisted, history.entries());
    }

    #[test]
    fn stored_entries_use_camel_case_keys() {
        let raw = r#"[{"text":"Historical text","timestamp":"2024-01-01T00:00:00.000Z",
            "includeQuote":true,"quotePosition":"end"}]"#;
        let history = History::load(Box::new(KeyValueHistory::new(MemoryStore::with_item(
            HISTORY_KEY,
            raw,
        ))));

        let first = history.get(0).unwrap();
        assert_eq!(first.text, "Historical text");
        assert!(first.include_quote);
        assert_eq!(first.quote_position, QuotePosition::End);

        let json = serde_json::to_value(first).unwrap();
        assert!(json.get("includeQuote").is_some());
        assert!(json.get("quotePosition").is_some());
    }

    #[test]
    fn malformed_store_starts_empty() {
        let history = History::load(Box::new(KeyValueHistory::new(MemoryStore::with_item(
            HISTORY_KEY,
            "{not json",
        ))));
        assert!(history.is_empty());
    }

    #[test]
    fn oversized_store_is_trimmed_on_load() {
        let entries: Vec<HistoryEntry> = (0..15).map(|i| entry(&i.to_string())).collect();
        let raw = serde_json::to_string(&entries).unwrap();
        let history = History::load(Box::new(KeyValueHistory::new(MemoryStore::with_item(
            HISTORY_KEY,
            &raw,
        ))));
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.entries()[0].text, "0");
    }

    #[test]
    fn summary_shows_time_and_truncates() {
        let mut e = entry("a very long message that keeps going");
        e.timestamp = "2024-05-01T08:30:15.123Z".into();
        e.include_quote = true;
        assert_eq!(e.summary(12), "08:30:15  [quote@start]  a very lo...");
    }
}
