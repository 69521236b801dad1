//! Storage collaborators
//!
//! The engine persists two things: the gamification state blob, through a
//! small key-value abstraction (get/set by string key, JSON values), and
//! the journal itself as an append-only NDJSON file (one entry per line).
//!
//! Writes are whole-file read-modify-write, last writer wins; the caller
//! serializes concurrent evaluations.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::AnalyticsError;
use crate::types::HealthEntry;

/// Storage key for the persisted gamification state blob
pub const GAMIFICATION_STATE_KEY: &str = "gamification.state";

/// Key-value storage with JSON-serialized values
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AnalyticsError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), AnalyticsError>;
}

/// In-memory store for tests and embedded hosts that manage persistence
/// themselves
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AnalyticsError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), AnalyticsError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// File-backed store holding all keys in one JSON object.
///
/// The whole file is loaded at open and rewritten on every set.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, serde_json::Value>,
}

impl FileStore {
    /// Open a store file; a missing file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AnalyticsError> {
        let path = path.into();
        let values = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };
        debug!(keys = values.len(), path = %path.display(), "opened state store");
        Ok(Self { path, values })
    }

    fn flush(&self) -> Result<(), AnalyticsError> {
        let content = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AnalyticsError> {
        match self.values.get(key) {
            Some(value) => Ok(Some(serde_json::to_string(value)?)),
            None => Ok(None),
        }
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), AnalyticsError> {
        let parsed: serde_json::Value = serde_json::from_str(&value)?;
        self.values.insert(key.to_string(), parsed);
        self.flush()
    }
}

/// Parse NDJSON (one entry per line; blank lines skipped)
pub fn parse_entries_ndjson(input: &str) -> Result<Vec<HealthEntry>, AnalyticsError> {
    let mut entries = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let entry: HealthEntry =
            serde_json::from_str(trimmed).map_err(|e| AnalyticsError::JournalParseError {
                line: index + 1,
                message: e.to_string(),
            })?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Parse a JSON array of entries
pub fn parse_entries_array(input: &str) -> Result<Vec<HealthEntry>, AnalyticsError> {
    serde_json::from_str(input).map_err(AnalyticsError::from)
}

/// Collapse duplicate dates, keeping the latest record for each date.
///
/// Enforces the one-entry-per-date invariant on load: an appended update
/// simply shadows the earlier line.
pub fn dedupe_by_date(entries: Vec<HealthEntry>) -> Vec<HealthEntry> {
    let mut index: BTreeMap<String, usize> = BTreeMap::new();
    let mut deduped: Vec<HealthEntry> = Vec::with_capacity(entries.len());

    for entry in entries {
        match index.get(&entry.date) {
            Some(&position) => {
                warn!(date = %entry.date, "duplicate journal date, keeping newest record");
                deduped[position] = entry;
            }
            None => {
                index.insert(entry.date.clone(), deduped.len());
                deduped.push(entry);
            }
        }
    }
    deduped
}

/// Append-only NDJSON journal file (one entry per line)
#[derive(Debug, Clone)]
pub struct JournalStore {
    path: PathBuf,
}

impl JournalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry as a new line.
    pub fn append(&self, entry: &HealthEntry) -> Result<(), AnalyticsError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut content = if self.path.exists() {
            fs::read_to_string(&self.path)?
        } else {
            String::new()
        };
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(&line);
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Load all entries, deduplicated by date (latest record wins).
    ///
    /// A missing file is an empty journal.
    pub fn load(&self) -> Result<Vec<HealthEntry>, AnalyticsError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        let entries = dedupe_by_date(parse_entries_ndjson(&content)?);
        debug!(count = entries.len(), path = %self.path.display(), "journal loaded");
        Ok(entries)
    }

    /// Replace the record for the entry's date, or append if new, then
    /// rewrite the file.
    pub fn upsert(&self, entry: &HealthEntry) -> Result<(), AnalyticsError> {
        let mut entries = self.load()?;
        match entries.iter_mut().find(|e| e.date == entry.date) {
            Some(existing) => *existing = entry.clone(),
            None => entries.push(entry.clone()),
        }

        let mut content = String::new();
        for entry in &entries {
            content.push_str(&serde_json::to_string(entry)?);
            content.push('\n');
        }
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SymptomLog;
    use pretty_assertions::assert_eq;

    fn make_entry(date: &str, mood: f64) -> HealthEntry {
        HealthEntry::new(
            date,
            "23:00",
            "07:00",
            7.0,
            mood,
            4.0,
            "",
            None,
            SymptomLog::default(),
        )
    }

    fn temp_path(suffix: &str) -> PathBuf {
        std::env::temp_dir().join(format!("vitalog-test-{}-{suffix}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(store.get("missing").unwrap().is_none());

        store.set("key", r#"{"a": 1}"#.to_string()).unwrap();
        let value = store.get("key").unwrap().unwrap();
        assert_eq!(value, r#"{"a": 1}"#);
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let path = temp_path("state.json");

        {
            let mut store = FileStore::open(&path).unwrap();
            store.set("counter", "42".to_string()).unwrap();
        }
        {
            let store = FileStore::open(&path).unwrap();
            assert_eq!(store.get("counter").unwrap().unwrap(), "42");
        }

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_store_rejects_non_json_value() {
        let path = temp_path("state.json");
        let mut store = FileStore::open(&path).unwrap();
        assert!(store.set("key", "not json".to_string()).is_err());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let input = format!(
            "{}\n\n{}\n",
            serde_json::to_string(&make_entry("2025-06-01", 6.0)).unwrap(),
            serde_json::to_string(&make_entry("2025-06-02", 7.0)).unwrap(),
        );
        let entries = parse_entries_ndjson(&input).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_parse_ndjson_reports_line_number() {
        let input = format!(
            "{}\nnot json\n",
            serde_json::to_string(&make_entry("2025-06-01", 6.0)).unwrap(),
        );
        match parse_entries_ndjson(&input) {
            Err(AnalyticsError::JournalParseError { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_dedupe_keeps_newest_record() {
        let entries = vec![
            make_entry("2025-06-01", 3.0),
            make_entry("2025-06-02", 5.0),
            make_entry("2025-06-01", 8.0),
        ];
        let deduped = dedupe_by_date(entries);
        assert_eq!(deduped.len(), 2);
        assert!((deduped[0].mood.mood_score - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_journal_append_and_load() {
        let path = temp_path("journal.ndjson");
        let journal = JournalStore::new(&path);

        journal.append(&make_entry("2025-06-01", 6.0)).unwrap();
        journal.append(&make_entry("2025-06-02", 7.0)).unwrap();

        let entries = journal.load().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, "2025-06-01");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_journal_missing_file_is_empty() {
        let journal = JournalStore::new(temp_path("missing.ndjson"));
        assert!(journal.load().unwrap().is_empty());
    }

    #[test]
    fn test_journal_upsert_replaces_by_date() {
        let path = temp_path("journal.ndjson");
        let journal = JournalStore::new(&path);

        journal.append(&make_entry("2025-06-01", 4.0)).unwrap();
        journal.upsert(&make_entry("2025-06-01", 9.0)).unwrap();
        journal.upsert(&make_entry("2025-06-02", 5.0)).unwrap();

        let entries = journal.load().unwrap();
        assert_eq!(entries.len(), 2);
        assert!((entries[0].mood.mood_score - 9.0).abs() < f64::EPSILON);

        let _ = fs::remove_file(&path);
    }
}
