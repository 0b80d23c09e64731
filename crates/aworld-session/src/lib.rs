//! Small local history of session ids, so `/restore` and `/latest` can
//! re-adopt a previous remote session without the client holding any
//! conversation state itself (that lives entirely on the backend).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use ulid::Ulid;

const HISTORY_FILE: &str = "sessions.json";
const MAX_HISTORY: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

pub struct SessionHistory {
    path: PathBuf,
}

impl SessionHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.local/share/aworld-cli/sessions.json` (or platform equivalent).
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "aworld-cli")
            .ok_or_else(|| anyhow::anyhow!("cannot determine data directory"))?;
        Ok(dirs.data_local_dir().join(HISTORY_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Vec<SessionRecord> {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    fn save(&self, records: &[SessionRecord]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(records)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// Generate a fresh session id, as `/new` does, without recording it —
    /// recording happens on first successful use via [`record`].
    pub fn generate_id() -> String {
        Ulid::new().to_string()
    }

    pub fn record(&self, id: &str) -> anyhow::Result<()> {
        let mut records = self.load();
        records.retain(|r| r.id != id);
        records.push(SessionRecord {
            id: id.to_string(),
            created_at: Utc::now(),
        });
        if records.len() > MAX_HISTORY {
            let excess = records.len() - MAX_HISTORY;
            records.drain(0..excess);
        }
        self.save(&records)
    }

    /// The most recently recorded session id, for `/restore` and `/latest`.
    pub fn latest(&self) -> Option<String> {
        self.load().last().map(|r| r.id.clone())
    }

    pub fn all(&self) -> Vec<SessionRecord> {
        self.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn record_and_latest_round_trip() {
        let dir = tempdir().unwrap();
        let history = SessionHistory::new(dir.path().join("sessions.json"));
        history.record("session-a").unwrap();
        history.record("session-b").unwrap();
        assert_eq!(history.latest(), Some("session-b".to_string()));
    }

    #[test]
    fn empty_history_has_no_latest() {
        let dir = tempdir().unwrap();
        let history = SessionHistory::new(dir.path().join("sessions.json"));
        assert_eq!(history.latest(), None);
    }

    #[test]
    fn re_recording_moves_entry_to_the_end() {
        let dir = tempdir().unwrap();
        let history = SessionHistory::new(dir.path().join("sessions.json"));
        history.record("a").unwrap();
        history.record("b").unwrap();
        history.record("a").unwrap();
        assert_eq!(history.latest(), Some("a".to_string()));
        assert_eq!(history.all().len(), 2);
    }

    #[test]
    fn history_caps_at_max_entries() {
        let dir = tempdir().unwrap();
        let history = SessionHistory::new(dir.path().join("sessions.json"));
        for i in 0..(MAX_HISTORY + 5) {
            history.record(&format!("session-{i}")).unwrap();
        }
        assert_eq!(history.all().len(), MAX_HISTORY);
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = SessionHistory::generate_id();
        let b = SessionHistory::generate_id();
        assert_ne!(a, b);
    }
}
