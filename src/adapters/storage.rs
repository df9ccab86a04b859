use crate::domain::model::{HistoryRecord, Participant, Roster};
use crate::domain::ports::{ConfigProvider, Repository};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Roster as a JSON object keyed by participant name, history as a
/// `year,gifter,giftee` CSV log.
#[derive(Debug, Clone)]
pub struct FileRepository {
    participants_path: PathBuf,
    history_path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct ParticipantEntry {
    email: String,
    #[serde(default)]
    invalid_matches: Vec<String>,
}

impl FileRepository {
    pub fn new(participants_path: impl Into<PathBuf>, history_path: impl Into<PathBuf>) -> Self {
        Self {
            participants_path: participants_path.into(),
            history_path: history_path.into(),
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self::new(config.participants_path(), config.history_path())
    }

    pub fn participants_path(&self) -> &Path {
        &self.participants_path
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

impl Repository for FileRepository {
    async fn load_roster(&self) -> Result<Roster> {
        tracing::debug!("Loading participants from {}", self.participants_path.display());
        let data = fs::read(&self.participants_path)?;
        let entries: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(&data)?;

        let mut participants = Vec::with_capacity(entries.len());
        for (name, value) in entries {
            let entry: ParticipantEntry = serde_json::from_value(value)?;
            participants.push(Participant::new(name, entry.email, entry.invalid_matches));
        }

        tracing::debug!("Loaded {} participants", participants.len());
        Ok(Roster::new(participants))
    }

    async fn save_roster(&self, roster: &Roster) -> Result<()> {
        let mut entries = serde_json::Map::with_capacity(roster.len());
        for participant in roster.participants() {
            let entry = ParticipantEntry {
                email: participant.email.clone(),
                invalid_matches: participant.invalid_matches.clone(),
            };
            entries.insert(participant.name.clone(), serde_json::to_value(entry)?);
        }

        let mut json = serde_json::to_string_pretty(&entries)?;
        json.push('\n');

        ensure_parent(&self.participants_path)?;
        // Stage, then rename over the roster in one step.
        let staging = self.participants_path.with_extension("json.tmp");
        fs::write(&staging, json)?;
        fs::rename(&staging, &self.participants_path)?;

        tracing::debug!("Saved {} participants to {}", roster.len(), self.participants_path.display());
        Ok(())
    }

    async fn load_history(&self) -> Result<Vec<HistoryRecord>> {
        if !self.history_path.exists() {
            tracing::debug!("No history at {}, starting empty", self.history_path.display());
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.history_path)?;
        let records = reader
            .deserialize::<HistoryRecord>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    async fn append_history(&self, records: &[HistoryRecord]) -> Result<()> {
        ensure_parent(&self.history_path)?;

        let needs_header = fs::metadata(&self.history_path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);

        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.history_path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        tracing::debug!(
            "Appended {} records to {}",
            records.len(),
            self.history_path.display()
        );
        Ok(())
    }
}
