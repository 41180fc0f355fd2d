//! Append-only CSV lead store

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::PersistenceError;
use call_agent_core::LeadRecord;

/// Lead store trait for abstraction
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Append one lead row
    async fn record(&self, lead: &LeadRecord) -> Result<(), PersistenceError>;
}

/// CSV-backed lead store
///
/// Appends rows `phone_number,status,date,time`, writing a header row
/// when the file is first created. File IO runs on the blocking pool
/// so recording a lead never stalls the controller's decision loop.
#[derive(Clone)]
pub struct CsvLeadStore {
    path: PathBuf,
}

impl CsvLeadStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_row(path: &Path, lead: &LeadRecord) -> Result<(), PersistenceError> {
        let write_header = !path.exists();

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if write_header {
            writer.write_record(["phone_number", "status", "date", "time"])?;
        }

        writer.write_record([
            lead.phone_number.as_str(),
            lead.status.as_str(),
            &lead.date(),
            &lead.time(),
        ])?;
        writer.flush()?;

        Ok(())
    }
}

#[async_trait]
impl LeadStore for CsvLeadStore {
    async fn record(&self, lead: &LeadRecord) -> Result<(), PersistenceError> {
        let path = self.path.clone();
        let row = lead.clone();

        tokio::task::spawn_blocking(move || Self::append_row(&path, &row))
            .await
            .map_err(|e| PersistenceError::TaskJoin(e.to_string()))??;

        tracing::info!(phone = %lead.phone_number, status = %lead.status.as_str(), "Lead saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use call_agent_core::LeadStatus;

    #[tokio::test]
    async fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");
        let store = CsvLeadStore::new(&path);

        let lead = LeadRecord::new("+15550100", LeadStatus::Interested);
        store.record(&lead).await.unwrap();
        store.record(&lead).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "phone_number,status,date,time");
        assert!(lines[1].starts_with("+15550100,interested,"));
        assert!(lines[2].starts_with("+15550100,interested,"));
    }

    #[tokio::test]
    async fn test_append_preserves_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");
        let store = CsvLeadStore::new(&path);

        store
            .record(&LeadRecord::new("+15550100", LeadStatus::Interested))
            .await
            .unwrap();
        store
            .record(&LeadRecord::new("+15550101", LeadStatus::Interested))
            .await
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("+15550100"));
        assert!(contents.contains("+15550101"));
    }

    #[tokio::test]
    async fn test_write_failure_is_reported_not_panicked() {
        // Directory path cannot be opened as a file.
        let dir = tempfile::tempdir().unwrap();
        let store = CsvLeadStore::new(dir.path());

        let result = store
            .record(&LeadRecord::new("+15550100", LeadStatus::Interested))
            .await;
        assert!(result.is_err());
    }
}
