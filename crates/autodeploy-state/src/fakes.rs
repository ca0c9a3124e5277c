//! In-memory fakes for storage traits (testing only)
//!
//! `MemoryProjectStore` satisfies the `ProjectStore` contract without any
//! external dependencies.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StorageError;
use crate::storage_traits::*;

/// In-memory project store backed by a `Vec<ProjectRecord>`.
#[derive(Debug, Default)]
pub struct MemoryProjectStore {
    records: Mutex<Vec<ProjectRecord>>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `records`.
    pub fn with_records(records: impl IntoIterator<Item = ProjectRecord>) -> Self {
        Self {
            records: Mutex::new(records.into_iter().collect()),
        }
    }

    /// Snapshot of a single row, for assertions.
    pub fn get(&self, name: &str) -> Option<ProjectRecord> {
        let records = self.records.lock().unwrap();
        records.iter().find(|r| r.name == name).cloned()
    }

    fn update<F>(&self, name: &str, f: F) -> StorageResult<()>
    where
        F: FnOnce(&mut ProjectRecord),
    {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| StorageError::ProjectNotFound {
                name: name.to_string(),
            })?;
        f(record);
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn upsert(&self, record: ProjectRecord) -> StorageResult<()> {
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }

    async fn list_automated(&self) -> StorageResult<Vec<ProjectRecord>> {
        let records = self.records.lock().unwrap();
        let mut automated: Vec<ProjectRecord> =
            records.iter().filter(|r| r.automated).cloned().collect();
        deployment_order(&mut automated);
        Ok(automated)
    }

    async fn is_queued(&self, name: &str) -> StorageResult<bool> {
        let records = self.records.lock().unwrap();
        records
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.queued)
            .ok_or_else(|| StorageError::ProjectNotFound {
                name: name.to_string(),
            })
    }

    async fn set_queued(&self, name: &str, queued: bool) -> StorageResult<()> {
        self.update(name, |r| r.queued = queued)
    }

    async fn record_deployment(&self, name: &str, at: DateTime<Utc>) -> StorageResult<()> {
        self.update(name, |r| r.last_deployed_at = Some(at))
    }
}
