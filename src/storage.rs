// Storage collaborators - record store and result sinks
//
// The engine only needs two record-store operations (read a subject, append a
// screening result) plus sync-status bookkeeping. Export/EMR submission is
// behind ResultSink; payload formatting is the sink's concern.

use std::collections::HashMap;
use std::sync::Mutex;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::screening::{ScreeningResult, SyncStatus};

/// Roster entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub age_years: u32,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
}

/// Screening result with its storage bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredResult {
    pub record_id: u64,
    pub result: ScreeningResult,
    pub sync_status: SyncStatus,
}

/// Async record store
pub trait RecordStore: Send + Sync {
    fn get_subject<'a>(
        &'a self,
        subject_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Subject>, SessionError>>;

    /// Append a result, returning its record id
    fn append_result(&self, result: ScreeningResult) -> BoxFuture<'_, Result<u64, SessionError>>;

    fn set_sync_status(
        &self,
        record_id: u64,
        status: SyncStatus,
    ) -> BoxFuture<'_, Result<(), SessionError>>;

    /// Results not yet delivered to the sinks
    fn unsynced_results(&self) -> BoxFuture<'_, Result<Vec<StoredResult>, SessionError>>;
}

/// Export/submission collaborator
pub trait ResultSink: Send + Sync {
    fn name(&self) -> &str;

    fn submit<'a>(&'a self, result: &'a ScreeningResult) -> BoxFuture<'a, Result<(), SessionError>>;

    /// Submit several results; stops at the first failure
    fn submit_batch<'a>(
        &'a self,
        results: &'a [ScreeningResult],
    ) -> BoxFuture<'a, Result<(), SessionError>> {
        async move {
            for result in results {
                self.submit(result).await?;
            }
            Ok(())
        }
        .boxed()
    }
}

fn storage_err(component: &str) -> SessionError {
    SessionError::StorageFailed {
        reason: format!("{} lock poisoned", component),
    }
}

/// In-process record store
#[derive(Default)]
pub struct InMemoryRecordStore {
    subjects: Mutex<HashMap<String, Subject>>,
    results: Mutex<Vec<StoredResult>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subjects<I: IntoIterator<Item = Subject>>(subjects: I) -> Self {
        Self {
            subjects: Mutex::new(subjects.into_iter().map(|s| (s.id.clone(), s)).collect()),
            results: Mutex::new(Vec::new()),
        }
    }

    pub fn insert_subject(&self, subject: Subject) -> Result<(), SessionError> {
        self.subjects
            .lock()
            .map_err(|_| storage_err("subjects"))?
            .insert(subject.id.clone(), subject);
        Ok(())
    }

    pub fn results(&self) -> Result<Vec<StoredResult>, SessionError> {
        Ok(self
            .results
            .lock()
            .map_err(|_| storage_err("results"))?
            .clone())
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get_subject<'a>(
        &'a self,
        subject_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Subject>, SessionError>> {
        async move {
            let subjects = self.subjects.lock().map_err(|_| storage_err("subjects"))?;
            Ok(subjects.get(subject_id).cloned())
        }
        .boxed()
    }

    fn append_result(&self, result: ScreeningResult) -> BoxFuture<'_, Result<u64, SessionError>> {
        async move {
            let mut results = self.results.lock().map_err(|_| storage_err("results"))?;
            let record_id = results.len() as u64 + 1;
            results.push(StoredResult {
                record_id,
                result,
                sync_status: SyncStatus::Pending,
            });
            Ok(record_id)
        }
        .boxed()
    }

    fn set_sync_status(
        &self,
        record_id: u64,
        status: SyncStatus,
    ) -> BoxFuture<'_, Result<(), SessionError>> {
        async move {
            let mut results = self.results.lock().map_err(|_| storage_err("results"))?;
            let stored = results
                .iter_mut()
                .find(|r| r.record_id == record_id)
                .ok_or_else(|| SessionError::StorageFailed {
                    reason: format!("no result with record id {}", record_id),
                })?;
            stored.sync_status = status;
            Ok(())
        }
        .boxed()
    }

    fn unsynced_results(&self) -> BoxFuture<'_, Result<Vec<StoredResult>, SessionError>> {
        async move {
            let results = self.results.lock().map_err(|_| storage_err("results"))?;
            Ok(results
                .iter()
                .filter(|r| r.sync_status != SyncStatus::Synced)
                .cloned()
                .collect())
        }
        .boxed()
    }
}

/// Sink that keeps submitted results in memory
#[derive(Default)]
pub struct CollectingSink {
    received: Mutex<Vec<ScreeningResult>>,
    reject_with: Option<String>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that rejects every submission
    pub fn rejecting(reason: &str) -> Self {
        Self {
            reject_with: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn received(&self) -> Vec<ScreeningResult> {
        self.received
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl ResultSink for CollectingSink {
    fn name(&self) -> &str {
        "collecting"
    }

    fn submit<'a>(&'a self, result: &'a ScreeningResult) -> BoxFuture<'a, Result<(), SessionError>> {
        async move {
            if let Some(reason) = &self.reject_with {
                return Err(SessionError::StorageFailed {
                    reason: reason.clone(),
                });
            }
            self.received
                .lock()
                .map_err(|_| storage_err("sink"))?
                .push(result.clone());
            Ok(())
        }
        .boxed()
    }
}
