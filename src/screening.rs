// Screening flow - assembles sub-test outcomes into a stored record
//
// A ScreeningResult is created once both sub-tests are complete and never
// mutated afterwards; only its sync status (owned by the record store)
// changes as sinks accept or reject it.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::{log_session_error, SessionError};
use crate::hearing::HearingOutcome;
use crate::storage::{RecordStore, ResultSink, StoredResult, Subject};
use crate::vision::{VisionOutcome, VisionSession};

/// Delivery state of a stored result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Pending,
    Synced,
    Failed,
}

/// Combined screening record for one subject
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreeningResult {
    pub subject_ref: String,
    pub vision_outcome: VisionOutcome,
    pub hearing_outcome: HearingOutcome,
    pub referral_needed: bool,
    pub completed_at_ms: u64,
}

impl ScreeningResult {
    pub fn new(
        subject_ref: impl Into<String>,
        vision_outcome: VisionOutcome,
        hearing_outcome: HearingOutcome,
    ) -> Self {
        let referral_needed = !vision_outcome.pass || !hearing_outcome.pass;
        Self {
            subject_ref: subject_ref.into(),
            vision_outcome,
            hearing_outcome,
            referral_needed,
            completed_at_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
        }
    }
}

/// Orchestrates subject lookup, record creation and delivery
pub struct ScreeningFlow {
    store: Arc<dyn RecordStore>,
    sinks: Vec<Arc<dyn ResultSink>>,
    config: AppConfig,
}

impl ScreeningFlow {
    pub fn new(store: Arc<dyn RecordStore>, config: AppConfig) -> Self {
        Self {
            store,
            sinks: Vec::new(),
            config,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Look up a subject, failing if absent
    pub async fn subject(&self, subject_id: &str) -> Result<Subject, SessionError> {
        self.store
            .get_subject(subject_id)
            .await?
            .ok_or_else(|| {
                let err = SessionError::SubjectNotFound {
                    subject_id: subject_id.to_string(),
                };
                log_session_error(&err, "screening_subject");
                err
            })
    }

    /// Vision session with the subject's age-banded start level
    pub async fn vision_session(&self, subject_id: &str) -> Result<VisionSession, SessionError> {
        let subject = self.subject(subject_id).await?;
        Ok(VisionSession::new(
            subject.age_years,
            self.config.vision.clone(),
        ))
    }

    /// Build, store and deliver the result for `subject_id`
    ///
    /// Sink failures are recorded as `SyncStatus::Failed` rather than returned;
    /// the record itself is already stored.
    #[tracing::instrument(skip(self, vision, hearing))]
    pub async fn complete(
        &self,
        subject_id: &str,
        vision: VisionOutcome,
        hearing: HearingOutcome,
    ) -> Result<StoredResult, SessionError> {
        let subject = self.subject(subject_id).await?;
        let result = ScreeningResult::new(subject.id, vision, hearing);

        let record_id = self
            .store
            .append_result(result.clone())
            .await
            .inspect_err(|err| log_session_error(err, "screening_append"))?;
        log::info!(
            "[Screening] Stored record {} for {} (referral={})",
            record_id,
            result.subject_ref,
            result.referral_needed
        );

        let sync_status = self.deliver(&result).await;
        self.store.set_sync_status(record_id, sync_status).await?;

        Ok(StoredResult {
            record_id,
            result,
            sync_status,
        })
    }

    async fn deliver(&self, result: &ScreeningResult) -> SyncStatus {
        if self.sinks.is_empty() {
            return SyncStatus::Pending;
        }

        for sink in &self.sinks {
            if let Err(err) = sink.submit(result).await {
                log::warn!("[Screening] Sink '{}' rejected result: {}", sink.name(), err);
                return SyncStatus::Failed;
            }
        }
        SyncStatus::Synced
    }

    /// Retry every pending or failed record as one batch per sink
    ///
    /// Returns the number of records marked synced.
    pub async fn sync_pending(&self) -> Result<usize, SessionError> {
        if self.sinks.is_empty() {
            return Ok(0);
        }

        let unsynced = self.store.unsynced_results().await?;
        if unsynced.is_empty() {
            return Ok(0);
        }

        let batch: Vec<ScreeningResult> = unsynced.iter().map(|s| s.result.clone()).collect();
        let mut status = SyncStatus::Synced;
        for sink in &self.sinks {
            if let Err(err) = sink.submit_batch(&batch).await {
                log::warn!("[Screening] Batch to '{}' failed: {}", sink.name(), err);
                status = SyncStatus::Failed;
                break;
            }
        }

        for stored in &unsynced {
            self.store.set_sync_status(stored.record_id, status).await?;
        }

        let synced = if status == SyncStatus::Synced {
            unsynced.len()
        } else {
            0
        };
        log::info!("[Screening] Batch sync: {}/{} synced", synced, unsynced.len());
        Ok(synced)
    }
}
