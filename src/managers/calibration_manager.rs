// CalibrationManager: owner of the CalibrationState singleton
//
// Single Responsibility: calibration mutations and their persistence.
// Every mutation builds the replacement state first, saves its snapshot, and
// only then swaps it in under the write lock. A failed save leaves the shared
// state untouched.

use std::sync::{Arc, RwLock};

use crate::calibration::gain::resolve_gain;
use crate::calibration::persistence::CalibrationStore;
use crate::calibration::procedure::BiologicalCalibrationProcedure;
use crate::calibration::profiles::{headphone_profile, DevicePlatform};
use crate::calibration::state::{
    BiologicalCalibration, CalibrationSnapshot, CalibrationState, CalibrationSummary,
};
use crate::error::{log_calibration_error, CalibrationError};

/// Manages calibration state and persistence
///
/// This manager handles:
/// - Loading and validating the persisted snapshot at startup
/// - Headphone selection and biological calibration updates
/// - Export/import of calibration snapshots
/// - Sharing the state with gain consumers via `Arc<RwLock<_>>`
///
/// # Example
/// ```ignore
/// let manager = CalibrationManager::new(DevicePlatform::Android, store);
/// manager.load()?;
/// manager.select_headphone("apple-airpods")?;
/// let gain = manager.resolve_gain(1000)?;
/// ```
pub struct CalibrationManager {
    state: Arc<RwLock<CalibrationState>>,
    store: Arc<dyn CalibrationStore>,
}

impl CalibrationManager {
    /// Create a manager with an uncalibrated state for `platform`
    pub fn new(platform: DevicePlatform, store: Arc<dyn CalibrationStore>) -> Self {
        Self {
            state: Arc::new(RwLock::new(CalibrationState::new(platform))),
            store,
        }
    }

    /// Load the persisted snapshot, if any
    ///
    /// # Returns
    /// * `Ok(true)` - A snapshot was found, validated and applied
    /// * `Ok(false)` - Nothing persisted yet; state left uncalibrated
    ///
    /// # Errors
    /// - `IncompatibleVersion` / `InvalidSnapshot` / `UnknownProfile` when the
    ///   stored snapshot fails validation (state left unchanged)
    pub fn load(&self) -> Result<bool, CalibrationError> {
        let Some(json) = self.store.load()? else {
            log::info!("[Calibration] No persisted calibration found");
            return Ok(false);
        };

        let snapshot = CalibrationSnapshot::from_json(&json).inspect_err(|err| {
            log_calibration_error(err, "load_calibration");
        })?;

        let mut state = self.write_state("load_calibration")?;
        let next = state.with_snapshot(&snapshot).inspect_err(|err| {
            log_calibration_error(err, "load_calibration");
        })?;
        *state = next;

        log::info!(
            "[Calibration] Loaded calibration (headphone={:?})",
            snapshot.headphone
        );
        Ok(true)
    }

    /// Select a headphone profile by id
    ///
    /// # Errors
    /// - `UnknownProfile` if `id` is not in the profile table (state unchanged)
    /// - `PersistFailed` if the store rejects the new snapshot (state unchanged)
    pub fn select_headphone(&self, id: &str) -> Result<(), CalibrationError> {
        if headphone_profile(id).is_none() {
            let err = CalibrationError::UnknownProfile { id: id.to_string() };
            log_calibration_error(&err, "select_headphone");
            return Err(err);
        }

        self.commit("select_headphone", |state| {
            Ok(CalibrationState {
                selected_profile_id: Some(id.to_string()),
                ..state.clone()
            })
        })
    }

    /// Drop the headphone selection
    pub fn clear_headphone(&self) -> Result<(), CalibrationError> {
        self.commit("clear_headphone", |state| {
            Ok(CalibrationState {
                selected_profile_id: None,
                ..state.clone()
            })
        })
    }

    /// Replace the biological calibration wholesale
    pub fn apply_biological(&self, bio: BiologicalCalibration) -> Result<(), CalibrationError> {
        self.commit("apply_biological", move |state| {
            Ok(CalibrationState {
                biological_calibration: Some(bio),
                ..state.clone()
            })
        })
    }

    /// Finalize a completed comfort-rating procedure and apply it
    pub fn finish_biological(
        &self,
        procedure: BiologicalCalibrationProcedure,
    ) -> Result<BiologicalCalibration, CalibrationError> {
        let bio = procedure.finalize().inspect_err(|err| {
            log_calibration_error(err, "finish_biological");
        })?;
        self.apply_biological(bio.clone())?;
        Ok(bio)
    }

    /// Clear headphone selection and biological calibration
    pub fn reset(&self) -> Result<(), CalibrationError> {
        let mut state = self.write_state("reset_calibration")?;
        self.store.clear().inspect_err(|err| {
            log_calibration_error(err, "reset_calibration");
        })?;
        *state = CalibrationState::new(state.device_platform);
        Ok(())
    }

    /// Export the current calibration as a versioned snapshot
    pub fn export_snapshot(&self) -> Result<CalibrationSnapshot, CalibrationError> {
        Ok(self.read_state("export_calibration")?.to_snapshot())
    }

    /// Import a snapshot exported from another device
    ///
    /// # Errors
    /// - `IncompatibleVersion` for any version other than the supported one
    pub fn import_json(&self, json: &str) -> Result<(), CalibrationError> {
        let snapshot = CalibrationSnapshot::from_json(json).inspect_err(|err| {
            log_calibration_error(err, "import_calibration");
        })?;
        self.commit("import_calibration", |state| state.with_snapshot(&snapshot))
    }

    /// Clone of the current state
    pub fn get_state(&self) -> Result<CalibrationState, CalibrationError> {
        Ok(self.read_state("get_calibration_state")?.clone())
    }

    /// Shared handle for gain consumers
    pub fn state_handle(&self) -> Arc<RwLock<CalibrationState>> {
        Arc::clone(&self.state)
    }

    pub fn summary(&self) -> Result<CalibrationSummary, CalibrationError> {
        Ok(self.read_state("calibration_summary")?.summary())
    }

    /// Resolve playback gain against the current state
    pub fn resolve_gain(&self, frequency_hz: u32) -> Result<f64, CalibrationError> {
        Ok(resolve_gain(
            frequency_hz,
            &*self.read_state("resolve_gain")?,
        ))
    }

    // ========================================================================
    // HELPER METHODS - Lock management and persistence
    // ========================================================================

    /// Build the next state, persist it, then publish it
    ///
    /// Holds the write lock across the save.
    fn commit<F>(&self, context: &str, build: F) -> Result<(), CalibrationError>
    where
        F: FnOnce(&CalibrationState) -> Result<CalibrationState, CalibrationError>,
    {
        let mut state = self.write_state(context)?;
        let next = build(&state).inspect_err(|err| {
            log_calibration_error(err, context);
        })?;

        let json = next.to_snapshot().to_json()?;
        self.store.save(&json).inspect_err(|err| {
            log_calibration_error(err, context);
        })?;

        *state = next;
        Ok(())
    }

    fn read_state(
        &self,
        context: &str,
    ) -> Result<std::sync::RwLockReadGuard<'_, CalibrationState>, CalibrationError> {
        self.state.read().map_err(|_| {
            let err = CalibrationError::StatePoisoned;
            log_calibration_error(&err, context);
            err
        })
    }

    fn write_state(
        &self,
        context: &str,
    ) -> Result<std::sync::RwLockWriteGuard<'_, CalibrationState>, CalibrationError> {
        self.state.write().map_err(|_| {
            let err = CalibrationError::StatePoisoned;
            log_calibration_error(&err, context);
            err
        })
    }
}
