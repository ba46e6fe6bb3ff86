// Calibration persistence - where the versioned snapshot lives between runs

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::CalibrationError;

/// Key-value style store holding one serialized calibration snapshot
pub trait CalibrationStore: Send + Sync {
    /// Stored snapshot JSON, `None` if nothing was saved yet
    fn load(&self) -> Result<Option<String>, CalibrationError>;
    fn save(&self, json: &str) -> Result<(), CalibrationError>;
    fn clear(&self) -> Result<(), CalibrationError>;
}

/// Snapshot stored as a JSON file
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn persist_err(err: std::io::Error) -> CalibrationError {
    CalibrationError::PersistFailed {
        reason: err.to_string(),
    }
}

impl CalibrationStore for JsonFileStore {
    fn load(&self) -> Result<Option<String>, CalibrationError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(persist_err(err)),
        }
    }

    fn save(&self, json: &str) -> Result<(), CalibrationError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(persist_err)?;
            }
        }
        fs::write(&self.path, json).map_err(persist_err)
    }

    fn clear(&self) -> Result<(), CalibrationError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(persist_err(err)),
        }
    }
}

/// In-memory store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryCalibrationStore {
    slot: Mutex<Option<String>>,
}

impl MemoryCalibrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(json: &str) -> Self {
        Self {
            slot: Mutex::new(Some(json.to_string())),
        }
    }
}

impl CalibrationStore for MemoryCalibrationStore {
    fn load(&self) -> Result<Option<String>, CalibrationError> {
        self.slot
            .lock()
            .map(|slot| slot.clone())
            .map_err(|_| CalibrationError::StatePoisoned)
    }

    fn save(&self, json: &str) -> Result<(), CalibrationError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| CalibrationError::StatePoisoned)?;
        *slot = Some(json.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), CalibrationError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| CalibrationError::StatePoisoned)?;
        *slot = None;
        Ok(())
    }
}
