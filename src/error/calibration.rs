// Calibration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Calibration error code constants
///
/// Single source of truth for the numeric codes surfaced by headphone
/// selection, biological calibration and calibration persistence.
///
/// Error code range: 2001-2008
pub struct CalibrationErrorCodes {}

impl CalibrationErrorCodes {
    /// Requested headphone profile id is not in the profile table
    pub const UNKNOWN_PROFILE: i32 = 2001;

    /// Persisted/imported calibration snapshot carries an unsupported version
    pub const INCOMPATIBLE_VERSION: i32 = 2002;

    /// Persisted/imported calibration snapshot could not be parsed
    pub const INVALID_SNAPSHOT: i32 = 2003;

    /// Calibration state RwLock was poisoned
    pub const STATE_POISONED: i32 = 2004;

    /// Calibration state could not be written to the persistence store
    pub const PERSIST_FAILED: i32 = 2005;

    /// Comfort response recorded for a frequency outside the calibration set
    pub const UNSUPPORTED_FREQUENCY: i32 = 2006;

    /// Biological calibration finalized before every frequency was rated
    pub const INCOMPLETE: i32 = 2007;

    /// Comfort response recorded after every frequency was already rated
    pub const ALREADY_COMPLETE: i32 = 2008;
}

/// Log a calibration error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_calibration_error(err: &CalibrationError, context: &str) {
    error!(
        "Calibration error in {}: code={}, component=CalibrationManager, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Calibration-related errors
///
/// Error code range: 2001-2008
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Headphone profile id not found
    UnknownProfile { id: String },

    /// Snapshot version not supported by this build
    IncompatibleVersion { found: String },

    /// Snapshot could not be decoded
    InvalidSnapshot { reason: String },

    /// Calibration state RwLock was poisoned
    StatePoisoned,

    /// Persistence store rejected the write
    PersistFailed { reason: String },

    /// Frequency is not part of the calibration sequence
    UnsupportedFrequency { frequency_hz: u32 },

    /// Not every calibration frequency has a comfort rating yet
    Incomplete { rated: usize, required: usize },

    /// Every calibration frequency is already rated
    AlreadyComplete,
}

impl ErrorCode for CalibrationError {
    fn code(&self) -> i32 {
        match self {
            CalibrationError::UnknownProfile { .. } => CalibrationErrorCodes::UNKNOWN_PROFILE,
            CalibrationError::IncompatibleVersion { .. } => {
                CalibrationErrorCodes::INCOMPATIBLE_VERSION
            }
            CalibrationError::InvalidSnapshot { .. } => CalibrationErrorCodes::INVALID_SNAPSHOT,
            CalibrationError::StatePoisoned => CalibrationErrorCodes::STATE_POISONED,
            CalibrationError::PersistFailed { .. } => CalibrationErrorCodes::PERSIST_FAILED,
            CalibrationError::UnsupportedFrequency { .. } => {
                CalibrationErrorCodes::UNSUPPORTED_FREQUENCY
            }
            CalibrationError::Incomplete { .. } => CalibrationErrorCodes::INCOMPLETE,
            CalibrationError::AlreadyComplete => CalibrationErrorCodes::ALREADY_COMPLETE,
        }
    }

    fn message(&self) -> String {
        match self {
            CalibrationError::UnknownProfile { id } => {
                format!("Unknown headphone profile: {}", id)
            }
            CalibrationError::IncompatibleVersion { found } => {
                format!("Incompatible calibration data version: {}", found)
            }
            CalibrationError::InvalidSnapshot { reason } => {
                format!("Invalid calibration snapshot: {}", reason)
            }
            CalibrationError::StatePoisoned => "Calibration state lock poisoned".to_string(),
            CalibrationError::PersistFailed { reason } => {
                format!("Failed to persist calibration: {}", reason)
            }
            CalibrationError::UnsupportedFrequency { frequency_hz } => {
                format!("Frequency {} Hz is not part of calibration", frequency_hz)
            }
            CalibrationError::Incomplete { rated, required } => {
                format!("Calibration incomplete: rated {} of {} frequencies", rated, required)
            }
            CalibrationError::AlreadyComplete => {
                "Every calibration frequency is already rated".to_string()
            }
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalibrationError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CalibrationError {}

impl From<serde_json::Error> for CalibrationError {
    fn from(err: serde_json::Error) -> Self {
        CalibrationError::InvalidSnapshot {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_error_codes() {
        assert_eq!(
            CalibrationError::UnknownProfile {
                id: "x".to_string()
            }
            .code(),
            2001
        );
        assert_eq!(
            CalibrationError::IncompatibleVersion {
                found: "2.0".to_string()
            }
            .code(),
            2002
        );
        assert_eq!(
            CalibrationError::InvalidSnapshot {
                reason: "test".to_string()
            }
            .code(),
            2003
        );
        assert_eq!(CalibrationError::StatePoisoned.code(), 2004);
        assert_eq!(
            CalibrationError::PersistFailed {
                reason: "disk".to_string()
            }
            .code(),
            2005
        );
        assert_eq!(
            CalibrationError::UnsupportedFrequency { frequency_hz: 3000 }.code(),
            2006
        );
        assert_eq!(
            CalibrationError::Incomplete {
                rated: 2,
                required: 5
            }
            .code(),
            2007
        );
        assert_eq!(CalibrationError::AlreadyComplete.code(), 2008);
    }

    #[test]
    fn test_calibration_error_messages() {
        let err = CalibrationError::UnknownProfile {
            id: "koss-porta-pro".to_string(),
        };
        assert_eq!(err.message(), "Unknown headphone profile: koss-porta-pro");

        let err = CalibrationError::IncompatibleVersion {
            found: "2.0".to_string(),
        };
        assert!(err.message().contains("Incompatible"));
        assert!(err.message().contains("2.0"));

        let err = CalibrationError::StatePoisoned;
        assert!(err.message().contains("poisoned"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CalibrationError = json_err.into();
        assert_eq!(err.code(), CalibrationErrorCodes::INVALID_SNAPSHOT);
    }

    #[test]
    fn test_calibration_error_display() {
        let err = CalibrationError::StatePoisoned;
        let display = format!("{}", err);
        assert!(display.contains("CalibrationError"));
        assert!(display.contains(&err.code().to_string()));
    }
}
