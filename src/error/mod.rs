// Error types for the screening engine
//
// This module defines custom error types for device, calibration and test
// session operations, each carrying a stable numeric code so the surrounding
// flow can surface failures to the operator without string matching.

mod audio;
mod calibration;
mod session;

pub use audio::{log_audio_error, AudioError, AudioErrorCodes};
pub use calibration::{log_calibration_error, CalibrationError, CalibrationErrorCodes};
pub use session::{log_session_error, SessionError, SessionErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the engine boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_trait_objects() {
        let errors: Vec<Box<dyn ErrorCode>> = vec![
            Box::new(AudioError::InputUnavailable),
            Box::new(CalibrationError::StatePoisoned),
            Box::new(SessionError::TestComplete),
        ];

        let codes: Vec<i32> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(
            codes,
            vec![
                AudioErrorCodes::INPUT_UNAVAILABLE,
                CalibrationErrorCodes::STATE_POISONED,
                SessionErrorCodes::TEST_COMPLETE
            ]
        );
    }

    #[test]
    fn test_error_propagation() {
        fn may_fail() -> Result<(), SessionError> {
            Err(SessionError::NoStimulusPending)
        }

        fn caller() -> Result<(), SessionError> {
            may_fail()?;
            Ok(())
        }

        assert!(caller().is_err());
    }
}
