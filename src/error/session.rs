// Test session error types and constants

use crate::error::{AudioError, ErrorCode};
use log::error;
use std::fmt;

/// Test session error code constants
///
/// Error code range: 3001-3007
pub struct SessionErrorCodes {}

impl SessionErrorCodes {
    /// Response received after the test reached its terminal state
    pub const TEST_COMPLETE: i32 = 3001;

    /// Response received while no stimulus is awaiting one
    pub const NO_STIMULUS_PENDING: i32 = 3002;

    /// Next stimulus requested while the current one still awaits a response
    pub const RESPONSE_PENDING: i32 = 3003;

    /// Response label is not one of the session's stimulus labels
    pub const UNKNOWN_LABEL: i32 = 3004;

    /// Subject reference not found in the record store
    pub const SUBJECT_NOT_FOUND: i32 = 3005;

    /// Record store or result sink rejected an operation
    pub const STORAGE_FAILED: i32 = 3006;

    /// Playback device failed to present a stimulus
    pub const STIMULUS_FAILED: i32 = 3007;
}

/// Log a session error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_session_error(err: &SessionError, context: &str) {
    error!(
        "Session error in {}: code={}, component=TestSession, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised by the vision/hearing engines and the screening flow
///
/// Rejected transitions always leave engine state unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Test already complete; input ignored
    TestComplete,

    /// No stimulus has been presented yet
    NoStimulusPending,

    /// Current stimulus has not been answered
    ResponsePending,

    /// Response label not in the stimulus set
    UnknownLabel { label: String },

    /// Subject not found
    SubjectNotFound { subject_id: String },

    /// Collaborator storage failure
    StorageFailed { reason: String },

    /// Stimulus could not be played
    StimulusFailed { reason: String },
}

impl ErrorCode for SessionError {
    fn code(&self) -> i32 {
        match self {
            SessionError::TestComplete => SessionErrorCodes::TEST_COMPLETE,
            SessionError::NoStimulusPending => SessionErrorCodes::NO_STIMULUS_PENDING,
            SessionError::ResponsePending => SessionErrorCodes::RESPONSE_PENDING,
            SessionError::UnknownLabel { .. } => SessionErrorCodes::UNKNOWN_LABEL,
            SessionError::SubjectNotFound { .. } => SessionErrorCodes::SUBJECT_NOT_FOUND,
            SessionError::StorageFailed { .. } => SessionErrorCodes::STORAGE_FAILED,
            SessionError::StimulusFailed { .. } => SessionErrorCodes::STIMULUS_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            SessionError::TestComplete => {
                "Test already complete. Start a retest to continue.".to_string()
            }
            SessionError::NoStimulusPending => {
                "No stimulus pending. Present the next stimulus first.".to_string()
            }
            SessionError::ResponsePending => {
                "Current stimulus still awaiting a response".to_string()
            }
            SessionError::UnknownLabel { label } => {
                format!("Unknown response label: {}", label)
            }
            SessionError::SubjectNotFound { subject_id } => {
                format!("Subject not found: {}", subject_id)
            }
            SessionError::StorageFailed { reason } => {
                format!("Storage operation failed: {}", reason)
            }
            SessionError::StimulusFailed { reason } => {
                format!("Stimulus playback failed: {}", reason)
            }
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SessionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SessionError {}

impl From<AudioError> for SessionError {
    fn from(err: AudioError) -> Self {
        SessionError::StimulusFailed {
            reason: err.message(),
        }
    }
}
