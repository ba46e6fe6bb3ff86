// Device error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Audio device error code constants
///
/// Single source of truth for the numeric codes surfaced by playback and
/// ambient-input capabilities.
///
/// Error code range: 1001-1004
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// Tone playback failed on the output device
    pub const PLAYBACK_FAILED: i32 = 1001;

    /// Ambient input (microphone) is not available or not initialized
    pub const INPUT_UNAVAILABLE: i32 = 1002;

    /// Output device is already playing a stimulus
    pub const DEVICE_BUSY: i32 = 1003;

    /// Mutex/RwLock was poisoned
    pub const LOCK_POISONED: i32 = 1004;
}

/// Log a device error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=AudioDevice, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors reported by the injected playback and ambient-input devices
///
/// Error code range: 1001-1004
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Tone playback failed
    PlaybackFailed { reason: String },

    /// Ambient input not available
    InputUnavailable,

    /// Output device already busy with another stimulus
    DeviceBusy,

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::PlaybackFailed { .. } => AudioErrorCodes::PLAYBACK_FAILED,
            AudioError::InputUnavailable => AudioErrorCodes::INPUT_UNAVAILABLE,
            AudioError::DeviceBusy => AudioErrorCodes::DEVICE_BUSY,
            AudioError::LockPoisoned { .. } => AudioErrorCodes::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::PlaybackFailed { reason } => {
                format!("Tone playback failed: {}", reason)
            }
            AudioError::InputUnavailable => {
                "Ambient input not available. Initialize the microphone first.".to_string()
            }
            AudioError::DeviceBusy => "Output device is busy playing a stimulus".to_string(),
            AudioError::LockPoisoned { component } => {
                format!("Lock poisoned for component: {}", component)
            }
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}

/// Convert from std::io::Error to AudioError
impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::PlaybackFailed {
            reason: err.to_string(),
        }
    }
}
