// Audio module - injected playback and ambient-input capabilities
//
// The engines never touch a global audio context or microphone. Callers
// construct a player/input handle and pass it in, which lets tests and the
// CLI substitute the stubs in `stubs`.

pub mod stubs;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::AudioError;

pub use stubs::{RecordingPlayer, ScriptedAmbientInput};

/// A pure-tone playback request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneRequest {
    pub frequency_hz: u32,
    /// Linear amplitude multiplier from the gain resolver (always > 0)
    pub linear_gain: f64,
    pub duration_ms: u64,
}

/// Output device capable of playing a pure tone
///
/// The returned future resolves when playback has ended.
pub trait StimulusPlayer: Send + Sync {
    fn play(&self, tone: ToneRequest) -> BoxFuture<'_, Result<(), AudioError>>;
}

/// Microphone-style input exposing a continuous energy reading
pub trait AmbientInput: Send + Sync {
    /// Instantaneous ambient level in dB SPL (estimated)
    fn current_level_db(&self) -> Result<f32, AudioError>;
}
