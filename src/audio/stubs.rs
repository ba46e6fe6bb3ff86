//! Stub devices for desktop testing and the CLI
//!
//! `RecordingPlayer` stands in for the tone generator: it waits out the tone
//! duration on the tokio clock and remembers every request. `ScriptedAmbientInput`
//! replays a fixed sequence of ambient levels.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::{AmbientInput, StimulusPlayer, ToneRequest};
use crate::error::AudioError;

/// Player that records requests instead of producing sound
#[derive(Default)]
pub struct RecordingPlayer {
    played: Mutex<Vec<ToneRequest>>,
    playing: AtomicBool,
    fail_with: Option<String>,
}

impl RecordingPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Player whose every request fails with `PlaybackFailed`
    pub fn failing(reason: &str) -> Self {
        Self {
            fail_with: Some(reason.to_string()),
            ..Self::default()
        }
    }

    /// Requests played so far, in order
    pub fn played(&self) -> Vec<ToneRequest> {
        self.played
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

/// Releases the busy flag however the play future ends
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl StimulusPlayer for RecordingPlayer {
    fn play(&self, tone: ToneRequest) -> BoxFuture<'_, Result<(), AudioError>> {
        async move {
            if let Some(reason) = &self.fail_with {
                return Err(AudioError::PlaybackFailed {
                    reason: reason.clone(),
                });
            }
            if self.playing.swap(true, Ordering::SeqCst) {
                return Err(AudioError::DeviceBusy);
            }
            let _busy = BusyGuard(&self.playing);

            self.played
                .lock()
                .map_err(|_| AudioError::LockPoisoned {
                    component: "RecordingPlayer".to_string(),
                })?
                .push(tone);
            tokio::time::sleep(Duration::from_millis(tone.duration_ms)).await;
            Ok(())
        }
        .boxed()
    }
}

/// Ambient input replaying scripted levels, then holding a fallback level
pub struct ScriptedAmbientInput {
    levels: Mutex<VecDeque<f32>>,
    fallback: f32,
}

impl ScriptedAmbientInput {
    pub fn new<I: IntoIterator<Item = f32>>(levels: I, fallback: f32) -> Self {
        Self {
            levels: Mutex::new(levels.into_iter().collect()),
            fallback,
        }
    }

    /// Input that always reads `level`
    pub fn constant(level: f32) -> Self {
        Self::new(std::iter::empty(), level)
    }
}

impl AmbientInput for ScriptedAmbientInput {
    fn current_level_db(&self) -> Result<f32, AudioError> {
        let mut levels = self
            .levels
            .lock()
            .map_err(|_| AudioError::LockPoisoned {
                component: "ScriptedAmbientInput".to_string(),
            })?;
        Ok(levels.pop_front().unwrap_or(self.fallback))
    }
}
