// HearingSession - async driver for one frequency identification attempt
//
// Each trial: pre-stimulus delay → tone at the calibrated gain → wait for the
// forced choice → feedback delay. Responses are only accepted after the tone
// has finished. The noise assessment is carried as an advisory flag and never
// blocks progress.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;

use crate::audio::{StimulusPlayer, ToneRequest};
use crate::calibration::gain::resolve_gain;
use crate::calibration::state::CalibrationState;
use crate::config::HearingConfig;
use crate::error::{log_session_error, SessionError};
use crate::hearing::frequency_test::{FrequencyTestState, ResponseOutcome};
use crate::hearing::stimulus::HearingStimulus;
use crate::hearing::HearingOutcome;
use crate::noise::NoiseAssessment;
use crate::telemetry::{self, TestKind};

/// What the UI shows while the subject chooses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StimulusPresentation {
    pub trial: usize,
    pub stimulus: &'static HearingStimulus,
    pub tone: ToneRequest,
    pub choices: Vec<&'static str>,
}

pub struct HearingSession {
    player: Arc<dyn StimulusPlayer>,
    calibration: Arc<RwLock<CalibrationState>>,
    config: HearingConfig,
    state: FrequencyTestState,
    awaiting_response: bool,
    environment: Option<NoiseAssessment>,
}

impl HearingSession {
    pub fn new(
        player: Arc<dyn StimulusPlayer>,
        calibration: Arc<RwLock<CalibrationState>>,
        config: HearingConfig,
    ) -> Self {
        let state = FrequencyTestState::new(config.frequency_set);
        Self {
            player,
            calibration,
            config,
            state,
            awaiting_response: false,
            environment: None,
        }
    }

    /// Attach the latest noise assessment (advisory only)
    pub fn set_environment(&mut self, assessment: NoiseAssessment) {
        if !assessment.acceptable {
            log::warn!("[Hearing] {}", assessment.recommendation);
        }
        self.environment = Some(assessment);
    }

    pub fn environment(&self) -> Option<&NoiseAssessment> {
        self.environment.as_ref()
    }

    /// False only when an attached assessment failed the threshold
    pub fn environment_acceptable(&self) -> bool {
        self.environment.as_ref().map_or(true, |a| a.acceptable)
    }

    pub fn state(&self) -> &FrequencyTestState {
        &self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.awaiting_response
    }

    fn tone_for(&self, stimulus: &HearingStimulus) -> ToneRequest {
        // Writers swap whole sub-objects, so a poisoned guard still holds a
        // consistent state
        let calibration = self
            .calibration
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        ToneRequest {
            frequency_hz: stimulus.frequency_hz,
            linear_gain: resolve_gain(stimulus.frequency_hz, &calibration),
            duration_ms: self.config.stimulus_duration_ms,
        }
    }

    /// Play the next stimulus and wait for it to finish
    ///
    /// # Errors
    /// - `TestComplete` once every stimulus has been answered
    /// - `ResponsePending` if the previous stimulus has no response yet
    /// - `StimulusFailed` if the player fails (the stimulus can be replayed)
    pub async fn present_next(&mut self) -> Result<StimulusPresentation, SessionError> {
        let stimulus = self.state.current_stimulus().ok_or_else(|| {
            let err = SessionError::TestComplete;
            log_session_error(&err, "hearing_present");
            err
        })?;
        if self.awaiting_response {
            let err = SessionError::ResponsePending;
            log_session_error(&err, "hearing_present");
            return Err(err);
        }

        tokio::time::sleep(self.config.pre_stimulus_delay()).await;

        let tone = self.tone_for(stimulus);
        self.player.play(tone).await.map_err(|err| {
            let err = SessionError::from(err);
            log_session_error(&err, "hearing_present");
            telemetry::hub().record_error(&err, "hearing_present");
            err
        })?;

        self.awaiting_response = true;
        let trial = self.state.current_index() + 1;
        telemetry::hub().record_stimulus(TestKind::Hearing, stimulus.id, trial);
        log::debug!(
            "[Hearing] Trial {}: {} ({} Hz, gain {:.4})",
            trial,
            stimulus.id,
            tone.frequency_hz,
            tone.linear_gain
        );

        Ok(StimulusPresentation {
            trial,
            stimulus,
            tone,
            choices: self.state.choices(),
        })
    }

    /// Record the subject's choice, then hold the feedback display
    ///
    /// # Errors
    /// - `TestComplete` after the last response
    /// - `NoStimulusPending` if nothing has been played since the last response
    /// - `UnknownLabel` for a label outside the set (stimulus stays pending)
    pub async fn respond(&mut self, chosen: &str) -> Result<ResponseOutcome, SessionError> {
        if self.state.is_complete() {
            let err = SessionError::TestComplete;
            log_session_error(&err, "hearing_respond");
            return Err(err);
        }
        if !self.awaiting_response {
            let err = SessionError::NoStimulusPending;
            log_session_error(&err, "hearing_respond");
            return Err(err);
        }

        let outcome = self
            .state
            .record_response(chosen)
            .inspect_err(|err| log_session_error(err, "hearing_respond"))?;
        self.awaiting_response = false;

        let trial = self.state.current_index();
        telemetry::hub().record_response(TestKind::Hearing, outcome.correct, trial);

        tokio::time::sleep(self.config.feedback()).await;

        if outcome.complete {
            let pass = self.state.passed();
            log::info!("[Hearing] Test complete: pass={}", pass);
            telemetry::hub().record_completion(TestKind::Hearing, pass, trial);
        }

        Ok(outcome)
    }

    /// Drive every remaining trial, asking `responder` for each choice
    #[tracing::instrument(skip_all, fields(frequency_set = %self.state.frequency_set()))]
    pub async fn run<F>(&mut self, mut responder: F) -> Result<HearingOutcome, SessionError>
    where
        F: FnMut(&StimulusPresentation) -> String,
    {
        while !self.state.is_complete() {
            let presentation = self.present_next().await?;
            let chosen = responder(&presentation);
            self.respond(&chosen).await?;
        }
        Ok(HearingOutcome::from_state(&self.state))
    }

    /// Outcome once complete
    pub fn outcome(&self) -> Option<HearingOutcome> {
        self.state
            .is_complete()
            .then(|| HearingOutcome::from_state(&self.state))
    }

    /// Discard all progress and start over with the same stimulus set
    pub fn retest(&mut self) {
        log::info!("[Hearing] Retest requested");
        self.state = FrequencyTestState::new(self.config.frequency_set);
        self.awaiting_response = false;
    }
}
