// VisionSession - async driver around the staircase engine
//
// Shows one optotype at a time, scores the answer, then holds the feedback
// display before the next optotype becomes current.

use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;

use crate::config::VisionConfig;
use crate::error::{log_session_error, SessionError};
use crate::telemetry::{self, TestKind};
use crate::vision::scoring::VisionOutcome;
use crate::vision::staircase::{Orientation, StaircaseEngine, StaircasePhase, TrialOutcome};

/// Optotype to render
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Optotype {
    pub trial: usize,
    pub level_index: usize,
    pub logmar: f64,
    pub orientation: Orientation,
}

pub struct VisionSession<R: Rng = StdRng> {
    engine: StaircaseEngine<R>,
    config: VisionConfig,
}

impl VisionSession<StdRng> {
    pub fn new(age_years: u32, config: VisionConfig) -> Self {
        Self::with_engine(StaircaseEngine::new(age_years), config)
    }
}

impl<R: Rng> VisionSession<R> {
    pub fn with_engine(engine: StaircaseEngine<R>, config: VisionConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &StaircaseEngine<R> {
        &self.engine
    }

    pub fn is_complete(&self) -> bool {
        self.engine.phase() == StaircasePhase::Complete
    }

    /// Optotype currently shown, `None` once complete
    pub fn current_optotype(&self) -> Option<Optotype> {
        let orientation = self.engine.current_orientation()?;
        let state = self.engine.state();
        Some(Optotype {
            trial: state.trial_history.len() + 1,
            level_index: state.current_level_index,
            logmar: state.current_logmar(),
            orientation,
        })
    }

    /// Score an answer and wait out the feedback display
    ///
    /// # Errors
    /// - `TestComplete` once the staircase has terminated
    pub async fn respond(&mut self, answer: Orientation) -> Result<TrialOutcome, SessionError> {
        if let Some(optotype) = self.current_optotype() {
            telemetry::hub().record_stimulus(
                TestKind::Vision,
                optotype.orientation.label(),
                optotype.trial,
            );
        }

        let outcome = self.engine.respond(answer).inspect_err(|err| {
            log_session_error(err, "vision_respond");
            telemetry::hub().record_error(err, "vision_respond");
        })?;
        telemetry::hub().record_response(TestKind::Vision, outcome.correct, outcome.trial);

        tokio::time::sleep(self.config.feedback()).await;

        if outcome.phase == StaircasePhase::Complete {
            let result = VisionOutcome::from_state(self.engine.state());
            log::info!(
                "[Vision] Test complete: logMAR {:.1} ({}) pass={}",
                result.logmar,
                result.snellen_equivalent,
                result.pass
            );
            telemetry::hub().record_completion(TestKind::Vision, result.pass, outcome.trial);
        }

        Ok(outcome)
    }

    /// Drive the staircase to completion, asking `responder` for each answer
    #[tracing::instrument(skip_all, fields(start_logmar = self.engine.current_logmar()))]
    pub async fn run<F>(&mut self, mut responder: F) -> Result<VisionOutcome, SessionError>
    where
        F: FnMut(&Optotype) -> Orientation,
    {
        while let Some(optotype) = self.current_optotype() {
            let answer = responder(&optotype);
            self.respond(answer).await?;
        }
        Ok(VisionOutcome::from_state(self.engine.state()))
    }

    /// Outcome once complete
    pub fn outcome(&self) -> Option<VisionOutcome> {
        self.is_complete()
            .then(|| VisionOutcome::from_state(self.engine.state()))
    }

    /// Score whatever has been answered so far (abandoned tests)
    pub fn partial_outcome(&self) -> VisionOutcome {
        VisionOutcome::from_state(self.engine.state())
    }

    pub fn retest(&mut self) {
        log::info!("[Vision] Retest requested");
        self.engine.retest();
    }
}
