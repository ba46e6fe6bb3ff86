// StaircaseEngine - adaptive logMAR staircase for optotype acuity
//
// The staircase moves one level harder after a correct answer and one level
// easier after a miss, clamped to the level table. A reversal is counted
// whenever correctness flips relative to the previous answer. The test ends
// after 4 reversals or 20 trials, whichever comes first.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// logMAR values by level index; index 0 is the smallest (hardest) optotype
pub const LOGMAR_LEVELS: [f64; 11] = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

/// Highest (easiest) level index
pub const MAX_LEVEL_INDEX: usize = LOGMAR_LEVELS.len() - 1;

pub const MAX_REVERSALS: u32 = 4;
pub const MAX_TRIALS: usize = 20;

/// Starting level index by age band
///
/// Younger children start on larger optotypes.
pub fn starting_level_index(age_years: u32) -> usize {
    match age_years {
        0..=4 => 7,
        5..=7 => 5,
        _ => 3,
    }
}

/// Optotype orientation (tumbling E / Landolt C direction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Up,
    Down,
    Left,
    Right,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Up,
        Orientation::Down,
        Orientation::Left,
        Orientation::Right,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "up" => Some(Orientation::Up),
            "down" => Some(Orientation::Down),
            "left" => Some(Orientation::Left),
            "right" => Some(Orientation::Right),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Orientation::Up => "up",
            Orientation::Down => "down",
            Orientation::Left => "left",
            Orientation::Right => "right",
        }
    }
}

/// One answered trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    pub level_index: usize,
    pub correct: bool,
}

/// Per-attempt staircase state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaircaseState {
    pub current_level_index: usize,
    pub reversal_count: u32,
    pub last_response_correct: Option<bool>,
    pub trial_history: Vec<Trial>,
}

impl StaircaseState {
    /// Fresh state at `start_index` (clamped to the level table)
    pub fn new(start_index: usize) -> Self {
        Self {
            current_level_index: start_index.min(MAX_LEVEL_INDEX),
            reversal_count: 0,
            last_response_correct: None,
            trial_history: Vec::new(),
        }
    }

    pub fn for_age(age_years: u32) -> Self {
        Self::new(starting_level_index(age_years))
    }

    pub fn is_complete(&self) -> bool {
        self.reversal_count >= MAX_REVERSALS || self.trial_history.len() >= MAX_TRIALS
    }

    pub fn current_logmar(&self) -> f64 {
        LOGMAR_LEVELS[self.current_level_index]
    }

    /// Pure transition: the state after one more answer
    ///
    /// Callers must check `is_complete` first; the engine does.
    pub fn apply_response(&self, correct: bool) -> Self {
        let mut next = self.clone();
        next.trial_history.push(Trial {
            level_index: self.current_level_index,
            correct,
        });

        if matches!(self.last_response_correct, Some(previous) if previous != correct) {
            next.reversal_count += 1;
        }
        next.last_response_correct = Some(correct);

        next.current_level_index = if correct {
            self.current_level_index.saturating_sub(1)
        } else {
            (self.current_level_index + 1).min(MAX_LEVEL_INDEX)
        };

        next
    }
}

/// Observable engine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StaircasePhase {
    AwaitingResponse,
    Complete,
}

/// Result of one answered trial
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrialOutcome {
    pub trial: usize,
    pub presented: Orientation,
    pub correct: bool,
    pub next_level_index: usize,
    pub reversals: u32,
    pub phase: StaircasePhase,
}

/// Staircase state plus the orientation currently shown
pub struct StaircaseEngine<R: Rng = StdRng> {
    age_years: u32,
    state: StaircaseState,
    orientation: Orientation,
    rng: R,
}

impl StaircaseEngine<StdRng> {
    /// Engine with an entropy-seeded orientation source
    pub fn new(age_years: u32) -> Self {
        Self::with_rng(age_years, StdRng::from_entropy())
    }
}

impl<R: Rng> StaircaseEngine<R> {
    pub fn with_rng(age_years: u32, mut rng: R) -> Self {
        let orientation = Orientation::random(&mut rng);
        Self {
            age_years,
            state: StaircaseState::for_age(age_years),
            orientation,
            rng,
        }
    }

    pub fn state(&self) -> &StaircaseState {
        &self.state
    }

    pub fn phase(&self) -> StaircasePhase {
        if self.state.is_complete() {
            StaircasePhase::Complete
        } else {
            StaircasePhase::AwaitingResponse
        }
    }

    /// Orientation currently shown, `None` once complete
    pub fn current_orientation(&self) -> Option<Orientation> {
        (!self.state.is_complete()).then_some(self.orientation)
    }

    pub fn current_logmar(&self) -> f64 {
        self.state.current_logmar()
    }

    /// Score the subject's answer against the shown orientation
    ///
    /// # Errors
    /// - `TestComplete` once the staircase has terminated (state unchanged)
    pub fn respond(&mut self, answer: Orientation) -> Result<TrialOutcome, SessionError> {
        let correct = answer == self.orientation;
        self.record(correct)
    }

    /// Record correctness directly (examiner-scored trials)
    pub fn record(&mut self, correct: bool) -> Result<TrialOutcome, SessionError> {
        if self.state.is_complete() {
            return Err(SessionError::TestComplete);
        }

        let presented = self.orientation;
        self.state = self.state.apply_response(correct);
        if !self.state.is_complete() {
            self.orientation = Orientation::random(&mut self.rng);
        }

        Ok(TrialOutcome {
            trial: self.state.trial_history.len(),
            presented,
            correct,
            next_level_index: self.state.current_level_index,
            reversals: self.state.reversal_count,
            phase: self.phase(),
        })
    }

    /// Discard the attempt and restart from the age-banded start level
    pub fn retest(&mut self) {
        self.state = StaircaseState::for_age(self.age_years);
        self.orientation = Orientation::random(&mut self.rng);
    }
}
