// Hearing module - frequency identification test and audiogram interpretation
//
// 1. stimulus: labeled stimulus catalogue and the standard/extended sets
// 2. frequency_test: fixed-order forced-choice state machine
// 3. audiogram: pattern classifier, speech intelligibility and report
// 4. session: async driver that plays each tone at the calibrated gain

pub mod audiogram;
pub mod frequency_test;
pub mod session;
pub mod stimulus;

use serde::Serialize;

pub use audiogram::{
    classify, generate_report, speech_intelligibility, AudiogramReport, DetectionMap,
    HearingPattern, SpeechIntelligibility, Urgency,
};
pub use frequency_test::{FrequencyTestState, ResponseOutcome};
pub use session::{HearingSession, StimulusPresentation};
pub use stimulus::{FrequencySet, HearingStimulus, EXTENDED_FREQUENCIES};

/// Hearing sub-test result carried by a screening record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HearingOutcome {
    pub per_frequency_detected: DetectionMap,
    pub pass: bool,
    /// Present for the extended 5-frequency protocol only
    pub audiogram_report: Option<AudiogramReport>,
}

impl HearingOutcome {
    /// Derive the outcome from a frequency test snapshot
    pub fn from_state(state: &FrequencyTestState) -> Self {
        let per_frequency_detected = state.detected_by_frequency();
        let audiogram_report = match state.frequency_set() {
            FrequencySet::Extended => Some(generate_report(&per_frequency_detected)),
            FrequencySet::Standard => None,
        };

        Self {
            per_frequency_detected,
            pass: state.passed(),
            audiogram_report,
        }
    }
}
