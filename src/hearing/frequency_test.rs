// FrequencyTestState - fixed-order forced-choice frequency identification
//
// Stimuli are presented strictly in list order. Each response names one of
// the stimulus labels in the set; it is correct when it names the stimulus
// just presented. There is no adaptivity: the state is terminal once every
// stimulus has a response.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::SessionError;
use crate::hearing::stimulus::{FrequencySet, HearingStimulus};

/// Result of one recorded response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseOutcome {
    pub stimulus_id: &'static str,
    pub frequency_hz: u32,
    pub chosen: String,
    pub correct: bool,
    /// True when this response completed the test
    pub complete: bool,
}

/// Per-attempt frequency identification state
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyTestState {
    set: FrequencySet,
    ordered_stimuli: Vec<&'static HearingStimulus>,
    current_index: usize,
    responses: BTreeMap<&'static str, bool>,
}

impl FrequencyTestState {
    pub fn new(set: FrequencySet) -> Self {
        Self {
            set,
            ordered_stimuli: set.stimuli(),
            current_index: 0,
            responses: BTreeMap::new(),
        }
    }

    pub fn frequency_set(&self) -> FrequencySet {
        self.set
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.ordered_stimuli.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_stimuli.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.ordered_stimuli.len()
    }

    /// Stimulus awaiting a response, `None` once complete
    pub fn current_stimulus(&self) -> Option<&'static HearingStimulus> {
        self.ordered_stimuli.get(self.current_index).copied()
    }

    /// Labels offered for every forced choice
    pub fn choices(&self) -> Vec<&'static str> {
        self.ordered_stimuli.iter().map(|s| s.id).collect()
    }

    /// Record the subject's choice for the current stimulus
    ///
    /// # Errors
    /// - `TestComplete` once every stimulus has been answered
    /// - `UnknownLabel` if `chosen` is not a label in this set
    ///
    /// State is unchanged on error.
    pub fn record_response(&mut self, chosen: &str) -> Result<ResponseOutcome, SessionError> {
        let stimulus = self.current_stimulus().ok_or(SessionError::TestComplete)?;

        if !self.ordered_stimuli.iter().any(|s| s.id == chosen) {
            return Err(SessionError::UnknownLabel {
                label: chosen.to_string(),
            });
        }

        let correct = chosen == stimulus.id;
        self.responses.insert(stimulus.id, correct);
        self.current_index += 1;

        Ok(ResponseOutcome {
            stimulus_id: stimulus.id,
            frequency_hz: stimulus.frequency_hz,
            chosen: chosen.to_string(),
            correct,
            complete: self.is_complete(),
        })
    }

    /// Responses keyed by stimulus id
    pub fn responses(&self) -> &BTreeMap<&'static str, bool> {
        &self.responses
    }

    /// Detection by frequency for every stimulus in the set
    ///
    /// Unanswered stimuli count as not detected.
    pub fn detected_by_frequency(&self) -> BTreeMap<u32, bool> {
        self.ordered_stimuli
            .iter()
            .map(|s| {
                (
                    s.frequency_hz,
                    self.responses.get(s.id).copied().unwrap_or(false),
                )
            })
            .collect()
    }

    /// Coarse pass: every stimulus in the set correctly identified
    pub fn passed(&self) -> bool {
        self.ordered_stimuli
            .iter()
            .all(|s| self.responses.get(s.id).copied().unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advances_in_list_order() {
        let mut state = FrequencyTestState::new(FrequencySet::Standard);
        assert_eq!(state.current_stimulus().unwrap().id, "dog");

        let outcome = state.record_response("dog").unwrap();
        assert!(outcome.correct);
        assert!(!outcome.complete);
        assert_eq!(state.current_stimulus().unwrap().id, "bird");

        state.record_response("bird").unwrap();
        let last = state.record_response("bell").unwrap();
        assert!(last.complete);
        assert!(state.is_complete());
        assert!(state.current_stimulus().is_none());
        assert!(state.passed());
    }

    #[test]
    fn test_wrong_label_is_incorrect() {
        let mut state = FrequencyTestState::new(FrequencySet::Standard);
        let outcome = state.record_response("bell").unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.frequency_hz, 1000);
        assert_eq!(state.detected_by_frequency()[&1000], false);
    }

    #[test]
    fn test_single_miss_fails_coarse_pass() {
        let mut state = FrequencyTestState::new(FrequencySet::Extended);
        for label in ["drum", "dog", "dog", "bell", "whistle"] {
            state.record_response(label).unwrap();
        }
        assert!(state.is_complete());
        assert!(!state.passed());
    }

    #[test]
    fn test_unknown_label_rejected_without_advancing() {
        let mut state = FrequencyTestState::new(FrequencySet::Standard);
        let before = state.clone();

        // drum is not offered in the standard set
        assert_eq!(
            state.record_response("drum"),
            Err(SessionError::UnknownLabel {
                label: "drum".to_string()
            })
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_responses_after_complete_rejected() {
        let mut state = FrequencyTestState::new(FrequencySet::Standard);
        for label in ["dog", "bird", "bell"] {
            state.record_response(label).unwrap();
        }
        let before = state.clone();

        assert_eq!(state.record_response("dog"), Err(SessionError::TestComplete));
        assert_eq!(state, before);
    }

    #[test]
    fn test_partial_test_reports_missing_as_not_detected() {
        let mut state = FrequencyTestState::new(FrequencySet::Extended);
        state.record_response("drum").unwrap();

        let detected = state.detected_by_frequency();
        assert_eq!(detected.len(), 5);
        assert!(detected[&500]);
        assert!(!detected[&8000]);
        assert!(!state.passed());
    }
}
