// BiologicalCalibrationProcedure - comfort rating workflow
//
// A listener with known normal hearing hears one tone per calibration
// frequency at the currently resolved gain and rates it too quiet, comfortable
// or too loud. The procedure walks the frequencies in fixed order:
// 500 → 1000 → 2000 → 4000 → 8000 Hz, then finalizes into a
// BiologicalCalibration that replaces any previous one wholesale.

use std::collections::BTreeMap;

use crate::audio::ToneRequest;
use crate::calibration::gain::resolve_gain;
use crate::calibration::state::{BiologicalCalibration, CalibrationState, ComfortResponse};
use crate::error::CalibrationError;

/// Frequencies rated during biological calibration
pub const CALIBRATION_FREQUENCIES: [u32; 5] = [500, 1000, 2000, 4000, 8000];

/// Length of each calibration tone
pub const CALIBRATION_TONE_MS: u64 = 2000;

/// Progress information for the current calibration step
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CalibrationProgress {
    /// Frequency awaiting a rating, `None` once every frequency is rated
    pub current_frequency: Option<u32>,
    pub rated: usize,
    pub total: usize,
}

impl CalibrationProgress {
    pub fn is_complete(&self) -> bool {
        self.rated >= self.total
    }
}

/// Collects comfort ratings frequency by frequency
#[derive(Debug, Clone, Default)]
pub struct BiologicalCalibrationProcedure {
    responses: BTreeMap<u32, ComfortResponse>,
    current_index: usize,
}

impl BiologicalCalibrationProcedure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frequency awaiting a rating
    pub fn current_frequency(&self) -> Option<u32> {
        CALIBRATION_FREQUENCIES.get(self.current_index).copied()
    }

    /// Tone to play for the current frequency under `state`
    pub fn current_tone(&self, state: &CalibrationState) -> Option<ToneRequest> {
        self.current_frequency().map(|frequency_hz| ToneRequest {
            frequency_hz,
            linear_gain: resolve_gain(frequency_hz, state),
            duration_ms: CALIBRATION_TONE_MS,
        })
    }

    /// Rate the current frequency and advance
    ///
    /// # Errors
    /// - `AlreadyComplete` once every frequency is rated
    pub fn record_response(
        &mut self,
        response: ComfortResponse,
    ) -> Result<CalibrationProgress, CalibrationError> {
        let frequency_hz = self
            .current_frequency()
            .ok_or(CalibrationError::AlreadyComplete)?;
        self.record_for(frequency_hz, response)
    }

    /// Rate a specific calibration frequency (re-rating overwrites)
    ///
    /// The cursor moves to the first frequency still lacking a rating.
    pub fn record_for(
        &mut self,
        frequency_hz: u32,
        response: ComfortResponse,
    ) -> Result<CalibrationProgress, CalibrationError> {
        if !CALIBRATION_FREQUENCIES.contains(&frequency_hz) {
            return Err(CalibrationError::UnsupportedFrequency { frequency_hz });
        }

        self.responses.insert(frequency_hz, response);
        self.current_index = CALIBRATION_FREQUENCIES
            .iter()
            .position(|f| !self.responses.contains_key(f))
            .unwrap_or(CALIBRATION_FREQUENCIES.len());

        log::debug!(
            "[Calibration] {} Hz rated {:?} ({}/{})",
            frequency_hz,
            response,
            self.responses.len(),
            CALIBRATION_FREQUENCIES.len()
        );

        Ok(self.progress())
    }

    pub fn progress(&self) -> CalibrationProgress {
        CalibrationProgress {
            current_frequency: self.current_frequency(),
            rated: self.responses.len(),
            total: CALIBRATION_FREQUENCIES.len(),
        }
    }

    /// Convert the collected ratings into a biological calibration
    pub fn finalize(self) -> Result<BiologicalCalibration, CalibrationError> {
        if self.responses.len() < CALIBRATION_FREQUENCIES.len() {
            return Err(CalibrationError::Incomplete {
                rated: self.responses.len(),
                required: CALIBRATION_FREQUENCIES.len(),
            });
        }
        Ok(BiologicalCalibration::from_responses(self.responses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::gain::BASE_GAIN;
    use crate::calibration::profiles::DevicePlatform;

    #[test]
    fn test_walks_frequencies_in_order() {
        let mut procedure = BiologicalCalibrationProcedure::new();
        let mut seen = Vec::new();

        while let Some(freq) = procedure.current_frequency() {
            seen.push(freq);
            procedure
                .record_response(ComfortResponse::Comfortable)
                .unwrap();
        }

        assert_eq!(seen, CALIBRATION_FREQUENCIES.to_vec());
        assert!(procedure.progress().is_complete());
    }

    #[test]
    fn test_finalize_maps_ratings_to_adjustments() {
        let mut procedure = BiologicalCalibrationProcedure::new();
        let ratings = [
            ComfortResponse::Comfortable,
            ComfortResponse::TooLoud,
            ComfortResponse::TooQuiet,
            ComfortResponse::Comfortable,
            ComfortResponse::TooLoud,
        ];
        for rating in ratings {
            procedure.record_response(rating).unwrap();
        }

        let bio = procedure.finalize().unwrap();
        assert_eq!(bio.adjustment_db(500), Some(0.0));
        assert_eq!(bio.adjustment_db(1000), Some(-2.0));
        assert_eq!(bio.adjustment_db(2000), Some(1.0));
        assert_eq!(bio.adjustment_db(8000), Some(-2.0));
    }

    #[test]
    fn test_finalize_incomplete_rejected() {
        let mut procedure = BiologicalCalibrationProcedure::new();
        procedure
            .record_response(ComfortResponse::Comfortable)
            .unwrap();

        match procedure.finalize() {
            Err(CalibrationError::Incomplete { rated, required }) => {
                assert_eq!(rated, 1);
                assert_eq!(required, 5);
            }
            other => panic!("Expected Incomplete, got {:?}", other),
        }
    }

    #[test]
    fn test_record_after_complete_rejected() {
        let mut procedure = BiologicalCalibrationProcedure::new();
        for _ in CALIBRATION_FREQUENCIES {
            procedure
                .record_response(ComfortResponse::Comfortable)
                .unwrap();
        }
        assert_eq!(
            procedure.record_response(ComfortResponse::TooLoud),
            Err(CalibrationError::AlreadyComplete)
        );
        assert_eq!(procedure.progress().rated, 5);
    }

    #[test]
    fn test_record_for_unsupported_frequency() {
        let mut procedure = BiologicalCalibrationProcedure::new();
        assert_eq!(
            procedure.record_for(3000, ComfortResponse::Comfortable),
            Err(CalibrationError::UnsupportedFrequency { frequency_hz: 3000 })
        );
    }

    #[test]
    fn test_rerating_moves_cursor_to_first_gap() {
        let mut procedure = BiologicalCalibrationProcedure::new();
        procedure
            .record_for(1000, ComfortResponse::TooLoud)
            .unwrap();
        assert_eq!(procedure.current_frequency(), Some(500));
        procedure
            .record_for(500, ComfortResponse::Comfortable)
            .unwrap();
        assert_eq!(procedure.current_frequency(), Some(2000));
    }

    #[test]
    fn test_current_tone_uses_resolved_gain() {
        let procedure = BiologicalCalibrationProcedure::new();
        let state = CalibrationState::new(DevicePlatform::Unknown);
        let tone = procedure.current_tone(&state).unwrap();

        assert_eq!(tone.frequency_hz, 500);
        assert_eq!(tone.linear_gain, BASE_GAIN);
        assert_eq!(tone.duration_ms, CALIBRATION_TONE_MS);
    }
}
