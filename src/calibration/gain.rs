// Gain resolution - composes calibration layers into one linear multiplier
//
// gain = BASE_GAIN × 10^(headphone_db/20) × 10^(device_db/20) × 10^(bio_db/20)
//
// Missing layers contribute 0 dB. Headphone corrections use the nearest table
// frequency; biological corrections match the exact frequency only.

use crate::calibration::profiles::device_profile;
use crate::calibration::state::CalibrationState;

/// Linear gain for the 30 dB HL screening level (-20 dB digital attenuation)
pub const BASE_GAIN: f64 = 0.1;

/// Convert a dB correction to a linear multiplier (always positive)
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Per-layer breakdown of a resolved gain
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct GainBreakdown {
    pub frequency_hz: u32,
    pub headphone_db: f64,
    pub device_db: f64,
    pub biological_db: f64,
    pub linear_gain: f64,
}

/// Resolve the playback gain for `frequency_hz`
pub fn resolve_gain(frequency_hz: u32, state: &CalibrationState) -> f64 {
    resolve_gain_breakdown(frequency_hz, state).linear_gain
}

/// Resolve the playback gain and report each layer's contribution
pub fn resolve_gain_breakdown(frequency_hz: u32, state: &CalibrationState) -> GainBreakdown {
    let headphone_db = state
        .selected_profile()
        .and_then(|profile| profile.nearest_correction_db(frequency_hz))
        .unwrap_or(0.0);

    let device_db = device_profile(state.device_platform)
        .map(|profile| profile.gain_adjustment_db)
        .unwrap_or(0.0);

    let biological_db = state
        .biological_calibration
        .as_ref()
        .and_then(|bio| bio.adjustment_db(frequency_hz))
        .unwrap_or(0.0);

    // Applied in fixed order: headphone, device, biological
    let mut linear_gain = BASE_GAIN;
    linear_gain *= db_to_linear(headphone_db);
    linear_gain *= db_to_linear(device_db);
    linear_gain *= db_to_linear(biological_db);

    GainBreakdown {
        frequency_hz,
        headphone_db,
        device_db,
        biological_db,
        linear_gain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::profiles::DevicePlatform;
    use crate::calibration::state::{BiologicalCalibration, ComfortResponse};

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_no_calibration_returns_base_gain() {
        let state = CalibrationState::new(DevicePlatform::Unknown);
        for freq in [250, 500, 1000, 2000, 4000, 8000, 12000] {
            assert_eq!(resolve_gain(freq, &state), BASE_GAIN);
        }

        // 0 dB platforms are also unity
        let ios = CalibrationState::new(DevicePlatform::Ios);
        assert!(approx_eq(resolve_gain(1000, &ios), BASE_GAIN));
    }

    #[test]
    fn test_multiplicative_composition() {
        let mut state = CalibrationState::new(DevicePlatform::Android);
        state.selected_profile_id = Some("sony-wh1000xm4".to_string());
        state.biological_calibration = Some(BiologicalCalibration::from_responses([(
            2000,
            ComfortResponse::TooLoud,
        )]));

        let expected =
            BASE_GAIN * db_to_linear(-1.5) * db_to_linear(-1.0) * db_to_linear(-2.0);
        assert!(approx_eq(resolve_gain(2000, &state), expected));

        let breakdown = resolve_gain_breakdown(2000, &state);
        assert_eq!(breakdown.headphone_db, -1.5);
        assert_eq!(breakdown.device_db, -1.0);
        assert_eq!(breakdown.biological_db, -2.0);
    }

    #[test]
    fn test_headphone_plus_bio_differs_from_bio_alone() {
        let bio = BiologicalCalibration::from_responses([(1000, ComfortResponse::TooQuiet)]);

        let mut bio_only = CalibrationState::new(DevicePlatform::Macos);
        bio_only.biological_calibration = Some(bio.clone());

        let mut both = bio_only.clone();
        both.selected_profile_id = Some("apple-airpods".to_string());

        let gain_bio = resolve_gain(1000, &bio_only);
        let gain_both = resolve_gain(1000, &both);

        assert!(approx_eq(gain_bio, BASE_GAIN * db_to_linear(1.0)));
        assert!(approx_eq(gain_both, gain_bio * db_to_linear(-1.5)));
        assert!(gain_both < gain_bio);
    }

    #[test]
    fn test_biological_requires_exact_frequency() {
        let mut state = CalibrationState::new(DevicePlatform::Unknown);
        state.biological_calibration = Some(BiologicalCalibration::from_responses([(
            1000,
            ComfortResponse::TooLoud,
        )]));

        assert!(approx_eq(
            resolve_gain(1000, &state),
            BASE_GAIN * db_to_linear(-2.0)
        ));
        assert_eq!(resolve_gain(1001, &state), BASE_GAIN);
    }

    #[test]
    fn test_headphone_uses_nearest_frequency() {
        let mut state = CalibrationState::new(DevicePlatform::Unknown);
        state.selected_profile_id = Some("apple-airpods".to_string());

        assert!(approx_eq(
            resolve_gain(6000, &state),
            BASE_GAIN * db_to_linear(-2.5)
        ));
        assert!(approx_eq(
            resolve_gain(7000, &state),
            BASE_GAIN * db_to_linear(-3.0)
        ));
    }

    #[test]
    fn test_gain_always_positive() {
        let mut state = CalibrationState::new(DevicePlatform::Windows);
        state.selected_profile_id = Some("sony-wh1000xm4".to_string());
        state.biological_calibration = Some(BiologicalCalibration {
            per_frequency_db_adjustment: [(8000, -120.0)].into_iter().collect(),
        });
        assert!(resolve_gain(8000, &state) > 0.0);
    }
}
