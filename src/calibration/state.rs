// CalibrationState - per-installation playback calibration
//
// Holds the selected headphone profile, the optional biological (comfort)
// calibration and the host platform. Persisted as a versioned snapshot;
// loading validates the version before any other field is interpreted.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::calibration::profiles::{
    device_profile, headphone_profile, CalibrationProfile, DevicePlatform, DeviceProfile,
};
use crate::error::CalibrationError;

/// Only snapshot version this build understands
pub const SNAPSHOT_VERSION: &str = "1.0";

/// Listener comfort rating for a calibration tone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComfortResponse {
    TooQuiet,
    Comfortable,
    TooLoud,
}

impl ComfortResponse {
    /// Gain correction derived from this rating
    pub fn adjustment_db(&self) -> f64 {
        match self {
            ComfortResponse::TooLoud => -2.0,
            ComfortResponse::TooQuiet => 1.0,
            ComfortResponse::Comfortable => 0.0,
        }
    }
}

/// User-derived per-frequency gain corrections
///
/// Matched by exact frequency only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiologicalCalibration {
    pub per_frequency_db_adjustment: BTreeMap<u32, f64>,
}

impl BiologicalCalibration {
    pub fn from_responses<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = (u32, ComfortResponse)>,
    {
        Self {
            per_frequency_db_adjustment: responses
                .into_iter()
                .map(|(freq, response)| (freq, response.adjustment_db()))
                .collect(),
        }
    }

    pub fn adjustment_db(&self, frequency_hz: u32) -> Option<f64> {
        self.per_frequency_db_adjustment.get(&frequency_hz).copied()
    }
}

/// Calibration singleton read by the gain resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationState {
    pub selected_profile_id: Option<String>,
    pub biological_calibration: Option<BiologicalCalibration>,
    pub device_platform: DevicePlatform,
}

/// Read-only overview for settings screens and exports
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationSummary {
    pub headphone: Option<&'static CalibrationProfile>,
    pub device: Option<&'static DeviceProfile>,
    pub biological: Option<BiologicalCalibration>,
    pub calibrated: bool,
}

impl CalibrationState {
    /// Uncalibrated state for the given platform
    pub fn new(device_platform: DevicePlatform) -> Self {
        Self {
            selected_profile_id: None,
            biological_calibration: None,
            device_platform,
        }
    }

    /// Selected headphone profile, if the id still resolves
    pub fn selected_profile(&self) -> Option<&'static CalibrationProfile> {
        self.selected_profile_id
            .as_deref()
            .and_then(headphone_profile)
    }

    pub fn is_calibrated(&self) -> bool {
        self.selected_profile_id.is_some() || self.biological_calibration.is_some()
    }

    pub fn summary(&self) -> CalibrationSummary {
        CalibrationSummary {
            headphone: self.selected_profile(),
            device: device_profile(self.device_platform),
            biological: self.biological_calibration.clone(),
            calibrated: self.is_calibrated(),
        }
    }

    /// Export the persisted portion of this state
    pub fn to_snapshot(&self) -> CalibrationSnapshot {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        CalibrationSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            headphone: self.selected_profile_id.clone(),
            device: self.device_platform,
            custom_calibration: self
                .biological_calibration
                .as_ref()
                .map(|bio| bio.per_frequency_db_adjustment.clone()),
            timestamp_ms,
        }
    }

    /// Build the state that results from applying `snapshot` on this device
    ///
    /// The host platform is never taken from the snapshot.
    ///
    /// # Errors
    /// - `UnknownProfile` if the snapshot names a headphone not in the table
    pub fn with_snapshot(&self, snapshot: &CalibrationSnapshot) -> Result<Self, CalibrationError> {
        if let Some(id) = &snapshot.headphone {
            if headphone_profile(id).is_none() {
                return Err(CalibrationError::UnknownProfile { id: id.clone() });
            }
        }

        Ok(Self {
            selected_profile_id: snapshot.headphone.clone(),
            biological_calibration: snapshot.custom_calibration.clone().map(|map| {
                BiologicalCalibration {
                    per_frequency_db_adjustment: map,
                }
            }),
            device_platform: self.device_platform,
        })
    }
}

/// Versioned persistence/export format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSnapshot {
    pub version: String,
    pub headphone: Option<String>,
    pub device: DevicePlatform,
    pub custom_calibration: Option<BTreeMap<u32, f64>>,
    #[serde(default)]
    pub timestamp_ms: u64,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: String,
}

impl CalibrationSnapshot {
    /// Parse a snapshot, rejecting unknown versions before reading other fields
    pub fn from_json(json: &str) -> Result<Self, CalibrationError> {
        let probe: VersionProbe = serde_json::from_str(json)?;
        if probe.version != SNAPSHOT_VERSION {
            return Err(CalibrationError::IncompatibleVersion {
                found: probe.version,
            });
        }
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, CalibrationError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bio_sample() -> BiologicalCalibration {
        BiologicalCalibration::from_responses([
            (500, ComfortResponse::Comfortable),
            (1000, ComfortResponse::TooLoud),
            (4000, ComfortResponse::TooQuiet),
        ])
    }

    #[test]
    fn test_comfort_adjustments() {
        let bio = bio_sample();
        assert_eq!(bio.adjustment_db(500), Some(0.0));
        assert_eq!(bio.adjustment_db(1000), Some(-2.0));
        assert_eq!(bio.adjustment_db(4000), Some(1.0));
        assert_eq!(bio.adjustment_db(2000), None);
    }

    #[test]
    fn test_new_state_is_uncalibrated() {
        let state = CalibrationState::new(DevicePlatform::Ios);
        assert!(!state.is_calibrated());
        assert!(state.selected_profile().is_none());

        let summary = state.summary();
        assert!(!summary.calibrated);
        assert_eq!(summary.device.unwrap().display_name, "iOS Devices");
    }

    #[test]
    fn test_snapshot_roundtrip_keeps_local_platform() {
        let mut state = CalibrationState::new(DevicePlatform::Android);
        state.selected_profile_id = Some("bose-qc35".to_string());
        state.biological_calibration = Some(bio_sample());

        let json = state.to_snapshot().to_json().unwrap();
        let snapshot = CalibrationSnapshot::from_json(&json).unwrap();

        let other_device = CalibrationState::new(DevicePlatform::Windows);
        let restored = other_device.with_snapshot(&snapshot).unwrap();

        assert_eq!(restored.selected_profile_id.as_deref(), Some("bose-qc35"));
        assert_eq!(restored.biological_calibration, Some(bio_sample()));
        assert_eq!(restored.device_platform, DevicePlatform::Windows);
    }

    #[test]
    fn test_snapshot_rejects_unknown_version() {
        let json = r#"{"version":"2.0","headphone":"bose-qc35","device":"ios","custom_calibration":null}"#;
        match CalibrationSnapshot::from_json(json) {
            Err(CalibrationError::IncompatibleVersion { found }) => assert_eq!(found, "2.0"),
            other => panic!("Expected IncompatibleVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_snapshot_rejects_malformed_json() {
        let result = CalibrationSnapshot::from_json(r#"{"headphone": 12}"#);
        assert!(matches!(
            result,
            Err(CalibrationError::InvalidSnapshot { .. })
        ));
    }

    #[test]
    fn test_snapshot_with_unknown_profile_rejected() {
        let snapshot = CalibrationSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            headphone: Some("koss-porta-pro".to_string()),
            device: DevicePlatform::Ios,
            custom_calibration: None,
            timestamp_ms: 0,
        };
        let state = CalibrationState::new(DevicePlatform::Ios);
        assert!(matches!(
            state.with_snapshot(&snapshot),
            Err(CalibrationError::UnknownProfile { .. })
        ));
    }
}
