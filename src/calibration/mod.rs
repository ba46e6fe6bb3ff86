// Calibration module - per-device stimulus level correction
//
// This module provides:
// 1. profiles: static headphone and host-platform correction tables
// 2. state: the CalibrationState singleton and its versioned snapshot
// 3. gain: composition of all layers into one linear gain multiplier
// 4. procedure: the biological (comfort rating) calibration workflow
// 5. persistence: where the snapshot is stored between runs
//
// The calibration workflow:
// 1. Select a headphone profile (or auto-detect one from the device label)
// 2. Optionally rate one tone per calibration frequency
// 3. Finalize to replace the biological calibration wholesale

pub mod gain;
pub mod persistence;
pub mod procedure;
pub mod profiles;
pub mod state;

pub use gain::{db_to_linear, resolve_gain, resolve_gain_breakdown, GainBreakdown, BASE_GAIN};
pub use persistence::{CalibrationStore, JsonFileStore, MemoryCalibrationStore};
pub use procedure::{BiologicalCalibrationProcedure, CalibrationProgress, CALIBRATION_FREQUENCIES};
pub use profiles::{CalibrationProfile, DevicePlatform, DeviceProfile};
pub use state::{
    BiologicalCalibration, CalibrationSnapshot, CalibrationState, CalibrationSummary,
    ComfortResponse,
};
