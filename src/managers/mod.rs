// Managers Module
//
// Focused manager classes owning long-lived shared state.
//
// - CalibrationManager: calibration state, its persistence and gain lookups

pub mod calibration_manager;

pub use calibration_manager::CalibrationManager;
