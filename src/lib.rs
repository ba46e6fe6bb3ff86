// Screening Core - pediatric vision/hearing screening engine
// Adaptive test state machines, stimulus calibration and audiogram interpretation

// Module declarations
pub mod audio;
pub mod calibration;
pub mod config;
pub mod error;
pub mod hearing;
pub mod managers;
pub mod noise;
pub mod screening;
pub mod storage;
pub mod telemetry;
pub mod vision;

// Re-exports for convenience
pub use calibration::{resolve_gain, CalibrationState};
pub use config::AppConfig;
pub use hearing::{AudiogramReport, HearingOutcome, HearingSession};
pub use managers::CalibrationManager;
pub use noise::{NoiseAssessment, NoiseAssessor};
pub use screening::{ScreeningFlow, ScreeningResult, SyncStatus};
pub use vision::{VisionOutcome, VisionSession};

/// Install the fmt subscriber (stderr) and bridge `log` records into it
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let result = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    if result.is_ok() {
        log::info!("[Init] Logging initialized");
    }
}
