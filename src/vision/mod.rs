// Vision module - adaptive optotype acuity test
//
// 1. staircase: logMAR level table, state and pure transition, engine
// 2. scoring: final score, Snellen notation, acuity category
// 3. session: async driver with feedback timing and telemetry

pub mod scoring;
pub mod session;
pub mod staircase;

pub use scoring::{
    final_logmar, logmar_to_metric_snellen, logmar_to_snellen, AcuityCategory, VisionOutcome,
};
pub use session::{Optotype, VisionSession};
pub use staircase::{
    starting_level_index, Orientation, StaircaseEngine, StaircasePhase, StaircaseState, Trial,
    TrialOutcome, LOGMAR_LEVELS,
};
