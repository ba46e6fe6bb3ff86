//! Telemetry event types describing screening session activity exposed to
//! the CLI and any subscribed dashboard.

use serde::{Deserialize, Serialize};

/// Which sub-test emitted an event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    Vision,
    Hearing,
}

/// Session metric events. Every variant is cheap to clone and serialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MetricEvent {
    StimulusPresented {
        test: TestKind,
        /// Optotype orientation or hearing stimulus id
        label: String,
        trial: usize,
    },
    ResponseRecorded {
        test: TestKind,
        correct: bool,
        trial: usize,
    },
    NoiseAssessed {
        maximum_db: f32,
        acceptable: bool,
    },
    TestCompleted {
        test: TestKind,
        pass: bool,
        trials: usize,
    },
    Error {
        code: i32,
        context: String,
    },
}
