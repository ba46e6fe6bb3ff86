//! Screening telemetry collector and helpers.
//!
//! The collector multiplexes stimulus, response, noise and completion events
//! into a bounded history plus an async broadcast stream.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use futures::Stream;
use once_cell::sync::Lazy;
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};

use crate::error::ErrorCode;

pub mod events;

pub use events::{MetricEvent, TestKind};

/// Global telemetry hub shared across the crate.
static HUB: Lazy<TelemetryHub> = Lazy::new(TelemetryHub::default);

/// Access the global telemetry hub.
pub fn hub() -> &'static TelemetryHub {
    &HUB
}

/// Snapshot of collector state for CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<MetricEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
    pub tests_passed: u64,
    pub tests_failed: u64,
}

/// Broadcast-based collector retaining a bounded history of metrics.
pub struct TelemetryCollector {
    tx: broadcast::Sender<MetricEvent>,
    history: Mutex<VecDeque<MetricEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer);
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: MetricEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        {
            // History is plain data; a panicked writer cannot leave it torn
            let mut history = self
                .history
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if history.len() == self.history_capacity {
                history.pop_front();
                self.dropped_history.fetch_add(1, Ordering::Relaxed);
            }
            history.push_back(event.clone());
        }

        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.tx.subscribe()
    }

    /// Live event stream; lagged events are skipped
    pub fn stream(&self) -> impl Stream<Item = MetricEvent> {
        BroadcastStream::new(self.tx.subscribe()).filter_map(|event| event.ok())
    }

    fn recent(&self) -> Vec<MetricEvent> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

/// Top-level hub wrapping collector state plus pass/fail tallies.
pub struct TelemetryHub {
    collector: TelemetryCollector,
    tests_passed: AtomicU64,
    tests_failed: AtomicU64,
}

impl TelemetryHub {
    pub fn new(channel_capacity: usize, history_capacity: usize) -> Self {
        Self {
            collector: TelemetryCollector::new(channel_capacity, history_capacity),
            tests_passed: AtomicU64::new(0),
            tests_failed: AtomicU64::new(0),
        }
    }

    pub fn collector(&self) -> &TelemetryCollector {
        &self.collector
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            recent: self.collector.recent(),
            total_events: self.collector.total_events.load(Ordering::Relaxed),
            dropped_events: self.collector.dropped_history.load(Ordering::Relaxed),
            tests_passed: self.tests_passed.load(Ordering::Relaxed),
            tests_failed: self.tests_failed.load(Ordering::Relaxed),
        }
    }

    pub fn record_stimulus(&self, test: TestKind, label: impl Into<String>, trial: usize) {
        self.collector.publish(MetricEvent::StimulusPresented {
            test,
            label: label.into(),
            trial,
        });
    }

    pub fn record_response(&self, test: TestKind, correct: bool, trial: usize) {
        self.collector.publish(MetricEvent::ResponseRecorded {
            test,
            correct,
            trial,
        });
    }

    pub fn record_noise(&self, maximum_db: f32, acceptable: bool) {
        self.collector.publish(MetricEvent::NoiseAssessed {
            maximum_db,
            acceptable,
        });
    }

    pub fn record_completion(&self, test: TestKind, pass: bool, trials: usize) {
        let counter = if pass {
            &self.tests_passed
        } else {
            &self.tests_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);

        self.collector
            .publish(MetricEvent::TestCompleted { test, pass, trials });
    }

    pub fn record_error<E: ErrorCode>(&self, err: &E, context: impl Into<String>) {
        self.collector.publish(MetricEvent::Error {
            code: err.code(),
            context: context.into(),
        });
    }
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new(256, 64)
    }
}
