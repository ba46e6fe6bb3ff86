// Noise module - ambient noise assessment for hearing screening
//
// NoiseAssessor samples the injected AmbientInput at a fixed sub-interval and
// reports pass/fail against the configured threshold. The result is advisory:
// nothing here pauses or gates a hearing test.

pub mod spectrum;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::audio::AmbientInput;
use crate::config::NoiseConfig;
use crate::error::{log_audio_error, AudioError};
use crate::telemetry;

pub use spectrum::{ansi_limit_db, ansi_limits, band_level_db, spectrum_level_db};

/// One instantaneous reading, as delivered to monitor callbacks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseStatus {
    pub level_db: f32,
    pub threshold_db: f32,
    pub acceptable: bool,
    pub timestamp_ms: u64,
}

/// Outcome of a time-boxed environment assessment
///
/// Levels are rounded to one decimal place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseAssessment {
    pub average: f32,
    pub maximum: f32,
    pub minimum: f32,
    pub threshold: f32,
    pub sample_count: usize,
    pub acceptable: bool,
    pub recommendation: String,
}

fn round1(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

fn now_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl NoiseAssessment {
    /// Summarize raw samples against `threshold`
    ///
    /// Acceptable iff the loudest sample is at or below the threshold.
    pub fn from_samples(samples: &[f32], threshold: f32) -> Self {
        if samples.is_empty() {
            return Self {
                average: 0.0,
                maximum: 0.0,
                minimum: 0.0,
                threshold,
                sample_count: 0,
                acceptable: true,
                recommendation: "Environment suitable for hearing screening".to_string(),
            };
        }

        let sum: f32 = samples.iter().sum();
        let maximum = samples.iter().copied().fold(f32::MIN, f32::max);
        let minimum = samples.iter().copied().fold(f32::MAX, f32::min);
        let acceptable = maximum <= threshold;

        let recommendation = if acceptable {
            "Environment suitable for hearing screening".to_string()
        } else {
            format!(
                "Too noisy! Please find a quieter location. Current: {:.1} dB, Required: <{} dB",
                maximum, threshold
            )
        };

        Self {
            average: round1(sum / samples.len() as f32),
            maximum: round1(maximum),
            minimum: round1(minimum),
            threshold,
            sample_count: samples.len(),
            acceptable,
            recommendation,
        }
    }
}

/// Ambient noise assessor over an injected input device
pub struct NoiseAssessor {
    input: Arc<dyn AmbientInput>,
    config: NoiseConfig,
}

impl NoiseAssessor {
    pub fn new(input: Arc<dyn AmbientInput>, config: NoiseConfig) -> Self {
        Self { input, config }
    }

    pub fn threshold_db(&self) -> f32 {
        self.config.threshold_db
    }

    pub fn set_threshold(&mut self, threshold_db: f32) {
        self.config.threshold_db = threshold_db;
    }

    /// Instantaneous reading against the threshold
    pub fn current_status(&self) -> Result<NoiseStatus, AudioError> {
        let level_db = self.input.current_level_db().inspect_err(|err| {
            log_audio_error(err, "noise_current_status");
        })?;

        Ok(NoiseStatus {
            level_db,
            threshold_db: self.config.threshold_db,
            acceptable: level_db <= self.config.threshold_db,
            timestamp_ms: now_timestamp_ms(),
        })
    }

    /// Number of samples collected for a window of `duration_ms`
    ///
    /// floor(duration / interval), never less than one.
    pub fn sample_count(&self, duration_ms: u64) -> usize {
        let interval = self.config.sample_interval_ms.max(1);
        ((duration_ms / interval) as usize).max(1)
    }

    /// Sample the environment for `duration_ms` and summarize
    ///
    /// The first reading is taken immediately; later readings follow at the
    /// configured sub-interval.
    pub async fn assess_environment(
        &self,
        duration_ms: u64,
    ) -> Result<NoiseAssessment, AudioError> {
        let count = self.sample_count(duration_ms);
        let interval = Duration::from_millis(self.config.sample_interval_ms);
        let mut samples = Vec::with_capacity(count);

        for i in 0..count {
            if i > 0 {
                tokio::time::sleep(interval).await;
            }
            let level = self.input.current_level_db().inspect_err(|err| {
                log_audio_error(err, "assess_environment");
                telemetry::hub().record_error(err, "assess_environment");
            })?;
            samples.push(level);
        }

        let assessment = NoiseAssessment::from_samples(&samples, self.config.threshold_db);
        log::info!(
            "[Noise] Assessed {} samples: avg={:.1} max={:.1} acceptable={}",
            assessment.sample_count,
            assessment.average,
            assessment.maximum,
            assessment.acceptable
        );
        telemetry::hub().record_noise(assessment.maximum, assessment.acceptable);

        Ok(assessment)
    }

    /// Assess using the configured default window
    pub async fn assess_default(&self) -> Result<NoiseAssessment, AudioError> {
        self.assess_environment(self.config.assessment_duration_ms)
            .await
    }

    /// Invoke `callback` at the configured cadence until the monitor is stopped
    ///
    /// Must be called from within a tokio runtime. Failed readings are logged
    /// and skipped.
    pub fn start_monitoring<F>(&self, callback: F) -> NoiseMonitor
    where
        F: FnMut(NoiseStatus) + Send + 'static,
    {
        let interval = Duration::from_millis(self.config.monitor_interval_ms);
        self.start_monitoring_every(interval, callback)
    }

    /// Like `start_monitoring` with an explicit cadence
    pub fn start_monitoring_every<F>(&self, interval: Duration, mut callback: F) -> NoiseMonitor
    where
        F: FnMut(NoiseStatus) + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let input = Arc::clone(&self.input);
        let threshold_db = self.config.threshold_db;
        let flag = Arc::clone(&running);

        log::info!("[Noise] Monitoring every {:?}", interval);

        let handle = tokio::spawn(async move {
            while flag.load(Ordering::Acquire) {
                match input.current_level_db() {
                    Ok(level_db) => callback(NoiseStatus {
                        level_db,
                        threshold_db,
                        acceptable: level_db <= threshold_db,
                        timestamp_ms: now_timestamp_ms(),
                    }),
                    Err(err) => log_audio_error(&err, "noise_monitor"),
                }
                tokio::time::sleep(interval).await;
            }
        });

        NoiseMonitor {
            running,
            handle: Some(handle),
        }
    }
}

/// Handle to a running continuous monitor
///
/// Dropping the handle stops the monitor.
pub struct NoiseMonitor {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl NoiseMonitor {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop monitoring; no callback fires after this returns
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.abort();
            log::info!("[Noise] Monitoring stopped");
        }
    }
}

impl Drop for NoiseMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ScriptedAmbientInput;
    use std::sync::Mutex;

    fn assessor(levels: Vec<f32>, fallback: f32) -> NoiseAssessor {
        NoiseAssessor::new(
            Arc::new(ScriptedAmbientInput::new(levels, fallback)),
            NoiseConfig::default(),
        )
    }

    struct BrokenInput;

    impl AmbientInput for BrokenInput {
        fn current_level_db(&self) -> Result<f32, AudioError> {
            Err(AudioError::InputUnavailable)
        }
    }

    #[test]
    fn test_sample_count_floors_and_clamps() {
        let assessor = assessor(vec![], 30.0);
        assert_eq!(assessor.sample_count(5000), 10);
        assert_eq!(assessor.sample_count(1250), 2);
        assert_eq!(assessor.sample_count(100), 1);
        assert_eq!(assessor.sample_count(0), 1);
    }

    #[test]
    fn test_from_samples_threshold_is_inclusive() {
        let ok = NoiseAssessment::from_samples(&[30.0, 40.0, 35.0], 40.0);
        assert!(ok.acceptable);
        assert_eq!(ok.maximum, 40.0);
        assert_eq!(ok.minimum, 30.0);
        assert_eq!(ok.average, 35.0);

        let noisy = NoiseAssessment::from_samples(&[30.0, 40.04, 35.0], 40.0);
        assert!(!noisy.acceptable);
        assert_eq!(
            noisy.recommendation,
            "Too noisy! Please find a quieter location. Current: 40.0 dB, Required: <40 dB"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_assess_environment_collects_window() {
        let assessor = assessor(vec![31.0, 33.0, 35.0, 37.0], 20.0);
        let started = tokio::time::Instant::now();

        let result = assessor.assess_environment(2000).await.unwrap();

        assert_eq!(result.sample_count, 4);
        assert_eq!(result.average, 34.0);
        assert_eq!(result.maximum, 37.0);
        assert!(result.acceptable);
        // First sample immediate, three sleeps between the rest
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_loud_sample_fails() {
        let assessor = assessor(vec![30.0, 55.0, 30.0], 30.0);
        let result = assessor.assess_environment(1500).await.unwrap();
        assert!(!result.acceptable);
        assert_eq!(result.maximum, 55.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_failure_propagates() {
        let assessor = NoiseAssessor::new(Arc::new(BrokenInput), NoiseConfig::default());
        assert_eq!(
            assessor.assess_environment(1000).await,
            Err(AudioError::InputUnavailable)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_runs_until_stopped() {
        let assessor = assessor(vec![20.0, 50.0], 25.0);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut monitor = assessor.start_monitoring_every(Duration::from_millis(100), move |s| {
            sink.lock().unwrap().push(s.acceptable);
        });
        assert!(monitor.is_running());

        tokio::time::sleep(Duration::from_millis(350)).await;
        monitor.stop();
        assert!(!monitor.is_running());

        let count = seen.lock().unwrap().len();
        tokio::time::sleep(Duration::from_millis(500)).await;
        let statuses = seen.lock().unwrap().clone();

        assert_eq!(statuses.len(), count);
        assert_eq!(&statuses[..2], &[true, false]);
        assert!(statuses.len() >= 3);
    }
}
