//! Acuity scoring for a finished (or abandoned) staircase

use serde::{Deserialize, Serialize};

use crate::vision::staircase::{StaircaseState, LOGMAR_LEVELS};

/// Number of trailing trials averaged into the final score
pub const SCORING_WINDOW: usize = 6;

/// Pass iff final logMAR is at or below this
pub const PASS_THRESHOLD_LOGMAR: f64 = 0.3;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Final logMAR score
///
/// Mean of the last six answered levels rounded to 0.1; with fewer than six
/// answers the current level is reported as-is.
pub fn final_logmar(state: &StaircaseState) -> f64 {
    let history = &state.trial_history;
    if history.len() < SCORING_WINDOW {
        return state.current_logmar();
    }

    let window = &history[history.len() - SCORING_WINDOW..];
    let sum: f64 = window.iter().map(|t| LOGMAR_LEVELS[t.level_index]).sum();
    round1(sum / SCORING_WINDOW as f64)
}

/// "20/N" notation
pub fn logmar_to_snellen(logmar: f64) -> String {
    format!("20/{}", (20.0 * 10f64.powf(logmar)).round() as u32)
}

/// Metric "6/N" notation
pub fn logmar_to_metric_snellen(logmar: f64) -> String {
    format!("6/{}", (6.0 * 10f64.powf(logmar)).round() as u32)
}

/// Coarse acuity band for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcuityCategory {
    Normal,
    Borderline,
    Mild,
    Moderate,
    Severe,
}

impl AcuityCategory {
    pub fn from_logmar(logmar: f64) -> Self {
        // Scores are rounded to 0.1, compare in tenths
        let tenths = (logmar * 10.0).round() as i64;
        match tenths {
            i64::MIN..=0 => AcuityCategory::Normal,
            1..=3 => AcuityCategory::Borderline,
            4..=5 => AcuityCategory::Mild,
            6..=7 => AcuityCategory::Moderate,
            _ => AcuityCategory::Severe,
        }
    }
}

/// Vision sub-test result carried by a screening record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionOutcome {
    pub logmar: f64,
    pub snellen_equivalent: String,
    pub metric_snellen: String,
    pub category: AcuityCategory,
    pub pass: bool,
    pub trials_completed: usize,
    pub reversals: u32,
}

impl VisionOutcome {
    pub fn from_state(state: &StaircaseState) -> Self {
        let logmar = final_logmar(state);
        Self {
            logmar,
            snellen_equivalent: logmar_to_snellen(logmar),
            metric_snellen: logmar_to_metric_snellen(logmar),
            category: AcuityCategory::from_logmar(logmar),
            pass: logmar <= PASS_THRESHOLD_LOGMAR,
            trials_completed: state.trial_history.len(),
            reversals: state.reversal_count,
        }
    }
}
