// AudiogramAnalyzer - rule-based hearing-loss pattern classification
//
// Input is a pass/fail map over the extended frequencies. Rules are tried in
// a fixed priority order and the first match wins:
//   1. no failures                         → normal
//   2. every failure ≥ 4000 Hz              → high-frequency-loss
//   3. only 500 Hz fails                    → low-frequency-loss
//   4. 1k and 2k fail, 500 and 4k pass      → cookie-bite
//   5. ≥ 4 of 5 fail                        → flat-loss
//   6. failures strictly ascending          → sloping-loss
//   7. anything else                        → irregular
//
// Frequencies missing from the map count as not detected.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::hearing::stimulus::EXTENDED_FREQUENCIES;

/// Pass/fail by frequency in Hz
pub type DetectionMap = BTreeMap<u32, bool>;

/// Referral urgency, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    None,
    Routine,
    Prompt,
    Urgent,
}

/// Named audiometric configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HearingPattern {
    Normal,
    HighFrequencyLoss,
    LowFrequencyLoss,
    CookieBite,
    FlatLoss,
    SlopingLoss,
    Irregular,
}

impl HearingPattern {
    pub fn id(&self) -> &'static str {
        match self {
            HearingPattern::Normal => "normal",
            HearingPattern::HighFrequencyLoss => "high-frequency-loss",
            HearingPattern::LowFrequencyLoss => "low-frequency-loss",
            HearingPattern::CookieBite => "cookie-bite",
            HearingPattern::FlatLoss => "flat-loss",
            HearingPattern::SlopingLoss => "sloping-loss",
            HearingPattern::Irregular => "irregular",
        }
    }

    pub fn human_name(&self) -> &'static str {
        match self {
            HearingPattern::Normal => "Normal Hearing",
            HearingPattern::HighFrequencyLoss => "High-Frequency Hearing Loss",
            HearingPattern::LowFrequencyLoss => "Low-Frequency Hearing Loss",
            HearingPattern::CookieBite => "Mid-Frequency Hearing Loss",
            HearingPattern::FlatLoss => "Broad-Spectrum Hearing Loss",
            HearingPattern::SlopingLoss => "Progressive High-Frequency Loss",
            HearingPattern::Irregular => "Irregular Hearing Loss Pattern",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            HearingPattern::Normal => "All frequencies passed screening threshold",
            HearingPattern::HighFrequencyLoss => "Loss limited to high frequencies (4-8 kHz)",
            HearingPattern::LowFrequencyLoss => "Loss limited to low frequencies",
            HearingPattern::CookieBite => {
                "Loss in middle frequencies with preserved low and high"
            }
            HearingPattern::FlatLoss => "Loss across multiple frequency ranges",
            HearingPattern::SlopingLoss => "Worsening loss as frequency increases",
            HearingPattern::Irregular => "Non-standard pattern requiring evaluation",
        }
    }

    pub fn possible_causes(&self) -> &'static [&'static str] {
        match self {
            HearingPattern::Normal => &[],
            HearingPattern::HighFrequencyLoss => &[
                "Noise exposure",
                "Ototoxic medications",
                "Early presbycusis",
                "Genetic factors",
            ],
            HearingPattern::LowFrequencyLoss => &[
                "Conductive loss (middle ear fluid)",
                "Meniere's disease",
                "Otosclerosis (early)",
            ],
            HearingPattern::CookieBite => {
                &["Genetic hearing loss", "Specific hereditary conditions"]
            }
            HearingPattern::FlatLoss => &[
                "Significant sensorineural hearing loss",
                "Mixed hearing loss",
                "Severe conductive loss",
            ],
            HearingPattern::SlopingLoss => &[
                "Age-related hearing loss (presbycusis)",
                "Noise-induced hearing loss",
                "Progressive sensorineural loss",
            ],
            HearingPattern::Irregular => &[
                "Test reliability issues",
                "Unusual hearing loss configuration",
                "Need for retest",
            ],
        }
    }

    pub fn urgency(&self) -> Urgency {
        match self {
            HearingPattern::Normal => Urgency::None,
            HearingPattern::HighFrequencyLoss | HearingPattern::SlopingLoss => Urgency::Routine,
            HearingPattern::LowFrequencyLoss
            | HearingPattern::CookieBite
            | HearingPattern::Irregular => Urgency::Prompt,
            HearingPattern::FlatLoss => Urgency::Urgent,
        }
    }

    /// Follow-up actions specific to this pattern
    fn pattern_recommendations(&self) -> &'static [&'static str] {
        match self {
            HearingPattern::Normal
            | HearingPattern::CookieBite
            | HearingPattern::SlopingLoss
            | HearingPattern::Irregular => &[],
            HearingPattern::HighFrequencyLoss => &[
                "Hearing protection education",
                "Noise exposure history assessment",
            ],
            HearingPattern::LowFrequencyLoss => &[
                "Medical evaluation for middle ear pathology",
                "Consider tympanometry",
            ],
            HearingPattern::FlatLoss => &[
                "Immediate audiological assessment",
                "Consider hearing aid evaluation",
            ],
        }
    }
}

/// Speech Intelligibility Index estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechIntelligibility {
    /// 0.0..=1.0
    pub score: f64,
    pub percentage: u32,
    pub interpretation: String,
}

/// Clinical meaning of a failed frequency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyInterpretation {
    pub frequency_hz: u32,
    pub significance: &'static str,
    pub loss_indicates: &'static [&'static str],
}

/// Full interpretation of one frequency-test snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudiogramReport {
    #[serde(rename = "pattern_id")]
    pub pattern: HearingPattern,
    pub human_name: &'static str,
    pub description: &'static str,
    pub possible_causes: Vec<&'static str>,
    pub referral_needed: bool,
    pub urgency: Urgency,
    pub speech_intelligibility: SpeechIntelligibility,
    /// Detection at all five extended frequencies
    pub frequencies: DetectionMap,
    pub failed_frequency_notes: Vec<FrequencyInterpretation>,
    pub recommendations: Vec<String>,
}

/// Frequency weights for the speech intelligibility estimate (8 kHz excluded)
const SII_WEIGHTS: [(u32, f64); 4] = [(500, 0.15), (1000, 0.25), (2000, 0.35), (4000, 0.25)];

fn detected(results: &DetectionMap, frequency_hz: u32) -> bool {
    results.get(&frequency_hz).copied().unwrap_or(false)
}

/// Failed extended frequencies in ascending order
pub fn failed_frequencies(results: &DetectionMap) -> Vec<u32> {
    EXTENDED_FREQUENCIES
        .iter()
        .copied()
        .filter(|&hz| !detected(results, hz))
        .collect()
}

/// Classify a detection map
pub fn classify(results: &DetectionMap) -> HearingPattern {
    let failures = failed_frequencies(results);

    if failures.is_empty() {
        return HearingPattern::Normal;
    }
    if failures.iter().all(|&hz| hz >= 4000) {
        return HearingPattern::HighFrequencyLoss;
    }
    if failures == [500] {
        return HearingPattern::LowFrequencyLoss;
    }
    if !detected(results, 1000)
        && !detected(results, 2000)
        && detected(results, 500)
        && detected(results, 4000)
    {
        return HearingPattern::CookieBite;
    }
    if failures.len() >= 4 {
        return HearingPattern::FlatLoss;
    }
    if failures.windows(2).all(|pair| pair[1] > pair[0]) {
        return HearingPattern::SlopingLoss;
    }
    HearingPattern::Irregular
}

fn interpret_sii(score: f64) -> &'static str {
    // Compare in hundredths so summed weights land exactly on band edges
    let hundredths = (score * 100.0).round() as u32;
    if hundredths >= 75 {
        "Excellent speech understanding expected"
    } else if hundredths >= 50 {
        "Good speech understanding in quiet"
    } else if hundredths >= 30 {
        "Moderate difficulty, especially in noise"
    } else {
        "Significant speech understanding difficulty"
    }
}

/// Weighted sum of passes at 500/1000/2000/4000 Hz
pub fn speech_intelligibility(results: &DetectionMap) -> SpeechIntelligibility {
    let score: f64 = SII_WEIGHTS
        .iter()
        .filter(|(hz, _)| detected(results, *hz))
        .map(|(_, weight)| weight)
        .sum();

    SpeechIntelligibility {
        score,
        percentage: (score * 100.0).round() as u32,
        interpretation: interpret_sii(score).to_string(),
    }
}

/// Clinical notes for one of the extended frequencies
pub fn frequency_interpretation(frequency_hz: u32) -> Option<FrequencyInterpretation> {
    let (significance, loss_indicates): (&'static str, &'static [&'static str]) =
        match frequency_hz {
            500 => (
                "Vowel sounds, low-frequency environmental sounds",
                &[
                    "Conductive hearing loss (middle ear problems)",
                    "Low-frequency sensorineural hearing loss (rare)",
                    "Meniere's disease (low-frequency fluctuating loss)",
                ],
            ),
            1000 => (
                "Speech fundamental frequency, baseline hearing",
                &[
                    "General hearing impairment",
                    "Mixed hearing loss",
                    "Age-related hearing loss (presbycusis) - early stage",
                ],
            ),
            2000 => (
                "Consonant clarity, speech understanding",
                &[
                    "Speech discrimination difficulty",
                    "Noise-induced hearing loss - early",
                    "Age-related hearing loss",
                ],
            ),
            4000 => (
                "Sibilants (/s/, /f/, /th/), high-frequency sounds",
                &[
                    "Noise-induced hearing loss - \"4 kHz notch\"",
                    "Ototoxic drug exposure",
                    "Early presbycusis",
                ],
            ),
            8000 => (
                "Extended high-frequency hearing",
                &[
                    "Early ototoxicity (before affecting lower frequencies)",
                    "Noise exposure (ultra-high frequency damage)",
                    "Age-related high-frequency loss",
                ],
            ),
            _ => return None,
        };

    Some(FrequencyInterpretation {
        frequency_hz,
        significance,
        loss_indicates,
    })
}

/// Recommendations in report order: referral lines, then pattern actions
pub fn recommendations(pattern: HearingPattern) -> Vec<String> {
    let mut lines = Vec::new();
    let urgency = pattern.urgency();

    if urgency != Urgency::None {
        lines.push("Refer to audiologist for comprehensive evaluation".to_string());
    }
    if urgency == Urgency::Urgent {
        lines.push("Priority referral recommended".to_string());
    }
    lines.extend(
        pattern
            .pattern_recommendations()
            .iter()
            .map(|line| line.to_string()),
    );
    lines
}

/// Build a fresh report from a detection map
pub fn generate_report(results: &DetectionMap) -> AudiogramReport {
    let pattern = classify(results);
    let urgency = pattern.urgency();

    let report = AudiogramReport {
        pattern,
        human_name: pattern.human_name(),
        description: pattern.description(),
        possible_causes: pattern.possible_causes().to_vec(),
        referral_needed: urgency != Urgency::None,
        urgency,
        speech_intelligibility: speech_intelligibility(results),
        frequencies: EXTENDED_FREQUENCIES
            .iter()
            .map(|&hz| (hz, detected(results, hz)))
            .collect(),
        failed_frequency_notes: failed_frequencies(results)
            .into_iter()
            .filter_map(frequency_interpretation)
            .collect(),
        recommendations: recommendations(pattern),
    };

    log::debug!(
        "[Audiogram] pattern={} urgency={:?} sii={}",
        pattern.id(),
        urgency,
        report.speech_intelligibility.percentage
    );

    report
}

#[cfg(test)]
#[path = "audiogram_tests.rs"]
mod tests;
