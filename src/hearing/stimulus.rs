//! Hearing stimulus catalogue
//!
//! Each test frequency is tied to a recognizable sound so young children can
//! answer by picking a picture instead of saying "yes, I heard it".

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// One labeled stimulus
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HearingStimulus {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub frequency_hz: u32,
    /// What the frequency carries in everyday listening
    pub clinical: &'static str,
}

static CATALOGUE: Lazy<Vec<HearingStimulus>> = Lazy::new(|| {
    vec![
        HearingStimulus {
            id: "drum",
            name: "Drum Beat",
            description: "Boom boom!",
            frequency_hz: 500,
            clinical: "Low-frequency hearing, vowel sounds",
        },
        HearingStimulus {
            id: "dog",
            name: "Dog Barking",
            description: "Woof woof!",
            frequency_hz: 1000,
            clinical: "Speech fundamental, baseline hearing",
        },
        HearingStimulus {
            id: "bird",
            name: "Bird Chirping",
            description: "Tweet tweet!",
            frequency_hz: 2000,
            clinical: "Consonant clarity, speech discrimination",
        },
        HearingStimulus {
            id: "bell",
            name: "Bell Ringing",
            description: "Ding ding!",
            frequency_hz: 4000,
            clinical: "Sibilant detection, noise damage indicator",
        },
        HearingStimulus {
            id: "whistle",
            name: "Whistle Blowing",
            description: "Wheee!",
            frequency_hz: 8000,
            clinical: "Extended high-frequency hearing",
        },
    ]
});

/// All stimuli in ascending frequency order
pub fn stimulus_catalogue() -> &'static [HearingStimulus] {
    &CATALOGUE
}

pub fn stimulus_by_id(id: &str) -> Option<&'static HearingStimulus> {
    CATALOGUE.iter().find(|s| s.id == id)
}

pub fn stimulus_for_frequency(frequency_hz: u32) -> Option<&'static HearingStimulus> {
    CATALOGUE.iter().find(|s| s.frequency_hz == frequency_hz)
}

/// Frequencies covered by the extended protocol and the audiogram analyzer
pub const EXTENDED_FREQUENCIES: [u32; 5] = [500, 1000, 2000, 4000, 8000];

/// Frequencies covered by the standard protocol
pub const STANDARD_FREQUENCIES: [u32; 3] = [1000, 2000, 4000];

/// Stimulus set selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencySet {
    /// dog, bird, bell
    #[default]
    Standard,
    /// drum, dog, bird, bell, whistle
    Extended,
}

impl FrequencySet {
    pub fn frequencies(&self) -> &'static [u32] {
        match self {
            FrequencySet::Standard => &STANDARD_FREQUENCIES,
            FrequencySet::Extended => &EXTENDED_FREQUENCIES,
        }
    }

    /// Stimuli in presentation order
    pub fn stimuli(&self) -> Vec<&'static HearingStimulus> {
        self.frequencies()
            .iter()
            .filter_map(|&hz| stimulus_for_frequency(hz))
            .collect()
    }
}

impl fmt::Display for FrequencySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrequencySet::Standard => write!(f, "standard"),
            FrequencySet::Extended => write!(f, "extended"),
        }
    }
}

impl FromStr for FrequencySet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(FrequencySet::Standard),
            "extended" => Ok(FrequencySet::Extended),
            other => Err(format!("unknown frequency set: {}", other)),
        }
    }
}
