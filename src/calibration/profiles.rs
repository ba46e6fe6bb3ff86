// Calibration profile tables - headphone and host-platform corrections
//
// Headphone corrections are the gain adjustment (dB) needed to reach the
// 30 dB HL screening presentation level on that model. Device adjustments
// compensate for platform output level differences. Both tables are static
// reference data and never mutated.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Reference data for one headphone model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationProfile {
    pub id: &'static str,
    pub display_name: &'static str,
    pub impedance_ohms: u32,
    pub sensitivity_db_spl_per_mw: f64,
    /// (frequency Hz, dB) pairs in ascending frequency order
    pub per_frequency_db_correction: Vec<(u32, f64)>,
    pub is_clinical_grade: bool,
    pub is_validated: bool,
}

impl CalibrationProfile {
    /// Correction at the table frequency closest to `frequency_hz`
    ///
    /// Ties keep the first closest entry in table order.
    pub fn nearest_correction_db(&self, frequency_hz: u32) -> Option<f64> {
        let mut best: Option<(u32, f64)> = None;
        for &(freq, db) in &self.per_frequency_db_correction {
            let distance = freq.abs_diff(frequency_hz);
            match best {
                Some((best_distance, _)) if distance >= best_distance => {}
                _ => best = Some((distance, db)),
            }
        }
        best.map(|(_, db)| db)
    }
}

/// Host platform categories with distinct output gain behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePlatform {
    Ios,
    Android,
    Macos,
    Windows,
    Unknown,
}

impl DevicePlatform {
    /// Classify a browser/host user-agent string
    pub fn detect(user_agent: &str) -> Self {
        let ua = user_agent.to_lowercase();
        if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ipod") {
            DevicePlatform::Ios
        } else if ua.contains("android") {
            DevicePlatform::Android
        } else if ua.contains("mac os x") {
            DevicePlatform::Macos
        } else if ua.contains("windows") {
            DevicePlatform::Windows
        } else {
            DevicePlatform::Unknown
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            DevicePlatform::Ios => "ios",
            DevicePlatform::Android => "android",
            DevicePlatform::Macos => "macos",
            DevicePlatform::Windows => "windows",
            DevicePlatform::Unknown => "unknown",
        }
    }

    pub fn from_id(id: &str) -> Self {
        match id {
            "ios" => DevicePlatform::Ios,
            "android" => DevicePlatform::Android,
            "macos" => DevicePlatform::Macos,
            "windows" => DevicePlatform::Windows,
            _ => DevicePlatform::Unknown,
        }
    }
}

/// Reference data for one host platform
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceProfile {
    pub platform: DevicePlatform,
    pub display_name: &'static str,
    pub gain_adjustment_db: f64,
}

/// Frequencies covered by every headphone table
const TABLE_FREQUENCIES: [u32; 5] = [500, 1000, 2000, 4000, 8000];

fn profile(
    id: &'static str,
    display_name: &'static str,
    impedance_ohms: u32,
    sensitivity_db_spl_per_mw: f64,
    corrections: [f64; 5],
    is_validated: bool,
    is_clinical_grade: bool,
) -> CalibrationProfile {
    CalibrationProfile {
        id,
        display_name,
        impedance_ohms,
        sensitivity_db_spl_per_mw,
        per_frequency_db_correction: TABLE_FREQUENCIES.iter().copied().zip(corrections).collect(),
        is_clinical_grade,
        is_validated,
    }
}

static HEADPHONE_PROFILES: Lazy<Vec<CalibrationProfile>> = Lazy::new(|| {
    vec![
        // Consumer
        profile(
            "apple-airpods",
            "Apple AirPods (All Generations)",
            32,
            105.0,
            [-2.0, -1.5, -1.0, -2.5, -3.0],
            true,
            false,
        ),
        profile(
            "apple-airpods-pro",
            "Apple AirPods Pro",
            32,
            107.0,
            [-1.8, -1.2, -0.8, -2.2, -2.8],
            true,
            false,
        ),
        profile(
            "sony-wh1000xm4",
            "Sony WH-1000XM4",
            47,
            105.0,
            [-2.5, -2.0, -1.5, -3.0, -3.5],
            true,
            false,
        ),
        profile(
            "bose-qc35",
            "Bose QuietComfort 35 II",
            40,
            106.0,
            [-2.2, -1.8, -1.3, -2.7, -3.2],
            true,
            false,
        ),
        // Clinical
        profile(
            "telephonics-tdh39",
            "Telephonics TDH-39 (Clinical Standard)",
            300,
            102.0,
            [0.0, 0.0, 0.0, 0.0, 0.0],
            true,
            true,
        ),
        profile(
            "sennheiser-hda200",
            "Sennheiser HDA 200 (Clinical)",
            250,
            104.0,
            [-0.5, -0.3, -0.2, -0.8, -1.0],
            true,
            true,
        ),
        // Generic
        profile(
            "generic-consumer",
            "Generic Consumer Headphones",
            32,
            105.0,
            [-2.0, -1.5, -1.0, -2.5, -3.0],
            false,
            false,
        ),
        profile(
            "generic-clinical",
            "Generic Clinical Headphones",
            300,
            102.0,
            [0.0, 0.0, 0.0, 0.0, 0.0],
            false,
            true,
        ),
    ]
});

static DEVICE_PROFILES: Lazy<Vec<DeviceProfile>> = Lazy::new(|| {
    vec![
        DeviceProfile {
            platform: DevicePlatform::Ios,
            display_name: "iOS Devices",
            gain_adjustment_db: 0.0,
        },
        DeviceProfile {
            platform: DevicePlatform::Android,
            display_name: "Android Devices",
            // Android output tends to run louder
            gain_adjustment_db: -1.0,
        },
        DeviceProfile {
            platform: DevicePlatform::Macos,
            display_name: "macOS",
            gain_adjustment_db: 0.0,
        },
        DeviceProfile {
            platform: DevicePlatform::Windows,
            display_name: "Windows",
            gain_adjustment_db: -0.5,
        },
    ]
});

/// All headphone profiles in table order
pub fn headphone_profiles() -> &'static [CalibrationProfile] {
    &HEADPHONE_PROFILES
}

/// Look up a headphone profile by id
pub fn headphone_profile(id: &str) -> Option<&'static CalibrationProfile> {
    HEADPHONE_PROFILES.iter().find(|p| p.id == id)
}

/// All device profiles
pub fn device_profiles() -> &'static [DeviceProfile] {
    &DEVICE_PROFILES
}

/// Look up the device profile for a platform (`Unknown` has none)
pub fn device_profile(platform: DevicePlatform) -> Option<&'static DeviceProfile> {
    DEVICE_PROFILES.iter().find(|p| p.platform == platform)
}

/// Guess a headphone profile id from an output device label
///
/// Falls back to the generic consumer profile.
pub fn auto_detect_headphone(device_label: &str) -> &'static str {
    let label = device_label.to_lowercase();

    if label.contains("airpods pro") {
        "apple-airpods-pro"
    } else if label.contains("airpods") {
        "apple-airpods"
    } else if label.contains("sony") && label.contains("1000") {
        "sony-wh1000xm4"
    } else if label.contains("bose") && label.contains("qc") {
        "bose-qc35"
    } else if label.contains("telephonics") || label.contains("tdh") {
        "telephonics-tdh39"
    } else if label.contains("sennheiser") && label.contains("hda") {
        "sennheiser-hda200"
    } else {
        "generic-consumer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_lookup() {
        let airpods = headphone_profile("apple-airpods").unwrap();
        assert_eq!(airpods.impedance_ohms, 32);
        assert!(airpods.is_validated);
        assert!(!airpods.is_clinical_grade);

        let tdh = headphone_profile("telephonics-tdh39").unwrap();
        assert!(tdh.is_clinical_grade);

        assert!(headphone_profile("koss-porta-pro").is_none());
        assert_eq!(headphone_profiles().len(), 8);
    }

    #[test]
    fn test_nearest_correction_exact_and_between() {
        let airpods = headphone_profile("apple-airpods").unwrap();
        assert_eq!(airpods.nearest_correction_db(1000), Some(-1.5));
        // 3000 Hz is 1000 from both 2000 and 4000; first in table order wins
        assert_eq!(airpods.nearest_correction_db(3000), Some(-1.0));
        assert_eq!(airpods.nearest_correction_db(6500), Some(-3.0));
        assert_eq!(airpods.nearest_correction_db(125), Some(-2.0));
    }

    #[test]
    fn test_device_platform_detection() {
        assert_eq!(
            DevicePlatform::detect("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)"),
            DevicePlatform::Ios
        );
        assert_eq!(
            DevicePlatform::detect("Mozilla/5.0 (Linux; Android 14; Pixel 8)"),
            DevicePlatform::Android
        );
        assert_eq!(
            DevicePlatform::detect("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)"),
            DevicePlatform::Macos
        );
        assert_eq!(
            DevicePlatform::detect("Mozilla/5.0 (Windows NT 10.0; Win64; x64)"),
            DevicePlatform::Windows
        );
        assert_eq!(
            DevicePlatform::detect("Mozilla/5.0 (X11; Linux x86_64)"),
            DevicePlatform::Unknown
        );
    }

    #[test]
    fn test_device_profiles() {
        assert_eq!(
            device_profile(DevicePlatform::Android).unwrap().gain_adjustment_db,
            -1.0
        );
        assert!(device_profile(DevicePlatform::Unknown).is_none());
        assert_eq!(DevicePlatform::from_id("windows"), DevicePlatform::Windows);
        assert_eq!(DevicePlatform::from_id("beos"), DevicePlatform::Unknown);
    }

    #[test]
    fn test_auto_detect_headphone() {
        assert_eq!(auto_detect_headphone("Jo's AirPods Pro"), "apple-airpods-pro");
        assert_eq!(auto_detect_headphone("AirPods"), "apple-airpods");
        assert_eq!(auto_detect_headphone("Sony WH-1000XM4"), "sony-wh1000xm4");
        assert_eq!(auto_detect_headphone("Bose QC35 II"), "bose-qc35");
        assert_eq!(auto_detect_headphone("TDH-39P"), "telephonics-tdh39");
        assert_eq!(
            auto_detect_headphone("Sennheiser HDA 200"),
            "sennheiser-hda200"
        );
        assert_eq!(auto_detect_headphone("USB Audio"), "generic-consumer");
    }
}
