//! Ambient level estimation from byte magnitude spectra
//!
//! Analyser front-ends hand over 8-bit magnitude bins (0..=255). Full scale is
//! referenced to 94 dB SPL, which is an estimate, not a calibrated SPL reading.

use once_cell::sync::Lazy;

/// dB SPL corresponding to a full-scale bin
pub const FULL_SCALE_DB_SPL: f32 = 94.0;

/// Overall A-weighted maximum permissible ambient level
pub const ANSI_OVERALL_LIMIT_DB: f32 = 40.0;

/// Maximum permissible ambient levels for audiometry (ANSI S3.1), by octave band
static ANSI_LIMITS: Lazy<Vec<(u32, f32)>> = Lazy::new(|| {
    vec![
        (125, 49.0),
        (250, 35.0),
        (500, 25.0),
        (1000, 21.0),
        (2000, 26.0),
        (4000, 27.0),
        (8000, 29.0),
    ]
});

/// (frequency Hz, max dB SPL) pairs in ascending frequency order
pub fn ansi_limits() -> &'static [(u32, f32)] {
    &ANSI_LIMITS
}

/// Limit for one octave band, `None` for frequencies outside the table
pub fn ansi_limit_db(frequency_hz: u32) -> Option<f32> {
    ANSI_LIMITS
        .iter()
        .find(|(freq, _)| *freq == frequency_hz)
        .map(|(_, db)| *db)
}

fn amplitude_to_db(amplitude: f32) -> f32 {
    if amplitude <= 0.0 {
        return 0.0;
    }
    (20.0 * (amplitude / 255.0).log10() + FULL_SCALE_DB_SPL).max(0.0)
}

/// Broadband level from the RMS of all bins (clamped at 0 dB)
pub fn spectrum_level_db(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = bins.iter().map(|&b| f32::from(b) * f32::from(b)).sum();
    let rms = (sum_sq / bins.len() as f32).sqrt();
    amplitude_to_db(rms)
}

/// Level around `target_hz`, averaged over a ±10% band (at least one bin each side)
///
/// `sample_rate_hz` is the analyser's input rate; the bins span 0..Nyquist.
pub fn band_level_db(bins: &[u8], sample_rate_hz: f32, target_hz: f32) -> f32 {
    if bins.is_empty() || sample_rate_hz <= 0.0 {
        return 0.0;
    }

    let bin_width = (sample_rate_hz / 2.0) / bins.len() as f32;
    let last = bins.len() - 1;
    let target_bin = ((target_hz / bin_width).floor() as usize).min(last);
    let half_band = ((target_hz * 0.1 / bin_width).floor() as usize).max(1);

    let start = target_bin.saturating_sub(half_band);
    let end = (target_bin + half_band).min(last);

    let band = &bins[start..=end];
    let mean = band.iter().map(|&b| f32::from(b)).sum::<f32>() / band.len() as f32;
    amplitude_to_db(mean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_scale_is_reference_level() {
        let bins = [255u8; 1024];
        assert!((spectrum_level_db(&bins) - 94.0).abs() < 1e-3);
    }

    #[test]
    fn test_silence_clamps_to_zero() {
        assert_eq!(spectrum_level_db(&[0u8; 512]), 0.0);
        assert_eq!(spectrum_level_db(&[]), 0.0);
        // 1/255 is about -48 dB re full scale, still positive after the offset
        assert!(spectrum_level_db(&[1u8; 16]) > 0.0);
    }

    #[test]
    fn test_half_scale_drops_about_six_db() {
        let level = spectrum_level_db(&[128u8; 64]);
        assert!((level - 88.0).abs() < 0.1, "level = {}", level);
    }

    #[test]
    fn test_band_level_isolates_target_region() {
        // 48 kHz input, 1024 bins: 23.4375 Hz per bin
        let mut bins = [0u8; 1024];
        let target_bin = (1000.0 / 23.4375) as usize;
        for b in &mut bins[target_bin - 4..=target_bin + 4] {
            *b = 255;
        }

        let at_1k = band_level_db(&bins, 48_000.0, 1000.0);
        let at_4k = band_level_db(&bins, 48_000.0, 4000.0);
        assert!((at_1k - 94.0).abs() < 1e-3);
        assert_eq!(at_4k, 0.0);
    }

    #[test]
    fn test_band_level_clamps_to_spectrum_edges() {
        let bins = [200u8; 64];
        let level = band_level_db(&bins, 8_000.0, 20_000.0);
        assert!(level > 0.0);
    }

    #[test]
    fn test_ansi_limits() {
        assert_eq!(ansi_limit_db(1000), Some(21.0));
        assert_eq!(ansi_limit_db(125), Some(49.0));
        assert_eq!(ansi_limit_db(3000), None);
        assert_eq!(ansi_limits().len(), 7);
    }
}
