use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, RwLock};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use screening_core::audio::RecordingPlayer;
use screening_core::calibration::profiles::{
    device_profiles, headphone_profile, headphone_profiles, DevicePlatform,
};
use screening_core::calibration::{
    resolve_gain_breakdown, BiologicalCalibration, CalibrationState, JsonFileStore,
};
use screening_core::config::{AppConfig, HearingConfig};
use screening_core::hearing::{generate_report, DetectionMap, FrequencySet, EXTENDED_FREQUENCIES};
use screening_core::noise::NoiseAssessment;
use screening_core::vision::{StaircaseState, VisionOutcome};
use screening_core::{CalibrationManager, HearingSession};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "screening_cli",
    about = "Offline harness for the screening engine's scoring and calibration logic"
)]
struct Cli {
    /// Configuration file (defaults to assets/screening_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a 5-frequency detection map into an audiogram report
    Classify {
        /// Detected frequencies (Hz); all others count as failed
        #[arg(long, value_delimiter = ',', conflicts_with = "failed")]
        detected: Option<Vec<u32>>,
        /// Failed frequencies (Hz); all others count as detected
        #[arg(long, value_delimiter = ',')]
        failed: Option<Vec<u32>>,
    },
    /// Resolve the playback gain for one frequency
    Gain {
        #[arg(long)]
        frequency: u32,
        #[arg(long)]
        headphone: Option<String>,
        #[arg(long, default_value = "unknown")]
        platform: String,
        /// Biological adjustments as HZ=DB pairs
        #[arg(long, value_delimiter = ',')]
        bio: Vec<String>,
    },
    /// List headphone and device calibration profiles
    Profiles,
    /// Replay staircase responses (1 correct, 0 incorrect) and score them
    Acuity {
        #[arg(long)]
        age: u32,
        #[arg(long, value_delimiter = ',')]
        responses: Vec<u8>,
    },
    /// Assess a recorded sequence of ambient levels
    Noise {
        #[arg(long, value_delimiter = ',', required = true)]
        levels: Vec<f32>,
        /// Override the configured threshold (dB)
        #[arg(long)]
        threshold: Option<f32>,
    },
    /// Simulate a hearing test with a scripted responder
    Hearing {
        #[arg(long, default_value = "extended")]
        set: FrequencySet,
        /// Frequencies the simulated subject fails to identify
        #[arg(long, value_delimiter = ',')]
        miss: Vec<u32>,
    },
    /// Inspect or change persisted calibration
    Calibration {
        /// Calibration snapshot file
        #[arg(long)]
        store: PathBuf,
        #[arg(long, default_value = "unknown")]
        platform: String,
        #[command(subcommand)]
        action: CalibrationAction,
    },
}

#[derive(Subcommand, Debug)]
enum CalibrationAction {
    /// Print the calibration summary
    Show,
    /// Select a headphone profile by id
    Select { id: String },
    /// Clear all calibration
    Reset,
    /// Print the snapshot JSON
    Export,
    /// Load a snapshot JSON file
    Import { file: PathBuf },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    screening_core::init_logging();
    let config = cli
        .config
        .map(AppConfig::load_from_file)
        .unwrap_or_else(AppConfig::load);

    match cli.command {
        Commands::Classify { detected, failed } => run_classify(detected, failed),
        Commands::Gain {
            frequency,
            headphone,
            platform,
            bio,
        } => run_gain(frequency, headphone, &platform, &bio),
        Commands::Profiles => run_profiles(),
        Commands::Acuity { age, responses } => run_acuity(age, &responses),
        Commands::Noise { levels, threshold } => {
            run_noise(&levels, threshold.unwrap_or(config.noise.threshold_db))
        }
        Commands::Hearing { set, miss } => run_hearing(set, &miss),
        Commands::Calibration {
            store,
            platform,
            action,
        } => run_calibration(store, &platform, action),
    }
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_classify(detected: Option<Vec<u32>>, failed: Option<Vec<u32>>) -> Result<ExitCode> {
    let results: DetectionMap = match (detected, failed) {
        (Some(detected), None) => EXTENDED_FREQUENCIES
            .iter()
            .map(|hz| (*hz, detected.contains(hz)))
            .collect(),
        (None, Some(failed)) => EXTENDED_FREQUENCIES
            .iter()
            .map(|hz| (*hz, !failed.contains(hz)))
            .collect(),
        _ => bail!("pass exactly one of --detected or --failed"),
    };

    emit(&generate_report(&results))?;
    Ok(ExitCode::from(0))
}

fn parse_bio(pairs: &[String]) -> Result<BTreeMap<u32, f64>> {
    pairs
        .iter()
        .map(|pair| {
            let (hz, db) = pair
                .split_once('=')
                .with_context(|| format!("expected HZ=DB, got '{}'", pair))?;
            let hz: u32 = hz
                .trim()
                .parse()
                .with_context(|| format!("invalid frequency in '{}'", pair))?;
            let db: f64 = db
                .trim()
                .parse()
                .with_context(|| format!("invalid dB value in '{}'", pair))?;
            Ok((hz, db))
        })
        .collect()
}

fn run_gain(
    frequency: u32,
    headphone: Option<String>,
    platform: &str,
    bio: &[String],
) -> Result<ExitCode> {
    if let Some(id) = &headphone {
        if headphone_profile(id).is_none() {
            bail!("unknown headphone profile '{}'", id);
        }
    }

    let mut state = CalibrationState::new(DevicePlatform::from_id(platform));
    state.selected_profile_id = headphone;
    if !bio.is_empty() {
        state.biological_calibration = Some(BiologicalCalibration {
            per_frequency_db_adjustment: parse_bio(bio)?,
        });
    }

    emit(&resolve_gain_breakdown(frequency, &state))?;
    Ok(ExitCode::from(0))
}

fn run_profiles() -> Result<ExitCode> {
    #[derive(Serialize)]
    struct ProfilesPayload {
        headphones: &'static [screening_core::calibration::CalibrationProfile],
        devices: &'static [screening_core::calibration::DeviceProfile],
    }

    emit(&ProfilesPayload {
        headphones: headphone_profiles(),
        devices: device_profiles(),
    })?;
    Ok(ExitCode::from(0))
}

fn run_acuity(age: u32, responses: &[u8]) -> Result<ExitCode> {
    #[derive(Serialize)]
    struct AcuityPayload {
        #[serde(flatten)]
        outcome: VisionOutcome,
        complete: bool,
        ignored_responses: usize,
    }

    let mut state = StaircaseState::for_age(age);
    let mut used = 0;
    for &response in responses {
        if state.is_complete() {
            break;
        }
        match response {
            0 | 1 => state = state.apply_response(response == 1),
            other => bail!("responses must be 0 or 1, got {}", other),
        }
        used += 1;
    }

    emit(&AcuityPayload {
        outcome: VisionOutcome::from_state(&state),
        complete: state.is_complete(),
        ignored_responses: responses.len() - used,
    })?;
    Ok(ExitCode::from(0))
}

fn run_noise(levels: &[f32], threshold: f32) -> Result<ExitCode> {
    let assessment = NoiseAssessment::from_samples(levels, threshold);
    emit(&assessment)?;
    Ok(ExitCode::from(if assessment.acceptable { 0 } else { 2 }))
}

fn run_hearing(set: FrequencySet, miss: &[u32]) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("building tokio runtime")?;

    let config = HearingConfig {
        frequency_set: set,
        pre_stimulus_delay_ms: 0,
        stimulus_duration_ms: 0,
        feedback_ms: 0,
    };
    let calibration = Arc::new(RwLock::new(CalibrationState::new(DevicePlatform::Unknown)));
    let mut session = HearingSession::new(Arc::new(RecordingPlayer::new()), calibration, config);

    let outcome = runtime.block_on(session.run(|presentation| {
        let stimulus = presentation.stimulus;
        if miss.contains(&stimulus.frequency_hz) {
            // Pick any other label
            presentation
                .choices
                .iter()
                .find(|label| **label != stimulus.id)
                .map(|label| label.to_string())
                .unwrap_or_default()
        } else {
            stimulus.id.to_string()
        }
    }))?;

    emit(&outcome)?;
    Ok(ExitCode::from(0))
}

fn run_calibration(store: PathBuf, platform: &str, action: CalibrationAction) -> Result<ExitCode> {
    let manager = CalibrationManager::new(
        DevicePlatform::from_id(platform),
        Arc::new(JsonFileStore::new(&store)),
    );
    manager
        .load()
        .with_context(|| format!("loading calibration from {}", store.display()))?;

    match action {
        CalibrationAction::Show => emit(&manager.summary()?)?,
        CalibrationAction::Select { id } => {
            manager.select_headphone(&id)?;
            emit(&manager.summary()?)?;
        }
        CalibrationAction::Reset => {
            manager.reset()?;
            emit(&manager.summary()?)?;
        }
        CalibrationAction::Export => emit(&manager.export_snapshot()?)?,
        CalibrationAction::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            manager.import_json(&json)?;
            emit(&manager.summary()?)?;
        }
    }
    Ok(ExitCode::from(0))
}
