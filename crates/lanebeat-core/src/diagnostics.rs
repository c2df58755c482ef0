use lanebeat_domain_chart::Chart;
use lanebeat_domain_eval::{JudgeEvent, ScoreSnapshot};
use lanebeat_ports::input::InputDevice;
use lanebeat_ports::storage::{SettingsDto, StorageError};
use lanebeat_ports::types::Seconds;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Serialize)]
struct AppVersion {
    name: String,
    version: String,
}

#[derive(Serialize)]
struct PlatformInfo {
    os: String,
    arch: String,
}

#[derive(Serialize)]
struct DeviceSnapshot {
    inputs: Vec<InputDevice>,
}

#[derive(Serialize)]
pub struct ChartSummary {
    pub notes: usize,
    pub holds: usize,
    pub tempo_segments: usize,
    pub base_bpm: f64,
    pub duration_seconds: Option<Seconds>,
}

#[derive(Serialize)]
struct RecentJudgements {
    events: Vec<JudgeEvent>,
    score: Option<ScoreSnapshot>,
}

impl ChartSummary {
    pub fn of(chart: &Chart) -> Self {
        Self {
            notes: chart.len(),
            holds: chart.notes().iter().filter(|note| note.is_hold()).count(),
            tempo_segments: chart.tempo_segments().len(),
            base_bpm: chart.base_bpm(),
            duration_seconds: chart.audio_duration_seconds(),
        }
    }
}

pub fn export_diagnostics(
    dir: &Path,
    settings: &SettingsDto,
    inputs: Vec<InputDevice>,
    chart: Option<ChartSummary>,
    recent: Vec<JudgeEvent>,
    score: Option<ScoreSnapshot>,
) -> Result<(), StorageError> {
    fs::create_dir_all(dir).map_err(|e| StorageError::Io(e.to_string()))?;

    let app_version = AppVersion {
        name: "Lanebeat".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let platform = PlatformInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    };

    write_json(&dir.join("app_version.json"), &app_version)?;
    write_json(&dir.join("platform.json"), &platform)?;
    write_json(&dir.join("settings.json"), settings)?;
    write_json(&dir.join("device_snapshot.json"), &DeviceSnapshot { inputs })?;
    write_json(&dir.join("chart_summary.json"), &chart)?;
    write_json(
        &dir.join("recent_judgements.json"),
        &RecentJudgements {
            events: recent,
            score,
        },
    )?;

    log::info!("diagnostics written to {}", dir.display());
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let data = serde_json::to_vec_pretty(value).map_err(|e| StorageError::Serde(e.to_string()))?;
    fs::write(path, data).map_err(|e| StorageError::Io(e.to_string()))
}
