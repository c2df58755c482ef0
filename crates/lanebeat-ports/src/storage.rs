use crate::chart::ChartDto;
use serde::{Deserialize, Serialize};

fn default_scroll_speed() -> f64 {
    5.0
}

fn default_spawn_distance() -> f64 {
    10.0
}

fn default_lead_in_seconds() -> f64 {
    3.0
}

fn default_playback_rate() -> f64 {
    1.0
}

fn default_grid_division() -> u32 {
    4
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serde(String),
    #[error("chart not found: {0}")]
    ChartNotFound(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetronomeMode {
    #[default]
    Off,
    /// One click per chart note as it crosses the judgement line.
    Notes,
    /// One click per beat of the tempo map.
    Beats,
}

/// Tier windows in seconds, each an absolute distance from the note timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimingWindowsDto {
    pub perfect: f64,
    pub great: f64,
    pub good: f64,
    pub miss: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HoldThresholdsDto {
    pub perfect: f64,
    pub great: f64,
    pub good: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringDto {
    pub base_points: i64,
    pub multiplier_thresholds: Vec<u32>,
    pub tier_scaled: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsDto {
    pub selected_input: Option<String>,
    #[serde(default = "default_scroll_speed")]
    pub scroll_speed: f64,
    #[serde(default = "default_spawn_distance")]
    pub spawn_distance: f64,
    #[serde(default = "default_lead_in_seconds")]
    pub lead_in_seconds: f64,
    #[serde(default = "default_playback_rate")]
    pub playback_rate: f64,
    pub input_offset_ms: i32,
    pub button_windows: TimingWindowsDto,
    pub stick_windows: TimingWindowsDto,
    pub hold_thresholds: HoldThresholdsDto,
    pub scoring: ScoringDto,
    pub metronome: MetronomeMode,
    #[serde(default = "default_grid_division")]
    pub grid_division: u32,
}

impl TimingWindowsDto {
    pub fn button_defaults() -> Self {
        Self {
            perfect: 0.05,
            great: 0.10,
            good: 0.15,
            miss: 0.20,
        }
    }

    pub fn stick_defaults() -> Self {
        Self {
            perfect: 0.08,
            great: 0.15,
            good: 0.20,
            miss: 0.30,
        }
    }
}

impl Default for HoldThresholdsDto {
    fn default() -> Self {
        Self {
            perfect: 0.95,
            great: 0.80,
            good: 0.60,
        }
    }
}

impl Default for ScoringDto {
    fn default() -> Self {
        Self {
            base_points: 100,
            multiplier_thresholds: vec![4, 8, 12],
            tier_scaled: false,
        }
    }
}

impl Default for SettingsDto {
    fn default() -> Self {
        Self {
            selected_input: None,
            scroll_speed: default_scroll_speed(),
            spawn_distance: default_spawn_distance(),
            lead_in_seconds: default_lead_in_seconds(),
            playback_rate: default_playback_rate(),
            input_offset_ms: 0,
            button_windows: TimingWindowsDto::button_defaults(),
            stick_windows: TimingWindowsDto::stick_defaults(),
            hold_thresholds: HoldThresholdsDto::default(),
            scoring: ScoringDto::default(),
            metronome: MetronomeMode::Off,
            grid_division: default_grid_division(),
        }
    }
}

pub trait StoragePort: Send + Sync {
    fn load_settings(&self) -> Result<SettingsDto, StorageError>;
    fn save_settings(&self, s: &SettingsDto) -> Result<(), StorageError>;

    fn list_charts(&self) -> Result<Vec<String>, StorageError>;
    fn load_chart(&self, name: &str) -> Result<ChartDto, StorageError>;
    fn save_chart(&self, name: &str, chart: &ChartDto) -> Result<(), StorageError>;
}
