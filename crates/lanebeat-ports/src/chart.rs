use crate::types::{Seconds, Shape};
use serde::{Deserialize, Serialize};

pub const CHART_SCHEMA_VERSION: &str = "1";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteKindDto {
    Tap,
    Hold,
}

/// Flat persisted note record; validated when turned into a chart note.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteDto {
    pub timestamp: Seconds,
    pub lane: i32,
    pub shape: Shape,
    pub kind: NoteKindDto,
    #[serde(default)]
    pub hold_duration: Seconds,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TempoChangeDto {
    pub timestamp: Seconds,
    pub bpm: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioRef {
    pub path: String,
    pub duration_seconds: Seconds,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartDto {
    pub schema_version: String,
    pub base_bpm: f64,
    pub audio: Option<AudioRef>,
    #[serde(default)]
    pub tempo_changes: Vec<TempoChangeDto>,
    pub notes: Vec<NoteDto>,
}

impl ChartDto {
    pub fn new(base_bpm: f64) -> Self {
        Self {
            schema_version: CHART_SCHEMA_VERSION.to_string(),
            base_bpm,
            audio: None,
            tempo_changes: Vec::new(),
            notes: Vec::new(),
        }
    }
}
