use lanebeat_domain_eval::{JudgeEvent, ScoreSnapshot};
use lanebeat_ports::chart::ChartDto;
use lanebeat_ports::input::InputDevice;
use lanebeat_ports::storage::{MetronomeMode, SettingsDto};
use lanebeat_ports::types::Seconds;
use lanebeat_ports::view::SpawnedNote;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ChartSource {
    /// A chart saved under this name in storage.
    Stored(String),
    Inline(ChartDto),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Command {
    ListInputs,
    SelectInput { device_id: String },
    LoadChart { source: ChartSource },
    Start,
    Pause,
    TogglePlay,
    Stop,
    Seek { seconds: Seconds },
    SetPlaybackRate { rate: f64 },
    SetInputOffsetMs { ms: i32 },
    SetMetronomeMode { mode: MetronomeMode },
    ApplySettings { settings: SettingsDto },
    ExportDiagnostics { path: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Ready,
    LeadIn,
    Running,
    Paused,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    InputsUpdated { devices: Vec<InputDevice> },
    SessionStateUpdated { state: SessionState, settings: SettingsDto },
    ChartLoaded { notes: usize, duration_seconds: Option<Seconds> },
    TransportUpdated { seconds: Seconds, playing: bool, rate: f64 },
    NoteSpawned { note: SpawnedNote },
    Judged { event: JudgeEvent },
    ScoreUpdated { snapshot: ScoreSnapshot },
    MetronomeClick { at: Seconds },
    Seeked { seconds: Seconds, discarded: usize },
    SongFinished { summary: ScoreSnapshot },
}
