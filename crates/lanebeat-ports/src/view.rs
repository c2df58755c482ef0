use crate::types::{Lane, NoteId, Seconds, Shape, Tier};
use serde::{Deserialize, Serialize};

/// Read-only snapshot handed to the visual layer when a note spawns.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnedNote {
    pub id: NoteId,
    pub timestamp: Seconds,
    pub lane: Lane,
    pub shape: Shape,
    pub hold_duration: Option<Seconds>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum NoteOutcome {
    Hit { tier: Tier, delta: Seconds },
    /// Initial tier of a hold; the final outcome follows later.
    HoldStarted { tier: Tier, delta: Seconds },
    HoldCompleted,
    HoldReleased { tier: Tier, held_ratio: f64 },
    Missed,
}

/// Visual layer callbacks. The view owns rendering and never mutates judgement state.
pub trait NoteViewPort: Send {
    fn on_spawn(&mut self, note: &SpawnedNote);
    fn on_resolved(&mut self, id: NoteId, outcome: NoteOutcome);
    fn on_hold_progress(&mut self, id: NoteId, remaining_ratio: f64);

    /// Every live note was dropped (seek, stop or a new run).
    fn on_reset(&mut self) {}
}
