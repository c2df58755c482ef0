use lanebeat_domain_chart::Note;
use lanebeat_ports::types::{Lane, NoteId, Seconds, Shape};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotePhase {
    Spawned,
    Resolved,
    ExpiredMiss,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldPhase {
    NotStarted,
    Sustaining,
    Completed,
    Failed,
}

/// Judgement state of one spawned note. Lives in the table from spawn until
/// its first resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct NoteRuntime {
    note: Note,
    phase: NotePhase,
    hold_phase: HoldPhase,
    hold_remaining: Seconds,
    hold_started_at: Seconds,
}

/// Final record of a resolved note runtime.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ArchivedNote {
    pub id: NoteId,
    pub lane: Lane,
    pub timestamp: Seconds,
    pub phase: NotePhase,
    pub hold_phase: HoldPhase,
}

/// Runtime table shared by the scheduler and the judge, keyed by note id.
/// Live entries are kept in spawn order, which is timestamp order.
#[derive(Debug, Default)]
pub struct RuntimeTable {
    live: Vec<NoteRuntime>,
    resolved: HashSet<NoteId>,
    archive: Vec<ArchivedNote>,
}

impl NoteRuntime {
    fn new(note: Note) -> Self {
        Self {
            note,
            phase: NotePhase::Spawned,
            hold_phase: HoldPhase::NotStarted,
            hold_remaining: note.hold_duration(),
            hold_started_at: note.timestamp(),
        }
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    pub fn id(&self) -> NoteId {
        self.note.id()
    }

    pub fn lane(&self) -> Lane {
        self.note.lane()
    }

    pub fn shape(&self) -> Shape {
        self.note.shape()
    }

    pub fn timestamp(&self) -> Seconds {
        self.note.timestamp()
    }

    pub fn phase(&self) -> NotePhase {
        self.phase
    }

    pub fn hold_phase(&self) -> HoldPhase {
        self.hold_phase
    }

    pub fn is_sustaining(&self) -> bool {
        self.hold_phase == HoldPhase::Sustaining
    }

    pub fn hold_remaining(&self) -> Seconds {
        self.hold_remaining
    }

    /// `1 - remaining / duration`; zero for taps.
    pub fn held_ratio(&self) -> f64 {
        let duration = self.note.hold_duration();
        if duration <= 0.0 {
            return 0.0;
        }
        (1.0 - self.hold_remaining / duration).clamp(0.0, 1.0)
    }

    pub fn remaining_ratio(&self) -> f64 {
        1.0 - self.held_ratio()
    }

    pub(crate) fn start_hold(&mut self, at: Seconds) {
        self.hold_phase = HoldPhase::Sustaining;
        self.hold_started_at = at;
        self.hold_remaining = self.note.hold_duration();
    }

    /// Recomputes the remaining hold time from the current clock reading.
    pub(crate) fn sustain_until(&mut self, now: Seconds) {
        let held_for = (now - self.hold_started_at).max(0.0);
        self.hold_remaining = (self.note.hold_duration() - held_for).max(0.0);
    }

    pub(crate) fn set_hold_phase(&mut self, phase: HoldPhase) {
        self.hold_phase = phase;
    }

    fn archived(&self) -> ArchivedNote {
        ArchivedNote {
            id: self.id(),
            lane: self.lane(),
            timestamp: self.timestamp(),
            phase: self.phase,
            hold_phase: self.hold_phase,
        }
    }
}

impl RuntimeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh runtime for `note`. Returns `false` if the note is
    /// already live or was resolved since the last `clear`.
    pub fn spawn(&mut self, note: &Note) -> bool {
        let id = note.id();
        if self.resolved.contains(&id) || self.live.iter().any(|rt| rt.id() == id) {
            return false;
        }
        self.live.push(NoteRuntime::new(*note));
        true
    }

    pub fn get(&self, id: NoteId) -> Option<&NoteRuntime> {
        self.live.iter().find(|rt| rt.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: NoteId) -> Option<&mut NoteRuntime> {
        self.live.iter_mut().find(|rt| rt.id() == id)
    }

    pub fn live(&self) -> impl Iterator<Item = &NoteRuntime> + '_ {
        self.live.iter()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_resolved(&self, id: NoteId) -> bool {
        self.resolved.contains(&id)
    }

    pub fn sustaining_in(&self, lane: Lane) -> Option<&NoteRuntime> {
        self.live.iter().find(|rt| rt.lane() == lane && rt.is_sustaining())
    }

    /// Moves the note out of the live set with its final phase. A second
    /// resolution of the same note is a no-op returning `false`.
    pub fn resolve(&mut self, id: NoteId, phase: NotePhase) -> bool {
        if phase == NotePhase::Spawned || self.resolved.contains(&id) {
            return false;
        }
        let Some(index) = self.live.iter().position(|rt| rt.id() == id) else {
            return false;
        };
        let mut runtime = self.live.remove(index);
        runtime.phase = phase;
        self.resolved.insert(id);
        self.archive.push(runtime.archived());
        true
    }

    pub fn archive(&self) -> &[ArchivedNote] {
        &self.archive
    }

    /// Drops every live runtime (including sustaining holds) and forgets which
    /// notes were resolved, so they can spawn again. Returns the discarded ids.
    pub fn clear(&mut self) -> Vec<NoteId> {
        self.resolved.clear();
        self.live.drain(..).map(|rt| rt.id()).collect()
    }

    /// Full reset for a new run: also forgets the archive.
    pub fn reset(&mut self) {
        self.clear();
        self.archive.clear();
    }
}
