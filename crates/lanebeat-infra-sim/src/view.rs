use lanebeat_ports::types::NoteId;
use lanebeat_ports::view::{NoteOutcome, NoteViewPort, SpawnedNote};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub enum ViewRecord {
    Spawned(SpawnedNote),
    Resolved(NoteId, NoteOutcome),
    HoldProgress(NoteId, f64),
    Reset,
}

/// Note view that only remembers what it was told. Clones share one log.
#[derive(Clone, Default)]
pub struct RecordingView {
    records: Arc<Mutex<Vec<ViewRecord>>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ViewRecord> {
        self.records.lock().clone()
    }

    pub fn resolved(&self) -> Vec<(NoteId, NoteOutcome)> {
        self.records
            .lock()
            .iter()
            .filter_map(|record| match record {
                ViewRecord::Resolved(id, outcome) => Some((*id, *outcome)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl NoteViewPort for RecordingView {
    fn on_spawn(&mut self, note: &SpawnedNote) {
        self.records.lock().push(ViewRecord::Spawned(*note));
    }

    fn on_resolved(&mut self, id: NoteId, outcome: NoteOutcome) {
        self.records.lock().push(ViewRecord::Resolved(id, outcome));
    }

    fn on_hold_progress(&mut self, id: NoteId, remaining_ratio: f64) {
        self.records
            .lock()
            .push(ViewRecord::HoldProgress(id, remaining_ratio));
    }

    fn on_reset(&mut self) {
        self.records.lock().push(ViewRecord::Reset);
    }
}
