use lanebeat_domain_chart::Note;
use lanebeat_domain_eval::{JudgeEvent, LaneWindows, MissReason, NotePhase, RuntimeTable};
use lanebeat_ports::storage::SettingsDto;
use lanebeat_ports::types::{NoteId, Seconds};
use lanebeat_ports::view::SpawnedNote;

const MIN_SCROLL_SPEED: f64 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulerConfig {
    /// Visual units per second.
    pub scroll_speed: f64,
    /// Visual distance from spawn point to the judgement line.
    pub spawn_distance: f64,
    pub windows: LaneWindows,
}

impl SchedulerConfig {
    /// Travel time from spawn to the judgement line.
    pub fn lookahead(&self) -> Seconds {
        self.spawn_distance / self.scroll_speed.max(MIN_SCROLL_SPEED)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        (&SettingsDto::default()).into()
    }
}

impl From<&SettingsDto> for SchedulerConfig {
    fn from(settings: &SettingsDto) -> Self {
        Self {
            scroll_speed: settings.scroll_speed,
            spawn_distance: settings.spawn_distance,
            windows: LaneWindows {
                stick: settings.stick_windows.into(),
                button: settings.button_windows.into(),
            },
        }
    }
}

/// Walks the time-sorted note list with a forward-only spawn cursor.
pub struct NoteScheduler {
    config: SchedulerConfig,
    notes: Vec<Note>,
    cursor: usize,
}

impl NoteScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            notes: Vec::new(),
            cursor: 0,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SchedulerConfig) {
        self.config = config;
    }

    pub fn set_notes(&mut self, mut notes: Vec<Note>) {
        notes.sort_by(|a, b| a.timestamp().total_cmp(&b.timestamp()));
        self.notes = notes;
        self.cursor = 0;
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Re-derives the cursor by scanning from the start. Notes just behind
    /// `time` that are still inside a miss window spawn again, so they can be
    /// hit or expire normally.
    pub fn seek(&mut self, time: Seconds) {
        let from = time - self.config.windows.widest_miss();
        self.cursor = self
            .notes
            .iter()
            .position(|note| note.timestamp() >= from)
            .unwrap_or(self.notes.len());
    }

    /// Spawns every note with `timestamp <= now + lookahead`, in order.
    pub fn spawn_due(&mut self, now: Seconds, table: &mut RuntimeTable) -> Vec<SpawnedNote> {
        let horizon = now + self.config.lookahead();
        let mut spawned = Vec::new();
        while let Some(note) = self.notes.get(self.cursor) {
            if note.timestamp() > horizon {
                break;
            }
            if table.spawn(note) {
                spawned.push(note.to_spawned());
            }
            self.cursor += 1;
        }
        spawned
    }

    /// Auto-misses spawned notes that passed the judgement line by more than
    /// their lane class's miss window. Sustaining holds are left to the judge.
    pub fn expire_overdue(&self, now: Seconds, table: &mut RuntimeTable) -> Vec<JudgeEvent> {
        let overdue: Vec<NoteId> = table
            .live()
            .filter(|rt| rt.phase() == NotePhase::Spawned && !rt.is_sustaining())
            .filter(|rt| now - rt.timestamp() > self.config.windows.max_miss(rt.lane().class()))
            .map(|rt| rt.id())
            .collect();

        overdue
            .into_iter()
            .filter(|id| table.resolve(*id, NotePhase::ExpiredMiss))
            .map(|note| {
                log::debug!("note {:?} expired", note);
                JudgeEvent::Miss {
                    note,
                    reason: MissReason::Expired,
                }
            })
            .collect()
    }

    /// Every note has been spawned and nothing is left unresolved.
    pub fn is_finished(&self, table: &RuntimeTable) -> bool {
        self.cursor >= self.notes.len() && table.live_count() == 0
    }
}
