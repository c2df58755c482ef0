use crate::model::{ChartError, Note, NoteSpec};
use crate::tempo::{TempoMap, TempoSegment};
use lanebeat_ports::chart::{AudioRef, ChartDto, CHART_SCHEMA_VERSION};
use lanebeat_ports::types::{Lane, NoteId, Seconds, Shape};

/// Collision tolerance for placement and paste.
pub const PLACEMENT_TOLERANCE: Seconds = 0.01;
/// Tolerance used when picking a note under the cursor.
pub const PICK_TOLERANCE: Seconds = 0.2;

const SAME_SEGMENT_EPSILON: Seconds = 1e-9;

/// Notes are kept sorted by timestamp (stable on ties) after every mutation
/// that goes through this type.
#[derive(Clone, Debug)]
pub struct Chart {
    base_bpm: f64,
    notes: Vec<Note>,
    tempo_segments: Vec<TempoSegment>,
    audio: Option<AudioRef>,
    next_id: u64,
}

impl Chart {
    pub fn new(base_bpm: f64) -> Result<Self, ChartError> {
        validate_bpm(0.0, base_bpm)?;
        Ok(Self {
            base_bpm,
            notes: Vec::new(),
            tempo_segments: Vec::new(),
            audio: None,
            next_id: 1,
        })
    }

    pub fn from_dto(dto: &ChartDto) -> Result<Self, ChartError> {
        if dto.schema_version != CHART_SCHEMA_VERSION {
            return Err(ChartError::UnsupportedSchema(dto.schema_version.clone()));
        }

        let mut chart = Chart::new(dto.base_bpm)?;
        chart.audio = dto.audio.clone();
        // Bad tempo changes are dropped; the rest of the chart still loads.
        for change in &dto.tempo_changes {
            if let Err(err) = chart.add_tempo_segment(TempoSegment::from_dto(change)) {
                log::warn!("skipping tempo change: {err}");
            }
        }
        for note in &dto.notes {
            let spec = NoteSpec::from_dto(note)?;
            chart.push_note(spec);
        }
        chart.sort_notes();
        Ok(chart)
    }

    pub fn to_dto(&self) -> ChartDto {
        ChartDto {
            schema_version: CHART_SCHEMA_VERSION.to_string(),
            base_bpm: self.base_bpm,
            audio: self.audio.clone(),
            tempo_changes: self.tempo_segments.iter().map(|s| s.to_dto()).collect(),
            notes: self.notes.iter().map(|n| n.spec().to_dto()).collect(),
        }
    }

    pub fn base_bpm(&self) -> f64 {
        self.base_bpm
    }

    pub fn set_base_bpm(&mut self, bpm: f64) -> Result<(), ChartError> {
        validate_bpm(0.0, bpm)?;
        self.base_bpm = bpm;
        Ok(())
    }

    pub fn audio(&self) -> Option<&AudioRef> {
        self.audio.as_ref()
    }

    pub fn set_audio(&mut self, audio: Option<AudioRef>) {
        self.audio = audio;
    }

    pub fn audio_duration_seconds(&self) -> Option<Seconds> {
        self.audio.as_ref().map(|audio| audio.duration_seconds)
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id() == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Last moment any note needs the player: the end of the latest hold or tap.
    pub fn last_note_end(&self) -> Option<Seconds> {
        self.notes.iter().map(|note| note.end_time()).reduce(f64::max)
    }

    pub fn add_note(&mut self, spec: NoteSpec) -> NoteId {
        let id = self.push_note(spec);
        self.sort_notes();
        id
    }

    pub fn remove_note(&mut self, id: NoteId) -> Result<Note, ChartError> {
        let index = self
            .notes
            .iter()
            .position(|note| note.id() == id)
            .ok_or(ChartError::NoteNotFound(id))?;
        Ok(self.notes.remove(index))
    }

    pub fn move_note(&mut self, id: NoteId, timestamp: Seconds) -> Result<(), ChartError> {
        let note = self.note_mut(id)?;
        let moved = note.spec().with_timestamp(timestamp)?;
        *note.spec_mut() = moved;
        self.sort_notes();
        Ok(())
    }

    pub fn set_note_shape(&mut self, id: NoteId, shape: Shape) -> Result<(), ChartError> {
        let note = self.note_mut(id)?;
        let reshaped = note.spec().with_shape(shape)?;
        *note.spec_mut() = reshaped;
        Ok(())
    }

    pub fn sort_notes(&mut self) {
        self.notes
            .sort_by(|a, b| a.timestamp().total_cmp(&b.timestamp()));
    }

    /// First note in `lane` with `|timestamp - time| < tolerance`, in list order.
    pub fn find_note_near(&self, lane: Lane, time: Seconds, tolerance: Seconds) -> Option<&Note> {
        self.notes
            .iter()
            .find(|note| note.lane() == lane && (note.timestamp() - time).abs() < tolerance)
    }

    pub fn tempo_segments(&self) -> &[TempoSegment] {
        &self.tempo_segments
    }

    /// Rejects segments at or before zero and non-positive BPM. A segment at an
    /// existing start time replaces that segment's BPM.
    pub fn add_tempo_segment(&mut self, segment: TempoSegment) -> Result<(), ChartError> {
        if !(segment.start.is_finite() && segment.start > 0.0) {
            return Err(ChartError::InvalidTempo {
                at: segment.start,
                bpm: segment.bpm,
            });
        }
        validate_bpm(segment.start, segment.bpm)?;

        if let Some(existing) = self
            .tempo_segments
            .iter_mut()
            .find(|s| (s.start - segment.start).abs() < SAME_SEGMENT_EPSILON)
        {
            existing.bpm = segment.bpm;
            return Ok(());
        }

        self.tempo_segments.push(segment);
        self.sort_tempo_segments();
        Ok(())
    }

    pub fn remove_tempo_segment(&mut self, index: usize) -> Option<TempoSegment> {
        (index < self.tempo_segments.len()).then(|| self.tempo_segments.remove(index))
    }

    pub fn sort_tempo_segments(&mut self) {
        self.tempo_segments
            .sort_by(|a, b| a.start.total_cmp(&b.start));
    }

    pub fn tempo_map(&self) -> TempoMap {
        TempoMap::new(self.base_bpm, self.tempo_segments.clone())
    }

    pub fn bpm_at(&self, time: Seconds) -> f64 {
        let mut bpm = self.base_bpm;
        for segment in &self.tempo_segments {
            if segment.start > time {
                break;
            }
            bpm = segment.bpm;
        }
        bpm
    }

    /// Appends without re-sorting; callers batch-insert and sort once.
    pub(crate) fn push_note(&mut self, spec: NoteSpec) -> NoteId {
        let id = NoteId(self.next_id);
        self.next_id += 1;
        self.notes.push(Note::new(id, spec));
        id
    }

    fn note_mut(&mut self, id: NoteId) -> Result<&mut Note, ChartError> {
        self.notes
            .iter_mut()
            .find(|note| note.id() == id)
            .ok_or(ChartError::NoteNotFound(id))
    }
}

fn validate_bpm(at: Seconds, bpm: f64) -> Result<(), ChartError> {
    if bpm.is_finite() && bpm > 0.0 {
        Ok(())
    } else {
        Err(ChartError::InvalidTempo { at, bpm })
    }
}
