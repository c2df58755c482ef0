use crate::metronome::Metronome;
use lanebeat_domain_chart::{
    copy_selection, delete_note, delete_note_near, delete_selection, grid_lines, paste_at_time,
    place_note, select_notes_in_region, Chart, ChartError, Clipboard, GridLine, Note, NoteKind,
    NoteSpec, PlaceOutcome, Selection, TempoSegment, TimelineScale, PICK_TOLERANCE,
};
use lanebeat_ports::chart::ChartDto;
use lanebeat_ports::storage::{MetronomeMode, SettingsDto};
use lanebeat_ports::types::{ButtonRow, Lane, LaneClass, NoteId, Seconds, Shape, StickDirection};
use std::ops::RangeInclusive;

/// Shape and kind given to notes placed by clicking a lane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteTemplate {
    pub stick: StickDirection,
    pub button: ButtonRow,
    /// `Some` places holds of this length.
    pub hold: Option<Seconds>,
}

impl Default for NoteTemplate {
    fn default() -> Self {
        Self {
            stick: StickDirection::Horizontal,
            button: ButtonRow::Top,
            hold: None,
        }
    }
}

impl NoteTemplate {
    pub fn shape_for(&self, lane: Lane) -> Shape {
        match lane.class() {
            LaneClass::Stick => Shape::Stick(self.stick),
            LaneClass::Button => Shape::Button(self.button),
        }
    }

    pub fn spec_at(&self, lane: Lane, time: Seconds) -> Result<NoteSpec, ChartError> {
        let kind = match self.hold {
            Some(duration) => NoteKind::Hold { duration },
            None => NoteKind::Tap,
        };
        NoteSpec::new(time, lane, self.shape_for(lane), kind)
    }
}

/// Audition playhead: advanced by wall-clock deltas, clicks on every note.
#[derive(Debug, Default)]
struct Preview {
    playing: bool,
    position: Seconds,
    clicks: Metronome,
}

/// Chart being edited plus the editor-side state around it.
pub struct EditorSession {
    chart: Chart,
    selection: Selection,
    clipboard: Clipboard,
    template: NoteTemplate,
    division: u32,
    scale: TimelineScale,
    preview: Preview,
    dirty: bool,
}

impl EditorSession {
    pub fn new(chart: Chart) -> Self {
        Self::with_settings(chart, &SettingsDto::default())
    }

    /// Grid division comes from the saved settings.
    pub fn with_settings(chart: Chart, settings: &SettingsDto) -> Self {
        Self {
            chart,
            selection: Selection::new(),
            clipboard: Clipboard::default(),
            template: NoteTemplate::default(),
            division: settings.grid_division.max(1),
            scale: TimelineScale::default(),
            preview: Preview::default(),
            dirty: false,
        }
    }

    pub fn from_dto(dto: &ChartDto) -> Result<Self, ChartError> {
        Ok(Self::new(Chart::from_dto(dto)?))
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn to_dto(&self) -> ChartDto {
        self.chart.to_dto()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn template(&self) -> NoteTemplate {
        self.template
    }

    pub fn set_template(&mut self, template: NoteTemplate) {
        self.template = template;
    }

    pub fn division(&self) -> u32 {
        self.division
    }

    pub fn set_division(&mut self, division: u32) {
        self.division = division.max(1);
    }

    pub fn scale(&self) -> TimelineScale {
        self.scale
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.scale.zoom = zoom.max(f64::EPSILON);
    }

    pub fn snap(&self, time: Seconds) -> Seconds {
        self.chart.snap(time, self.division)
    }

    pub fn place_note(&mut self, lane: Lane, time: Seconds) -> Result<PlaceOutcome, ChartError> {
        let spec = self.template.spec_at(lane, time.max(0.0))?;
        let outcome = place_note(&mut self.chart, spec, self.division)?;
        if matches!(outcome, PlaceOutcome::Placed(_)) {
            self.dirty = true;
        }
        Ok(outcome)
    }

    /// Places a note at a point on the timeline, `y` measured from time zero.
    pub fn place_at(&mut self, x: f64, y: f64) -> Result<PlaceOutcome, ChartError> {
        let map = self.chart.tempo_map();
        let lane = self.scale.lane_at_x(x);
        let time = self.scale.y_to_time(&map, y);
        self.place_note(lane, time)
    }

    pub fn delete_note(&mut self, id: NoteId) -> Result<Note, ChartError> {
        let removed = delete_note(&mut self.chart, id)?;
        self.selection.remove(id);
        self.dirty = true;
        Ok(removed)
    }

    pub fn delete_at(&mut self, x: f64, y: f64) -> Option<Note> {
        let map = self.chart.tempo_map();
        let lane = self.scale.lane_at_x(x);
        let time = self.scale.y_to_time(&map, y);
        let removed = delete_note_near(&mut self.chart, lane, time, PICK_TOLERANCE)?;
        self.selection.remove(removed.id());
        self.dirty = true;
        Some(removed)
    }

    pub fn note_near(&self, lane: Lane, time: Seconds) -> Option<&Note> {
        self.chart.find_note_near(lane, time, PICK_TOLERANCE)
    }

    pub fn select_region(&mut self, lanes: RangeInclusive<Lane>, times: RangeInclusive<Seconds>) -> usize {
        self.selection = select_notes_in_region(&self.chart, lanes, times);
        self.selection.len()
    }

    pub fn select_all(&mut self) -> usize {
        self.selection = self.chart.notes().iter().map(|note| note.id()).collect();
        self.selection.len()
    }

    pub fn toggle_selected(&mut self, id: NoteId) {
        if !self.selection.remove(id) && self.chart.note(id).is_some() {
            self.selection.insert(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn delete_selected(&mut self) -> usize {
        let removed = delete_selection(&mut self.chart, &mut self.selection);
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    pub fn copy_selection(&mut self) -> usize {
        self.clipboard = copy_selection(&self.chart, &self.selection);
        self.clipboard.len()
    }

    pub fn paste_at(&mut self, time: Seconds) -> Vec<NoteId> {
        let inserted = paste_at_time(&mut self.chart, &self.clipboard, time, self.division);
        if !inserted.is_empty() {
            self.dirty = true;
            self.selection = inserted.iter().copied().collect();
        }
        inserted
    }

    pub fn paste_at_playhead(&mut self) -> Vec<NoteId> {
        self.paste_at(self.preview.position)
    }

    pub fn add_tempo_change(&mut self, start: Seconds, bpm: f64) -> Result<(), ChartError> {
        self.chart.add_tempo_segment(TempoSegment { start, bpm })?;
        self.dirty = true;
        Ok(())
    }

    pub fn remove_tempo_change(&mut self, index: usize) -> Option<TempoSegment> {
        let removed = self.chart.remove_tempo_segment(index)?;
        self.dirty = true;
        Some(removed)
    }

    pub fn grid_lines(&self, from: Seconds, to: Seconds) -> Vec<GridLine> {
        grid_lines(&self.chart.tempo_map(), self.division, from, to)
    }

    pub fn time_to_y(&self, time: Seconds) -> f64 {
        self.scale.time_to_y(&self.chart.tempo_map(), time)
    }

    /// Height of the whole timeline: the audio length, or the last note end.
    pub fn timeline_height(&self) -> f64 {
        let end = self
            .chart
            .audio_duration_seconds()
            .or_else(|| self.chart.last_note_end())
            .unwrap_or(0.0);
        self.scale.total_height(&self.chart.tempo_map(), end)
    }

    pub fn playhead(&self) -> Seconds {
        self.preview.position
    }

    pub fn is_previewing(&self) -> bool {
        self.preview.playing
    }

    /// Starting the preview picks up edits made since the last run.
    pub fn toggle_preview(&mut self) -> bool {
        self.preview.playing = !self.preview.playing;
        if self.preview.playing {
            self.preview
                .clicks
                .rebuild(MetronomeMode::Notes, &self.chart, self.preview.position);
            log::debug!("preview started at {:.2}s", self.preview.position);
        }
        self.preview.playing
    }

    pub fn seek_preview(&mut self, time: Seconds) {
        let end = self.chart.audio_duration_seconds().unwrap_or(f64::INFINITY);
        self.preview.position = time.clamp(0.0, end);
        self.preview.clicks.seek(self.preview.position);
    }

    /// Advances the playhead and returns the note clicks it passed.
    pub fn tick_preview(&mut self, dt: Seconds) -> Vec<Seconds> {
        if !self.preview.playing {
            return Vec::new();
        }
        self.preview.position += dt.max(0.0);
        if let Some(end) = self.chart.audio_duration_seconds() {
            if self.preview.position >= end {
                self.preview.position = end;
                self.preview.playing = false;
            }
        }
        self.preview.clicks.poll(self.preview.position)
    }
}
