use crate::chart::{Chart, PLACEMENT_TOLERANCE};
use crate::model::{ChartError, Note, NoteSpec};
use lanebeat_ports::types::{Lane, NoteId, Seconds};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaceOutcome {
    Placed(NoteId),
    /// A note already occupies the snapped (lane, time); nothing was inserted.
    Skipped { existing: NoteId },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<NoteId>,
}

/// Copied notes with timestamps relative to the earliest copied note. Lanes stay absolute.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Clipboard {
    entries: Vec<NoteSpec>,
}

/// Rounds `time` to the nearest multiple of one `division`-th of a beat at `bpm_at_time`.
pub fn snap_to_grid(time: Seconds, bpm_at_time: f64, division: u32) -> Seconds {
    let interval = 60.0 / bpm_at_time / division.max(1) as f64;
    (time / interval).round() * interval
}

impl Chart {
    /// Snaps using the BPM active at `time`, not the base BPM.
    pub fn snap(&self, time: Seconds, division: u32) -> Seconds {
        snap_to_grid(time, self.bpm_at(time), division)
    }
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: NoteId) -> bool {
        self.ids.insert(id)
    }

    pub fn remove(&mut self, id: NoteId) -> bool {
        self.ids.remove(&id)
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.ids.contains(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NoteId> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<NoteId> for Selection {
    fn from_iter<T: IntoIterator<Item = NoteId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl Clipboard {
    pub fn entries(&self) -> &[NoteSpec] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Snaps `spec` to the grid and inserts it unless its (lane, time) is taken.
pub fn place_note(chart: &mut Chart, spec: NoteSpec, division: u32) -> Result<PlaceOutcome, ChartError> {
    let snapped = spec.with_timestamp(chart.snap(spec.timestamp(), division))?;
    if let Some(existing) = chart.find_note_near(snapped.lane(), snapped.timestamp(), PLACEMENT_TOLERANCE) {
        log::debug!(
            "skip placement: lane {} at {:.3}s already holds {:?}",
            snapped.lane(),
            snapped.timestamp(),
            existing.id()
        );
        return Ok(PlaceOutcome::Skipped {
            existing: existing.id(),
        });
    }
    Ok(PlaceOutcome::Placed(chart.add_note(snapped)))
}

pub fn delete_note(chart: &mut Chart, id: NoteId) -> Result<Note, ChartError> {
    let removed = chart.remove_note(id)?;
    log::debug!(
        "deleted note at {:.2}s in lane {}",
        removed.timestamp(),
        removed.lane()
    );
    Ok(removed)
}

/// Click-to-delete: removes the first note in `lane` within `tolerance` of `time`.
pub fn delete_note_near(chart: &mut Chart, lane: Lane, time: Seconds, tolerance: Seconds) -> Option<Note> {
    let id = chart.find_note_near(lane, time, tolerance)?.id();
    delete_note(chart, id).ok()
}

pub fn delete_selection(chart: &mut Chart, selection: &mut Selection) -> usize {
    let removed = selection
        .iter()
        .filter(|id| chart.remove_note(*id).is_ok())
        .count();
    selection.clear();
    removed
}

/// Notes whose lane and timestamp both fall inside the (inclusive) region.
/// Bounds may be given in either order.
pub fn select_notes_in_region(
    chart: &Chart,
    lanes: RangeInclusive<Lane>,
    times: RangeInclusive<Seconds>,
) -> Selection {
    let (lane_lo, lane_hi) = ordered(*lanes.start(), *lanes.end());
    let (time_lo, time_hi) = ordered_f64(*times.start(), *times.end());

    let selection: Selection = chart
        .notes()
        .iter()
        .filter(|note| {
            note.lane() >= lane_lo
                && note.lane() <= lane_hi
                && note.timestamp() >= time_lo
                && note.timestamp() <= time_hi
        })
        .map(|note| note.id())
        .collect();

    log::debug!(
        "selected {} notes (lanes {}-{}, time {:.2}s-{:.2}s)",
        selection.len(),
        lane_lo,
        lane_hi,
        time_lo,
        time_hi
    );
    selection
}

pub fn copy_notes<'a, I>(notes: I) -> Clipboard
where
    I: IntoIterator<Item = &'a Note>,
{
    let notes: Vec<&Note> = notes.into_iter().collect();
    let Some(earliest) = notes.iter().map(|note| note.timestamp()).reduce(f64::min) else {
        return Clipboard::default();
    };

    let mut entries = Vec::with_capacity(notes.len());
    for note in notes {
        let relative = note.timestamp() - earliest;
        if let Ok(entry) = note.spec().with_timestamp(relative) {
            entries.push(entry);
        }
    }
    entries.sort_by(|a, b| a.timestamp().total_cmp(&b.timestamp()));
    Clipboard { entries }
}

pub fn copy_selection(chart: &Chart, selection: &Selection) -> Clipboard {
    let clipboard = copy_notes(chart.notes().iter().filter(|note| selection.contains(note.id())));
    log::debug!("copied {} notes to clipboard", clipboard.len());
    clipboard
}

/// Inserts every clipboard entry at `snap(paste_time) + offset`, skipping entries
/// whose (lane, time) is already occupied. Returns the ids actually inserted.
pub fn paste_at_time(chart: &mut Chart, clipboard: &Clipboard, paste_time: Seconds, division: u32) -> Vec<NoteId> {
    let anchor = chart.snap(paste_time, division);
    let mut inserted = Vec::new();

    for entry in clipboard.entries() {
        let absolute = anchor + entry.timestamp();
        if chart
            .find_note_near(entry.lane(), absolute, PLACEMENT_TOLERANCE)
            .is_some()
        {
            continue;
        }
        let Ok(spec) = entry.with_timestamp(absolute) else {
            continue;
        };
        inserted.push(chart.push_note(spec));
    }

    chart.sort_notes();
    log::debug!("pasted {} notes at {:.2}s", inserted.len(), anchor);
    inserted
}

fn ordered(a: Lane, b: Lane) -> (Lane, Lane) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn ordered_f64(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
