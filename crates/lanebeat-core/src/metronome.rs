use lanebeat_domain_chart::Chart;
use lanebeat_ports::storage::MetronomeMode;
use lanebeat_ports::types::Seconds;

const SAME_CLICK_EPSILON: Seconds = 1e-6;

/// Click cursor over precomputed click times.
#[derive(Debug, Default)]
pub struct Metronome {
    mode: MetronomeMode,
    clicks: Vec<Seconds>,
    cursor: usize,
}

impl Metronome {
    pub fn new(mode: MetronomeMode) -> Self {
        Self {
            mode,
            clicks: Vec::new(),
            cursor: 0,
        }
    }

    pub fn mode(&self) -> MetronomeMode {
        self.mode
    }

    pub fn clicks(&self) -> &[Seconds] {
        &self.clicks
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Recomputes click times for `chart` and puts the cursor at `position`.
    pub fn rebuild(&mut self, mode: MetronomeMode, chart: &Chart, position: Seconds) {
        self.mode = mode;
        self.clicks = match mode {
            MetronomeMode::Off => Vec::new(),
            MetronomeMode::Notes => note_clicks(chart),
            MetronomeMode::Beats => beat_clicks(chart),
        };
        self.seek(position);
    }

    /// Scans from the start: the next click is the first at or after `time`.
    pub fn seek(&mut self, time: Seconds) {
        self.cursor = self
            .clicks
            .iter()
            .position(|&click| click >= time)
            .unwrap_or(self.clicks.len());
    }

    /// Clicks that became due since the last poll.
    pub fn poll(&mut self, now: Seconds) -> Vec<Seconds> {
        let mut due = Vec::new();
        while let Some(&click) = self.clicks.get(self.cursor) {
            if click > now {
                break;
            }
            due.push(click);
            self.cursor += 1;
        }
        due
    }
}

fn note_clicks(chart: &Chart) -> Vec<Seconds> {
    let mut clicks: Vec<Seconds> = chart.notes().iter().map(|note| note.timestamp()).collect();
    clicks.dedup_by(|a, b| (*a - *b).abs() < SAME_CLICK_EPSILON);
    clicks
}

fn beat_clicks(chart: &Chart) -> Vec<Seconds> {
    let end = chart
        .audio_duration_seconds()
        .or_else(|| chart.last_note_end())
        .unwrap_or(0.0);
    let map = chart.tempo_map();

    let mut clicks = Vec::new();
    let mut beat = 0.0;
    loop {
        let time = map.beat_to_time(beat);
        if time > end {
            break;
        }
        clicks.push(time);
        beat += 1.0;
    }
    clicks
}
