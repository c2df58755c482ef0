use lanebeat_ports::chart::TempoChangeDto;
use lanebeat_ports::types::Seconds;
use serde::{Deserialize, Serialize};

/// A BPM change taking effect at `start`. The base BPM implicitly covers `[0, first.start)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TempoSegment {
    pub start: Seconds,
    pub bpm: f64,
}

/// Piecewise-constant tempo timeline. Assumes validated input: every segment
/// starts after zero and has a positive BPM (see `Chart::add_tempo_segment`).
#[derive(Clone, Debug, PartialEq)]
pub struct TempoMap {
    base_bpm: f64,
    spans: Vec<Span>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Span {
    start_time: Seconds,
    start_beat: f64,
    bpm: f64,
}

impl TempoSegment {
    pub fn from_dto(dto: &TempoChangeDto) -> Self {
        Self {
            start: dto.timestamp,
            bpm: dto.bpm,
        }
    }

    pub fn to_dto(self) -> TempoChangeDto {
        TempoChangeDto {
            timestamp: self.start,
            bpm: self.bpm,
        }
    }
}

impl TempoMap {
    pub fn new(base_bpm: f64, mut segments: Vec<TempoSegment>) -> Self {
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut spans = Vec::with_capacity(segments.len() + 1);
        spans.push(Span {
            start_time: 0.0,
            start_beat: 0.0,
            bpm: base_bpm,
        });
        for segment in segments {
            let prev = spans[spans.len() - 1];
            let start_beat = prev.start_beat + (segment.start - prev.start_time) * prev.bpm / 60.0;
            spans.push(Span {
                start_time: segment.start,
                start_beat,
                bpm: segment.bpm,
            });
        }

        Self { base_bpm, spans }
    }

    pub fn constant(bpm: f64) -> Self {
        Self::new(bpm, Vec::new())
    }

    pub fn base_bpm(&self) -> f64 {
        self.base_bpm
    }

    pub fn segments(&self) -> impl Iterator<Item = TempoSegment> + '_ {
        self.spans.iter().skip(1).map(|span| TempoSegment {
            start: span.start_time,
            bpm: span.bpm,
        })
    }

    pub fn bpm_at(&self, time: Seconds) -> f64 {
        self.span_for_time(time).bpm
    }

    /// Negative times (lead-in) extrapolate the base BPM backwards.
    pub fn time_to_beat(&self, time: Seconds) -> f64 {
        let span = self.span_for_time(time);
        span.start_beat + (time - span.start_time) * span.bpm / 60.0
    }

    pub fn beat_to_time(&self, beat: f64) -> Seconds {
        let span = self.span_for_beat(beat);
        span.start_time + (beat - span.start_beat) * 60.0 / span.bpm
    }

    /// `(start, end, bpm)` for every constant-tempo interval overlapping `[from, to)`.
    pub fn intervals(&self, from: Seconds, to: Seconds) -> Vec<(Seconds, Seconds, f64)> {
        let mut out = Vec::new();
        for (idx, span) in self.spans.iter().enumerate() {
            let end = self
                .spans
                .get(idx + 1)
                .map(|next| next.start_time)
                .unwrap_or(f64::INFINITY);
            let start = if idx == 0 { f64::NEG_INFINITY } else { span.start_time };
            let lo = start.max(from);
            let hi = end.min(to);
            if lo < hi {
                out.push((lo, hi, span.bpm));
            }
        }
        out
    }

    fn span_for_time(&self, time: Seconds) -> Span {
        let mut current = self.spans[0];
        for span in &self.spans[1..] {
            if span.start_time > time {
                break;
            }
            current = *span;
        }
        current
    }

    fn span_for_beat(&self, beat: f64) -> Span {
        let mut current = self.spans[0];
        for span in &self.spans[1..] {
            if span.start_beat > beat {
                break;
            }
            current = *span;
        }
        current
    }
}
