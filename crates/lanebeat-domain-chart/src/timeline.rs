use crate::tempo::TempoMap;
use lanebeat_ports::types::{Lane, Seconds};

const GRID_EPSILON: f64 = 1e-6;

/// Vertical editor layout: one beat spans `beat_height * zoom` units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineScale {
    pub beat_height: f64,
    pub zoom: f64,
    pub lane_width: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLine {
    pub time: Seconds,
    /// Falls on a whole beat.
    pub is_major: bool,
}

impl Default for TimelineScale {
    fn default() -> Self {
        Self {
            beat_height: 100.0,
            zoom: 1.0,
            lane_width: 80.0,
        }
    }
}

impl TimelineScale {
    pub fn time_to_y(&self, map: &TempoMap, time: Seconds) -> f64 {
        map.time_to_beat(time) * self.units_per_beat()
    }

    pub fn y_to_time(&self, map: &TempoMap, y: f64) -> Seconds {
        map.beat_to_time(y / self.units_per_beat())
    }

    pub fn lane_at_x(&self, x: f64) -> Lane {
        Lane::clamped((x / self.lane_width).floor() as i32)
    }

    pub fn total_height(&self, map: &TempoMap, duration: Seconds) -> f64 {
        self.time_to_y(map, duration)
    }

    fn units_per_beat(&self) -> f64 {
        self.beat_height * self.zoom.max(f64::EPSILON)
    }
}

/// Grid lines in `[from, to)`. Within each tempo interval the lines sit on the
/// same multiples `snap_to_grid` rounds to, so every line is a snap target.
pub fn grid_lines(map: &TempoMap, division: u32, from: Seconds, to: Seconds) -> Vec<GridLine> {
    let division = division.max(1);
    let mut lines = Vec::new();

    for (start, end, bpm) in map.intervals(from.max(0.0), to) {
        let interval = 60.0 / bpm / division as f64;
        // Tolerate rounding so a line sitting exactly on a tempo change is kept.
        let mut k = (start / interval - GRID_EPSILON).ceil() as i64;
        loop {
            let time = k as f64 * interval;
            if time >= end {
                break;
            }
            lines.push(GridLine {
                time,
                is_major: k.rem_euclid(division as i64) == 0,
            });
            k += 1;
        }
    }
    lines
}
