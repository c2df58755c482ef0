use lanebeat_domain_chart::{TempoMap, TempoSegment};

const EPS: f64 = 1e-9;

fn varied_map() -> TempoMap {
    TempoMap::new(
        120.0,
        vec![
            TempoSegment { start: 12.5, bpm: 90.0 },
            TempoSegment { start: 4.0, bpm: 180.0 },
            TempoSegment { start: 30.0, bpm: 200.0 },
        ],
    )
}

#[test]
fn constant_tempo_converts_linearly() {
    let map = TempoMap::constant(120.0);
    assert!((map.time_to_beat(1.0) - 2.0).abs() < EPS);
    assert!((map.beat_to_time(8.0) - 4.0).abs() < EPS);
    assert_eq!(map.bpm_at(100.0), 120.0);
}

#[test]
fn beats_accumulate_across_segments() {
    let map = varied_map();
    // 4s at 120 = 8 beats, 8.5s at 180 = 25.5 beats, 2.5s at 90 = 3.75 beats.
    assert!((map.time_to_beat(4.0) - 8.0).abs() < EPS);
    assert!((map.time_to_beat(12.5) - 33.5).abs() < EPS);
    assert!((map.time_to_beat(15.0) - 37.25).abs() < EPS);
    assert!((map.beat_to_time(37.25) - 15.0).abs() < EPS);
}

#[test]
fn bpm_at_picks_last_segment_starting_at_or_before() {
    let map = varied_map();
    assert_eq!(map.bpm_at(0.0), 120.0);
    assert_eq!(map.bpm_at(3.999), 120.0);
    assert_eq!(map.bpm_at(4.0), 180.0);
    assert_eq!(map.bpm_at(12.5), 90.0);
    assert_eq!(map.bpm_at(1_000.0), 200.0);
}

#[test]
fn beat_to_time_inverts_time_to_beat() {
    let map = varied_map();
    let mut beat = 0.0;
    while beat < 150.0 {
        let back = map.time_to_beat(map.beat_to_time(beat));
        assert!((back - beat).abs() < 1e-6, "beat {beat} came back as {back}");
        beat += 0.37;
    }

    let mut time = 0.0;
    while time < 60.0 {
        let back = map.beat_to_time(map.time_to_beat(time));
        assert!((back - time).abs() < 1e-6, "time {time} came back as {back}");
        time += 0.113;
    }
}

#[test]
fn round_trip_holds_exactly_on_segment_boundaries() {
    let map = varied_map();
    for boundary in [4.0, 12.5, 30.0] {
        let beat = map.time_to_beat(boundary);
        assert!((map.beat_to_time(beat) - boundary).abs() < 1e-9);
    }
}

#[test]
fn time_to_beat_is_non_decreasing() {
    let map = varied_map();
    let mut prev = map.time_to_beat(0.0);
    let mut time = 0.0;
    while time < 45.0 {
        time += 0.01;
        let beat = map.time_to_beat(time);
        assert!(beat >= prev, "beat went backwards at {time}");
        prev = beat;
    }
}

#[test]
fn lead_in_times_map_to_negative_beats() {
    let map = varied_map();
    assert!((map.time_to_beat(-1.5) + 3.0).abs() < EPS);
    assert!((map.beat_to_time(-3.0) + 1.5).abs() < EPS);
}

#[test]
fn intervals_cover_requested_range() {
    let map = varied_map();
    let intervals = map.intervals(2.0, 13.0);
    assert_eq!(
        intervals,
        vec![(2.0, 4.0, 120.0), (4.0, 12.5, 180.0), (12.5, 13.0, 90.0)]
    );
}
