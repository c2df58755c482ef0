use lanebeat_domain_chart::{grid_lines, snap_to_grid, TempoMap, TempoSegment, TimelineScale};
use lanebeat_ports::types::Lane;
use pretty_assertions::assert_eq;

#[test]
fn grid_lines_mark_whole_beats_as_major() {
    let map = TempoMap::constant(120.0);
    let lines = grid_lines(&map, 4, 0.0, 1.0);

    let times: Vec<f64> = lines.iter().map(|l| l.time).collect();
    assert_eq!(times, vec![0.0, 0.125, 0.25, 0.375, 0.5, 0.625, 0.75, 0.875]);
    let majors: Vec<f64> = lines.iter().filter(|l| l.is_major).map(|l| l.time).collect();
    assert_eq!(majors, vec![0.0, 0.5]);
}

#[test]
fn every_grid_line_is_a_snap_target() {
    let map = TempoMap::new(120.0, vec![TempoSegment { start: 10.0, bpm: 90.0 }]);
    let lines = grid_lines(&map, 4, 9.0, 11.0);
    assert!(!lines.is_empty());

    for line in &lines {
        let snapped = snap_to_grid(line.time, map.bpm_at(line.time + 1e-9), 4);
        assert!(
            (snapped - line.time).abs() < 1e-6,
            "line at {} snaps to {}",
            line.time,
            snapped
        );
    }
}

#[test]
fn grid_keeps_line_on_tempo_change() {
    let map = TempoMap::new(120.0, vec![TempoSegment { start: 10.0, bpm: 90.0 }]);
    let lines = grid_lines(&map, 4, 9.0, 10.9);

    let at_change = lines.iter().filter(|l| (l.time - 10.0).abs() < 1e-6).count();
    assert_eq!(at_change, 1);
    // 8 quarter-beats per second before the change, 6 after.
    assert_eq!(lines.len(), 14);
}

#[test]
fn scale_maps_time_to_height_through_beats() {
    let map = TempoMap::new(120.0, vec![TempoSegment { start: 2.0, bpm: 60.0 }]);
    let scale = TimelineScale::default();

    assert!((scale.time_to_y(&map, 1.0) - 200.0).abs() < 1e-9);
    // 4 beats by 2s, then one beat per second.
    assert!((scale.time_to_y(&map, 3.0) - 500.0).abs() < 1e-9);
    assert!((scale.y_to_time(&map, 500.0) - 3.0).abs() < 1e-9);

    let zoomed = TimelineScale {
        zoom: 2.0,
        ..TimelineScale::default()
    };
    assert!((zoomed.time_to_y(&map, 1.0) - 400.0).abs() < 1e-9);
}

#[test]
fn lane_at_x_clamps_to_valid_lanes() {
    let scale = TimelineScale::default();
    assert_eq!(scale.lane_at_x(-5.0), Lane::MIN);
    assert_eq!(scale.lane_at_x(170.0), Lane::new(2).expect("lane"));
    assert_eq!(scale.lane_at_x(10_000.0), Lane::MAX);
}
