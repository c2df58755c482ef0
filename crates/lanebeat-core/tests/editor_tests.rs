use lanebeat_core::{EditorSession, NoteTemplate};
use lanebeat_domain_chart::{Chart, PlaceOutcome};
use lanebeat_ports::chart::AudioRef;
use lanebeat_ports::storage::SettingsDto;
use lanebeat_ports::types::{ButtonRow, Lane, Shape, StickDirection};
use pretty_assertions::assert_eq;

fn lane(index: i32) -> Lane {
    Lane::new(index).unwrap()
}

fn editor() -> EditorSession {
    let mut chart = Chart::new(120.0).unwrap();
    chart.set_audio(Some(AudioRef {
        path: "song.ogg".to_string(),
        duration_seconds: 8.0,
    }));
    EditorSession::new(chart)
}

#[test]
fn placement_follows_the_template_and_grid() {
    let mut ed = editor();
    ed.set_template(NoteTemplate {
        stick: StickDirection::Down,
        button: ButtonRow::Bottom,
        hold: None,
    });

    let stick = ed.place_note(lane(1), 1.06).unwrap();
    let button = ed.place_note(lane(5), 2.01).unwrap();
    let again = ed.place_note(lane(5), 1.99).unwrap();

    let PlaceOutcome::Placed(stick) = stick else {
        panic!("stick note not placed");
    };
    let PlaceOutcome::Placed(button) = button else {
        panic!("button note not placed");
    };
    assert_eq!(again, PlaceOutcome::Skipped { existing: button });

    let chart = ed.chart();
    assert_eq!(chart.note(stick).unwrap().timestamp(), 1.0);
    assert_eq!(chart.note(stick).unwrap().shape(), Shape::Stick(StickDirection::Down));
    assert_eq!(chart.note(button).unwrap().shape(), Shape::Button(ButtonRow::Bottom));
    assert!(ed.is_dirty());
}

#[test]
fn grid_division_comes_from_settings() {
    assert_eq!(editor().division(), 4);

    let settings = SettingsDto {
        grid_division: 2,
        ..SettingsDto::default()
    };
    let mut ed = EditorSession::with_settings(Chart::new(120.0).unwrap(), &settings);
    assert_eq!(ed.division(), 2);

    // 120 BPM halved: a 0.25 s grid.
    let PlaceOutcome::Placed(id) = ed.place_note(lane(3), 1.2).unwrap() else {
        panic!("expected a placement");
    };
    assert_eq!(ed.chart().note(id).unwrap().timestamp(), 1.25);

    let zero = SettingsDto {
        grid_division: 0,
        ..SettingsDto::default()
    };
    assert_eq!(EditorSession::with_settings(Chart::new(120.0).unwrap(), &zero).division(), 1);
}

#[test]
fn clicking_the_timeline_places_and_deletes() {
    let mut ed = editor();
    let scale = ed.scale();
    // 120 BPM: beat 3 is 1.5 s.
    let x = scale.lane_width * 3.5;
    let y = scale.beat_height * 3.0;

    let placed = ed.place_at(x, y).unwrap();
    let PlaceOutcome::Placed(id) = placed else {
        panic!("expected a placement");
    };
    assert_eq!(ed.chart().note(id).unwrap().lane(), lane(3));
    assert_eq!(ed.chart().note(id).unwrap().timestamp(), 1.5);
    assert_eq!(ed.time_to_y(1.5), y);

    let removed = ed.delete_at(x, y + 10.0).unwrap();
    assert_eq!(removed.id(), id);
    assert!(ed.chart().is_empty());
}

#[test]
fn selection_copy_and_paste_at_playhead() {
    let mut ed = editor();
    ed.place_note(lane(3), 1.0).unwrap();
    ed.place_note(lane(4), 1.5).unwrap();
    ed.place_note(lane(0), 1.5).unwrap();

    assert_eq!(ed.select_region(lane(4)..=lane(3), 2.0..=0.5), 2);
    assert_eq!(ed.copy_selection(), 2);

    ed.seek_preview(4.02);
    let pasted = ed.paste_at_playhead();
    assert_eq!(pasted.len(), 2);
    assert_eq!(ed.selection().len(), 2);

    let times: Vec<f64> = pasted
        .iter()
        .map(|id| ed.chart().note(*id).unwrap().timestamp())
        .collect();
    assert_eq!(times, vec![4.0, 4.5]);

    assert!(ed.paste_at_playhead().is_empty());
    assert_eq!(ed.chart().len(), 5);

    assert_eq!(ed.delete_selected(), 2);
    assert_eq!(ed.chart().len(), 3);
    assert!(ed.selection().is_empty());
}

#[test]
fn preview_clicks_each_note_once() {
    let mut ed = editor();
    for t in [0.5, 1.0, 1.0, 2.0] {
        ed.place_note(lane(3), t).unwrap();
    }
    ed.place_note(lane(4), 1.0).unwrap();

    assert!(ed.toggle_preview());
    let mut clicks = Vec::new();
    for _ in 0..30 {
        clicks.extend(ed.tick_preview(0.1));
    }
    assert_eq!(clicks, vec![0.5, 1.0, 2.0]);

    ed.seek_preview(0.75);
    let after_seek: Vec<f64> = (0..5).flat_map(|_| ed.tick_preview(0.1)).collect();
    assert_eq!(after_seek, vec![1.0]);
}

#[test]
fn preview_stops_at_the_end_of_the_audio() {
    let mut ed = editor();
    ed.toggle_preview();
    ed.tick_preview(20.0);
    assert_eq!(ed.playhead(), 8.0);
    assert!(!ed.is_previewing());
}

#[test]
fn tempo_changes_move_the_grid() {
    let mut ed = editor();
    ed.set_division(1);
    ed.add_tempo_change(2.0, 60.0).unwrap();

    let times: Vec<f64> = ed.grid_lines(0.0, 5.0).iter().map(|line| line.time).collect();
    assert_eq!(times, vec![0.0, 0.5, 1.0, 1.5, 2.0, 3.0, 4.0]);
    assert!(ed.add_tempo_change(0.0, 90.0).is_err());

    // Four beats at 120 BPM, then six at 60 BPM.
    assert_eq!(ed.timeline_height(), 1000.0);
    ed.set_zoom(2.0);
    assert_eq!(ed.timeline_height(), 2000.0);

    assert!(ed.remove_tempo_change(0).is_some());
    assert!(ed.remove_tempo_change(0).is_none());
}
