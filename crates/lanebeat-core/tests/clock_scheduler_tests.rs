use lanebeat_core::{ClockState, NoteScheduler, PlaybackClock, SchedulerConfig};
use lanebeat_domain_chart::{Note, NoteKind, NoteSpec};
use lanebeat_domain_eval::{JudgeEvent, RuntimeTable};
use lanebeat_infra_sim::SimulatedTransport;
use lanebeat_ports::audio::{AudioError, AudioTransportPort};
use lanebeat_ports::storage::SettingsDto;
use lanebeat_ports::types::{ButtonRow, Lane, Seconds, Shape, StickDirection};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn notes(specs: &[(Seconds, i32)]) -> Vec<Note> {
    let mut chart = lanebeat_domain_chart::Chart::new(120.0).unwrap();
    for &(t, lane) in specs {
        let lane = Lane::new(lane).unwrap();
        let shape = if lane.index() < 3 {
            Shape::Stick(StickDirection::Up)
        } else {
            Shape::Button(ButtonRow::Top)
        };
        chart.add_note(NoteSpec::new(t, lane, shape, NoteKind::Tap).unwrap());
    }
    chart.notes().to_vec()
}

#[test]
fn lookahead_comes_from_scroll_speed_and_distance() {
    let config = SchedulerConfig::from(&SettingsDto {
        scroll_speed: 4.0,
        spawn_distance: 12.0,
        ..SettingsDto::default()
    });
    assert_eq!(config.lookahead(), 3.0);
    assert_eq!(SchedulerConfig::default().lookahead(), 2.0);
}

#[test]
fn notes_spawn_in_order_once() {
    let mut scheduler = NoteScheduler::new(SchedulerConfig::default());
    scheduler.set_notes(notes(&[(5.0, 3), (1.0, 4), (3.0, 0)]));
    let mut table = RuntimeTable::new();

    let first: Vec<Seconds> = scheduler
        .spawn_due(0.0, &mut table)
        .iter()
        .map(|n| n.timestamp)
        .collect();
    assert_eq!(first, vec![1.0]);

    let second: Vec<Seconds> = scheduler
        .spawn_due(3.0, &mut table)
        .iter()
        .map(|n| n.timestamp)
        .collect();
    assert_eq!(second, vec![3.0, 5.0]);
    assert!(scheduler.spawn_due(10.0, &mut table).is_empty());
    assert_eq!(table.live_count(), 3);
}

#[test]
fn expiry_uses_the_lane_class_window() {
    let mut scheduler = NoteScheduler::new(SchedulerConfig::default());
    scheduler.set_notes(notes(&[(1.0, 0), (1.0, 3)]));
    let mut table = RuntimeTable::new();
    scheduler.spawn_due(1.0, &mut table);

    // Past the button window (0.20) but inside the stick window (0.30).
    let expired = scheduler.expire_overdue(1.25, &mut table);
    assert_eq!(expired.len(), 1);
    let JudgeEvent::Miss { note, .. } = expired[0] else {
        panic!("expected a miss");
    };
    assert!(table.is_resolved(note));
    assert_eq!(table.live_count(), 1);

    assert_eq!(scheduler.expire_overdue(1.35, &mut table).len(), 1);
    assert!(scheduler.is_finished(&table));
}

#[test]
fn seek_rederives_the_cursor_from_the_start() {
    let mut scheduler = NoteScheduler::new(SchedulerConfig::default());
    scheduler.set_notes(notes(&[(1.0, 3), (2.0, 3), (3.0, 3)]));
    let mut table = RuntimeTable::new();
    scheduler.spawn_due(10.0, &mut table);
    assert_eq!(scheduler.cursor(), 3);

    scheduler.seek(1.5);
    assert_eq!(scheduler.cursor(), 1);
    table.clear();
    assert_eq!(scheduler.spawn_due(1.5, &mut table).len(), 2);

    // Widest default miss window is the stick one, 0.30.
    scheduler.seek(2.25);
    assert_eq!(scheduler.cursor(), 1);
    scheduler.seek(2.35);
    assert_eq!(scheduler.cursor(), 2);
}

#[test]
fn clock_reads_the_transport_once_per_sync() {
    let transport = Arc::new(SimulatedTransport::with_clip(10.0));
    let mut clock = PlaybackClock::new(transport.clone(), 0.0);
    let t0 = Instant::now();

    clock.start(t0).unwrap();
    assert_eq!(clock.state(), ClockState::Playing);
    transport.advance(1.25);
    assert_eq!(clock.now(), 0.0);
    assert_eq!(clock.sync(t0).unwrap(), 1.25);

    // An input 100 ms after the sync maps forward at the playback rate.
    let later = t0 + Duration::from_millis(100);
    assert!((clock.song_time_at(later) - 1.35).abs() < 1e-9);

    clock.set_rate(0.0).unwrap();
    assert_eq!(clock.rate(), 0.1);
}

#[test]
fn clock_seek_clamps_and_pause_freezes() {
    let transport = Arc::new(SimulatedTransport::with_clip(10.0));
    let mut clock = PlaybackClock::new(transport.clone(), 0.0);
    let t0 = Instant::now();
    clock.start(t0).unwrap();

    assert_eq!(clock.seek(42.0).unwrap(), 10.0);
    assert_eq!(clock.seek(-1.0).unwrap(), 0.0);

    transport.advance(2.0);
    clock.pause().unwrap();
    assert_eq!(clock.now(), 2.0);
    transport.advance(1.0);
    assert_eq!(clock.sync(t0).unwrap(), 2.0);
    assert!(!transport.is_playing());
}

#[test]
fn clock_without_audio_refuses_to_start() {
    let transport = Arc::new(SimulatedTransport::default());
    let mut clock = PlaybackClock::new(transport.clone(), 3.0);
    assert!(matches!(clock.start(Instant::now()), Err(AudioError::NoClip)));
    assert_eq!(clock.state(), ClockState::Stopped);

    transport.load_clip(Some(5.0));
    clock.start(Instant::now()).unwrap();
    assert_eq!(clock.state(), ClockState::LeadIn);
    assert_eq!(clock.now(), -3.0);
}
