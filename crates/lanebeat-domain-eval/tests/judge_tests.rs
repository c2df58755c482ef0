use lanebeat_domain_chart::{Chart, NoteSpec};
use lanebeat_domain_eval::{
    HoldPhase, Judge, JudgeConfig, JudgeEvent, LaneAction, NotePhase, RuntimeTable,
};
use lanebeat_ports::types::{ButtonRow, Lane, Shape, StickDirection, Tier};
use pretty_assertions::assert_eq;

fn lane(index: i32) -> Lane {
    Lane::new(index).expect("valid lane")
}

fn top() -> Shape {
    Shape::Button(ButtonRow::Top)
}

fn spawn_all(chart: &Chart) -> RuntimeTable {
    let mut table = RuntimeTable::new();
    for note in chart.notes() {
        assert!(table.spawn(note));
    }
    table
}

fn press(lane_index: i32, shape: Shape, at: f64) -> LaneAction {
    LaneAction {
        lane: lane(lane_index),
        shape,
        at,
    }
}

#[test]
fn button_lane_tiers_follow_window_order() {
    let judge = Judge::new(JudgeConfig::default());
    let cases = [
        (10.03, Some(Tier::Perfect)),
        (10.08, Some(Tier::Great)),
        (10.13, Some(Tier::Good)),
        (10.18, Some(Tier::Ok)),
        (9.87, Some(Tier::Good)),
        (10.25, None),
    ];

    for (at, expected) in cases {
        let mut chart = Chart::new(120.0).expect("chart");
        let id = chart.add_note(NoteSpec::tap(10.0, lane(3), top()).expect("note"));
        let mut table = spawn_all(&chart);

        let event = judge.on_lane_action(&mut table, press(3, top(), at));
        match expected {
            Some(tier) => {
                assert!(
                    matches!(event, JudgeEvent::Hit { note, tier: t, .. } if note == id && t == tier),
                    "action at {at}: {event:?}"
                );
                assert!(table.is_resolved(id));
            }
            None => {
                assert!(matches!(event, JudgeEvent::Ghost { .. }), "action at {at}: {event:?}");
                assert!(table.get(id).is_some(), "ghost input must not consume the note");
            }
        }
    }
}

#[test]
fn stick_lanes_use_their_own_windows() {
    let judge = Judge::new(JudgeConfig::default());
    let up = Shape::Stick(StickDirection::Up);
    let mut chart = Chart::new(120.0).expect("chart");
    chart.add_note(NoteSpec::tap(5.0, lane(0), up).expect("note"));
    chart.add_note(NoteSpec::tap(5.0, lane(4), top()).expect("note"));
    let mut table = spawn_all(&chart);

    let stick = judge.on_lane_action(&mut table, press(0, up, 5.07));
    assert_eq!(stick.scored_tier(), Some(Tier::Perfect));

    let button = judge.on_lane_action(&mut table, press(4, top(), 5.07));
    assert_eq!(button.scored_tier(), Some(Tier::Great));
}

#[test]
fn shape_must_match_exactly() {
    let judge = Judge::new(JudgeConfig::default());
    let mut chart = Chart::new(120.0).expect("chart");
    let id = chart.add_note(NoteSpec::tap(1.0, lane(1), Shape::Stick(StickDirection::UpDown)).expect("note"));
    let mut table = spawn_all(&chart);

    let event = judge.on_lane_action(&mut table, press(1, Shape::Stick(StickDirection::Up), 1.0));
    assert!(matches!(event, JudgeEvent::Ghost { .. }));
    assert!(table.get(id).is_some());
}

#[test]
fn closest_candidate_wins_and_ties_go_to_earlier_note() {
    let judge = Judge::new(JudgeConfig::default());
    let mut chart = Chart::new(120.0).expect("chart");
    let _early = chart.add_note(NoteSpec::tap(10.0, lane(5), top()).expect("note"));
    let late = chart.add_note(NoteSpec::tap(10.25, lane(5), top()).expect("note"));

    let mut table = spawn_all(&chart);
    let event = judge.on_lane_action(&mut table, press(5, top(), 10.2));
    assert_eq!(event.note(), Some(late));

    let mut chart = Chart::new(120.0).expect("chart");
    let first = chart.add_note(NoteSpec::tap(10.0, lane(5), top()).expect("note"));
    let _second = chart.add_note(NoteSpec::tap(10.25, lane(5), top()).expect("note"));
    let mut table = spawn_all(&chart);
    let event = judge.on_lane_action(&mut table, press(5, top(), 10.125));
    assert_eq!(event.note(), Some(first));
}

#[test]
fn second_resolution_is_a_no_op() {
    let judge = Judge::new(JudgeConfig::default());
    let mut chart = Chart::new(120.0).expect("chart");
    let id = chart.add_note(NoteSpec::tap(2.0, lane(3), top()).expect("note"));
    let mut table = spawn_all(&chart);

    let hit = judge.on_lane_action(&mut table, press(3, top(), 2.0));
    assert_eq!(hit.note(), Some(id));

    assert!(!table.resolve(id, NotePhase::ExpiredMiss));
    let again = judge.on_lane_action(&mut table, press(3, top(), 2.01));
    assert!(matches!(again, JudgeEvent::Ghost { .. }));
    assert!(!table.spawn(chart.note(id).expect("note")));
    assert_eq!(table.archive().len(), 1);
    assert_eq!(table.archive()[0].phase, NotePhase::Resolved);
}

#[test]
fn hold_sustained_to_the_end_completes_as_perfect() {
    let judge = Judge::new(JudgeConfig::default());
    let mut chart = Chart::new(120.0).expect("chart");
    let id = chart.add_note(NoteSpec::hold(0.0, lane(4), top(), 2.0).expect("note"));
    let mut table = spawn_all(&chart);

    let start = judge.on_lane_action(&mut table, press(4, top(), 0.0));
    assert_eq!(
        start,
        JudgeEvent::HoldStarted {
            note: id,
            tier: Tier::Perfect,
            delta: 0.0
        }
    );
    assert_eq!(start.scored_tier(), None);

    let mut events = Vec::new();
    for frame in 1..=120 {
        let now = frame as f64 / 60.0;
        events.extend(judge.update_holds(&mut table, now, |_, _| true));
    }

    let (last, progress) = events.split_last().expect("hold events");
    assert_eq!(*last, JudgeEvent::HoldCompleted { note: id });
    assert_eq!(last.scored_tier(), Some(Tier::Perfect));
    assert_eq!(progress.len(), 119);
    assert!(progress
        .iter()
        .all(|e| matches!(e, JudgeEvent::HoldProgress { note, .. } if *note == id)));
    assert_eq!(table.live_count(), 0);
    assert_eq!(table.archive()[0].hold_phase, HoldPhase::Completed);
}

#[test]
fn early_release_is_graded_by_held_ratio() {
    let judge = Judge::new(JudgeConfig::default());
    let mut chart = Chart::new(120.0).expect("chart");
    let id = chart.add_note(NoteSpec::hold(0.0, lane(3), top(), 2.0).expect("note"));
    let mut table = spawn_all(&chart);

    judge.on_lane_action(&mut table, press(3, top(), 0.0));
    for now in [0.4, 0.8, 1.2, 1.6] {
        let events = judge.update_holds(&mut table, now, |_, _| true);
        assert_eq!(events.len(), 1);
    }
    let events = judge.update_holds(&mut table, 1.7, |_, _| false);

    assert_eq!(events.len(), 1);
    let JudgeEvent::HoldReleased {
        note,
        tier,
        held_ratio,
    } = events[0]
    else {
        panic!("expected release, got {:?}", events[0]);
    };
    assert_eq!(note, id);
    assert_eq!(tier, Tier::Great);
    assert!((held_ratio - 0.8).abs() < 1e-9);
    assert_eq!(table.archive()[0].hold_phase, HoldPhase::Failed);
}

#[test]
fn barely_held_release_counts_as_miss() {
    let judge = Judge::new(JudgeConfig::default());
    let mut chart = Chart::new(120.0).expect("chart");
    chart.add_note(NoteSpec::hold(0.0, lane(3), top(), 2.0).expect("note"));
    let mut table = spawn_all(&chart);

    judge.on_lane_action(&mut table, press(3, top(), 0.0));
    judge.update_holds(&mut table, 0.5, |_, _| true);
    let events = judge.update_holds(&mut table, 0.6, |_, _| false);
    assert_eq!(events[0].scored_tier(), Some(Tier::Miss));
}

#[test]
fn sustaining_hold_blocks_retrigger_and_second_hold_in_lane() {
    let judge = Judge::new(JudgeConfig::default());
    let mut chart = Chart::new(120.0).expect("chart");
    let first = chart.add_note(NoteSpec::hold(1.0, lane(3), top(), 2.0).expect("note"));
    let second = chart.add_note(NoteSpec::hold(1.1, lane(3), top(), 1.0).expect("note"));
    let mut table = spawn_all(&chart);

    let started = judge.on_lane_action(&mut table, press(3, top(), 1.0));
    assert_eq!(started.note(), Some(first));

    let rejected = judge.on_lane_action(&mut table, press(3, top(), 1.1));
    assert!(matches!(rejected, JudgeEvent::Ghost { .. }));
    assert_eq!(
        table.get(second).map(|rt| rt.hold_phase()),
        Some(HoldPhase::NotStarted)
    );
    assert!(table.get(first).is_some_and(|rt| rt.is_sustaining()));
}

#[test]
fn tap_in_a_busy_lane_is_still_judged() {
    let judge = Judge::new(JudgeConfig::default());
    let mut chart = Chart::new(120.0).expect("chart");
    chart.add_note(NoteSpec::hold(1.0, lane(5), top(), 2.0).expect("note"));
    let tap = chart.add_note(NoteSpec::tap(1.5, lane(5), Shape::Button(ButtonRow::Bottom)).expect("note"));
    let mut table = spawn_all(&chart);

    judge.on_lane_action(&mut table, press(5, top(), 1.0));
    let event = judge.on_lane_action(&mut table, press(5, Shape::Button(ButtonRow::Bottom), 1.5));
    assert_eq!(event.note(), Some(tap));
    assert_eq!(event.scored_tier(), Some(Tier::Perfect));
}

#[test]
fn clear_discards_sustaining_holds() {
    let judge = Judge::new(JudgeConfig::default());
    let mut chart = Chart::new(120.0).expect("chart");
    let id = chart.add_note(NoteSpec::hold(1.0, lane(4), top(), 2.0).expect("note"));
    let mut table = spawn_all(&chart);

    judge.on_lane_action(&mut table, press(4, top(), 1.0));
    assert_eq!(table.clear(), vec![id]);
    assert!(judge.update_holds(&mut table, 2.0, |_, _| true).is_empty());
    assert!(table.spawn(chart.note(id).expect("note")));
}
