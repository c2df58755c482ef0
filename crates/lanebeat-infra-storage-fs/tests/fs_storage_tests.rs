use lanebeat_infra_storage_fs::FsStorage;
use lanebeat_ports::chart::{ChartDto, NoteDto, NoteKindDto, TempoChangeDto};
use lanebeat_ports::storage::{MetronomeMode, SettingsDto, StorageError, StoragePort};
use lanebeat_ports::types::{ButtonRow, Shape};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn scratch_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!(
        "lanebeat-storage-{tag}-{}-{nanos}",
        std::process::id()
    ))
}

fn sample_chart() -> ChartDto {
    let mut chart = ChartDto::new(120.0);
    chart.tempo_changes.push(TempoChangeDto {
        timestamp: 8.0,
        bpm: 150.0,
    });
    chart.notes.push(NoteDto {
        timestamp: 1.5,
        lane: 4,
        shape: Shape::Button(ButtonRow::Both),
        kind: NoteKindDto::Hold,
        hold_duration: 0.75,
    });
    chart
}

#[test]
fn missing_settings_file_yields_defaults() {
    let dir = scratch_dir("defaults");
    let storage = FsStorage::new(dir);
    let settings = storage.load_settings().unwrap();
    assert_eq!(settings.scroll_speed, 5.0);
    assert_eq!(settings.lead_in_seconds, 3.0);
    assert_eq!(settings.metronome, MetronomeMode::Off);
}

#[test]
fn settings_survive_a_save() {
    let dir = scratch_dir("settings");
    let storage = FsStorage::new(dir.clone());
    let settings = SettingsDto {
        input_offset_ms: -35,
        metronome: MetronomeMode::Beats,
        selected_input: Some("sim".to_string()),
        ..SettingsDto::default()
    };
    storage.save_settings(&settings).unwrap();

    let loaded = storage.load_settings().unwrap();
    assert_eq!(loaded.input_offset_ms, -35);
    assert_eq!(loaded.metronome, MetronomeMode::Beats);
    assert_eq!(loaded.selected_input.as_deref(), Some("sim"));
    assert_eq!(loaded.scoring, settings.scoring);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn partial_settings_fill_in_defaults() {
    let dir = scratch_dir("partial");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("settings.json"), br#"{ "scroll_speed": 7.5 }"#).unwrap();

    let loaded = FsStorage::new(dir.clone()).load_settings().unwrap();
    assert_eq!(loaded.scroll_speed, 7.5);
    assert_eq!(loaded.spawn_distance, 10.0);
    assert_eq!(loaded.button_windows.miss, 0.20);
    assert_eq!(loaded.scoring.multiplier_thresholds, vec![4, 8, 12]);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn charts_are_listed_by_name() {
    let dir = scratch_dir("charts");
    let storage = FsStorage::new(dir.clone());
    assert_eq!(storage.list_charts().unwrap(), Vec::<String>::new());

    storage.save_chart("second song", &sample_chart()).unwrap();
    storage.save_chart("first-song", &sample_chart()).unwrap();
    std::fs::write(dir.join("charts").join("notes.txt"), b"ignored").unwrap();

    assert_eq!(
        storage.list_charts().unwrap(),
        vec!["first-song".to_string(), "second song".to_string()]
    );
    assert_eq!(storage.load_chart("first-song").unwrap(), sample_chart());
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn unknown_chart_is_reported_by_name() {
    let storage = FsStorage::new(scratch_dir("unknown"));
    let err = storage.load_chart("nothing").unwrap_err();
    assert!(matches!(err, StorageError::ChartNotFound(name) if name == "nothing"));
}

#[test]
fn chart_names_cannot_escape_the_charts_dir() {
    let storage = FsStorage::new(scratch_dir("escape"));
    assert!(storage.save_chart("../outside", &sample_chart()).is_err());
    assert!(storage.save_chart("", &sample_chart()).is_err());
}
