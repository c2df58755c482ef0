use crate::clock::{ClockState, PlaybackClock};
use crate::diagnostics::{export_diagnostics, ChartSummary};
use crate::ipc::{ChartSource, Command, Event, SessionState};
use crate::metronome::Metronome;
use crate::scheduler::{NoteScheduler, SchedulerConfig};
use lanebeat_domain_chart::{Chart, ChartError};
use lanebeat_domain_eval::{
    Judge, JudgeConfig, JudgeEvent, LaneAction, RuntimeTable, ScoreSnapshot, ScoreTracker,
    ScoringConfig,
};
use lanebeat_ports::audio::{AudioError, AudioTransportPort};
use lanebeat_ports::input::{InputError, InputPort, InputStream, PlayerAction};
use lanebeat_ports::storage::{SettingsDto, StorageError, StoragePort};
use lanebeat_ports::types::Seconds;
use lanebeat_ports::view::NoteViewPort;
use parking_lot::Mutex;
use rtrb::{Consumer, RingBuffer};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

const INPUT_QUEUE_CAPACITY: usize = 1024;
const RECENT_JUDGEMENTS: usize = 64;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("no chart or audio loaded")]
    ChartNotLoaded,
    #[error("audio error: {0}")]
    Audio(#[from] AudioError),
    #[error("input error: {0}")]
    Input(#[from] InputError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("chart error: {0}")]
    Chart(#[from] ChartError),
}

/// One gameplay session: clock, scheduler, judge and score wired together
/// and driven by `tick`.
pub struct GameSession {
    audio: Arc<dyn AudioTransportPort>,
    input: Arc<dyn InputPort>,
    storage: Option<Box<dyn StoragePort>>,
    view: Option<Box<dyn NoteViewPort>>,
    settings: SettingsDto,
    state: SessionState,
    clock: PlaybackClock,
    scheduler: NoteScheduler,
    metronome: Metronome,
    table: RuntimeTable,
    judge: Judge,
    scores: ScoreTracker,
    chart: Option<Chart>,
    input_stream: Option<Box<dyn InputStream>>,
    input_rx: Option<Consumer<PlayerAction>>,
    events: VecDeque<Event>,
    recent: VecDeque<JudgeEvent>,
    last_transport_emit: Option<Instant>,
}

impl GameSession {
    pub fn new(
        audio: Arc<dyn AudioTransportPort>,
        input: Arc<dyn InputPort>,
        storage: Option<Box<dyn StoragePort>>,
    ) -> Self {
        let settings = match storage.as_ref() {
            Some(storage) => storage.load_settings().unwrap_or_else(|err| {
                log::warn!("falling back to default settings: {err}");
                SettingsDto::default()
            }),
            None => SettingsDto::default(),
        };
        Self::with_settings(audio, input, storage, settings)
    }

    pub fn with_settings(
        audio: Arc<dyn AudioTransportPort>,
        input: Arc<dyn InputPort>,
        storage: Option<Box<dyn StoragePort>>,
        settings: SettingsDto,
    ) -> Self {
        let mut clock = PlaybackClock::new(audio.clone(), settings.lead_in_seconds);
        if let Err(err) = clock.set_rate(settings.playback_rate) {
            log::warn!("failed to apply playback rate: {err}");
        }
        Self {
            audio,
            input,
            storage,
            view: None,
            clock,
            scheduler: NoteScheduler::new(SchedulerConfig::from(&settings)),
            metronome: Metronome::new(settings.metronome),
            table: RuntimeTable::new(),
            judge: Judge::new(JudgeConfig::from(&settings)),
            scores: ScoreTracker::new(ScoringConfig::from(&settings.scoring)),
            settings,
            state: SessionState::Idle,
            chart: None,
            input_stream: None,
            input_rx: None,
            events: VecDeque::new(),
            recent: VecDeque::with_capacity(RECENT_JUDGEMENTS),
            last_transport_emit: None,
        }
    }

    pub fn set_view(&mut self, view: Box<dyn NoteViewPort>) {
        self.view = Some(view);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn settings(&self) -> &SettingsDto {
        &self.settings
    }

    pub fn chart(&self) -> Option<&Chart> {
        self.chart.as_ref()
    }

    pub fn runtime(&self) -> &RuntimeTable {
        &self.table
    }

    pub fn score(&self) -> ScoreSnapshot {
        self.scores.snapshot()
    }

    pub fn song_time(&self) -> Seconds {
        self.clock.now()
    }

    pub fn metronome(&self) -> &Metronome {
        &self.metronome
    }

    pub fn handle_command(&mut self, cmd: Command) -> Result<(), SessionError> {
        match cmd {
            Command::ListInputs => {
                let devices = self.input.list_devices()?;
                self.events.push_back(Event::InputsUpdated { devices });
            }
            Command::SelectInput { device_id } => {
                self.open_input(device_id)?;
            }
            Command::LoadChart { source } => {
                let dto = match source {
                    ChartSource::Stored(name) => {
                        let storage = self
                            .storage
                            .as_ref()
                            .ok_or_else(|| StorageError::ChartNotFound(name.clone()))?;
                        storage.load_chart(&name)?
                    }
                    ChartSource::Inline(dto) => dto,
                };
                self.load_chart(Chart::from_dto(&dto)?)?;
            }
            Command::Start => {
                self.start_at(Instant::now())?;
            }
            Command::Pause => {
                self.pause()?;
            }
            Command::TogglePlay => {
                if self.clock.is_running() {
                    self.pause()?;
                } else {
                    self.start_at(Instant::now())?;
                }
            }
            Command::Stop => {
                self.stop()?;
            }
            Command::Seek { seconds } => {
                self.seek(seconds)?;
            }
            Command::SetPlaybackRate { rate } => {
                self.clock.set_rate(rate)?;
                self.settings.playback_rate = self.clock.rate();
                self.emit_transport(true);
                self.save_settings();
            }
            Command::SetInputOffsetMs { ms } => {
                self.settings.input_offset_ms = ms;
                self.save_settings();
            }
            Command::SetMetronomeMode { mode } => {
                self.settings.metronome = mode;
                if let Some(chart) = self.chart.as_ref() {
                    self.metronome.rebuild(mode, chart, self.clock.now());
                } else {
                    self.metronome = Metronome::new(mode);
                }
                self.save_settings();
            }
            Command::ApplySettings { settings } => {
                self.apply_settings(settings);
            }
            Command::ExportDiagnostics { path } => {
                let inputs = self.input.list_devices()?;
                export_diagnostics(
                    Path::new(&path),
                    &self.settings,
                    inputs,
                    self.chart.as_ref().map(ChartSummary::of),
                    self.recent.iter().copied().collect(),
                    Some(self.scores.snapshot()),
                )?;
            }
        }
        Ok(())
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// One simulation step. The song position is read once, up front.
    pub fn tick_at(&mut self, now: Instant) {
        if !matches!(self.state, SessionState::LeadIn | SessionState::Running) {
            self.discard_pending_inputs();
            return;
        }

        let song_now = match self.clock.sync(now) {
            Ok(position) => position,
            Err(err) => {
                log::warn!("clock sync failed: {err}");
                return;
            }
        };
        if self.state == SessionState::LeadIn && self.clock.state() == ClockState::Playing {
            self.set_state(SessionState::Running);
        }

        self.spawn_notes(song_now);
        self.process_inputs();

        let input = self.input.clone();
        let hold_events = self
            .judge
            .update_holds(&mut self.table, song_now, |lane, shape| {
                input.is_shape_still_actuated(lane, shape)
            });
        self.handle_judge_events(hold_events);

        let expired = self.scheduler.expire_overdue(song_now, &mut self.table);
        self.handle_judge_events(expired);

        for at in self.metronome.poll(song_now) {
            self.events.push_back(Event::MetronomeClick { at });
        }

        if self.clock.at_end() {
            self.finish_song();
            return;
        }
        self.emit_transport(false);
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    pub fn load_chart(&mut self, chart: Chart) -> Result<(), SessionError> {
        if self.clock.is_running() {
            self.clock.stop()?;
        }
        self.reset_run();
        self.scheduler.set_notes(chart.notes().to_vec());
        self.metronome.rebuild(self.settings.metronome, &chart, 0.0);

        log::info!(
            "chart loaded: {} notes, {} tempo changes",
            chart.len(),
            chart.tempo_segments().len()
        );
        self.events.push_back(Event::ChartLoaded {
            notes: chart.len(),
            duration_seconds: chart.audio_duration_seconds(),
        });
        self.chart = Some(chart);
        self.set_state(SessionState::Ready);
        Ok(())
    }

    /// Starts or resumes play. From `Ready` the run state is reset first.
    pub fn start_at(&mut self, now: Instant) -> Result<(), SessionError> {
        if self.chart.is_none() || self.audio.duration_seconds().is_none() {
            return Err(SessionError::ChartNotLoaded);
        }
        match self.state {
            SessionState::LeadIn | SessionState::Running => return Ok(()),
            SessionState::Ready => {
                self.reset_run();
                self.clock.set_lead_in(self.settings.lead_in_seconds);
            }
            SessionState::Paused | SessionState::Idle => {}
        }

        self.clock.start(now).map_err(|err| match err {
            AudioError::NoClip => SessionError::ChartNotLoaded,
            other => SessionError::Audio(other),
        })?;
        let next = if self.clock.state() == ClockState::LeadIn {
            SessionState::LeadIn
        } else {
            SessionState::Running
        };
        log::info!("session started at {:.2}s", self.clock.now());
        self.set_state(next);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), SessionError> {
        if !self.clock.is_running() {
            return Ok(());
        }
        self.clock.pause()?;
        self.set_state(SessionState::Paused);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SessionError> {
        self.clock.stop()?;
        self.reset_run();
        log::info!("session stopped");
        let next = if self.chart.is_some() {
            SessionState::Ready
        } else {
            SessionState::Idle
        };
        self.set_state(next);
        self.emit_transport(true);
        Ok(())
    }

    /// Jumps the song clock. Live notes, including sustaining holds, are
    /// discarded and every cursor is re-derived for the new position.
    fn seek(&mut self, seconds: Seconds) -> Result<(), SessionError> {
        let target = self.clock.seek(seconds)?;
        let discarded = self.table.clear();
        self.scheduler.seek(target);
        self.metronome.seek(target);
        if let Some(view) = self.view.as_mut() {
            view.on_reset();
        }
        if self.state == SessionState::LeadIn {
            self.set_state(SessionState::Running);
        }

        log::info!("seek to {:.2}s, {} live notes discarded", target, discarded.len());
        self.events.push_back(Event::Seeked {
            seconds: target,
            discarded: discarded.len(),
        });
        self.emit_transport(true);
        Ok(())
    }

    fn apply_settings(&mut self, settings: SettingsDto) {
        self.judge.set_config(JudgeConfig::from(&settings));
        self.scheduler.set_config(SchedulerConfig::from(&settings));
        if settings.scoring != self.settings.scoring {
            self.scores = ScoreTracker::new(ScoringConfig::from(&settings.scoring));
        }
        self.clock.set_lead_in(settings.lead_in_seconds);
        if let Err(err) = self.clock.set_rate(settings.playback_rate) {
            log::warn!("failed to apply playback rate: {err}");
        }
        if let Some(chart) = self.chart.as_ref() {
            self.metronome.rebuild(settings.metronome, chart, self.clock.now());
        }
        self.settings = settings;
        self.emit_session_state();
        self.save_settings();
    }

    fn open_input(&mut self, device_id: String) -> Result<(), SessionError> {
        if let Some(stream) = self.input_stream.take() {
            stream.close();
        }

        let (producer, consumer) = RingBuffer::new(INPUT_QUEUE_CAPACITY);
        let producer = Arc::new(Mutex::new(producer));
        let cb = Arc::new(move |action: PlayerAction| {
            if let Some(mut guard) = producer.try_lock() {
                let _ = guard.push(action);
            }
        });

        let stream = self.input.open(cb)?;
        self.input_stream = Some(stream);
        self.input_rx = Some(consumer);
        log::info!("input opened: {device_id}");
        self.settings.selected_input = Some(device_id);
        self.emit_session_state();
        self.save_settings();
        Ok(())
    }

    fn spawn_notes(&mut self, song_now: Seconds) {
        let spawned = self.scheduler.spawn_due(song_now, &mut self.table);
        for note in spawned {
            if let Some(view) = self.view.as_mut() {
                view.on_spawn(&note);
            }
            self.events.push_back(Event::NoteSpawned { note });
        }
    }

    fn process_inputs(&mut self) {
        let Some(mut consumer) = self.input_rx.take() else {
            return;
        };

        let offset = f64::from(self.settings.input_offset_ms) / 1000.0;
        while let Ok(action) = consumer.pop() {
            let lane_action = LaneAction {
                lane: action.lane,
                shape: action.shape,
                at: self.clock.song_time_at(action.at) + offset,
            };
            let event = self.judge.on_lane_action(&mut self.table, lane_action);
            self.handle_judge_event(event);
        }

        self.input_rx = Some(consumer);
    }

    fn discard_pending_inputs(&mut self) {
        if let Some(consumer) = self.input_rx.as_mut() {
            while consumer.pop().is_ok() {}
        }
    }

    fn handle_judge_events(&mut self, events: Vec<JudgeEvent>) {
        for event in events {
            self.handle_judge_event(event);
        }
    }

    fn handle_judge_event(&mut self, event: JudgeEvent) {
        if let Some(view) = self.view.as_mut() {
            match event {
                JudgeEvent::HoldProgress {
                    note,
                    remaining_ratio,
                } => view.on_hold_progress(note, remaining_ratio),
                _ => {
                    if let Some((note, outcome)) = event.outcome() {
                        view.on_resolved(note, outcome);
                    }
                }
            }
        }

        if matches!(event, JudgeEvent::HoldProgress { .. }) {
            return;
        }

        if self.recent.len() >= RECENT_JUDGEMENTS {
            self.recent.pop_front();
        }
        self.recent.push_back(event);
        self.events.push_back(Event::Judged { event });

        if let Some(tier) = event.scored_tier() {
            let snapshot = self.scores.on_judgement(tier);
            self.events.push_back(Event::ScoreUpdated { snapshot });
        }
    }

    /// Audio reached its end: whatever is still pending is settled, the
    /// summary goes out and the session returns to `Ready` at the start.
    fn finish_song(&mut self) {
        self.spawn_notes(f64::INFINITY);
        let holds = self
            .judge
            .update_holds(&mut self.table, f64::INFINITY, |_, _| true);
        self.handle_judge_events(holds);
        let expired = self.scheduler.expire_overdue(f64::INFINITY, &mut self.table);
        self.handle_judge_events(expired);

        let summary = self.scores.snapshot();
        log::info!(
            "song finished: score {} max combo {} accuracy {:.1}%",
            summary.score,
            summary.max_combo,
            summary.accuracy * 100.0
        );
        self.events.push_back(Event::SongFinished { summary });

        if let Err(err) = self.clock.stop() {
            log::warn!("failed to stop audio: {err}");
        }
        self.table.clear();
        self.scheduler.seek(0.0);
        self.metronome.seek(0.0);
        self.set_state(SessionState::Ready);
        self.emit_transport(true);
    }

    fn reset_run(&mut self) {
        // A seek while stopped is kept: the next run starts from there.
        let from = if self.clock.now() > 0.0 {
            self.clock.now()
        } else {
            f64::NEG_INFINITY
        };
        self.table.reset();
        self.scores.reset();
        self.scheduler.seek(from);
        self.metronome.seek(from);
        self.recent.clear();
        if let Some(view) = self.view.as_mut() {
            view.on_reset();
        }
    }

    fn set_state(&mut self, state: SessionState) {
        self.state = state;
        self.emit_session_state();
    }

    fn emit_session_state(&mut self) {
        self.events.push_back(Event::SessionStateUpdated {
            state: self.state,
            settings: self.settings.clone(),
        });
    }

    fn emit_transport(&mut self, force: bool) {
        let now = Instant::now();
        if !force {
            if let Some(last) = self.last_transport_emit {
                if now.duration_since(last) < Duration::from_millis(33) {
                    return;
                }
            }
        }
        self.events.push_back(Event::TransportUpdated {
            seconds: self.clock.now(),
            playing: self.clock.is_running(),
            rate: self.clock.rate(),
        });
        self.last_transport_emit = Some(now);
    }

    fn save_settings(&self) {
        if let Some(storage) = self.storage.as_ref() {
            if let Err(err) = storage.save_settings(&self.settings) {
                log::warn!("failed to save settings: {err}");
            }
        }
    }
}
