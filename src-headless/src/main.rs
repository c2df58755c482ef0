use clap::{Parser, Subcommand};
use lanebeat_core::{Command, Event, GameSession, SessionError, SessionState};
use lanebeat_domain_chart::{Chart, ChartError, Note};
use lanebeat_domain_eval::{JudgeEvent, ScoreSnapshot};
use lanebeat_infra_sim::{SimulatedGamepad, SimulatedTransport};
use lanebeat_infra_storage_fs::FsStorage;
use lanebeat_ports::audio::AudioTransportPort;
use lanebeat_ports::chart::ChartDto;
use lanebeat_ports::storage::{StorageError, StoragePort};
use lanebeat_ports::types::{Seconds, Tier};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

const TAIL_SECONDS: Seconds = 2.0;

#[derive(Parser)]
#[command(name = "lanebeat-headless")]
#[command(version, about = "Runs lanebeat charts without audio or video", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings and chart directory (default: platform config dir)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List charts saved in the data directory
    List,
    /// Autoplay a chart and print the result
    Run {
        /// Chart JSON file
        #[arg(long, conflicts_with = "stored")]
        chart: Option<PathBuf>,

        /// Name of a chart saved in the data directory
        #[arg(long)]
        stored: Option<String>,

        /// Ticks per second
        #[arg(long, default_value = "60")]
        fps: u32,

        /// Largest timing error of the autoplayer, in milliseconds
        #[arg(long, default_value = "0")]
        spread_ms: u32,

        /// Leave every Nth note unplayed (0 plays everything)
        #[arg(long, default_value = "0")]
        skip_every: usize,

        /// Write diagnostics into this directory afterwards
        #[arg(long)]
        diagnostics: Option<PathBuf>,

        /// Print every judgement
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(thiserror::Error, Debug)]
enum HeadlessError {
    #[error("pass --chart or --stored")]
    NoChart,
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid chart json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// One scripted press. Holds are released at `release_at`.
struct Cue {
    note: Note,
    at: Seconds,
    release_at: Option<Seconds>,
}

fn main() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let cli = Cli::parse();
    let storage = match cli.data_dir {
        Some(dir) => FsStorage::new(dir),
        None => FsStorage::default(),
    };

    let result = match cli.command {
        Commands::List => list(&storage),
        Commands::Run {
            chart,
            stored,
            fps,
            spread_ms,
            skip_every,
            diagnostics,
            verbose,
        } => load_chart(&storage, chart, stored).and_then(|chart| {
            let options = RunOptions {
                fps: fps.max(1),
                spread: f64::from(spread_ms) / 1000.0,
                skip_every,
                diagnostics,
                verbose,
            };
            run(storage, chart, &options)
        }),
    };

    if let Err(err) = result {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn list(storage: &FsStorage) -> Result<(), HeadlessError> {
    let names = storage.list_charts()?;
    if names.is_empty() {
        println!("No charts in {}", storage.base_dir().display());
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

fn load_chart(
    storage: &FsStorage,
    path: Option<PathBuf>,
    stored: Option<String>,
) -> Result<Chart, HeadlessError> {
    let dto: ChartDto = match (path, stored) {
        (Some(path), _) => {
            let data = std::fs::read(&path).map_err(|source| HeadlessError::Read {
                path: path.clone(),
                source,
            })?;
            serde_json::from_slice(&data)?
        }
        (None, Some(name)) => storage.load_chart(&name)?,
        (None, None) => return Err(HeadlessError::NoChart),
    };
    Ok(Chart::from_dto(&dto)?)
}

struct RunOptions {
    fps: u32,
    spread: Seconds,
    skip_every: usize,
    diagnostics: Option<PathBuf>,
    verbose: bool,
}

fn run(storage: FsStorage, chart: Chart, options: &RunOptions) -> Result<(), HeadlessError> {
    let clip = chart
        .audio_duration_seconds()
        .or_else(|| chart.last_note_end().map(|end| end + TAIL_SECONDS))
        .unwrap_or(TAIL_SECONDS);
    let mut cues = plan(&chart, options);

    let transport = Arc::new(SimulatedTransport::with_clip(clip));
    let pad = SimulatedGamepad::new();
    let mut session = GameSession::new(
        transport.clone(),
        Arc::new(pad.clone()),
        Some(Box::new(storage)),
    );
    let lead_in = session.settings().lead_in_seconds;

    session.handle_command(Command::SelectInput {
        device_id: SimulatedGamepad::DEVICE_ID.to_string(),
    })?;
    session.load_chart(chart)?;

    let origin = Instant::now();
    session.start_at(origin)?;

    let frame = 1.0 / f64::from(options.fps);
    let deadline = lead_in + clip + TAIL_SECONDS;
    let mut elapsed = 0.0;
    let mut summary = None;
    let mut held: Vec<Cue> = Vec::new();

    while summary.is_none() && elapsed < deadline {
        elapsed += frame;
        let now = origin + Duration::from_secs_f64(elapsed);
        if session.state() == SessionState::Running {
            transport.advance(frame);
        }

        let song = transport.current_position_seconds();
        if session.state() == SessionState::Running {
            while cues.first().is_some_and(|cue| cue.at <= song) {
                let cue = cues.remove(0);
                pad.press(cue.note.lane(), cue.note.shape(), now);
                if cue.release_at.is_some() {
                    held.push(cue);
                }
            }
        }
        // Let go of holds once their end has passed.
        held.retain(|cue| match cue.release_at {
            Some(end) if end < song => {
                pad.release(cue.note.lane(), now);
                false
            }
            _ => true,
        });

        session.tick_at(now);
        for event in session.drain_events() {
            match event {
                Event::Judged { event } if options.verbose => print_judgement(&event),
                Event::SongFinished { summary: snapshot } => summary = Some(snapshot),
                _ => {}
            }
        }
    }

    if let Some(dir) = options.diagnostics.as_ref() {
        session.handle_command(Command::ExportDiagnostics {
            path: dir.display().to_string(),
        })?;
    }

    match summary {
        Some(snapshot) => print_summary(&snapshot),
        None => log::warn!("song did not finish within {deadline:.1}s"),
    }
    Ok(())
}

/// Scripted presses for every note, with a repeatable timing error of up to
/// `spread` seconds.
fn plan(chart: &Chart, options: &RunOptions) -> Vec<Cue> {
    let mut cues: Vec<Cue> = chart
        .notes()
        .iter()
        .enumerate()
        .filter(|(index, _)| options.skip_every == 0 || (index + 1) % options.skip_every != 0)
        .map(|(index, note)| {
            let step = (index * 7919 % 21) as f64 / 10.0 - 1.0;
            let at = note.timestamp() + step * options.spread;
            Cue {
                note: *note,
                at,
                release_at: note.is_hold().then(|| note.end_time()),
            }
        })
        .collect();
    cues.sort_by(|a, b| a.at.total_cmp(&b.at));
    cues
}

fn print_judgement(event: &JudgeEvent) {
    match event {
        JudgeEvent::Hit { note, tier, delta } => {
            println!("{:>6} {:<9} {:+.3}s", note.0, tier.label(), delta)
        }
        JudgeEvent::HoldStarted { note, tier, .. } => {
            println!("{:>6} hold      {}", note.0, tier.label())
        }
        JudgeEvent::HoldCompleted { note } => println!("{:>6} held      Perfect!", note.0),
        JudgeEvent::HoldReleased {
            note,
            tier,
            held_ratio,
        } => println!(
            "{:>6} released  {} ({:.0}%)",
            note.0,
            tier.label(),
            held_ratio * 100.0
        ),
        JudgeEvent::Miss { note, .. } => println!("{:>6} Miss", note.0),
        JudgeEvent::Ghost { lane, shape, at } => {
            println!("     - ghost     lane {lane} {shape} at {at:.3}s")
        }
        JudgeEvent::HoldProgress { .. } => {}
    }
}

fn print_summary(snapshot: &ScoreSnapshot) {
    println!("score     {}", snapshot.score);
    println!("max combo {}", snapshot.max_combo);
    println!("accuracy  {:.1}%", snapshot.accuracy * 100.0);
    for tier in [Tier::Perfect, Tier::Great, Tier::Good, Tier::Ok, Tier::Miss] {
        println!("{:<9} {}", tier.label(), snapshot.counts.get(tier));
    }
}
