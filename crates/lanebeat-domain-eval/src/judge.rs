use crate::runtime::{HoldPhase, NotePhase, NoteRuntime, RuntimeTable};
use crate::windows::JudgeConfig;
use lanebeat_ports::types::{Lane, NoteId, Seconds, Shape, Tier};
use lanebeat_ports::view::NoteOutcome;
use serde::{Deserialize, Serialize};

/// A player actuation already mapped to song time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneAction {
    pub lane: Lane,
    pub shape: Shape,
    pub at: Seconds,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissReason {
    /// Passed the judgement line by more than the lane's miss window.
    Expired,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum JudgeEvent {
    Hit {
        note: NoteId,
        tier: Tier,
        delta: Seconds,
    },
    /// Initial tier of a hold; the scored judgement arrives with its resolution.
    HoldStarted {
        note: NoteId,
        tier: Tier,
        delta: Seconds,
    },
    HoldProgress {
        note: NoteId,
        remaining_ratio: f64,
    },
    HoldCompleted {
        note: NoteId,
    },
    HoldReleased {
        note: NoteId,
        tier: Tier,
        held_ratio: f64,
    },
    Miss {
        note: NoteId,
        reason: MissReason,
    },
    /// No candidate within the miss window. Nothing was consumed.
    Ghost {
        lane: Lane,
        shape: Shape,
        at: Seconds,
    },
}

impl JudgeEvent {
    pub fn note(&self) -> Option<NoteId> {
        match *self {
            JudgeEvent::Hit { note, .. }
            | JudgeEvent::HoldStarted { note, .. }
            | JudgeEvent::HoldProgress { note, .. }
            | JudgeEvent::HoldCompleted { note }
            | JudgeEvent::HoldReleased { note, .. }
            | JudgeEvent::Miss { note, .. } => Some(note),
            JudgeEvent::Ghost { .. } => None,
        }
    }

    /// The tier that counts toward score and combo, if this event resolves a note.
    pub fn scored_tier(&self) -> Option<Tier> {
        match *self {
            JudgeEvent::Hit { tier, .. } | JudgeEvent::HoldReleased { tier, .. } => Some(tier),
            JudgeEvent::HoldCompleted { .. } => Some(Tier::Perfect),
            JudgeEvent::Miss { .. } => Some(Tier::Miss),
            JudgeEvent::HoldStarted { .. }
            | JudgeEvent::HoldProgress { .. }
            | JudgeEvent::Ghost { .. } => None,
        }
    }

    /// Outcome reported to the view, for events that change a note's display state.
    pub fn outcome(&self) -> Option<(NoteId, NoteOutcome)> {
        match *self {
            JudgeEvent::Hit { note, tier, delta } => Some((note, NoteOutcome::Hit { tier, delta })),
            JudgeEvent::HoldStarted { note, tier, delta } => {
                Some((note, NoteOutcome::HoldStarted { tier, delta }))
            }
            JudgeEvent::HoldCompleted { note } => Some((note, NoteOutcome::HoldCompleted)),
            JudgeEvent::HoldReleased {
                note,
                tier,
                held_ratio,
            } => Some((note, NoteOutcome::HoldReleased { tier, held_ratio })),
            JudgeEvent::Miss { note, .. } => Some((note, NoteOutcome::Missed)),
            JudgeEvent::HoldProgress { .. } | JudgeEvent::Ghost { .. } => None,
        }
    }
}

pub struct Judge {
    cfg: JudgeConfig,
}

impl Judge {
    pub fn new(cfg: JudgeConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.cfg
    }

    pub fn set_config(&mut self, cfg: JudgeConfig) {
        self.cfg = cfg;
    }

    /// Resolves one lane action against the live notes of its lane.
    ///
    /// Candidates are spawned, unresolved, non-sustaining notes whose shape
    /// matches exactly and whose timestamp is within the lane class's miss
    /// window. The closest one wins; equal distances go to the earlier
    /// timestamp, then the lower note id. Hold candidates are skipped while
    /// the lane already sustains a hold.
    pub fn on_lane_action(&self, table: &mut RuntimeTable, action: LaneAction) -> JudgeEvent {
        let windows = *self.cfg.windows.for_class(action.lane.class());
        let lane_busy = table.sustaining_in(action.lane).is_some();

        let best = table
            .live()
            .filter(|rt| is_candidate(rt, &action, lane_busy))
            .map(|rt| (rt.id(), rt.timestamp(), action.at - rt.timestamp()))
            .filter(|(_, _, delta)| delta.abs() <= windows.miss)
            .min_by(|a, b| {
                a.2.abs()
                    .total_cmp(&b.2.abs())
                    .then(a.1.total_cmp(&b.1))
                    .then(a.0.cmp(&b.0))
            });

        let Some((id, _, delta)) = best else {
            log::debug!(
                "ghost input: lane {} {} at {:.3}s",
                action.lane,
                action.shape,
                action.at
            );
            return ghost(&action);
        };
        let Some(tier) = windows.classify(delta) else {
            return ghost(&action);
        };

        let is_hold = table.get(id).is_some_and(|rt| rt.note().is_hold());
        if is_hold {
            if let Some(runtime) = table.get_mut(id) {
                runtime.start_hold(action.at);
            }
            log::debug!("hold {:?} started: {} ({:+.3}s)", id, tier, delta);
            return JudgeEvent::HoldStarted {
                note: id,
                tier,
                delta,
            };
        }

        if !table.resolve(id, NotePhase::Resolved) {
            return ghost(&action);
        }
        log::debug!("note {:?} hit: {} ({:+.3}s)", id, tier, delta);
        JudgeEvent::Hit {
            note: id,
            tier,
            delta,
        }
    }

    /// Advances every sustaining hold to `now`. `is_held` reports whether the
    /// lane's control is still actuated in the note's shape.
    pub fn update_holds<F>(&self, table: &mut RuntimeTable, now: Seconds, mut is_held: F) -> Vec<JudgeEvent>
    where
        F: FnMut(Lane, Shape) -> bool,
    {
        let sustaining: Vec<(NoteId, Lane, Shape)> = table
            .live()
            .filter(|rt| rt.is_sustaining())
            .map(|rt| (rt.id(), rt.lane(), rt.shape()))
            .collect();

        let mut events = Vec::new();
        for (id, lane, shape) in sustaining {
            let held = is_held(lane, shape);
            let Some(runtime) = table.get_mut(id) else {
                continue;
            };

            if held {
                runtime.sustain_until(now);
                if runtime.hold_remaining() > 0.0 {
                    events.push(JudgeEvent::HoldProgress {
                        note: id,
                        remaining_ratio: runtime.remaining_ratio(),
                    });
                    continue;
                }
                runtime.set_hold_phase(HoldPhase::Completed);
                if table.resolve(id, NotePhase::Resolved) {
                    log::debug!("hold {:?} completed", id);
                    events.push(JudgeEvent::HoldCompleted { note: id });
                }
            } else {
                let held_ratio = runtime.held_ratio();
                let tier = self.cfg.hold.grade(held_ratio);
                runtime.set_hold_phase(HoldPhase::Failed);
                if table.resolve(id, NotePhase::Resolved) {
                    log::debug!("hold {:?} released at {:.2}: {}", id, held_ratio, tier);
                    events.push(JudgeEvent::HoldReleased {
                        note: id,
                        tier,
                        held_ratio,
                    });
                }
            }
        }
        events
    }
}

fn is_candidate(rt: &NoteRuntime, action: &LaneAction, lane_busy: bool) -> bool {
    rt.phase() == NotePhase::Spawned
        && rt.hold_phase() == HoldPhase::NotStarted
        && rt.lane() == action.lane
        && rt.shape() == action.shape
        && !(lane_busy && rt.note().is_hold())
}

fn ghost(action: &LaneAction) -> JudgeEvent {
    JudgeEvent::Ghost {
        lane: action.lane,
        shape: action.shape,
        at: action.at,
    }
}
