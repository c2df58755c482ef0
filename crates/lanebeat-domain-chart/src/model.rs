use lanebeat_ports::chart::{NoteDto, NoteKindDto};
use lanebeat_ports::types::{InvalidLane, Lane, NoteId, Seconds, Shape};
use lanebeat_ports::view::SpawnedNote;
use serde::Serialize;

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum ChartError {
    #[error(transparent)]
    InvalidLane(#[from] InvalidLane),
    #[error("invalid tempo: {bpm} bpm at {at}s")]
    InvalidTempo { at: Seconds, bpm: f64 },
    #[error("shape {shape} does not fit lane {lane}")]
    ShapeMismatch { lane: Lane, shape: Shape },
    #[error("invalid hold duration: {0}")]
    InvalidHoldDuration(Seconds),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(Seconds),
    #[error("note not found: {0:?}")]
    NoteNotFound(NoteId),
    #[error("unsupported chart schema: {0}")]
    UnsupportedSchema(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum NoteKind {
    Tap,
    Hold { duration: Seconds },
}

/// A validated note that has not been given an id yet. The lane class and
/// shape always agree, and holds always have a positive duration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NoteSpec {
    timestamp: Seconds,
    lane: Lane,
    shape: Shape,
    kind: NoteKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Note {
    id: NoteId,
    spec: NoteSpec,
}

impl NoteSpec {
    pub fn new(timestamp: Seconds, lane: Lane, shape: Shape, kind: NoteKind) -> Result<Self, ChartError> {
        if !timestamp.is_finite() {
            return Err(ChartError::InvalidTimestamp(timestamp));
        }
        if !lane.accepts(shape) {
            return Err(ChartError::ShapeMismatch { lane, shape });
        }
        if let NoteKind::Hold { duration } = kind {
            if !(duration.is_finite() && duration > 0.0) {
                return Err(ChartError::InvalidHoldDuration(duration));
            }
        }
        Ok(Self {
            timestamp,
            lane,
            shape,
            kind,
        })
    }

    pub fn tap(timestamp: Seconds, lane: Lane, shape: Shape) -> Result<Self, ChartError> {
        Self::new(timestamp, lane, shape, NoteKind::Tap)
    }

    pub fn hold(timestamp: Seconds, lane: Lane, shape: Shape, duration: Seconds) -> Result<Self, ChartError> {
        Self::new(timestamp, lane, shape, NoteKind::Hold { duration })
    }

    pub fn from_dto(dto: &NoteDto) -> Result<Self, ChartError> {
        let lane = Lane::new(dto.lane)?;
        let kind = match dto.kind {
            NoteKindDto::Tap => NoteKind::Tap,
            NoteKindDto::Hold => NoteKind::Hold {
                duration: dto.hold_duration,
            },
        };
        Self::new(dto.timestamp, lane, dto.shape, kind)
    }

    pub fn to_dto(&self) -> NoteDto {
        NoteDto {
            timestamp: self.timestamp,
            lane: self.lane.into(),
            shape: self.shape,
            kind: match self.kind {
                NoteKind::Tap => NoteKindDto::Tap,
                NoteKind::Hold { .. } => NoteKindDto::Hold,
            },
            hold_duration: self.hold_duration(),
        }
    }

    pub fn with_timestamp(self, timestamp: Seconds) -> Result<Self, ChartError> {
        Self::new(timestamp, self.lane, self.shape, self.kind)
    }

    pub fn with_shape(self, shape: Shape) -> Result<Self, ChartError> {
        Self::new(self.timestamp, self.lane, shape, self.kind)
    }

    pub fn timestamp(&self) -> Seconds {
        self.timestamp
    }

    pub fn lane(&self) -> Lane {
        self.lane
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn kind(&self) -> NoteKind {
        self.kind
    }

    pub fn is_hold(&self) -> bool {
        matches!(self.kind, NoteKind::Hold { .. })
    }

    /// Zero for taps.
    pub fn hold_duration(&self) -> Seconds {
        match self.kind {
            NoteKind::Tap => 0.0,
            NoteKind::Hold { duration } => duration,
        }
    }

    pub fn end_time(&self) -> Seconds {
        self.timestamp + self.hold_duration()
    }
}

impl Note {
    pub(crate) fn new(id: NoteId, spec: NoteSpec) -> Self {
        Self { id, spec }
    }

    pub fn id(&self) -> NoteId {
        self.id
    }

    pub fn spec(&self) -> &NoteSpec {
        &self.spec
    }

    pub(crate) fn spec_mut(&mut self) -> &mut NoteSpec {
        &mut self.spec
    }

    pub fn timestamp(&self) -> Seconds {
        self.spec.timestamp
    }

    pub fn lane(&self) -> Lane {
        self.spec.lane
    }

    pub fn shape(&self) -> Shape {
        self.spec.shape
    }

    pub fn kind(&self) -> NoteKind {
        self.spec.kind
    }

    pub fn is_hold(&self) -> bool {
        self.spec.is_hold()
    }

    pub fn hold_duration(&self) -> Seconds {
        self.spec.hold_duration()
    }

    pub fn end_time(&self) -> Seconds {
        self.spec.end_time()
    }

    pub fn to_spawned(&self) -> SpawnedNote {
        SpawnedNote {
            id: self.id,
            timestamp: self.timestamp(),
            lane: self.lane(),
            shape: self.shape(),
            hold_duration: self.is_hold().then(|| self.hold_duration()),
        }
    }
}
