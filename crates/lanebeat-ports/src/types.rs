use serde::{Deserialize, Serialize};
use std::fmt;

pub type Seconds = f64; // song time, negative during lead-in

pub const LANE_COUNT: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NoteId(pub u64);

#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
#[error("invalid lane index: {0} (expected 0..{max})", max = LANE_COUNT - 1)]
pub struct InvalidLane(pub i32);

/// Logical lane 0..=5. Lanes 0-2 read the analog stick, lanes 3-5 read buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Lane(u8);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneClass {
    Stick,
    Button,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StickDirection {
    Up,
    Horizontal,
    Down,
    UpDown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonRow {
    Top,
    Bottom,
    Both,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Shape {
    Stick(StickDirection),
    Button(ButtonRow),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Perfect,
    Great,
    Good,
    Ok,
    Miss,
}

impl Lane {
    pub const MIN: Lane = Lane(0);
    pub const MAX: Lane = Lane(LANE_COUNT as u8 - 1);

    pub fn new(index: i32) -> Result<Self, InvalidLane> {
        if (0..LANE_COUNT as i32).contains(&index) {
            Ok(Self(index as u8))
        } else {
            Err(InvalidLane(index))
        }
    }

    /// Clamps an editor-derived index into the valid lane range.
    pub fn clamped(index: i32) -> Self {
        Self(index.clamp(0, LANE_COUNT as i32 - 1) as u8)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn class(self) -> LaneClass {
        if self.0 <= 2 {
            LaneClass::Stick
        } else {
            LaneClass::Button
        }
    }

    pub fn all() -> impl Iterator<Item = Lane> {
        (0..LANE_COUNT as u8).map(Lane)
    }

    pub fn accepts(self, shape: Shape) -> bool {
        self.class() == shape.class()
    }
}

impl TryFrom<i32> for Lane {
    type Error = InvalidLane;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Lane::new(value)
    }
}

impl From<Lane> for i32 {
    fn from(lane: Lane) -> Self {
        lane.0 as i32
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Shape {
    pub fn class(self) -> LaneClass {
        match self {
            Shape::Stick(_) => LaneClass::Stick,
            Shape::Button(_) => LaneClass::Button,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Stick(direction) => write!(f, "{direction:?}"),
            Shape::Button(row) => write!(f, "{row:?}"),
        }
    }
}

impl Tier {
    pub fn is_miss(self) -> bool {
        self == Tier::Miss
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::Perfect => "Perfect!",
            Tier::Great => "Great!",
            Tier::Good => "Good",
            Tier::Ok => "OK",
            Tier::Miss => "Miss",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
