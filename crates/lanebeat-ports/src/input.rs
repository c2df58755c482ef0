use crate::types::{Lane, Shape};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Instant};

/// A lane/shape actuation as reported by the device layer, not mapped to song time yet.
#[derive(Clone, Copy, Debug)]
pub struct PlayerAction {
    pub at: Instant,
    pub lane: Lane,
    pub shape: Shape,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputDevice {
    pub id: String,
    pub name: String,
    pub is_available: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum InputError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Action stream handle: drop closes it.
pub trait InputStream: Send {
    fn close(self: Box<Self>);
}

pub type PlayerActionCallback = Arc<dyn Fn(PlayerAction) + Send + Sync + 'static>;

pub trait InputPort: Send + Sync {
    fn list_devices(&self) -> Result<Vec<InputDevice>, InputError>;

    /// Open the action stream: implementation may invoke cb from a background thread.
    fn open(&self, cb: PlayerActionCallback) -> Result<Box<dyn InputStream>, InputError>;

    /// Polled once per tick for every sustaining hold.
    fn is_shape_still_actuated(&self, lane: Lane, shape: Shape) -> bool;
}
