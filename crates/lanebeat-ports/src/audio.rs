use crate::types::Seconds;

#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    #[error("no audio clip loaded")]
    NoClip,
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Audio transport for the song clip. The reported position is the single
/// source of truth for song time; callers read it once per tick.
pub trait AudioTransportPort: Send + Sync {
    fn current_position_seconds(&self) -> Seconds;

    /// `None` while no clip is loaded.
    fn duration_seconds(&self) -> Option<Seconds>;

    fn is_playing(&self) -> bool;

    fn play(&self) -> Result<(), AudioError>;
    fn pause(&self) -> Result<(), AudioError>;
    fn stop(&self) -> Result<(), AudioError>;

    fn set_position(&self, seconds: Seconds) -> Result<(), AudioError>;
    fn set_rate(&self, rate: f64) -> Result<(), AudioError>;
}
