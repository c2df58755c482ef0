use lanebeat_ports::audio::{AudioError, AudioTransportPort};
use lanebeat_ports::types::Seconds;
use parking_lot::Mutex;

/// Audio transport with no device behind it. Time only moves when the
/// owner calls `advance`, so runs are reproducible.
pub struct SimulatedTransport {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    duration: Option<Seconds>,
    position: Seconds,
    playing: bool,
    rate: f64,
}

impl SimulatedTransport {
    pub fn new(duration: Option<Seconds>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                duration,
                position: 0.0,
                playing: false,
                rate: 1.0,
            }),
        }
    }

    pub fn with_clip(duration: Seconds) -> Self {
        Self::new(Some(duration.max(0.0)))
    }

    pub fn load_clip(&self, duration: Option<Seconds>) {
        let mut inner = self.inner.lock();
        inner.duration = duration;
        inner.position = 0.0;
        inner.playing = false;
    }

    /// Moves the playhead by `dt` wall seconds scaled by the rate. Reaching
    /// the end of the clip stops playback there.
    pub fn advance(&self, dt: Seconds) {
        let mut inner = self.inner.lock();
        if !inner.playing {
            return;
        }
        inner.position += dt.max(0.0) * inner.rate;
        if let Some(duration) = inner.duration {
            if inner.position >= duration {
                inner.position = duration;
                inner.playing = false;
            }
        }
    }

    pub fn rate(&self) -> f64 {
        self.inner.lock().rate
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AudioTransportPort for SimulatedTransport {
    fn current_position_seconds(&self) -> Seconds {
        self.inner.lock().position
    }

    fn duration_seconds(&self) -> Option<Seconds> {
        self.inner.lock().duration
    }

    fn is_playing(&self) -> bool {
        self.inner.lock().playing
    }

    fn play(&self) -> Result<(), AudioError> {
        let mut inner = self.inner.lock();
        if inner.duration.is_none() {
            return Err(AudioError::NoClip);
        }
        inner.playing = true;
        Ok(())
    }

    fn pause(&self) -> Result<(), AudioError> {
        self.inner.lock().playing = false;
        Ok(())
    }

    fn stop(&self) -> Result<(), AudioError> {
        let mut inner = self.inner.lock();
        inner.playing = false;
        inner.position = 0.0;
        Ok(())
    }

    fn set_position(&self, seconds: Seconds) -> Result<(), AudioError> {
        let mut inner = self.inner.lock();
        let Some(duration) = inner.duration else {
            return Err(AudioError::NoClip);
        };
        inner.position = seconds.clamp(0.0, duration);
        Ok(())
    }

    fn set_rate(&self, rate: f64) -> Result<(), AudioError> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(AudioError::Backend(format!("invalid rate {rate}")));
        }
        self.inner.lock().rate = rate;
        Ok(())
    }
}
