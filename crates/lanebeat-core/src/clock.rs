use lanebeat_ports::audio::{AudioError, AudioTransportPort};
use lanebeat_ports::types::Seconds;
use std::sync::Arc;
use std::time::Instant;

const MIN_RATE: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    /// Counting down before audio starts; song time is negative.
    LeadIn,
    Playing,
    Paused,
}

/// Song clock driven by the audio transport's reported position.
///
/// `sync` must be called once per tick; everything else in that tick reads
/// the synced value through `now`.
pub struct PlaybackClock {
    audio: Arc<dyn AudioTransportPort>,
    state: ClockState,
    lead_in: Seconds,
    lead_in_origin: Option<Instant>,
    countdown: Seconds,
    rate: f64,
    position: Seconds,
    anchor: Option<Instant>,
}

impl PlaybackClock {
    pub fn new(audio: Arc<dyn AudioTransportPort>, lead_in: Seconds) -> Self {
        Self {
            audio,
            state: ClockState::Stopped,
            lead_in: lead_in.max(0.0),
            lead_in_origin: None,
            countdown: 0.0,
            rate: 1.0,
            position: 0.0,
            anchor: None,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Playing or counting down.
    pub fn is_running(&self) -> bool {
        matches!(self.state, ClockState::Playing | ClockState::LeadIn)
    }

    pub fn now(&self) -> Seconds {
        self.position
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn duration(&self) -> Option<Seconds> {
        self.audio.duration_seconds()
    }

    pub fn set_lead_in(&mut self, lead_in: Seconds) {
        self.lead_in = lead_in.max(0.0);
    }

    /// Starts from the current position. From the very beginning of the song
    /// the lead-in countdown runs first.
    pub fn start(&mut self, now: Instant) -> Result<(), AudioError> {
        if self.audio.duration_seconds().is_none() {
            return Err(AudioError::NoClip);
        }
        if self.is_running() {
            return Ok(());
        }

        if self.position <= 0.0 && self.lead_in > 0.0 {
            let countdown = if self.position < 0.0 {
                -self.position
            } else {
                self.lead_in
            };
            self.begin_lead_in(now, countdown);
            return Ok(());
        }

        self.audio.set_position(self.position.max(0.0))?;
        self.audio.set_rate(self.rate)?;
        self.audio.play()?;
        self.state = ClockState::Playing;
        self.anchor = Some(now);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), AudioError> {
        match self.state {
            ClockState::Playing => {
                self.position = self.audio.current_position_seconds();
                self.audio.pause()?;
            }
            ClockState::LeadIn => {
                self.lead_in_origin = None;
            }
            ClockState::Paused | ClockState::Stopped => return Ok(()),
        }
        self.state = ClockState::Paused;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), AudioError> {
        self.audio.stop()?;
        self.state = ClockState::Stopped;
        self.position = 0.0;
        self.lead_in_origin = None;
        self.anchor = None;
        Ok(())
    }

    /// Clamps to `[0, duration]` and returns the clamped target. A running
    /// lead-in is cut short and audio starts at the target.
    pub fn seek(&mut self, seconds: Seconds) -> Result<Seconds, AudioError> {
        let duration = self.audio.duration_seconds().unwrap_or(0.0);
        let target = seconds.clamp(0.0, duration.max(0.0));

        match self.state {
            ClockState::Playing => {
                self.audio.set_position(target)?;
            }
            ClockState::LeadIn => {
                self.lead_in_origin = None;
                self.audio.set_position(target)?;
                self.audio.set_rate(self.rate)?;
                self.audio.play()?;
                self.state = ClockState::Playing;
            }
            ClockState::Paused | ClockState::Stopped => {}
        }
        self.position = target;
        Ok(target)
    }

    pub fn set_rate(&mut self, rate: f64) -> Result<(), AudioError> {
        self.rate = rate.max(MIN_RATE);
        self.audio.set_rate(self.rate)
    }

    /// Reads the authoritative position once. Returns the song time for this tick.
    pub fn sync(&mut self, now: Instant) -> Result<Seconds, AudioError> {
        match self.state {
            ClockState::LeadIn => {
                let Some(origin) = self.lead_in_origin else {
                    return Ok(self.position);
                };
                let elapsed = now.saturating_duration_since(origin).as_secs_f64();
                let countdown_left = self.countdown - elapsed;
                if countdown_left > 0.0 {
                    self.position = -countdown_left;
                } else {
                    log::info!("lead-in finished, starting audio");
                    self.lead_in_origin = None;
                    self.audio.set_position(0.0)?;
                    self.audio.set_rate(self.rate)?;
                    self.audio.play()?;
                    self.state = ClockState::Playing;
                    self.position = self.audio.current_position_seconds();
                }
            }
            ClockState::Playing => {
                self.position = self.audio.current_position_seconds();
            }
            ClockState::Paused | ClockState::Stopped => {}
        }
        self.anchor = Some(now);
        Ok(self.position)
    }

    /// Song time of an input stamped at `at`, relative to the last `sync`.
    pub fn song_time_at(&self, at: Instant) -> Seconds {
        let Some(anchor) = self.anchor else {
            return self.position;
        };
        if !self.is_running() {
            return self.position;
        }
        let rate = if self.state == ClockState::Playing {
            self.rate
        } else {
            1.0
        };
        let offset = if at >= anchor {
            at.duration_since(anchor).as_secs_f64()
        } else {
            -anchor.duration_since(at).as_secs_f64()
        };
        self.position + offset * rate
    }

    /// Whether audio has reached its end.
    pub fn at_end(&self) -> bool {
        match self.audio.duration_seconds() {
            Some(duration) => self.state == ClockState::Playing && self.position >= duration,
            None => false,
        }
    }

    fn begin_lead_in(&mut self, now: Instant, countdown: Seconds) {
        log::info!("lead-in: {:.2}s before audio", countdown);
        self.lead_in_origin = Some(now);
        self.countdown = countdown;
        self.position = -countdown;
        self.state = ClockState::LeadIn;
        self.anchor = Some(now);
    }
}
