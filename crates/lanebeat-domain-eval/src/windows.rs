use lanebeat_ports::storage::{HoldThresholdsDto, SettingsDto, TimingWindowsDto};
use lanebeat_ports::types::{LaneClass, Seconds, Tier};

/// Tier windows as absolute distances (seconds) from a note's timestamp.
/// Expected to be ascending: `perfect <= great <= good <= miss`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingWindows {
    pub perfect: Seconds,
    pub great: Seconds,
    pub good: Seconds,
    pub miss: Seconds,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneWindows {
    pub stick: TimingWindows,
    pub button: TimingWindows,
}

/// Minimum held ratio for each tier when a hold is released early.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoldThresholds {
    pub perfect: f64,
    pub great: f64,
    pub good: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JudgeConfig {
    pub windows: LaneWindows,
    pub hold: HoldThresholds,
}

impl TimingWindows {
    /// `None` once `|delta|` is outside the miss window. The widest band yields
    /// `Tier::Ok`, never `Tier::Miss`.
    pub fn classify(&self, delta: Seconds) -> Option<Tier> {
        let distance = delta.abs();
        if distance <= self.perfect {
            Some(Tier::Perfect)
        } else if distance <= self.great {
            Some(Tier::Great)
        } else if distance <= self.good {
            Some(Tier::Good)
        } else if distance <= self.miss {
            Some(Tier::Ok)
        } else {
            None
        }
    }
}

impl From<TimingWindowsDto> for TimingWindows {
    fn from(dto: TimingWindowsDto) -> Self {
        Self {
            perfect: dto.perfect,
            great: dto.great,
            good: dto.good,
            miss: dto.miss,
        }
    }
}

impl LaneWindows {
    pub fn for_class(&self, class: LaneClass) -> &TimingWindows {
        match class {
            LaneClass::Stick => &self.stick,
            LaneClass::Button => &self.button,
        }
    }

    pub fn max_miss(&self, class: LaneClass) -> Seconds {
        self.for_class(class).miss
    }

    /// Widest miss window over both lane classes.
    pub fn widest_miss(&self) -> Seconds {
        self.stick.miss.max(self.button.miss)
    }
}

impl Default for LaneWindows {
    fn default() -> Self {
        Self {
            stick: TimingWindowsDto::stick_defaults().into(),
            button: TimingWindowsDto::button_defaults().into(),
        }
    }
}

impl HoldThresholds {
    pub fn grade(&self, held_ratio: f64) -> Tier {
        if held_ratio >= self.perfect {
            Tier::Perfect
        } else if held_ratio >= self.great {
            Tier::Great
        } else if held_ratio >= self.good {
            Tier::Good
        } else {
            Tier::Miss
        }
    }
}

impl From<HoldThresholdsDto> for HoldThresholds {
    fn from(dto: HoldThresholdsDto) -> Self {
        Self {
            perfect: dto.perfect,
            great: dto.great,
            good: dto.good,
        }
    }
}

impl Default for HoldThresholds {
    fn default() -> Self {
        HoldThresholdsDto::default().into()
    }
}

impl From<&SettingsDto> for JudgeConfig {
    fn from(settings: &SettingsDto) -> Self {
        Self {
            windows: LaneWindows {
                stick: settings.stick_windows.into(),
                button: settings.button_windows.into(),
            },
            hold: settings.hold_thresholds.into(),
        }
    }
}
