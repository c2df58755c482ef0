use lanebeat_ports::input::{
    InputDevice, InputError, InputPort, InputStream, PlayerAction, PlayerActionCallback,
};
use lanebeat_ports::types::{ButtonRow, Lane, LaneClass, Shape, StickDirection};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

pub const DEFAULT_STICK_DEADZONE: f64 = 0.5;
pub const DEFAULT_TRIGGER_THRESHOLD: f64 = 0.5;

const BUTTON_LANES: usize = 3;
const FIRST_BUTTON_LANE: usize = 3;

/// Quantizes the analog stick to (-1|0|1, -1|0|1) and reports an action
/// whenever that pair changes to something other than neutral.
#[derive(Clone, Copy, Debug)]
pub struct StickQuantizer {
    deadzone: f64,
    previous: (i8, i8),
}

impl StickQuantizer {
    pub fn new(deadzone: f64) -> Self {
        Self {
            deadzone: deadzone.abs(),
            previous: (0, 0),
        }
    }

    pub fn quantize(&self, x: f64, y: f64) -> (i8, i8) {
        (self.axis(x), self.axis(y))
    }

    /// Feeds one raw sample. Returns the lane action fired by a direction change.
    pub fn update(&mut self, x: f64, y: f64) -> Option<(Lane, Shape)> {
        let current = self.quantize(x, y);
        let changed = current != self.previous;
        self.previous = current;
        if !changed || current == (0, 0) {
            return None;
        }
        stick_action(current.0, current.1)
    }

    /// Whether the raw sample still points into `lane` with `direction`.
    /// `UpDown` accepts either vertical direction.
    pub fn is_held(&self, x: f64, y: f64, lane: Lane, direction: StickDirection) -> bool {
        let (horizontal, vertical) = self.quantize(x, y);
        let required = match lane.index() {
            0 => -1,
            2 => 1,
            _ => 0,
        };
        if lane.class() != LaneClass::Stick || horizontal != required {
            return false;
        }
        match direction {
            StickDirection::Up => vertical == 1,
            StickDirection::Down => vertical == -1,
            StickDirection::Horizontal => vertical == 0,
            StickDirection::UpDown => vertical != 0,
        }
    }

    fn axis(&self, value: f64) -> i8 {
        if value < -self.deadzone {
            -1
        } else if value > self.deadzone {
            1
        } else {
            0
        }
    }
}

impl Default for StickQuantizer {
    fn default() -> Self {
        Self::new(DEFAULT_STICK_DEADZONE)
    }
}

fn stick_action(horizontal: i8, vertical: i8) -> Option<(Lane, Shape)> {
    let direction = match vertical {
        1 => StickDirection::Up,
        -1 => StickDirection::Down,
        _ => StickDirection::Horizontal,
    };
    let lane = match horizontal {
        -1 => 0,
        1 => 2,
        // Straight up or down only; neutral never reaches here.
        _ if vertical != 0 => 1,
        _ => return None,
    };
    Some((Lane::clamped(lane), Shape::Stick(direction)))
}

/// Edge detection for one button lane's top and bottom inputs.
#[derive(Clone, Copy, Debug, Default)]
pub struct ButtonLaneState {
    top: bool,
    bottom: bool,
}

impl ButtonLaneState {
    /// Feeds the current held flags and returns the row pressed on this edge.
    /// A press that completes "both held" reports `Both`.
    pub fn update(&mut self, top: bool, bottom: bool) -> Option<ButtonRow> {
        let top_pressed = top && !self.top;
        let bottom_pressed = bottom && !self.bottom;
        self.top = top;
        self.bottom = bottom;

        let both_held = top && bottom;
        if both_held && (top_pressed || bottom_pressed) {
            Some(ButtonRow::Both)
        } else if top_pressed {
            Some(ButtonRow::Top)
        } else if bottom_pressed {
            Some(ButtonRow::Bottom)
        } else {
            None
        }
    }

    pub fn is_held(&self, row: ButtonRow) -> bool {
        match row {
            ButtonRow::Top => self.top,
            ButtonRow::Bottom => self.bottom,
            ButtonRow::Both => self.top && self.bottom,
        }
    }
}

/// Scripted controller: raw stick and button samples go through the same
/// quantization a real pad would, and every action is stamped with the
/// `Instant` the caller supplies.
#[derive(Clone)]
pub struct SimulatedGamepad {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    stick: StickQuantizer,
    raw_stick: (f64, f64),
    lanes: [ButtonLaneState; BUTTON_LANES],
    trigger_threshold: f64,
    callback: Option<PlayerActionCallback>,
}

struct GamepadStream {
    inner: Arc<Mutex<Inner>>,
}

impl InputStream for GamepadStream {
    fn close(self: Box<Self>) {
        self.inner.lock().callback = None;
    }
}

impl SimulatedGamepad {
    pub const DEVICE_ID: &'static str = "sim-gamepad";

    pub fn new() -> Self {
        Self::with_calibration(DEFAULT_STICK_DEADZONE, DEFAULT_TRIGGER_THRESHOLD)
    }

    pub fn with_calibration(deadzone: f64, trigger_threshold: f64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                stick: StickQuantizer::new(deadzone),
                raw_stick: (0.0, 0.0),
                lanes: [ButtonLaneState::default(); BUTTON_LANES],
                trigger_threshold,
                callback: None,
            })),
        }
    }

    pub fn is_open(&self) -> bool {
        self.inner.lock().callback.is_some()
    }

    pub fn set_stick(&self, x: f64, y: f64, at: Instant) {
        let fired = {
            let mut inner = self.inner.lock();
            inner.raw_stick = (x, y);
            inner.stick.update(x, y)
        };
        if let Some((lane, shape)) = fired {
            self.emit(PlayerAction { at, lane, shape });
        }
    }

    /// Digital buttons for a button lane. Stick lanes are ignored.
    pub fn set_buttons(&self, lane: Lane, top: bool, bottom: bool, at: Instant) {
        let Some(index) = button_index(lane) else {
            log::warn!("lane {lane} has no buttons");
            return;
        };
        let fired = self.inner.lock().lanes[index].update(top, bottom);
        if let Some(row) = fired {
            self.emit(PlayerAction {
                at,
                lane,
                shape: Shape::Button(row),
            });
        }
    }

    /// Analog trigger bound to one row of a button lane.
    pub fn set_trigger(&self, lane: Lane, row: ButtonRow, value: f64, at: Instant) {
        let Some(index) = button_index(lane) else {
            return;
        };
        let (top, bottom) = {
            let inner = self.inner.lock();
            let pressed = value > inner.trigger_threshold;
            let state = inner.lanes[index];
            match row {
                ButtonRow::Top => (pressed, state.is_held(ButtonRow::Bottom)),
                ButtonRow::Bottom => (state.is_held(ButtonRow::Top), pressed),
                ButtonRow::Both => (pressed, pressed),
            }
        };
        self.set_buttons(lane, top, bottom, at);
    }

    /// Puts the controller into the position that produces `shape` in `lane`,
    /// passing through neutral first so a repeated press fires again.
    pub fn press(&self, lane: Lane, shape: Shape, at: Instant) {
        match shape {
            Shape::Stick(direction) => {
                let (x, y) = stick_vector(lane, direction);
                self.set_stick(0.0, 0.0, at);
                self.set_stick(x, y, at);
            }
            Shape::Button(row) => {
                self.set_buttons(lane, false, false, at);
                let (top, bottom) = match row {
                    ButtonRow::Top => (true, false),
                    ButtonRow::Bottom => (false, true),
                    ButtonRow::Both => (true, true),
                };
                self.set_buttons(lane, top, bottom, at);
            }
        }
    }

    pub fn release(&self, lane: Lane, at: Instant) {
        match lane.class() {
            LaneClass::Stick => self.set_stick(0.0, 0.0, at),
            LaneClass::Button => self.set_buttons(lane, false, false, at),
        }
    }

    fn emit(&self, action: PlayerAction) {
        let callback = self.inner.lock().callback.clone();
        match callback {
            Some(cb) => cb(action),
            None => log::debug!("gamepad closed, dropping {} {}", action.lane, action.shape),
        }
    }
}

impl Default for SimulatedGamepad {
    fn default() -> Self {
        Self::new()
    }
}

impl InputPort for SimulatedGamepad {
    fn list_devices(&self) -> Result<Vec<InputDevice>, InputError> {
        Ok(vec![InputDevice {
            id: Self::DEVICE_ID.to_string(),
            name: "Simulated gamepad".to_string(),
            is_available: true,
        }])
    }

    fn open(&self, cb: PlayerActionCallback) -> Result<Box<dyn InputStream>, InputError> {
        self.inner.lock().callback = Some(cb);
        Ok(Box::new(GamepadStream {
            inner: self.inner.clone(),
        }))
    }

    fn is_shape_still_actuated(&self, lane: Lane, shape: Shape) -> bool {
        let inner = self.inner.lock();
        match shape {
            Shape::Stick(direction) => {
                let (x, y) = inner.raw_stick;
                inner.stick.is_held(x, y, lane, direction)
            }
            Shape::Button(row) => {
                button_index(lane).is_some_and(|index| inner.lanes[index].is_held(row))
            }
        }
    }
}

fn button_index(lane: Lane) -> Option<usize> {
    (lane.class() == LaneClass::Button).then(|| lane.index() - FIRST_BUTTON_LANE)
}

fn stick_vector(lane: Lane, direction: StickDirection) -> (f64, f64) {
    let x = match lane.index() {
        0 => -1.0,
        2 => 1.0,
        _ => 0.0,
    };
    let y = match direction {
        StickDirection::Up | StickDirection::UpDown => 1.0,
        StickDirection::Down => -1.0,
        StickDirection::Horizontal => 0.0,
    };
    (x, y)
}
