use std::fmt;
use std::fmt::{Display, Formatter};
use log::trace;

pub const NES_CONTROLLER_KEY_A: usize = 0x00;
pub const NES_CONTROLLER_KEY_B: usize = 0x01;
pub const NES_CONTROLLER_KEY_SELECT: usize = 0x02;
pub const NES_CONTROLLER_KEY_START: usize = 0x03;
pub const NES_CONTROLLER_KEY_UP: usize = 0x04;
pub const NES_CONTROLLER_KEY_DOWN: usize = 0x05;
pub const NES_CONTROLLER_KEY_LEFT: usize = 0x06;
pub const NES_CONTROLLER_KEY_RIGHT: usize = 0x07;
pub const NES_CONTROLLER_KEY_COUNT: usize = 8;

/// Raw state-array values; bit 0 is the button, bit 6 is the open-bus remnant seen on $4016/$4017.
pub const BUTTON_RELEASED: u8 = 0x40;
pub const BUTTON_PRESSED: u8 = 0x41;

#[derive(Debug, PartialEq)]
pub enum ControllerError {
    IncorrectInput(String),
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::IncorrectInput(message) => write!(f, "incorrect input: {}", message),
        }
    }
}

impl std::error::Error for ControllerError {}

/// Standard joypad: 8 buttons read serially, A first, after a strobe.
#[derive(Debug, Clone)]
pub struct StandardController {
    state: [u8; NES_CONTROLLER_KEY_COUNT],
    strobe: bool,
    shift_index: usize,
}

impl Default for StandardController {
    fn default() -> Self {
        StandardController::new()
    }
}

impl StandardController {
    pub fn new() -> Self {
        StandardController {
            state: [BUTTON_RELEASED; NES_CONTROLLER_KEY_COUNT],
            strobe: false,
            shift_index: 0,
        }
    }

    pub fn button_down(&mut self, key: usize) -> Result<(), ControllerError> {
        self.set_key(key, BUTTON_PRESSED)
    }

    pub fn button_up(&mut self, key: usize) -> Result<(), ControllerError> {
        self.set_key(key, BUTTON_RELEASED)
    }

    fn set_key(&mut self, key: usize, value: u8) -> Result<(), ControllerError> {
        let slot = self.state.get_mut(key)
            .ok_or_else(|| ControllerError::IncorrectInput(format!("no such key: {}", key)))?;
        *slot = value;
        trace!("controller key {} -> 0x{:02X}", key, value);

        Ok(())
    }

    pub fn state(&self) -> [u8; NES_CONTROLLER_KEY_COUNT] {
        self.state
    }

    /// $4016 write: while bit 0 is set the shift register keeps reloading from the buttons.
    pub fn write_strobe(&mut self, value: u8) {
        self.strobe = value & 0x01 != 0;
        if self.strobe {
            self.shift_index = 0;
        }
    }

    pub fn read_serial(&mut self) -> u8 {
        let value = self.peek_serial();
        if !self.strobe && self.shift_index < NES_CONTROLLER_KEY_COUNT {
            self.shift_index += 1;
        }
        value
    }

    pub fn peek_serial(&self) -> u8 {
        if self.strobe {
            self.state[NES_CONTROLLER_KEY_A]
        } else {
            self.state.get(self.shift_index).copied().unwrap_or(BUTTON_PRESSED)
        }
    }

    pub fn reset_port(&mut self) {
        self.strobe = false;
        self.shift_index = 0;
    }
}
