use std::fmt;
use std::fmt::{Display, Formatter};
#[cfg(test)]
use mockall::automock;

/// Called with the core's own frame count each time a frame completes.
pub type FrameCallback = Box<dyn FnMut(u64)>;

/// Called with every (left, right) sample the core emits.
pub type AudioSampleCallback = Box<dyn FnMut(f32, f32)>;

pub struct CoreCallbacks {
    pub on_frame: FrameCallback,
    pub on_audio_sample: AudioSampleCallback,
}

/// Builds a fresh core wired to the given callbacks; invoked once per `loadRom`.
pub type CoreFactory = Box<dyn Fn(CoreCallbacks) -> Box<dyn EmulationCore>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Button::A, Button::B, Button::Select, Button::Start,
        Button::Up, Button::Down, Button::Left, Button::Right,
    ];

    pub fn from_name(name: &str) -> Option<Button> {
        Button::ALL.iter().copied().find(|button| button.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Button::A => "A",
            Button::B => "B",
            Button::Select => "SELECT",
            Button::Start => "START",
            Button::Up => "UP",
            Button::Down => "DOWN",
            Button::Left => "LEFT",
            Button::Right => "RIGHT",
        }
    }

    /// Position in the controller state array.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl Display for Button {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CpuState {
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub status: u8,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PpuState {
    pub nmi_on_vblank: bool,
    pub sprite_size: bool,
    pub bg_pattern_table: bool,
    pub sprite_pattern_table: bool,
    pub bg_visible: bool,
    pub sprite_visible: bool,
    pub vblank: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    RomRejected(String),
    Fault(String),
    InvalidInput(String),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::RomRejected(s) => write!(f, "{}", s),
            CoreError::Fault(s) => write!(f, "{}", s),
            CoreError::InvalidInput(s) => write!(f, "invalid input: {}", s),
        }
    }
}

impl std::error::Error for CoreError {}

/// What the harness needs from an emulator. Controllers are numbered 1 and 2.
#[cfg_attr(test, automock)]
pub trait EmulationCore {
    fn load_rom(&mut self, data: &[u8]) -> Result<(), CoreError>;
    fn step_frame(&mut self) -> Result<(), CoreError>;
    fn button_down(&mut self, controller: u8, button: Button) -> Result<(), CoreError>;
    fn button_up(&mut self, controller: u8, button: Button) -> Result<(), CoreError>;
    fn reset(&mut self) -> Result<(), CoreError>;

    fn cpu_state(&self) -> CpuState;
    /// Side-effect free read of the CPU address space.
    fn read_memory(&self, addr: u16) -> u8;
    fn ppu_state(&self) -> PpuState;
    fn sprite_memory(&self) -> Vec<u8>;
    /// The 32 palette entries at PPU $3F00-$3F1F, read without touching PPUADDR or the read buffer.
    fn palette_memory(&self) -> Vec<u8>;
    fn controller_state(&self, controller: u8) -> Vec<u8>;
}
