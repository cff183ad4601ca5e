use std::fmt::{Display, Formatter};
use log::{debug, info};
use crate::apu::{ApuType, DEFAULT_SAMPLE_RATE};
use crate::bus::Bus;
use crate::controller::{ControllerError, NES_CONTROLLER_KEY_COUNT};
use crate::cpu::{CpuError, CpuRegisters, CpuType};
use crate::cpu_6502::Cpu6502;
use crate::ines_loader::INesLoader;
use crate::loader::LoaderError;
use crate::nes_bus::NesBus;
use crate::ppu::{PpuFlags, PpuType};
use crate::ppu_2c02::{OAM_SIZE, PALETTE_SIZE};

const PPU_DOTS_PER_CPU_CYCLE: u32 = 3;

/// Called with the running frame count each time the PPU completes a frame.
pub type FrameCallback = Box<dyn FnMut(u64)>;

/// Called with every (left, right) audio sample, in emission order.
pub type AudioSampleCallback = Box<dyn FnMut(f32, f32)>;

#[derive(Debug, Clone)]
pub struct NesConsoleConfig {
    pub sample_rate: u32,
}

impl Default for NesConsoleConfig {
    fn default() -> Self {
        NesConsoleConfig { sample_rate: DEFAULT_SAMPLE_RATE }
    }
}

#[derive(Debug, PartialEq)]
pub enum NESConsoleError {
    NoCartridge,
    ProgramLoaderError(LoaderError),
    CpuError(CpuError),
    ControllerError(String),
}

impl From<CpuError> for NESConsoleError {
    fn from(error: CpuError) -> Self {
        NESConsoleError::CpuError(error)
    }
}

impl From<LoaderError> for NESConsoleError {
    fn from(error: LoaderError) -> Self {
        NESConsoleError::ProgramLoaderError(error)
    }
}

impl From<ControllerError> for NESConsoleError {
    fn from(error: ControllerError) -> Self {
        NESConsoleError::ControllerError(error.to_string())
    }
}

impl Display for NESConsoleError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            NESConsoleError::NoCartridge => { write!(f, "no cartridge inserted") },
            NESConsoleError::ProgramLoaderError(e) => { write!(f, "program loader error: {}", e) },
            NESConsoleError::CpuError(e) => { write!(f, "cpu error: {}", e) },
            NESConsoleError::ControllerError(s) => { write!(f, "controller error: {}", s) }
        }
    }
}

impl std::error::Error for NESConsoleError {}

pub struct NESConsole {
    cpu: Cpu6502,
    bus: NesBus,
    on_frame: FrameCallback,
    on_audio_sample: AudioSampleCallback,
    cartridge_loaded: bool,
}

impl NESConsole {
    pub fn new(config: NesConsoleConfig, on_frame: FrameCallback, on_audio_sample: AudioSampleCallback) -> NESConsole {
        debug!("creating cpu: {:?}", CpuType::NES6502);
        debug!("creating ppu: {}", PpuType::NES2C02);
        debug!("creating apu: {}", ApuType::RP2A03);

        NESConsole {
            cpu: Cpu6502::new(),
            bus: NesBus::new(config.sample_rate),
            on_frame,
            on_audio_sample,
            cartridge_loaded: false,
        }
    }

    /// Parse an iNES image, insert the cartridge and power the console on.
    pub fn load_rom(&mut self, data: &[u8]) -> Result<(), NESConsoleError> {
        let loader = INesLoader::from_bytes(data)?;
        info!("loading rom: {} bytes, mapper {}", data.len(), loader.header().mapper);

        let cartridge = loader.build_cartridge()?;
        self.bus.insert_cartridge(cartridge);
        self.cartridge_loaded = true;

        self.power_on()
    }

    pub fn power_on(&mut self) -> Result<(), NESConsoleError> {
        if !self.cartridge_loaded {
            Err(NESConsoleError::NoCartridge)?
        }

        self.bus.reset();
        self.cpu.power_on(&mut self.bus);
        Ok(())
    }

    /// Same as a power cycle, without touching the cartridge.
    pub fn reset(&mut self) -> Result<(), NESConsoleError> {
        debug!("console reset");
        self.power_on()
    }

    /// Run until the PPU completes the current frame; returns the PPU frame count.
    pub fn step_frame(&mut self) -> Result<u64, NESConsoleError> {
        if !self.cartridge_loaded {
            Err(NESConsoleError::NoCartridge)?
        }

        loop {
            let cycles = self.cpu.step(&mut self.bus)? + self.bus.take_dma_stall_cycles();

            for _ in 0..cycles {
                if let Some(sample) = self.bus.apu_mut().clock() {
                    (self.on_audio_sample)(sample, sample);
                }
                for _ in 0..PPU_DOTS_PER_CPU_CYCLE {
                    self.bus.ppu_mut().tick();
                }
            }

            if self.bus.ppu_mut().take_nmi() {
                self.cpu.signal_nmi();
            }
            self.cpu.set_irq_line(self.bus.apu().irq_asserted());

            if self.bus.ppu_mut().take_frame_complete() {
                let frame = self.bus.ppu().frame_count();
                (self.on_frame)(frame);
                return Ok(frame);
            }
        }
    }

    pub fn button_down(&mut self, controller: usize, key: usize) -> Result<(), NESConsoleError> {
        self.controller_mut(controller)?.button_down(key)?;
        Ok(())
    }

    pub fn button_up(&mut self, controller: usize, key: usize) -> Result<(), NESConsoleError> {
        self.controller_mut(controller)?.button_up(key)?;
        Ok(())
    }

    fn controller_mut(&mut self, controller: usize) -> Result<&mut crate::controller::StandardController, NESConsoleError> {
        self.bus.controller_mut(controller)
            .ok_or_else(|| NESConsoleError::ControllerError(format!("no controller on port {}", controller)))
    }

    pub fn controller_state(&self, controller: usize) -> Result<[u8; NES_CONTROLLER_KEY_COUNT], NESConsoleError> {
        self.bus.controller(controller)
            .map(|c| c.state())
            .ok_or_else(|| NESConsoleError::ControllerError(format!("no controller on port {}", controller)))
    }

    pub fn cpu_registers(&self) -> CpuRegisters {
        self.cpu.registers()
    }

    pub fn peek(&self, addr: u16) -> u8 {
        self.bus.peek_byte(addr)
    }

    pub fn ppu_flags(&self) -> PpuFlags {
        self.bus.ppu().flags()
    }

    pub fn oam(&self) -> [u8; OAM_SIZE] {
        *self.bus.ppu().oam()
    }

    pub fn palette_ram(&self) -> [u8; PALETTE_SIZE] {
        self.bus.ppu().palette_ram()
    }

    pub fn frame_count(&self) -> u64 {
        self.bus.ppu().frame_count()
    }

    #[cfg(test)]
    pub fn is_cartridge_loaded(&self) -> bool {
        self.cartridge_loaded
    }
}

pub struct NESConsoleBuilder {
    config: NesConsoleConfig,
    on_frame: Option<FrameCallback>,
    on_audio_sample: Option<AudioSampleCallback>,
}

impl Default for NESConsoleBuilder {
    fn default() -> Self {
        NESConsoleBuilder::new()
    }
}

impl NESConsoleBuilder {
    pub fn new() -> Self {
        NESConsoleBuilder {
            config: NesConsoleConfig::default(),
            on_frame: None,
            on_audio_sample: None,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    pub fn with_frame_callback(mut self, on_frame: FrameCallback) -> Self {
        self.on_frame = Some(on_frame);
        self
    }

    pub fn with_audio_sample_callback(mut self, on_audio_sample: AudioSampleCallback) -> Self {
        self.on_audio_sample = Some(on_audio_sample);
        self
    }

    pub fn build(self) -> NESConsole {
        let on_frame: FrameCallback = match self.on_frame {
            Some(callback) => callback,
            None => Box::new(|_: u64| {}),
        };
        let on_audio_sample: AudioSampleCallback = match self.on_audio_sample {
            Some(callback) => callback,
            None => Box::new(|_: f32, _: f32| {}),
        };

        NESConsole::new(self.config, on_frame, on_audio_sample)
    }
}
