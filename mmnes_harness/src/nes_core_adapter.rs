use log::{debug, trace};
use mmnes_core::nes_console::{NESConsole, NESConsoleBuilder, NESConsoleError};
use crate::audio_capture::SAMPLE_RATE;
use crate::emulation_core::{Button, CoreCallbacks, CoreError, CoreFactory, CpuState, EmulationCore, PpuState};

impl From<NESConsoleError> for CoreError {
    fn from(error: NESConsoleError) -> Self {
        match error {
            NESConsoleError::ProgramLoaderError(e) => CoreError::RomRejected(e.to_string()),
            NESConsoleError::ControllerError(s) => CoreError::InvalidInput(s),
            other => CoreError::Fault(other.to_string()),
        }
    }
}

/// `EmulationCore` backed by the bundled `mmnes_core` console.
pub struct NesCoreAdapter {
    console: NESConsole,
}

impl NesCoreAdapter {
    pub fn new(callbacks: CoreCallbacks) -> NesCoreAdapter {
        let console = NESConsoleBuilder::new()
            .with_sample_rate(SAMPLE_RATE)
            .with_frame_callback(callbacks.on_frame)
            .with_audio_sample_callback(callbacks.on_audio_sample)
            .build();

        NesCoreAdapter { console }
    }

    fn port(controller: u8) -> Result<usize, CoreError> {
        match controller {
            1 | 2 => Ok(controller as usize - 1),
            other => Err(CoreError::InvalidInput(format!("no controller {}", other))),
        }
    }
}

pub fn nes_core_factory() -> CoreFactory {
    Box::new(|callbacks: CoreCallbacks| -> Box<dyn EmulationCore> {
        Box::new(NesCoreAdapter::new(callbacks))
    })
}

impl EmulationCore for NesCoreAdapter {
    fn load_rom(&mut self, data: &[u8]) -> Result<(), CoreError> {
        debug!("adapter: loading {} bytes", data.len());
        Ok(self.console.load_rom(data)?)
    }

    fn step_frame(&mut self) -> Result<(), CoreError> {
        let frame = self.console.step_frame()?;
        trace!("adapter: core frame {}", frame);
        Ok(())
    }

    fn button_down(&mut self, controller: u8, button: Button) -> Result<(), CoreError> {
        Ok(self.console.button_down(NesCoreAdapter::port(controller)?, button.index())?)
    }

    fn button_up(&mut self, controller: u8, button: Button) -> Result<(), CoreError> {
        Ok(self.console.button_up(NesCoreAdapter::port(controller)?, button.index())?)
    }

    fn reset(&mut self) -> Result<(), CoreError> {
        Ok(self.console.reset()?)
    }

    fn cpu_state(&self) -> CpuState {
        let registers = self.console.cpu_registers();

        CpuState {
            pc: registers.pc,
            a: registers.a,
            x: registers.x,
            y: registers.y,
            sp: registers.sp,
            status: registers.p,
        }
    }

    fn read_memory(&self, addr: u16) -> u8 {
        self.console.peek(addr)
    }

    fn ppu_state(&self) -> PpuState {
        let flags = self.console.ppu_flags();

        PpuState {
            nmi_on_vblank: flags.nmi_on_vblank,
            sprite_size: flags.sprite_size,
            bg_pattern_table: flags.bg_pattern_table,
            sprite_pattern_table: flags.sprite_pattern_table,
            bg_visible: flags.bg_visible,
            sprite_visible: flags.sprite_visible,
            vblank: flags.vblank,
        }
    }

    fn sprite_memory(&self) -> Vec<u8> {
        self.console.oam().to_vec()
    }

    fn palette_memory(&self) -> Vec<u8> {
        self.console.palette_ram().to_vec()
    }

    fn controller_state(&self, controller: u8) -> Vec<u8> {
        NesCoreAdapter::port(controller)
            .ok()
            .and_then(|port| self.console.controller_state(port).ok())
            .map(|state| state.to_vec())
            .unwrap_or_default()
    }
}
