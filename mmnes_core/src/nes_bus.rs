use std::cell::RefCell;
use std::rc::Rc;
use log::{debug, trace};
use crate::apu_rp2a03::ApuRp2A03;
use crate::bus::Bus;
use crate::cartridge::Cartridge;
use crate::controller::StandardController;
use crate::ppu_2c02::{Ppu2c02, OAM_SIZE};

pub const WRAM_MEMORY_SIZE: usize = 2 * 1024;
const WRAM_END_ADDR: u16 = 0x1FFF;
const PPU_REGISTERS_END_ADDR: u16 = 0x3FFF;
const OAM_DMA_ADDR: u16 = 0x4014;
const APU_STATUS_ADDR: u16 = 0x4015;
const JOYPAD1_ADDR: u16 = 0x4016;
const JOYPAD2_ADDR: u16 = 0x4017;
const IO_END_ADDR: u16 = 0x401F;
const OAM_DMA_STALL_CYCLES: u32 = 513;

/// NES CPU memory map: WRAM, PPU registers, APU and joypads, then the cartridge.
#[derive(Debug)]
pub struct NesBus {
    wram: [u8; WRAM_MEMORY_SIZE],
    ppu: Ppu2c02,
    apu: ApuRp2A03,
    controllers: [StandardController; 2],
    cartridge: Option<Rc<RefCell<dyn Cartridge>>>,
    dma_stall_cycles: u32,
    open_bus: u8,
}

impl NesBus {
    pub fn new(sample_rate: u32) -> Self {
        NesBus {
            wram: [0; WRAM_MEMORY_SIZE],
            ppu: Ppu2c02::new(),
            apu: ApuRp2A03::new(sample_rate),
            controllers: [StandardController::new(), StandardController::new()],
            cartridge: None,
            dma_stall_cycles: 0,
            open_bus: 0,
        }
    }

    pub fn insert_cartridge(&mut self, cartridge: Rc<RefCell<dyn Cartridge>>) {
        debug!("bus: inserting cartridge {}", cartridge.borrow().mapper());
        self.ppu.insert_cartridge(cartridge.clone());
        self.cartridge = Some(cartridge);
    }

    /// Power-on state of every chip and of the cartridge board; held buttons survive.
    pub fn reset(&mut self) {
        self.wram = [0; WRAM_MEMORY_SIZE];
        if let Some(cartridge) = &self.cartridge {
            cartridge.borrow_mut().reset();
        }
        self.ppu.reset();
        self.apu.reset();
        for controller in self.controllers.iter_mut() {
            controller.reset_port();
        }
        self.dma_stall_cycles = 0;
        self.open_bus = 0;
    }

    pub fn ppu(&self) -> &Ppu2c02 {
        &self.ppu
    }

    pub fn ppu_mut(&mut self) -> &mut Ppu2c02 {
        &mut self.ppu
    }

    pub fn apu_mut(&mut self) -> &mut ApuRp2A03 {
        &mut self.apu
    }

    pub fn apu(&self) -> &ApuRp2A03 {
        &self.apu
    }

    pub fn controller(&self, index: usize) -> Option<&StandardController> {
        self.controllers.get(index)
    }

    pub fn controller_mut(&mut self, index: usize) -> Option<&mut StandardController> {
        self.controllers.get_mut(index)
    }

    pub fn take_dma_stall_cycles(&mut self) -> u32 {
        std::mem::take(&mut self.dma_stall_cycles)
    }

    fn oam_dma(&mut self, page: u8) {
        trace!("bus: OAM DMA from page 0x{:02X}", page);
        let base = (page as u16) << 8;
        for offset in 0..OAM_SIZE as u16 {
            let value = self.read_byte(base | offset);
            self.ppu.write_oam_data(value);
        }
        self.dma_stall_cycles += OAM_DMA_STALL_CYCLES;
    }

    fn cartridge_read(&self, addr: u16) -> u8 {
        match &self.cartridge {
            Some(cartridge) => cartridge.borrow().cpu_read(addr),
            None => self.open_bus,
        }
    }
}

impl Bus for NesBus {
    fn read_byte(&mut self, addr: u16) -> u8 {
        let value = match addr {
            0x0000..=WRAM_END_ADDR => self.wram[addr as usize % WRAM_MEMORY_SIZE],
            0x2000..=PPU_REGISTERS_END_ADDR => self.ppu.read_register(addr),
            APU_STATUS_ADDR => self.apu.read_status(),
            JOYPAD1_ADDR => self.controllers[0].read_serial(),
            JOYPAD2_ADDR => self.controllers[1].read_serial(),
            0x4000..=IO_END_ADDR => self.open_bus,
            _ => self.cartridge_read(addr),
        };

        self.open_bus = value;
        value
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        self.open_bus = value;

        match addr {
            0x0000..=WRAM_END_ADDR => self.wram[addr as usize % WRAM_MEMORY_SIZE] = value,
            0x2000..=PPU_REGISTERS_END_ADDR => self.ppu.write_register(addr, value),
            OAM_DMA_ADDR => self.oam_dma(value),
            JOYPAD1_ADDR => {
                // the strobe line is wired to both ports
                self.controllers[0].write_strobe(value);
                self.controllers[1].write_strobe(value);
            },
            0x4000..=IO_END_ADDR => self.apu.write_register(addr, value),
            _ => {
                if let Some(cartridge) = &self.cartridge {
                    cartridge.borrow_mut().cpu_write(addr, value);
                }
            },
        }
    }

    fn peek_byte(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=WRAM_END_ADDR => self.wram[addr as usize % WRAM_MEMORY_SIZE],
            0x2000..=PPU_REGISTERS_END_ADDR => self.ppu.peek_register(addr),
            APU_STATUS_ADDR => self.apu.peek_status(),
            JOYPAD1_ADDR => self.controllers[0].peek_serial(),
            JOYPAD2_ADDR => self.controllers[1].peek_serial(),
            0x4000..=IO_END_ADDR => self.open_bus,
            _ => self.cartridge_read(addr),
        }
    }
}
