use std::cell::RefCell;
use std::rc::Rc;
use log::{debug, trace};
use crate::cartridge::{Cartridge, PpuNameTableMirroring};
use crate::ppu::PpuFlags;

pub const OAM_SIZE: usize = 256;
pub const NT_MAP_HORIZONTAL: [usize; 4] = [0, 0, 1, 1]; // A and B same name table; C and D same name table
pub const NT_MAP_VERTICAL: [usize; 4] = [0, 1, 0, 1]; // A and C same name table; B and D same name table
const NAME_TABLE_SIZE: usize = 1024;
const CIRAM_SIZE: usize = 2 * NAME_TABLE_SIZE;
pub const PALETTE_SIZE: usize = 32;
const PALETTE_START_ADDR: u16 = 0x3F00;
const NAME_TABLE_START_ADDR: u16 = 0x2000;

const V_INCR_GOING_ACROSS: u16 = 1;
const V_INCR_GOING_DOWN: u16 = 32;

pub const DOTS_PER_SCANLINE: u16 = 341;
pub const SCANLINES_PER_FRAME: u16 = 262;
const VISIBLE_SCANLINES: u16 = 240;
const VBLANK_SCANLINE: u16 = 241;
const PRE_RENDER_SCANLINE: u16 = 261;

#[derive(Debug, Clone, Copy)]
enum ControlFlag {
    VramIncrement = 0x04,
    SpritePatternTable = 0x08,
    BackgroundPatternTable = 0x10,
    SpriteSize = 0x20,
    GenerateNmi = 0x80,
}

#[derive(Debug, Clone, Copy)]
enum MaskFlag {
    ShowBackground = 0x08,
    ShowSprites = 0x10,
}

#[derive(Debug, Clone, Copy)]
enum StatusFlag {
    SpriteOverflow = 0x20,
    Sprite0Hit = 0x40,
    VBlank = 0x80,
}

#[derive(Debug, PartialEq, Clone, Copy)]
enum LatchState {
    HIGH,
    LOW,
}

/// The shared write toggle of PPUSCROLL/PPUADDR ("w").
#[derive(Debug, PartialEq)]
struct Latch {
    state: LatchState
}

impl Latch {
    fn new() -> Self {
        Latch { state: LatchState::HIGH }
    }

    fn latch(&mut self) {
        self.state = match self.state {
            LatchState::HIGH => LatchState::LOW,
            LatchState::LOW => LatchState::HIGH,
        };
    }

    fn reset(&mut self) {
        self.state = LatchState::HIGH;
    }
}

/// Register-level 2C02: CPU-visible registers, VRAM plumbing and dot timing. No pixels are produced.
#[derive(Debug)]
pub struct Ppu2c02 {
    control: u8,
    mask: u8,
    status: u8,
    oam_addr: u8,
    oam: [u8; OAM_SIZE],
    v: u16,
    t: u16,
    fine_x: u8,
    latch: Latch,
    read_buffer: u8,
    open_bus: u8,
    ciram: [u8; CIRAM_SIZE],
    palette: [u8; PALETTE_SIZE],
    cartridge: Option<Rc<RefCell<dyn Cartridge>>>,
    scanline: u16,
    dot: u16,
    frame_count: u64,
    nmi_pending: bool,
    frame_complete: bool,
}

impl Default for Ppu2c02 {
    fn default() -> Self {
        Ppu2c02::new()
    }
}

impl Ppu2c02 {
    pub fn new() -> Self {
        Ppu2c02 {
            control: 0,
            mask: 0,
            status: 0,
            oam_addr: 0,
            oam: [0; OAM_SIZE],
            v: 0,
            t: 0,
            fine_x: 0,
            latch: Latch::new(),
            read_buffer: 0,
            open_bus: 0,
            ciram: [0; CIRAM_SIZE],
            palette: [0; PALETTE_SIZE],
            cartridge: None,
            scanline: 0,
            dot: 0,
            frame_count: 0,
            nmi_pending: false,
            frame_complete: false,
        }
    }

    pub fn insert_cartridge(&mut self, cartridge: Rc<RefCell<dyn Cartridge>>) {
        self.cartridge = Some(cartridge);
    }

    /// Power-on state; the cartridge stays attached.
    pub fn reset(&mut self) {
        let cartridge = self.cartridge.take();
        *self = Ppu2c02::new();
        self.cartridge = cartridge;
        debug!("PPU: reset");
    }

    fn is_control_set(&self, flag: ControlFlag) -> bool {
        self.control & flag as u8 != 0
    }

    fn is_mask_set(&self, flag: MaskFlag) -> bool {
        self.mask & flag as u8 != 0
    }

    fn is_status_set(&self, flag: StatusFlag) -> bool {
        self.status & flag as u8 != 0
    }

    fn set_status(&mut self, flag: StatusFlag, value: bool) {
        if value {
            self.status |= flag as u8;
        } else {
            self.status &= !(flag as u8);
        }
    }

    pub fn flags(&self) -> PpuFlags {
        PpuFlags {
            nmi_on_vblank: self.is_control_set(ControlFlag::GenerateNmi),
            sprite_size: self.is_control_set(ControlFlag::SpriteSize),
            bg_pattern_table: self.is_control_set(ControlFlag::BackgroundPatternTable),
            sprite_pattern_table: self.is_control_set(ControlFlag::SpritePatternTable),
            addr_increment: self.is_control_set(ControlFlag::VramIncrement),
            bg_visible: self.is_mask_set(MaskFlag::ShowBackground),
            sprite_visible: self.is_mask_set(MaskFlag::ShowSprites),
            vblank: self.is_status_set(StatusFlag::VBlank),
            sprite0_hit: self.is_status_set(StatusFlag::Sprite0Hit),
            sprite_overflow: self.is_status_set(StatusFlag::SpriteOverflow),
        }
    }

    pub fn oam(&self) -> &[u8; OAM_SIZE] {
        &self.oam
    }

    /// $3F00-$3F1F as the PPU bus sees it, backdrop mirrors resolved.
    pub fn palette_ram(&self) -> [u8; PALETTE_SIZE] {
        std::array::from_fn(|index| self.palette[Ppu2c02::palette_index(PALETTE_START_ADDR + index as u16)])
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    pub fn dot(&self) -> u16 {
        self.dot
    }

    #[cfg(test)]
    pub fn vram_address(&self) -> u16 {
        self.v
    }

    #[cfg(test)]
    pub fn fine_x_scroll(&self) -> u8 {
        self.fine_x
    }

    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    pub fn take_frame_complete(&mut self) -> bool {
        std::mem::take(&mut self.frame_complete)
    }

    /// Advance one dot.
    pub fn tick(&mut self) {
        self.dot += 1;
        if self.dot >= DOTS_PER_SCANLINE {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline >= SCANLINES_PER_FRAME {
                self.scanline = 0;
                self.frame_count += 1;
                self.frame_complete = true;
                trace!("PPU: frame {} complete", self.frame_count);
            }
        }

        match (self.scanline, self.dot) {
            (VBLANK_SCANLINE, 1) => {
                self.set_status(StatusFlag::VBlank, true);
                if self.is_control_set(ControlFlag::GenerateNmi) {
                    self.nmi_pending = true;
                }
            },
            (PRE_RENDER_SCANLINE, 1) => {
                self.set_status(StatusFlag::VBlank, false);
                self.set_status(StatusFlag::Sprite0Hit, false);
                self.set_status(StatusFlag::SpriteOverflow, false);
            },
            (line, dot) if line < VISIBLE_SCANLINES => self.evaluate_sprite0_hit(line, dot),
            _ => {}
        }
    }

    /// Sprite 0 hit approximated from its bounding box: set on its first row, at its left edge.
    fn evaluate_sprite0_hit(&mut self, line: u16, dot: u16) {
        if !self.is_mask_set(MaskFlag::ShowBackground) || !self.is_mask_set(MaskFlag::ShowSprites) ||
            self.is_status_set(StatusFlag::Sprite0Hit) {
            return;
        }

        let y = self.oam[0] as u16 + 1;
        let x = self.oam[3] as u16;
        if line == y && dot == x + 1 && x < 255 {
            self.set_status(StatusFlag::Sprite0Hit, true);
        }
    }

    pub fn read_register(&mut self, addr: u16) -> u8 {
        let value = match addr & 0x0007 {
            2 => {
                let value = (self.status & 0xE0) | (self.open_bus & 0x1F);
                self.set_status(StatusFlag::VBlank, false);
                self.latch.reset();
                value
            },
            4 => self.oam[self.oam_addr as usize],
            7 => self.read_data_register(),
            _ => self.open_bus,
        };

        self.open_bus = value;
        value
    }

    pub fn peek_register(&self, addr: u16) -> u8 {
        match addr & 0x0007 {
            2 => (self.status & 0xE0) | (self.open_bus & 0x1F),
            4 => self.oam[self.oam_addr as usize],
            7 => self.read_buffer,
            _ => self.open_bus,
        }
    }

    pub fn write_register(&mut self, addr: u16, value: u8) {
        self.open_bus = value;

        match addr & 0x0007 {
            0 => self.write_control_register(value),
            1 => self.mask = value,
            2 => {},
            3 => self.oam_addr = value,
            4 => self.write_oam_data(value),
            5 => self.write_scroll_register(value),
            6 => self.write_address_register(value),
            _ => {
                self.write_vram(self.v, value);
                self.increment_v();
            },
        }
    }

    /// One byte of an OAM DMA transfer.
    pub fn write_oam_data(&mut self, value: u8) {
        self.oam[self.oam_addr as usize] = value;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    fn write_control_register(&mut self, value: u8) {
        let nmi_was_enabled = self.is_control_set(ControlFlag::GenerateNmi);
        self.control = value;
        self.t = (self.t & 0xF3FF) | (((value & 0x03) as u16) << 10);

        // enabling NMI while the vblank flag is still up fires immediately
        if !nmi_was_enabled && self.is_control_set(ControlFlag::GenerateNmi) && self.is_status_set(StatusFlag::VBlank) {
            self.nmi_pending = true;
        }
    }

    fn write_scroll_register(&mut self, value: u8) {
        match self.latch.state {
            LatchState::HIGH => {
                self.t = (self.t & !0x001F) | (value >> 3) as u16;
                self.fine_x = value & 0x07;
            },
            LatchState::LOW => {
                self.t = (self.t & !0x73E0) | (((value & 0x07) as u16) << 12) | (((value & 0xF8) as u16) << 2);
            },
        }
        self.latch.latch();
    }

    fn write_address_register(&mut self, value: u8) {
        match self.latch.state {
            LatchState::HIGH => {
                self.t = (self.t & 0x00FF) | (((value & 0x3F) as u16) << 8);
            },
            LatchState::LOW => {
                self.t = (self.t & 0xFF00) | value as u16;
                self.v = self.t;
            },
        }
        self.latch.latch();
    }

    fn increment_v(&mut self) {
        let step = if self.is_control_set(ControlFlag::VramIncrement) { V_INCR_GOING_DOWN } else { V_INCR_GOING_ACROSS };
        self.v = self.v.wrapping_add(step) & 0x7FFF;
    }

    fn read_data_register(&mut self) -> u8 {
        let addr = self.v & 0x3FFF;

        // palette reads bypass the buffer, which is refilled from the name table underneath
        let value = if addr >= PALETTE_START_ADDR {
            self.read_buffer = self.read_vram(addr - 0x1000);
            self.read_vram(addr)
        } else {
            let buffered = self.read_buffer;
            self.read_buffer = self.read_vram(addr);
            buffered
        };

        self.increment_v();
        value
    }

    fn read_vram(&self, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;

        match addr {
            0x0000..=0x1FFF => self.cartridge.as_ref().map(|c| c.borrow().chr_read(addr)).unwrap_or(0),
            0x2000..=0x3EFF => self.ciram[self.name_table_index(addr)],
            _ => self.palette[Ppu2c02::palette_index(addr)],
        }
    }

    fn write_vram(&mut self, addr: u16, value: u8) {
        let addr = addr & 0x3FFF;

        match addr {
            0x0000..=0x1FFF => {
                if let Some(cartridge) = &self.cartridge {
                    cartridge.borrow_mut().chr_write(addr, value);
                }
            },
            0x2000..=0x3EFF => {
                let index = self.name_table_index(addr);
                self.ciram[index] = value;
            },
            _ => self.palette[Ppu2c02::palette_index(addr)] = value & 0x3F,
        }
    }

    fn name_table_index(&self, addr: u16) -> usize {
        let offset = ((addr - NAME_TABLE_START_ADDR) & 0x0FFF) as usize;
        let table = offset / NAME_TABLE_SIZE;
        let mirroring = self.cartridge.as_ref()
            .map(|c| c.borrow().mirroring())
            .unwrap_or(PpuNameTableMirroring::Horizontal);

        let bank = match mirroring {
            PpuNameTableMirroring::Horizontal => NT_MAP_HORIZONTAL[table],
            // only 2 KiB of CIRAM is modelled, four-screen boards fall back to vertical
            PpuNameTableMirroring::Vertical | PpuNameTableMirroring::FourScreen => NT_MAP_VERTICAL[table],
            PpuNameTableMirroring::SingleScreenLower => 0,
            PpuNameTableMirroring::SingleScreenUpper => 1,
        };

        bank * NAME_TABLE_SIZE + offset % NAME_TABLE_SIZE
    }

    fn palette_index(addr: u16) -> usize {
        let index = (addr & 0x001F) as usize;
        // $3F10/$3F14/$3F18/$3F1C mirror the background entries
        if index >= 0x10 && index % 4 == 0 {
            index - 0x10
        } else {
            index
        }
    }
}
