use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use crate::mapper::NesMapper;

pub const PRG_RAM_SIZE: usize = 8 * 1024;
pub const PRG_RAM_ADDRESS_SPACE: (u16, u16) = (0x6000, 0x7FFF);
pub const PRG_ROM_ADDRESS_SPACE: (u16, u16) = (0x8000, 0xFFFF);

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PpuNameTableMirroring {
    Vertical,
    Horizontal,
    FourScreen,
    SingleScreenLower,
    SingleScreenUpper,
}

#[derive(Debug, PartialEq)]
pub enum CartridgeError {
    Unsupported(String),
    IllegalState(String)
}

impl Display for CartridgeError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            CartridgeError::Unsupported(s) => { write!(f, "unsupported: {}", s) },
            CartridgeError::IllegalState(s) => { write!(f, "illegal state: {}", s) }
        }
    }
}

/// A cartridge board as seen from both buses: PRG on the CPU side ($4020-$FFFF), CHR on the PPU side ($0000-$1FFF).
pub trait Cartridge: Debug {
    fn cpu_read(&self, addr: u16) -> u8;
    fn cpu_write(&mut self, addr: u16, value: u8);
    fn chr_read(&self, addr: u16) -> u8;
    fn chr_write(&mut self, addr: u16, value: u8);
    fn mirroring(&self) -> PpuNameTableMirroring;
    fn mapper(&self) -> NesMapper;
    /// Back to the state right after loading: bank registers, PRG-RAM and CHR-RAM cleared.
    fn reset(&mut self);
}

/// CHR storage shared by the simple boards: either ROM from the image or 8 KiB of RAM.
#[derive(Debug)]
pub struct ChrMemory {
    data: Vec<u8>,
    writable: bool,
}

impl ChrMemory {
    pub fn rom(data: Vec<u8>) -> Self {
        ChrMemory { data, writable: false }
    }

    pub fn ram(size: usize) -> Self {
        ChrMemory { data: vec![0; size], writable: true }
    }

    pub fn is_ram(&self) -> bool {
        self.writable
    }

    pub fn clear(&mut self) {
        if self.writable {
            self.data.fill(0);
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        if self.data.is_empty() {
            return 0;
        }

        self.data[addr as usize % self.data.len()]
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        if self.writable && !self.data.is_empty() {
            let index = addr as usize % self.data.len();
            self.data[index] = value;
        }
    }
}

pub(crate) fn is_prg_ram_address(addr: u16) -> bool {
    (PRG_RAM_ADDRESS_SPACE.0..=PRG_RAM_ADDRESS_SPACE.1).contains(&addr)
}
