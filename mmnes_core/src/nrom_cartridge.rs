use log::debug;
use crate::cartridge::{is_prg_ram_address, Cartridge, CartridgeError, ChrMemory, PpuNameTableMirroring, PRG_RAM_ADDRESS_SPACE, PRG_RAM_SIZE, PRG_ROM_ADDRESS_SPACE};
use crate::mapper::NesMapper;

const NROM_PRG_BANK_SIZE: usize = 16 * 1024;
const NROM_MAX_PRG_SIZE: usize = 32 * 1024;

/// Mapper 0: 16 or 32 KiB of PRG-ROM (16 KiB images are mirrored), 8 KiB CHR-ROM or CHR-RAM.
#[derive(Debug)]
pub struct NromCartridge {
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
    chr: ChrMemory,
    mirroring: PpuNameTableMirroring,
}

impl NromCartridge {
    pub fn new(prg_rom: Vec<u8>, chr: ChrMemory, mirroring: PpuNameTableMirroring) -> Result<NromCartridge, CartridgeError> {
        if prg_rom.is_empty() || prg_rom.len() > NROM_MAX_PRG_SIZE || prg_rom.len() % NROM_PRG_BANK_SIZE != 0 {
            Err(CartridgeError::Unsupported(format!("NROM cartridge cannot hold {} bytes of PRG-ROM", prg_rom.len())))?
        }

        debug!("NROM: prg rom size: {}, chr ram: {}, mirroring: {:?}", prg_rom.len(), chr.is_ram(), mirroring);

        Ok(NromCartridge {
            prg_rom,
            prg_ram: vec![0; PRG_RAM_SIZE],
            chr,
            mirroring,
        })
    }
}

impl Cartridge for NromCartridge {
    fn cpu_read(&self, addr: u16) -> u8 {
        if is_prg_ram_address(addr) {
            self.prg_ram[(addr - PRG_RAM_ADDRESS_SPACE.0) as usize]
        } else if addr >= PRG_ROM_ADDRESS_SPACE.0 {
            self.prg_rom[(addr - PRG_ROM_ADDRESS_SPACE.0) as usize % self.prg_rom.len()]
        } else {
            0
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        if is_prg_ram_address(addr) {
            self.prg_ram[(addr - PRG_RAM_ADDRESS_SPACE.0) as usize] = value;
        }
    }

    fn chr_read(&self, addr: u16) -> u8 {
        self.chr.read(addr)
    }

    fn chr_write(&mut self, addr: u16, value: u8) {
        self.chr.write(addr, value)
    }

    fn mirroring(&self) -> PpuNameTableMirroring {
        self.mirroring
    }

    fn mapper(&self) -> NesMapper {
        NesMapper::NROM
    }

    fn reset(&mut self) {
        self.prg_ram.fill(0);
        self.chr.clear();
    }
}
