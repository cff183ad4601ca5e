use log::{debug, trace};
use crate::cartridge::{is_prg_ram_address, Cartridge, CartridgeError, ChrMemory, PpuNameTableMirroring, PRG_RAM_ADDRESS_SPACE, PRG_RAM_SIZE, PRG_ROM_ADDRESS_SPACE};
use crate::mapper::NesMapper;

const UNROM_PRG_BANK_SIZE: usize = 16 * 1024;
const UNROM_FIXED_BANK_START: u16 = 0xC000;

/// Mapper 2: switchable 16 KiB bank at $8000, last bank fixed at $C000.
#[derive(Debug)]
pub struct UnromCartridge {
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
    chr: ChrMemory,
    mirroring: PpuNameTableMirroring,
    bank_count: usize,
    selected_bank: usize,
}

impl UnromCartridge {
    pub fn new(prg_rom: Vec<u8>, chr: ChrMemory, mirroring: PpuNameTableMirroring) -> Result<UnromCartridge, CartridgeError> {
        if prg_rom.is_empty() || prg_rom.len() % UNROM_PRG_BANK_SIZE != 0 {
            Err(CartridgeError::Unsupported(format!("UxROM PRG-ROM size must be a multiple of 16 KiB, got {} bytes", prg_rom.len())))?
        }

        let bank_count = prg_rom.len() / UNROM_PRG_BANK_SIZE;
        debug!("UNROM: prg rom size: {}, number of banks: {}, chr ram: {}", prg_rom.len(), bank_count, chr.is_ram());

        Ok(UnromCartridge {
            prg_rom,
            prg_ram: vec![0; PRG_RAM_SIZE],
            chr,
            mirroring,
            bank_count,
            selected_bank: 0,
        })
    }

    pub fn selected_bank(&self) -> usize {
        self.selected_bank
    }
}

impl Cartridge for UnromCartridge {
    fn cpu_read(&self, addr: u16) -> u8 {
        if is_prg_ram_address(addr) {
            return self.prg_ram[(addr - PRG_RAM_ADDRESS_SPACE.0) as usize];
        }

        if addr < PRG_ROM_ADDRESS_SPACE.0 {
            return 0;
        }

        let bank = if addr >= UNROM_FIXED_BANK_START { self.bank_count - 1 } else { self.selected_bank };
        let offset = (addr as usize - PRG_ROM_ADDRESS_SPACE.0 as usize) % UNROM_PRG_BANK_SIZE;

        self.prg_rom[bank * UNROM_PRG_BANK_SIZE + offset]
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        if is_prg_ram_address(addr) {
            self.prg_ram[(addr - PRG_RAM_ADDRESS_SPACE.0) as usize] = value;
        } else if addr >= PRG_ROM_ADDRESS_SPACE.0 {
            self.selected_bank = (value & 0x0F) as usize % self.bank_count;
            trace!("UNROM: switching to bank {}", self.selected_bank);
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
        NesMapper::UxROM
    }

    fn reset(&mut self) {
        self.selected_bank = 0;
        self.prg_ram.fill(0);
        self.chr.clear();
    }
}
