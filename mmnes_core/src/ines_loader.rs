use std::cell::RefCell;
use std::rc::Rc;
use log::{debug, info};
use crate::cartridge::{Cartridge, ChrMemory, PpuNameTableMirroring};
use crate::loader::LoaderError;
use crate::mapper::NesMapper;
use crate::nrom_cartridge::NromCartridge;
use crate::unrom_cartridge::UnromCartridge;

pub const HEADER_SIZE: usize = 16;
pub const TRAINER_SIZE: usize = 512;
pub const PRG_ROM_UNIT_SIZE: usize = 16 * 1024;
pub const CHR_ROM_UNIT_SIZE: usize = 8 * 1024;
const CHR_RAM_SIZE: usize = 8 * 1024;
const INES_PREAMBLE: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];

#[derive(Debug, Clone, PartialEq)]
pub struct INesRomHeader {
    pub prg_rom_size: usize,
    pub chr_rom_size: usize,
    pub nametables_layout: PpuNameTableMirroring,
    pub battery: bool,
    pub trainer: bool,
    pub mapper: NesMapper,
}

impl INesRomHeader {
    pub fn from_bytes(bytes: &[u8]) -> Result<INesRomHeader, LoaderError> {
        if bytes.len() < HEADER_SIZE || bytes[0..4] != INES_PREAMBLE {
            Err(LoaderError::InvalidRomFormat)?
        }

        let header = INesRomHeader {
            prg_rom_size: bytes[4] as usize * PRG_ROM_UNIT_SIZE,
            chr_rom_size: bytes[5] as usize * CHR_ROM_UNIT_SIZE,
            nametables_layout: INesRomHeader::build_nametables_layout(bytes),
            battery: bytes[6] & 0x02 != 0,
            trainer: bytes[6] & 0x04 != 0,
            mapper: INesRomHeader::build_mapper(bytes),
        };

        debug!("ines header: {:?}", header);
        Ok(header)
    }

    pub fn prg_offset(&self) -> usize {
        if self.trainer {
            HEADER_SIZE + TRAINER_SIZE
        } else {
            HEADER_SIZE
        }
    }

    pub fn chr_offset(&self) -> usize {
        self.prg_offset() + self.prg_rom_size
    }

    pub fn image_size(&self) -> usize {
        self.chr_offset() + self.chr_rom_size
    }

    fn build_nametables_layout(bytes: &[u8]) -> PpuNameTableMirroring {
        if bytes[6] & 0x08 != 0 {
            PpuNameTableMirroring::FourScreen
        } else if bytes[6] & 0x01 == 0 {
            PpuNameTableMirroring::Horizontal
        } else {
            PpuNameTableMirroring::Vertical
        }
    }

    fn build_mapper(bytes: &[u8]) -> NesMapper {
        let lower = (bytes[6] >> 4) as u16;
        // bytes 8-15 are only meaningful to iNES 2.0; old dumps often carry garbage in bytes 12-15
        let upper = if bytes[7] & 0x0C == 0x08 || bytes[12..16].iter().all(|b| *b == 0) {
            (bytes[7] & 0xF0) as u16
        } else {
            0
        };

        NesMapper::from_id(upper | lower)
    }
}

/// Builds a cartridge from an in-memory iNES image.
#[derive(Debug)]
pub struct INesLoader<'a> {
    header: INesRomHeader,
    data: &'a [u8],
}

impl<'a> INesLoader<'a> {
    pub fn from_bytes(data: &'a [u8]) -> Result<INesLoader<'a>, LoaderError> {
        let header = INesRomHeader::from_bytes(data)?;

        if data.len() < header.image_size() {
            Err(LoaderError::Truncated { expected: header.image_size(), actual: data.len() })?
        }

        Ok(INesLoader { header, data })
    }

    pub fn header(&self) -> &INesRomHeader {
        &self.header
    }

    pub fn build_cartridge(self) -> Result<Rc<RefCell<dyn Cartridge>>, LoaderError> {
        info!("building cartridge: {}", self.header.mapper);

        let prg_rom = self.data[self.header.prg_offset()..self.header.chr_offset()].to_vec();
        let chr = if self.header.chr_rom_size == 0 {
            ChrMemory::ram(CHR_RAM_SIZE)
        } else {
            ChrMemory::rom(self.data[self.header.chr_offset()..self.header.image_size()].to_vec())
        };
        let mirroring = self.header.nametables_layout;

        let cartridge: Rc<RefCell<dyn Cartridge>> = match self.header.mapper {
            NesMapper::NROM => Rc::new(RefCell::new(NromCartridge::new(prg_rom, chr, mirroring)?)),
            NesMapper::UxROM => Rc::new(RefCell::new(UnromCartridge::new(prg_rom, chr, mirroring)?)),
            other => Err(LoaderError::UnsupportedMapper(other.to_string()))?
        };

        Ok(cartridge)
    }
}
