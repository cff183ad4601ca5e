use log::LevelFilter;
use simplelog::{Config, TestLogger};
use std::sync::Once;
use crate::bus::Bus;

mod ines_loader;
mod nes_console;
mod ppu_2c02;

static START: Once = Once::new();

fn init_logger_for_test() {
    START.call_once(|| TestLogger::init(LevelFilter::Trace, Config::default()).unwrap());
}

pub fn init() {
    init_logger_for_test();
}

pub const PRG_BANK_SIZE: usize = 16 * 1024;
pub const CHR_BANK_SIZE: usize = 8 * 1024;

/// Flat 64 KiB of RAM, enough to run the CPU in isolation.
#[derive(Debug)]
pub struct FlatBus {
    pub memory: Vec<u8>,
}

impl FlatBus {
    pub fn new() -> Self {
        FlatBus { memory: vec![0; 0x10000] }
    }

    pub fn load(&mut self, addr: u16, bytes: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + bytes.len()].copy_from_slice(bytes);
    }

    pub fn set_vector(&mut self, vector: u16, target: u16) {
        self.load(vector, &target.to_le_bytes());
    }
}

impl Bus for FlatBus {
    fn read_byte(&mut self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        self.memory[addr as usize] = value;
    }

    fn peek_byte(&self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }
}

/// iNES header for the given bank counts, flags 6 and 7.
pub fn ines_header(prg_banks: u8, chr_banks: u8, flags6: u8, flags7: u8) -> Vec<u8> {
    let mut header = vec![0x4E, 0x45, 0x53, 0x1A, prg_banks, chr_banks, flags6, flags7];
    header.resize(16, 0);
    header
}

/// A 16 KiB NROM image running `program` from $C000 with the given NMI handler address.
pub fn build_nrom_image(program: &[u8], nmi_handler: u16) -> Vec<u8> {
    let mut prg = vec![0xEA; PRG_BANK_SIZE];
    prg[..program.len()].copy_from_slice(program);
    prg[0x3FFA..0x3FFC].copy_from_slice(&nmi_handler.to_le_bytes());
    prg[0x3FFC..0x3FFE].copy_from_slice(&0xC000u16.to_le_bytes());
    prg[0x3FFE..0x4000].copy_from_slice(&0xC000u16.to_le_bytes());

    let mut image = ines_header(1, 1, 0x01, 0x00);
    image.extend_from_slice(&prg);
    image.extend(vec![0; CHR_BANK_SIZE]);
    image
}

pub const DEMO_NMI_HANDLER: u16 = 0xC028;
pub const DEMO_MAIN_LOOP_COUNTER: u16 = 0x0010;
pub const DEMO_NMI_COUNTER: u16 = 0x0011;

/// Enables NMI and rendering, starts a square wave on pulse 1, then spins incrementing $10;
/// the NMI handler increments $11 once per frame.
pub fn demo_program() -> Vec<u8> {
    vec![
        0x78,                   // C000 SEI
        0xD8,                   // C001 CLD
        0xA2, 0xFF,             // C002 LDX #$FF
        0x9A,                   // C004 TXS
        0xA9, 0x80,             // C005 LDA #$80
        0x8D, 0x00, 0x20,       // C007 STA $2000
        0xA9, 0x1E,             // C00A LDA #$1E
        0x8D, 0x01, 0x20,       // C00C STA $2001
        0xA9, 0x0F,             // C00F LDA #$0F
        0x8D, 0x15, 0x40,       // C011 STA $4015
        0xA9, 0xBF,             // C014 LDA #$BF
        0x8D, 0x00, 0x40,       // C016 STA $4000
        0xA9, 0xFD,             // C019 LDA #$FD
        0x8D, 0x02, 0x40,       // C01B STA $4002
        0xA9, 0x08,             // C01E LDA #$08
        0x8D, 0x03, 0x40,       // C020 STA $4003
        0xE6, 0x10,             // C023 INC $10
        0x4C, 0x23, 0xC0,       // C025 JMP $C023
        0xE6, 0x11,             // C028 INC $11
        0x40,                   // C02A RTI
    ]
}

pub fn demo_rom() -> Vec<u8> {
    build_nrom_image(&demo_program(), DEMO_NMI_HANDLER)
}
