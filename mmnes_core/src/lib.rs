pub mod apu;
pub mod apu_rp2a03;
pub mod bus;
pub mod cartridge;
pub mod controller;
pub mod cpu;
pub mod cpu_6502;
pub mod ines_loader;
pub mod loader;
pub mod mapper;
pub mod nes_bus;
pub mod nes_console;
pub mod nrom_cartridge;
pub mod ppu;
pub mod ppu_2c02;
pub mod unrom_cartridge;

#[cfg(test)]
pub mod tests;
