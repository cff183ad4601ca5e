use std::fmt::Debug;

/// The 16-bit address space seen by the CPU.
pub trait Bus: Debug {
    /// Read a byte, triggering any register side effects (PPU status latch, controller shift...).
    fn read_byte(&mut self, addr: u16) -> u8;

    fn write_byte(&mut self, addr: u16, value: u8);

    /// Read a byte without disturbing any device state.
    fn peek_byte(&self, addr: u16) -> u8;

    fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read_byte(addr) as u16;
        let hi = self.read_byte(addr.wrapping_add(1)) as u16;

        (hi << 8) | lo
    }
}
