use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

#[derive(Default, Debug, Clone)]
pub enum CpuType {
    #[default]
    NES6502
}

/// Snapshot of the programmer-visible 6502 registers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CpuRegisters {
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub p: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CpuError {
    InvalidOperand(String),
    Halted(u16),
}

impl Error for CpuError {}

impl Display for CpuError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            CpuError::InvalidOperand(s) => { write!(f, "missing or invalid operand: {}", s) },
            CpuError::Halted(addr) => { write!(f, "cpu halted 0x{:04X}", addr) }
        }
    }
}
