use std::fmt;
use std::fmt::{Display, Formatter};

#[derive(Default, Debug, Clone)]
pub enum PpuType {
    #[default]
    NES2C02
}

impl Display for PpuType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PpuType::NES2C02 => write!(f, "ppu type: NES2C02")
        }
    }
}

/// Decoded view of PPUCTRL, PPUMASK and PPUSTATUS.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PpuFlags {
    pub nmi_on_vblank: bool,
    pub sprite_size: bool,
    pub bg_pattern_table: bool,
    pub sprite_pattern_table: bool,
    pub addr_increment: bool,
    pub bg_visible: bool,
    pub sprite_visible: bool,
    pub vblank: bool,
    pub sprite0_hit: bool,
    pub sprite_overflow: bool,
}
