use std::fmt;
use std::fmt::{Display, Formatter};

pub const CPU_CLOCK_HZ: u32 = 1_789_773;
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

#[derive(Default, Debug, Clone)]
pub enum ApuType {
    #[default]
    RP2A03
}

impl Display for ApuType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ApuType::RP2A03 => write!(f, "apu type: RP2A03")
        }
    }
}
