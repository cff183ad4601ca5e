use std::fmt;
use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum NesMapper {
    NROM,          // 0
    MMC1,          // 1
    UxROM,         // 2
    CNROM,         // 3
    MMC3,          // 4
    AxROM,         // 7
    Unknown(u16),
}

impl NesMapper {
    pub const fn from_id(id: u16) -> Self {
        match id {
            0 => NesMapper::NROM,
            1 => NesMapper::MMC1,
            2 => NesMapper::UxROM,
            3 => NesMapper::CNROM,
            4 => NesMapper::MMC3,
            7 => NesMapper::AxROM,
            other => NesMapper::Unknown(other),
        }
    }

    pub const fn id(self) -> u16 {
        match self {
            NesMapper::NROM => 0,
            NesMapper::MMC1 => 1,
            NesMapper::UxROM => 2,
            NesMapper::CNROM => 3,
            NesMapper::MMC3 => 4,
            NesMapper::AxROM => 7,
            NesMapper::Unknown(id) => id,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            NesMapper::NROM => "NROM",
            NesMapper::MMC1 => "MMC1",
            NesMapper::UxROM => "UxROM",
            NesMapper::CNROM => "CNROM",
            NesMapper::MMC3 => "MMC3",
            NesMapper::AxROM => "AxROM",
            NesMapper::Unknown(_) => "Unknown",
        }
    }
}

impl Display for NesMapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} (mapper {})", self.name(), self.id())
    }
}
