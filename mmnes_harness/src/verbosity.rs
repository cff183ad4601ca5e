use std::fmt;
use std::fmt::{Display, Formatter};
use log::LevelFilter;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    #[default]
    Off,
    Info,
    Debug,
}

impl Verbosity {
    pub fn from_level(level: u64) -> Option<Verbosity> {
        match level {
            0 => Some(Verbosity::Off),
            1 => Some(Verbosity::Info),
            2 => Some(Verbosity::Debug),
            _ => None,
        }
    }

    pub fn level(&self) -> u8 {
        *self as u8
    }

    pub fn level_filter(&self) -> LevelFilter {
        match self {
            Verbosity::Off => LevelFilter::Off,
            Verbosity::Info => LevelFilter::Info,
            Verbosity::Debug => LevelFilter::Debug,
        }
    }

    /// Make this the process-wide ceiling for the `log` macros.
    pub fn apply(&self) {
        log::set_max_level(self.level_filter());
    }
}

impl Display for Verbosity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Verbosity::Off => write!(f, "verbosity: off"),
            Verbosity::Info => write!(f, "verbosity: info"),
            Verbosity::Debug => write!(f, "verbosity: debug"),
        }
    }
}
