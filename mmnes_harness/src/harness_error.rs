use std::fmt;
use std::fmt::{Display, Formatter};
use crate::emulation_core::CoreError;

/// Everything a single command can fail with. The `Display` text is the wire message.
#[derive(Debug, Clone, PartialEq)]
pub enum HarnessError {
    ProtocolError(String),
    UnknownCommand(String),
    PreconditionError,
    NoAudioCaptured,
    ResourceNotFound(String),
    InvalidArgument(String),
    RomLoadError(String),
    EmulationError(String),
}

impl HarnessError {
    pub fn invalid_json(detail: impl Display) -> HarnessError {
        HarnessError::ProtocolError(format!("Invalid JSON: {}", detail))
    }

    pub fn invalid_command(detail: impl Display) -> HarnessError {
        HarnessError::ProtocolError(format!("Invalid command: {}", detail))
    }

    pub fn not_a_count(name: &str) -> HarnessError {
        HarnessError::InvalidArgument(format!("Invalid argument: {} must be a non-negative integer", name))
    }
}

impl From<CoreError> for HarnessError {
    fn from(error: CoreError) -> Self {
        HarnessError::EmulationError(error.to_string())
    }
}

impl Display for HarnessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::ProtocolError(s) => write!(f, "{}", s),
            HarnessError::UnknownCommand(name) => write!(f, "Unknown command: {}", name),
            HarnessError::PreconditionError => write!(f, "No ROM loaded"),
            HarnessError::NoAudioCaptured => write!(f, "No audio captured"),
            HarnessError::ResourceNotFound(path) => write!(f, "ROM not found: {}", path),
            HarnessError::InvalidArgument(s) => write!(f, "{}", s),
            HarnessError::RomLoadError(s) => write!(f, "{}", s),
            HarnessError::EmulationError(s) => write!(f, "Emulation error: {}", s),
        }
    }
}

impl std::error::Error for HarnessError {}
