use std::fmt::{Display, Formatter};
use crate::cartridge::CartridgeError;

#[derive(Debug, PartialEq)]
pub enum LoaderError {
    InvalidRomFormat,
    Truncated { expected: usize, actual: usize },
    CartridgeError(CartridgeError),
    UnsupportedMapper(String)
}

impl From<CartridgeError> for LoaderError {
    fn from(error: CartridgeError) -> Self {
        LoaderError::CartridgeError(error)
    }
}

impl Display for LoaderError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            LoaderError::InvalidRomFormat => { write!(f, "invalid ROM format") },
            LoaderError::Truncated { expected, actual } => { write!(f, "truncated ROM image: expected {} bytes, got {}", expected, actual) },
            LoaderError::CartridgeError(e) => { write!(f, "-> cartridge error: {}", e) }
            LoaderError::UnsupportedMapper(s) => { write!(f, "unsupported mapper: {}", s) }
        }
    }
}

impl std::error::Error for LoaderError {}
