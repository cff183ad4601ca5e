pub mod audio_analyzer;
pub mod audio_capture;
pub mod cli;
pub mod command;
pub mod dispatcher;
pub mod emulation_core;
pub mod harness_error;
pub mod nes_core_adapter;
pub mod response;
pub mod session;
pub mod state_snapshot;
pub mod transport;
pub mod verbosity;
pub mod wav_encoder;

#[cfg(test)]
pub mod tests;
