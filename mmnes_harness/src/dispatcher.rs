use std::fs;
use std::path::Path;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, info};
use crate::audio_analyzer::AudioAnalyzer;
use crate::audio_capture::SAMPLE_RATE;
use crate::command::{Command, CommandType};
use crate::harness_error::HarnessError;
use crate::response::{Payload, Response};
use crate::session::Session;
use crate::state_snapshot::StateSnapshot;
use crate::verbosity::Verbosity;
use crate::wav_encoder::encode_wav;

const DEFAULT_FRAME_COUNT: u64 = 1;
const DEFAULT_CAPTURE_FRAMES: u64 = 10;
const DEFAULT_CONTROLLER: u64 = 1;
const DEFAULT_VERBOSITY_LEVEL: u64 = 0;
const MAX_ADDRESS: u64 = 0xFFFF;

/// Run one command against the session and build its response.
pub fn dispatch(session: &mut Session, command: &Command) -> Response {
    let Some(command_type) = CommandType::from_name(&command.name) else {
        return Response::from(HarnessError::UnknownCommand(command.name.clone()));
    };

    debug!("dispatching {}", command_type);

    if command_type.needs_core() && !session.has_core() {
        return Response::from(HarnessError::PreconditionError);
    }

    let result = match command_type {
        CommandType::LoadRom => load_rom(session, command),
        CommandType::Frame => frame(session, command),
        CommandType::ButtonDown => button(session, command, true),
        CommandType::ButtonUp => button(session, command, false),
        CommandType::GetState => get_state(session),
        CommandType::Reset => reset(session),
        CommandType::CaptureAudio => capture_audio(session, command),
        CommandType::AnalyzeAudio => analyze_audio(session),
        CommandType::SetVerbosity => set_verbosity(session, command),
        CommandType::ReadMemory => read_memory(session, command),
        CommandType::ReadPalette => read_palette(session),
        CommandType::Quit => return Response::Quit,
    };

    Response::from(result)
}

fn load_rom(session: &mut Session, command: &Command) -> Result<Payload, HarnessError> {
    let path = command.path()?;
    load_rom_file(session, path)?;

    Ok(Payload::message(format!("Loaded {}", path)))
}

/// Read `path` and swap in a fresh core running it. On failure the session is left untouched.
pub fn load_rom_file(session: &mut Session, path: &str) -> Result<(), HarnessError> {
    let rom_path = Path::new(path);
    if !rom_path.exists() {
        Err(HarnessError::ResourceNotFound(path.to_string()))?
    }

    let data = fs::read(rom_path)
        .map_err(|e| HarnessError::RomLoadError(format!("Failed to read ROM {}: {}", path, e)))?;

    let mut core = session.create_core();
    core.load_rom(&data)
        .map_err(|e| HarnessError::RomLoadError(format!("Failed to load ROM {}: {}", path, e)))?;

    session.install_core(core);
    info!("loaded {} ({} bytes, crc32 {:08X})", path, data.len(), crc32fast::hash(&data));

    Ok(())
}

fn frame(session: &mut Session, command: &Command) -> Result<Payload, HarnessError> {
    let count = command.count_or("count", DEFAULT_FRAME_COUNT)?;
    let frame = session.step_frames(count)?;

    debug!("frame: advanced {} frame(s), now at {}", count, frame);
    Ok(Payload::frame(frame))
}

fn button(session: &mut Session, command: &Command, pressed: bool) -> Result<Payload, HarnessError> {
    let controller = match command.count_or("controller", DEFAULT_CONTROLLER)? {
        controller @ (1 | 2) => controller as u8,
        other => return Err(HarnessError::InvalidArgument(format!("Unknown controller: {}", other))),
    };
    let button = command.button()?;

    let core = session.core_mut()?;
    debug!("{}: controller={}, button={} (index={})", command.name, controller, button, button.index());
    debug!("  state before: {:02x?}", core.controller_state(controller));

    if pressed {
        core.button_down(controller, button)?;
    } else {
        core.button_up(controller, button)?;
    }

    debug!("  state after:  {:02x?}", core.controller_state(controller));
    Ok(Payload::empty())
}

fn get_state(session: &Session) -> Result<Payload, HarnessError> {
    let snapshot = StateSnapshot::capture(session.core()?, session.frame_count());
    debug!("getState: frame={}, pc=0x{:04X}", snapshot.frame, snapshot.cpu.pc);

    Ok(Payload { data: Some(snapshot), ..Payload::default() })
}

fn reset(session: &mut Session) -> Result<Payload, HarnessError> {
    session.core_mut()?.reset()?;
    session.reset_frame_count();

    debug!("reset: back to power-on state");
    Ok(Payload::empty())
}

fn capture_audio(session: &mut Session, command: &Command) -> Result<Payload, HarnessError> {
    let frames = command.count_or("frames", DEFAULT_CAPTURE_FRAMES)?;
    debug!("captureAudio: capturing {} frame(s)", frames);

    session.audio().borrow_mut().start();
    let stepped = session.step_frames(frames);
    session.audio().borrow_mut().stop();
    let frame = stepped?;

    let audio = session.audio().borrow();
    let samples = audio.samples();
    let wav = encode_wav(samples, SAMPLE_RATE);
    debug!("captureAudio: captured {} samples, {} bytes of WAV", samples.len(), wav.len());

    Ok(Payload {
        frame: Some(frame),
        samples: Some(samples.len()),
        wav: Some(STANDARD.encode(wav)),
        ..Payload::default()
    })
}

/// Metrics over the samples of the most recent `captureAudio`.
fn analyze_audio(session: &Session) -> Result<Payload, HarnessError> {
    let audio = session.audio().borrow();
    if audio.samples().is_empty() {
        Err(HarnessError::NoAudioCaptured)?
    }

    let analysis = AudioAnalyzer::new(SAMPLE_RATE).analyze(audio.samples());
    Ok(Payload { analysis: Some(analysis), ..Payload::default() })
}

fn set_verbosity(session: &mut Session, command: &Command) -> Result<Payload, HarnessError> {
    let level = command.count_or("level", DEFAULT_VERBOSITY_LEVEL)?;
    let verbosity = Verbosity::from_level(level)
        .ok_or_else(|| HarnessError::InvalidArgument(format!("Invalid verbosity level: {}", level)))?;

    session.set_verbosity(verbosity);
    info!("Verbosity set to {}", level);

    Ok(Payload { verbosity: Some(verbosity.level()), ..Payload::default() })
}

fn read_memory(session: &Session, command: &Command) -> Result<Payload, HarnessError> {
    let start = command.address("start")?;
    let end = command.address("end")?;

    if start > end || end > MAX_ADDRESS {
        Err(HarnessError::InvalidArgument(format!("Invalid memory range: {}-{}", start, end)))?
    }

    let (start, end) = (start as u16, end as u16);
    let core = session.core()?;
    let bytes = (start..=end).map(|addr| core.read_memory(addr)).collect();

    Ok(Payload { start: Some(start), end: Some(end), bytes: Some(bytes), ..Payload::default() })
}

fn read_palette(session: &Session) -> Result<Payload, HarnessError> {
    let palette = session.core()?.palette_memory();
    debug!("readPalette: backdrop 0x{:02X}", palette.first().copied().unwrap_or(0));

    Ok(Payload { palette: Some(palette), ..Payload::default() })
}
