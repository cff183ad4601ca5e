use std::io::Write;
use std::sync::{Mutex, MutexGuard, Once};
use log::LevelFilter;
use serde_json::{json, Value};
use simplelog::{Config, TestLogger};
use tempfile::NamedTempFile;
use crate::command::Command;
use crate::dispatcher::dispatch;
use crate::emulation_core::{CoreCallbacks, CoreFactory, EmulationCore, MockEmulationCore};
use crate::nes_core_adapter::nes_core_factory;
use crate::response::Response;
use crate::session::Session;
use crate::verbosity::Verbosity;

mod command;
mod verbosity;

static START: Once = Once::new();
static LOG_LEVEL: Mutex<()> = Mutex::new(());

fn init_logger_for_test() {
    START.call_once(|| TestLogger::init(LevelFilter::Trace, Config::default()).unwrap());
}

pub fn init() {
    init_logger_for_test();
}

const PRG_BANK_SIZE: usize = 16 * 1024;
const CHR_BANK_SIZE: usize = 8 * 1024;

pub const DEMO_NMI_COUNTER: usize = 0x11;

/// 16 KiB NROM image with `program` at $C000, reset and IRQ vectors on $C000.
pub fn build_nrom_image(program: &[u8], nmi_handler: u16) -> Vec<u8> {
    let mut prg = vec![0xEA; PRG_BANK_SIZE];
    prg[..program.len()].copy_from_slice(program);
    prg[0x3FFA..0x3FFC].copy_from_slice(&nmi_handler.to_le_bytes());
    prg[0x3FFC..0x3FFE].copy_from_slice(&0xC000u16.to_le_bytes());
    prg[0x3FFE..0x4000].copy_from_slice(&0xC000u16.to_le_bytes());

    let mut image = vec![0x4E, 0x45, 0x53, 0x1A, 1, 1, 0x01, 0x00];
    image.resize(16, 0);
    image.extend_from_slice(&prg);
    image.extend(vec![0; CHR_BANK_SIZE]);
    image
}

/// Turns on NMI, rendering and a square wave, then loops on INC $10; each NMI does INC $11.
pub fn demo_rom() -> Vec<u8> {
    let program = [
        0x78, 0xD8, 0xA2, 0xFF, 0x9A,
        0xA9, 0x80, 0x8D, 0x00, 0x20,
        0xA9, 0x1E, 0x8D, 0x01, 0x20,
        0xA9, 0x0F, 0x8D, 0x15, 0x40,
        0xA9, 0xBF, 0x8D, 0x00, 0x40,
        0xA9, 0xFD, 0x8D, 0x02, 0x40,
        0xA9, 0x08, 0x8D, 0x03, 0x40,
        0xE6, 0x10, 0x4C, 0x23, 0xC0,
        // NMI handler at $C028
        0xE6, 0x11, 0x40,
    ];
    build_nrom_image(&program, 0xC028)
}

/// First opcode is a JAM.
pub fn jam_rom() -> Vec<u8> {
    build_nrom_image(&[0x02], 0xC000)
}

pub fn write_rom(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

pub fn path_of(file: &NamedTempFile) -> String {
    file.path().to_string_lossy().to_string()
}

/// Serializes changes to the global `log` ceiling; hold it while asserting on `log::max_level()`.
pub fn lock_log_level() -> MutexGuard<'static, ()> {
    LOG_LEVEL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn nes_session() -> Session {
    init();
    let _level = lock_log_level();
    Session::new(nes_core_factory(), Verbosity::Debug)
}

pub fn mock_factory<F>(configure: F) -> CoreFactory
where
    F: Fn(&mut MockEmulationCore, CoreCallbacks) + 'static,
{
    Box::new(move |callbacks: CoreCallbacks| -> Box<dyn EmulationCore> {
        let mut core = MockEmulationCore::new();
        configure(&mut core, callbacks);
        Box::new(core)
    })
}

pub fn mock_session<F>(configure: F) -> Session
where
    F: Fn(&mut MockEmulationCore, CoreCallbacks) + 'static,
{
    init();
    let _level = lock_log_level();
    Session::new(mock_factory(configure), Verbosity::Debug)
}

/// Dispatch a command given as JSON and return the response as JSON.
pub fn run(session: &mut Session, command: Value) -> Value {
    let command = Command::parse(&command.to_string()).unwrap();
    let response: Response = dispatch(session, &command);
    serde_json::from_str(&response.to_json().unwrap()).unwrap()
}

pub fn load(session: &mut Session, rom: &NamedTempFile) -> Value {
    run(session, json!({"cmd": "loadRom", "args": {"path": path_of(rom)}}))
}

pub fn error(message: &str) -> Value {
    json!({"status": "error", "message": message})
}
