use std::io;
use std::process::ExitCode;
use clap::Parser;
use log::{error, warn, LevelFilter, SetLoggerError};
use simplelog::{ConfigBuilder, LevelPadding, WriteLogger};
use mmnes_harness::cli::Args;
use mmnes_harness::dispatcher::load_rom_file;
use mmnes_harness::nes_core_adapter::nes_core_factory;
use mmnes_harness::session::Session;
use mmnes_harness::transport::{SessionEnd, Transport};

fn logger_init() -> Result<(), SetLoggerError> {
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_location_level(LevelFilter::Off)
        .set_level_padding(LevelPadding::Off)
        .build();

    // the ceiling is lowered again by the session's verbosity
    WriteLogger::init(LevelFilter::Debug, config, io::stderr())
}

fn main() -> ExitCode {
    let args: Args = Args::parse();

    if let Err(e) = logger_init() {
        eprintln!("[ERROR] could not install logger: {}", e);
    }

    let mut session = Session::new(nes_core_factory(), args.initial_verbosity());

    if let Some(rom_file) = &args.rom_file {
        let path = rom_file.to_string_lossy();
        if let Err(e) = load_rom_file(&mut session, &path) {
            warn!("could not preload rom: {}", e);
        }
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut transport = Transport::new(stdin.lock(), stdout.lock());

    match transport.run(&mut session) {
        Ok(SessionEnd::Quit) => ExitCode::SUCCESS,
        Ok(SessionEnd::EndOfInput) => {
            warn!("input closed without quit");
            ExitCode::FAILURE
        },
        Err(e) => {
            error!("protocol channel failed: {}", e);
            ExitCode::FAILURE
        },
    }
}
