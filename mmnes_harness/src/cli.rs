use std::path::PathBuf;
use clap::Parser;
use clap::builder::FalseyValueParser;
use clap_num::number_range;
use crate::verbosity::Verbosity;

#[derive(Parser, Debug)]
#[command(author, version, about = "NES test harness speaking line-delimited JSON on stdio", long_about = None)]
pub struct Args {
    #[arg(
        short = 'd',
        long = "debug",
        env = "DEBUG",
        value_parser = FalseyValueParser::new(),
        help = "debug diagnostics on stderr, same as verbosity 2",
    )]
    pub debug: bool,

    #[arg(
        short = 'v',
        long = "verbosity",
        help = "initial verbosity: 0=off, 1=info, 2=debug",
        default_value_t = 0,
        value_parser = parse_verbosity,
    )]
    pub verbosity: u8,

    #[arg(
        short = 'f',
        long = "rom-file",
        help = "rom file to load before accepting commands",
    )]
    pub rom_file: Option<PathBuf>,
}

fn parse_verbosity(s: &str) -> Result<u8, String> {
    number_range(s, 0, 2)
}

impl Args {
    /// `--debug` (or a truthy `DEBUG`) wins over `--verbosity`.
    pub fn initial_verbosity(&self) -> Verbosity {
        if self.debug {
            Verbosity::Debug
        } else {
            Verbosity::from_level(self.verbosity as u64).unwrap_or_default()
        }
    }
}
