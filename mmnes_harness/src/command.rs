use std::fmt;
use std::fmt::{Display, Formatter};
use clap_num::maybe_hex;
use serde::Deserialize;
use serde_json::{Map, Value};
use crate::emulation_core::Button;
use crate::harness_error::HarnessError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    LoadRom,
    Frame,
    ButtonDown,
    ButtonUp,
    GetState,
    Reset,
    CaptureAudio,
    AnalyzeAudio,
    SetVerbosity,
    ReadMemory,
    ReadPalette,
    Quit,
}

impl CommandType {
    pub fn from_name(name: &str) -> Option<CommandType> {
        let command_type = match name {
            "loadRom" => CommandType::LoadRom,
            "frame" => CommandType::Frame,
            "buttonDown" => CommandType::ButtonDown,
            "buttonUp" => CommandType::ButtonUp,
            "getState" => CommandType::GetState,
            "reset" => CommandType::Reset,
            "captureAudio" => CommandType::CaptureAudio,
            "analyzeAudio" => CommandType::AnalyzeAudio,
            "setVerbosity" => CommandType::SetVerbosity,
            "readMemory" => CommandType::ReadMemory,
            "readPalette" => CommandType::ReadPalette,
            "quit" => CommandType::Quit,
            _ => return None,
        };

        Some(command_type)
    }

    /// Commands that may run before any ROM is loaded.
    pub fn needs_core(&self) -> bool {
        !matches!(self, CommandType::LoadRom | CommandType::SetVerbosity | CommandType::Quit)
    }
}

impl Display for CommandType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Deserialize)]
struct WireCommand {
    cmd: String,
    #[serde(default)]
    args: Map<String, Value>,
}

/// One parsed input line: `{"cmd": "<name>", "args": {...}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub args: Map<String, Value>,
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, HarnessError> {
        let value: Value = serde_json::from_str(line).map_err(HarnessError::invalid_json)?;
        if !value.is_object() {
            Err(HarnessError::invalid_command(format!("expected an object, got {}", value)))?
        }

        let wire: WireCommand = serde_json::from_value(value).map_err(HarnessError::invalid_command)?;

        Ok(Command { name: wire.cmd, args: wire.args })
    }

    // an explicit null reads the same as an absent key
    fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name).filter(|value| !value.is_null())
    }

    /// Non-negative integer argument, `default` when absent. An explicit 0 stays 0.
    pub fn count_or(&self, name: &str, default: u64) -> Result<u64, HarnessError> {
        match self.arg(name) {
            None => Ok(default),
            Some(value) => value.as_u64().ok_or_else(|| HarnessError::not_a_count(name)),
        }
    }

    /// Required address: a JSON integer or a `0x` prefixed string.
    pub fn address(&self, name: &str) -> Result<u64, HarnessError> {
        match self.arg(name) {
            Some(Value::Number(number)) => number.as_u64().ok_or_else(|| HarnessError::not_a_count(name)),
            Some(Value::String(text)) => maybe_hex::<u64>(text.trim()).map_err(|_| HarnessError::not_a_count(name)),
            _ => Err(HarnessError::not_a_count(name)),
        }
    }

    pub fn button(&self) -> Result<Button, HarnessError> {
        let value = self.args.get("button");

        value.and_then(Value::as_str)
            .and_then(Button::from_name)
            .ok_or_else(|| HarnessError::InvalidArgument(format!("Unknown button: {}", Command::render(value))))
    }

    pub fn path(&self) -> Result<&str, HarnessError> {
        self.args.get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| HarnessError::InvalidArgument("Missing argument: path".to_string()))
    }

    fn render(value: Option<&Value>) -> String {
        match value {
            None => "null".to_string(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        }
    }
}
