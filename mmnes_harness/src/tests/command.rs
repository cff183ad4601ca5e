use serde_json::json;
use crate::command::{Command, CommandType};
use crate::emulation_core::Button;
use crate::harness_error::HarnessError;
use crate::tests::init;

fn parse(line: &str) -> Command {
    init();
    Command::parse(line).unwrap()
}

fn message(result: Result<Command, HarnessError>) -> String {
    result.unwrap_err().to_string()
}

#[test]
fn test_parse_command_with_args() {
    let command = parse(r#"{"cmd": "frame", "args": {"count": 3}}"#);

    assert_eq!(command.name, "frame");
    assert_eq!(command.count_or("count", 1), Ok(3));
}

#[test]
fn test_missing_args_default_to_empty() {
    let command = parse(r#"{"cmd": "getState"}"#);

    assert!(command.args.is_empty());
    assert_eq!(command.count_or("count", 1), Ok(1));
}

#[test]
fn test_malformed_json_is_reported_as_invalid_json() {
    init();

    assert!(message(Command::parse("{not json")).starts_with("Invalid JSON: "));
    assert!(message(Command::parse("")).starts_with("Invalid JSON: "));
}

#[test]
fn test_non_object_or_missing_cmd_is_an_invalid_command() {
    init();

    assert!(message(Command::parse("[1, 2]")).starts_with("Invalid command: "));
    assert!(message(Command::parse(r#"{"args": {}}"#)).starts_with("Invalid command: "));
    assert!(message(Command::parse(r#"{"cmd": 5}"#)).starts_with("Invalid command: "));
    assert!(message(Command::parse(r#"{"cmd": "frame", "args": [3]}"#)).starts_with("Invalid command: "));
}

#[test]
fn test_explicit_zero_is_not_replaced_by_default() {
    let command = parse(r#"{"cmd": "frame", "args": {"count": 0}}"#);

    assert_eq!(command.count_or("count", 1), Ok(0));
}

#[test]
fn test_null_reads_as_absent() {
    let command = parse(r#"{"cmd": "frame", "args": {"count": null}}"#);

    assert_eq!(command.count_or("count", 1), Ok(1));
}

#[test]
fn test_counts_must_be_non_negative_integers() {
    let expected = Err(HarnessError::InvalidArgument("Invalid argument: count must be a non-negative integer".to_string()));

    for count in [json!(-1), json!(1.5), json!("3"), json!(true)] {
        let command = parse(&json!({"cmd": "frame", "args": {"count": count}}).to_string());
        assert_eq!(command.count_or("count", 1), expected);
    }
}

#[test]
fn test_addresses_accept_integers_and_hex_strings() {
    let command = parse(r#"{"cmd": "readMemory", "args": {"start": 16, "end": "0x07FF"}}"#);

    assert_eq!(command.address("start"), Ok(16));
    assert_eq!(command.address("end"), Ok(0x07FF));
    assert!(command.address("missing").is_err());
}

#[test]
fn test_button_names_are_upper_case() {
    let command = parse(r#"{"cmd": "buttonDown", "args": {"button": "SELECT"}}"#);
    assert_eq!(command.button(), Ok(Button::Select));

    let command = parse(r#"{"cmd": "buttonDown", "args": {"button": "select"}}"#);
    assert_eq!(command.button().unwrap_err().to_string(), "Unknown button: select");

    let command = parse(r#"{"cmd": "buttonDown", "args": {}}"#);
    assert_eq!(command.button().unwrap_err().to_string(), "Unknown button: null");

    let command = parse(r#"{"cmd": "buttonDown", "args": {"button": 7}}"#);
    assert_eq!(command.button().unwrap_err().to_string(), "Unknown button: 7");
}

#[test]
fn test_path_must_be_a_string() {
    let command = parse(r#"{"cmd": "loadRom", "args": {"path": 12}}"#);

    assert_eq!(command.path().unwrap_err().to_string(), "Missing argument: path");
}

#[test]
fn test_command_names_map_to_types() {
    init();

    assert_eq!(CommandType::from_name("captureAudio"), Some(CommandType::CaptureAudio));
    assert_eq!(CommandType::from_name("readMemory"), Some(CommandType::ReadMemory));
    assert_eq!(CommandType::from_name("analyzeAudio"), Some(CommandType::AnalyzeAudio));
    assert_eq!(CommandType::from_name("readPalette"), Some(CommandType::ReadPalette));
    assert!(CommandType::ReadPalette.needs_core());
    assert_eq!(CommandType::from_name("LOADROM"), None);
    assert!(!CommandType::SetVerbosity.needs_core());
    assert!(CommandType::GetState.needs_core());
}
