use serde::Serialize;
use crate::audio_analyzer::AudioAnalysis;
use crate::harness_error::HarnessError;
use crate::state_snapshot::StateSnapshot;

/// Optional fields of an `ok` response; only the ones a command sets are serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Payload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wav: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<StateSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AudioAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<u8>>,
}

impl Payload {
    pub fn empty() -> Payload {
        Payload::default()
    }

    pub fn message(message: impl Into<String>) -> Payload {
        Payload { message: Some(message.into()), ..Payload::default() }
    }

    pub fn frame(frame: u64) -> Payload {
        Payload { frame: Some(frame), ..Payload::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Ready,
    Ok(Payload),
    Error { message: String },
    Quit,
}

impl Response {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<HarnessError> for Response {
    fn from(error: HarnessError) -> Self {
        Response::Error { message: error.to_string() }
    }
}

impl From<Result<Payload, HarnessError>> for Response {
    fn from(result: Result<Payload, HarnessError>) -> Self {
        match result {
            Ok(payload) => Response::Ok(payload),
            Err(error) => Response::from(error),
        }
    }
}
