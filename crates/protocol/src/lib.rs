use anyhow::Result;
use serde::{Deserialize, Serialize};

pub const STATUS_OK: u16 = 200;
pub const STATUS_FAILURE: u16 = 500;

/// Gateway proxy response: `{"statusCode": <u16>, "body": "<json text>"}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResponse {
    pub status_code: u16,
    pub body: String,
}

impl ProbeResponse {
    pub fn ok<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self {
            status_code: STATUS_OK,
            body: serialize_json_pretty(value)?,
        })
    }

    pub fn failure(error: &ErrorBody) -> Self {
        let body = serialize_json_pretty(error).unwrap_or_else(|err| {
            format!("{{\n  \"name\": \"SerializationError\",\n  \"message\": \"{err}\"\n}}")
        });
        Self {
            status_code: STATUS_FAILURE,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }
}

/// Failure shape returned to the caller.
///
/// Structured errors carry `name`, `message` and an optional `stack`; anything
/// else (for example a panic payload) is echoed as the raw value.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ErrorBody {
    Structured(ErrorEnvelope),
    Raw(serde_json::Value),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorBody {
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Structured(envelope) => Some(envelope.message.as_str()),
            Self::Raw(value) => value.as_str(),
        }
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

/// Two-space indented JSON, the format every response body uses.
pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}
