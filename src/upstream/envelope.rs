//! Typed parsing of the proxy response envelope
//! `{ success, response: { result } }`.
//!
//! Parsing happens in two steps: the envelope is decoded into loosely typed
//! JSON first, and only a successful envelope with a present `result` is
//! handed to the schema for `T`. Schema drift in one result shape therefore
//! surfaces as a [`ParseError::Schema`] naming the method instead of a generic
//! decode failure.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug)]
pub enum ParseError {
    /// Body was not a JSON envelope at all.
    Envelope { method: &'static str, message: String },
    /// Envelope carried `success: false` or no `success` flag.
    Unsuccessful { method: &'static str },
    /// Envelope was successful but `response.result` was absent or null.
    MissingResult { method: &'static str },
    /// `response.result` did not match the expected shape.
    Schema { method: &'static str, message: String },
}

impl ParseError {
    /// Envelope-level "no usable data" as opposed to a malformed body.
    pub fn is_empty_result(&self) -> bool {
        matches!(
            self,
            ParseError::Unsuccessful { .. } | ParseError::MissingResult { .. }
        )
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Envelope { method, message } => {
                write!(f, "{method} returned an undecodable envelope: {message}")
            }
            ParseError::Unsuccessful { method } => {
                write!(f, "{method} envelope reported success=false")
            }
            ParseError::MissingResult { method } => {
                write!(f, "{method} envelope has no response.result")
            }
            ParseError::Schema { method, message } => {
                write!(f, "{method} result does not match schema: {message}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    response: Option<RawResponse>,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    result: Option<Value>,
}

pub fn parse_result<T: DeserializeOwned>(
    method: &'static str,
    body: &str,
) -> Result<T, ParseError> {
    let envelope: RawEnvelope =
        serde_json::from_str(body).map_err(|err| ParseError::Envelope {
            method,
            message: err.to_string(),
        })?;

    if envelope.success != Some(true) {
        return Err(ParseError::Unsuccessful { method });
    }

    let result = envelope
        .response
        .and_then(|response| response.result)
        .ok_or(ParseError::MissingResult { method })?;

    serde_json::from_value(result).map_err(|err| ParseError::Schema {
        method,
        message: err.to_string(),
    })
}
