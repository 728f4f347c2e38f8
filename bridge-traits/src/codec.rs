//! Result Codec
//!
//! Backends report read results as a `{ result, success, error }` triple that
//! survives marshalling across a language boundary. Two transport forms exist:
//!
//! - **Field map**: a string-keyed map with the three fields, as produced by
//!   JVM hosts returning a `HashMap<String, String>`.
//! - **JSON string**: `{"result":"...","success":"0|1","error":"..."}`.
//!
//! Encoding always emits all three fields. Decoding is strict about presence:
//! a missing field is a [`DecodeError::MissingField`], never a panic.
//!
//! ## Success flag
//!
//! The flag is two-valued: `"0"` (or JSON `false` / `0`) means failure and any
//! other value means success. In particular `"false"` is treated as success.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::outcome::Outcome;

pub const RESULT_FIELD: &str = "result";
pub const SUCCESS_FIELD: &str = "success";
pub const ERROR_FIELD: &str = "error";

const SUCCESS_FLAG: &str = "1";
const FAILURE_FLAG: &str = "0";

/// Backend-native read response before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawResult {
    FieldMap(HashMap<String, String>),
    Json(String),
}

/// Transport form used when encoding an [`Outcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    FieldMap,
    #[default]
    Json,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// JSON form of the success flag. Hosts send strings, but booleans and
/// numbers are accepted.
#[derive(Deserialize)]
#[serde(untagged)]
enum SuccessFlag {
    Text(String),
    Flag(bool),
    Number(i64),
}

impl SuccessFlag {
    fn is_failure(&self) -> bool {
        match self {
            Self::Text(text) => text == FAILURE_FLAG,
            Self::Flag(flag) => !flag,
            Self::Number(number) => *number == 0,
        }
    }
}

#[derive(Deserialize)]
struct WireResult {
    result: Option<String>,
    success: Option<SuccessFlag>,
    error: Option<String>,
}

/// Encoder/decoder for the `{ result, success, error }` triple.
pub struct ResultCodec;

impl ResultCodec {
    pub fn encode(outcome: &Outcome, encoding: Encoding) -> RawResult {
        match encoding {
            Encoding::FieldMap => RawResult::FieldMap(Self::encode_field_map(outcome)),
            Encoding::Json => RawResult::Json(Self::encode_json(outcome)),
        }
    }

    pub fn encode_field_map(outcome: &Outcome) -> HashMap<String, String> {
        let (result, flag, error) = Self::fields(outcome);
        HashMap::from([
            (RESULT_FIELD.to_string(), result.to_string()),
            (SUCCESS_FIELD.to_string(), flag.to_string()),
            (ERROR_FIELD.to_string(), error.to_string()),
        ])
    }

    /// Encode as a JSON document with properly escaped string values.
    pub fn encode_json(outcome: &Outcome) -> String {
        let (result, flag, error) = Self::fields(outcome);
        format!(
            "{{\"{}\":{},\"{}\":{},\"{}\":{}}}",
            RESULT_FIELD,
            Value::from(result),
            SUCCESS_FIELD,
            Value::from(flag),
            ERROR_FIELD,
            Value::from(error)
        )
    }

    /// Decode a raw backend result.
    ///
    /// A backend-reported failure decodes to `Ok(Outcome::Failure(..))`;
    /// `Err` is reserved for payloads that cannot be interpreted at all.
    pub fn decode(raw: &RawResult) -> Result<Outcome, DecodeError> {
        match raw {
            RawResult::FieldMap(map) => Self::decode_field_map(map),
            RawResult::Json(json) => Self::decode_json(json),
        }
    }

    pub fn decode_field_map(map: &HashMap<String, String>) -> Result<Outcome, DecodeError> {
        let result = map
            .get(RESULT_FIELD)
            .ok_or(DecodeError::MissingField(RESULT_FIELD))?;
        let success = map
            .get(SUCCESS_FIELD)
            .ok_or(DecodeError::MissingField(SUCCESS_FIELD))?;
        let error = map
            .get(ERROR_FIELD)
            .ok_or(DecodeError::MissingField(ERROR_FIELD))?;

        Ok(Self::classify(
            result.clone(),
            success == FAILURE_FLAG,
            error.clone(),
        ))
    }

    pub fn decode_json(json: &str) -> Result<Outcome, DecodeError> {
        let wire: WireResult =
            serde_json::from_str(json).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        let result = wire.result.ok_or(DecodeError::MissingField(RESULT_FIELD))?;
        let success = wire
            .success
            .ok_or(DecodeError::MissingField(SUCCESS_FIELD))?;
        let error = wire.error.ok_or(DecodeError::MissingField(ERROR_FIELD))?;

        Ok(Self::classify(result, success.is_failure(), error))
    }

    fn classify(result: String, failed: bool, error: String) -> Outcome {
        if failed {
            Outcome::failure(error)
        } else {
            Outcome::success(result)
        }
    }

    fn fields(outcome: &Outcome) -> (&str, &'static str, &str) {
        match outcome {
            Outcome::Success(value) => (value.expose(), SUCCESS_FLAG, ""),
            Outcome::Failure(message) => ("", FAILURE_FLAG, message.as_str()),
        }
    }
}
