//! The `{result, message, data}` wrapper every service response uses.
//!
//! [`interpret`] turns an HTTP status flag plus raw body into either the
//! typed `data` payload or an [`EnvelopeError`]. Callers attach the HTTP
//! status line themselves when reporting [`EnvelopeError::NotJson`].

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::submission::FormFeedback;

/// `result` value signalling success.
pub const RESULT_SUCCESS: &str = "success";

/// Message the service returns when a job for the submitted id0 exists.
pub const DUPLICATE_JOB_MESSAGE: &str = "Duplicate job";

/// Prefix of validation failures: `invalid:<field>,<field>,...`.
pub const INVALID_PREFIX: &str = "invalid:";

/// Fallback text when an error envelope carries no message.
const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Why a response could not be turned into data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    /// The body was not a JSON envelope at all.
    #[error("response body is not a JSON envelope")]
    NotJson,

    /// The service reported `result: error` or a non-2xx status.
    #[error("{0}")]
    Rejected(String),

    /// `data` did not have the expected shape.
    #[error("unexpected response data: {0}")]
    UnexpectedData(String),
}

/// Interpret a response body.
///
/// Success requires both a 2xx status and `result: "success"`. A missing
/// `data` field is treated as an empty object so that payload types with
/// only optional fields still deserialize.
pub fn interpret<T: DeserializeOwned>(http_ok: bool, body: &str) -> Result<T, EnvelopeError> {
    let raw: RawEnvelope = serde_json::from_str(body).map_err(|_| EnvelopeError::NotJson)?;

    if !http_ok || raw.result.as_deref() != Some(RESULT_SUCCESS) {
        let message = raw
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
        return Err(EnvelopeError::Rejected(message));
    }

    let data = match raw.data {
        Some(serde_json::Value::Null) | None => serde_json::Value::Object(Default::default()),
        Some(value) => value,
    };

    serde_json::from_value(data).map_err(|e| EnvelopeError::UnexpectedData(e.to_string()))
}

/// `data` of a successful submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitData {
    pub id0: String,
}

/// `data` of a status check. `status` is kept raw; unknown values are
/// "absent" rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusData {
    #[serde(default)]
    pub status: Option<String>,
}

/// `data` of the network statistics endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NetworkStats {
    #[serde(default)]
    pub waiting: u64,
    #[serde(default)]
    pub working: u64,
    #[serde(default)]
    pub miners: u64,
    #[serde(default, rename = "totalMined")]
    pub total_mined: u64,
}

/// Classified submission failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitRejection {
    /// Field-level validation failure.
    Invalid(FormFeedback),
    /// A job for this id0 is already tracked by the service.
    Duplicate,
    /// Anything else; shown to the user verbatim.
    Other(String),
}

impl SubmitRejection {
    pub fn classify(message: &str) -> Self {
        if let Some(fields) = message.strip_prefix(INVALID_PREFIX) {
            Self::Invalid(FormFeedback::from_field_list(fields))
        } else if message == DUPLICATE_JOB_MESSAGE {
            Self::Duplicate
        } else {
            Self::Other(message.to_string())
        }
    }
}
