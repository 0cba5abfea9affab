//! Write response envelope.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;

/// `{ success, data?, error? }` returned by every write.
///
/// `success: false` is an ordinary outcome, not an error: callers branch on
/// it explicitly and only trust `data` when `success` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MutationResponse {
    /// Success with no payload (the demo acknowledgement).
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn ok_with(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Decode a raw host reply for `operation`.
    pub fn from_value(operation: &str, raw: Value) -> Result<Self, BridgeError> {
        serde_json::from_value(raw).map_err(|e| BridgeError::malformed(operation, e.to_string()))
    }

    pub fn into_value(self) -> Value {
        serde_json::to_value(&self).unwrap_or(Value::Null)
    }

    /// Convert into a typed outcome, decoding `data` when present.
    pub fn into_outcome<T: DeserializeOwned>(
        self,
        operation: &str,
    ) -> Result<MutationOutcome<T>, BridgeError> {
        if !self.success {
            return Ok(MutationOutcome::Rejected {
                error: self
                    .error
                    .unwrap_or_else(|| "operation failed".to_string()),
            });
        }
        let data = match self.data {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                serde_json::from_value(value)
                    .map_err(|e| BridgeError::malformed(operation, e.to_string()))?,
            ),
        };
        Ok(MutationOutcome::Applied { data })
    }
}

/// Typed view of a [`MutationResponse`].
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<T> {
    /// The host accepted the write. `data` is absent in demo mode.
    Applied { data: Option<T> },
    /// The host refused the write; `error` is meant for inline display.
    Rejected { error: String },
}

impl<T> MutationOutcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Rejected { error } => Some(error),
            Self::Applied { .. } => None,
        }
    }
}
