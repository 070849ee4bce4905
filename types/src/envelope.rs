//! Result envelope: the single outbound message a unit sends.
//!
//! Wire form is `<tag>:<json>` where the tag is exactly three characters.
//! The bridge never looks at the raw string past [`Envelope::parse`]; from
//! there on the outcome is a typed [`Envelope`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const SUCCESS_TAG: &str = "res";
pub const FAILURE_TAG: &str = "err";
pub const SEPARATOR: char = ':';

const TAG_LEN: usize = 3;

/// Error details thrown inside the unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub stack: String,
}

/// Decoded outcome of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Success(Value),
    Failure(ErrorInfo),
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("worker message is too short to carry a tag: {0:?}")]
    Truncated(String),
    #[error("unrecognized worker message tag `{0}`")]
    UnknownTag(String),
    #[error("worker message tag `{0}` is not followed by `:`")]
    MissingSeparator(String),
    #[error("malformed `{tag}` payload: {source}")]
    Payload {
        tag: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl Envelope {
    /// Parse one outbound message. Unknown tags are errors.
    pub fn parse(message: &str) -> Result<Self, EnvelopeError> {
        let Some(tag) = message.get(..TAG_LEN) else {
            return Err(EnvelopeError::Truncated(message.to_string()));
        };
        let tag = match tag {
            SUCCESS_TAG => SUCCESS_TAG,
            FAILURE_TAG => FAILURE_TAG,
            other => return Err(EnvelopeError::UnknownTag(other.to_string())),
        };
        let body = message[TAG_LEN..]
            .strip_prefix(SEPARATOR)
            .ok_or_else(|| EnvelopeError::MissingSeparator(tag.to_string()))?;

        if tag == SUCCESS_TAG {
            serde_json::from_str(body)
                .map(Self::Success)
                .map_err(|source| EnvelopeError::Payload { tag, source })
        } else {
            serde_json::from_str(body)
                .map(Self::Failure)
                .map_err(|source| EnvelopeError::Payload { tag, source })
        }
    }

    /// Render the wire form. The harness emits the same shape from inside the unit.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Success(value) => format!("{SUCCESS_TAG}{SEPARATOR}{value}"),
            Self::Failure(info) => {
                let body = serde_json::json!({
                    "message": info.message,
                    "stack": info.stack,
                });
                format!("{FAILURE_TAG}{SEPARATOR}{body}")
            }
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}
