use serde_json::Value;
use thiserror::Error;

use crate::constants::MAX_TWEET_CHARS;

/// Error taxonomy shared by the session, registry and dispatcher.
///
/// Every variant maps to a stable `errorCode` string in the response
/// envelope; none of them escapes the dispatcher boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PerchError {
    /// Tweet text empty or over the character limit.
    #[error("Tweet text must be between 1 and {MAX_TWEET_CHARS} characters")]
    InvalidText,

    /// Aggregated field-level sign-up violations.
    #[error("Sign-up rejected: {}", .0.join("; "))]
    SignUpRejected(Vec<String>),

    /// Credential mismatch, unknown account, or no active session.
    #[error("Authentication failed")]
    AuthError,

    /// The session user does not own the targeted tweet, or a claimed
    /// retweet/original attachment does not hold.
    #[error("Not authorized to modify the targeted tweet")]
    NotAuthorized,

    /// Referenced id does not resolve.
    #[error("Tweet not found")]
    NotFound,

    /// Dispatch tag outside the known command set.
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// Missing or ill-typed request parameter.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Persistence failure, distinct from "no session" and "not found".
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PerchError {
    /// Stable error code carried in the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidText => "InvalidText",
            Self::SignUpRejected(_) => "ValidationErrors",
            Self::AuthError => "AuthError",
            Self::NotAuthorized => "NotAuthorized",
            Self::NotFound => "NotFound",
            Self::UnknownMethod(_) => "UnknownMethod",
            Self::BadRequest(_) => "BadRequest",
            Self::Storage(_) => "Storage",
        }
    }

    /// `errorCode` value for the envelope: a string for every kind
    /// except sign-up validation, which carries the violation list.
    pub fn code_value(&self) -> Value {
        match self {
            Self::SignUpRejected(messages) => Value::Array(
                messages.iter().cloned().map(Value::String).collect(),
            ),
            other => Value::String(other.code().to_string()),
        }
    }
}
