//! Request/response envelope exchanged with the dispatcher.
//!
//! Transports are out of scope; whatever delivers requests is expected
//! to hand over an already-parsed [`Request`] and serialize the
//! [`Response`] back out.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PerchError;

/// The command set understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    SignIn,
    SignUp,
    Timeline,
    ShowMyTweets,
    Tweet,
    RemoveTweet,
    Retweet,
    RemoveRetweet,
    Like,
    Dislike,
    Reply,
    RemoveReply,
}

impl Method {
    /// Symbolic wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SignIn => "SIGNIN",
            Self::SignUp => "SIGNUP",
            Self::Timeline => "TIMELINE",
            Self::ShowMyTweets => "SHOW_MY_TWEETS",
            Self::Tweet => "TWEET",
            Self::RemoveTweet => "REMOVETWEET",
            Self::Retweet => "RETWEET",
            Self::RemoveRetweet => "REMOVERETWEET",
            Self::Like => "LIKE",
            Self::Dislike => "DISLIKE",
            Self::Reply => "REPLY",
            Self::RemoveReply => "REMOVEREPLY",
        }
    }
}

impl std::str::FromStr for Method {
    type Err = PerchError;

    /// An unrecognized tag is a hard failure, never a silent
    /// fall-through to an empty result.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SIGNIN" => Ok(Self::SignIn),
            "SIGNUP" => Ok(Self::SignUp),
            "TIMELINE" => Ok(Self::Timeline),
            "SHOW_MY_TWEETS" => Ok(Self::ShowMyTweets),
            "TWEET" => Ok(Self::Tweet),
            "REMOVETWEET" => Ok(Self::RemoveTweet),
            "RETWEET" => Ok(Self::Retweet),
            "REMOVERETWEET" => Ok(Self::RemoveRetweet),
            "LIKE" => Ok(Self::Like),
            "DISLIKE" => Ok(Self::Dislike),
            "REPLY" => Ok(Self::Reply),
            "REMOVEREPLY" => Ok(Self::RemoveReply),
            other => Err(PerchError::UnknownMethod(other.to_string())),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tagged command: symbolic method name plus a free-form parameter
/// map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub parameter_values: Value,
}

impl Request {
    pub fn new(method: Method, parameter_values: Value) -> Self {
        Self {
            method: method.as_str().to_string(),
            parameter_values,
        }
    }
}

/// Response envelope. `result` is always a JSON array when present;
/// `errorCode` is a string, except for sign-up validation failures
/// where it carries the violation messages as an array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub has_error: bool,
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_code: Option<Value>,
}

impl Response {
    /// Successful envelope carrying `count` items.
    pub fn success(count: u64, result: Option<Value>) -> Self {
        Self {
            has_error: false,
            count,
            result,
            error_code: None,
        }
    }

    /// Failure envelope for any dispatcher-level error.
    pub fn failure(error: &PerchError) -> Self {
        let count = match error {
            PerchError::SignUpRejected(messages) => messages.len() as u64,
            _ => 0,
        };
        Self {
            has_error: true,
            count,
            result: None,
            error_code: Some(error.code_value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_round_trip() {
        for name in [
            "SIGNIN",
            "SIGNUP",
            "TIMELINE",
            "SHOW_MY_TWEETS",
            "TWEET",
            "REMOVETWEET",
            "RETWEET",
            "REMOVERETWEET",
            "LIKE",
            "DISLIKE",
            "REPLY",
            "REMOVEREPLY",
        ] {
            let method: Method = name.parse().unwrap();
            assert_eq!(method.as_str(), name);
        }
    }

    #[test]
    fn unknown_method_is_an_error() {
        let err = "FOLLOW".parse::<Method>().unwrap_err();
        assert_eq!(err, PerchError::UnknownMethod("FOLLOW".to_string()));
    }

    #[test]
    fn request_uses_camel_case_keys() {
        let request: Request = serde_json::from_value(json!({
            "method": "TWEET",
            "parameterValues": {"text": "hello"}
        }))
        .unwrap();
        assert_eq!(request.method, "TWEET");
        assert_eq!(request.parameter_values["text"], "hello");
    }

    #[test]
    fn response_omits_absent_fields() {
        let value = serde_json::to_value(Response::success(0, None)).unwrap();
        assert_eq!(value, json!({"hasError": false, "count": 0}));
    }

    #[test]
    fn failure_envelope_carries_code() {
        let value =
            serde_json::to_value(Response::failure(&PerchError::NotAuthorized)).unwrap();
        assert_eq!(
            value,
            json!({"hasError": true, "count": 0, "errorCode": "NotAuthorized"})
        );
    }

    #[test]
    fn sign_up_failure_counts_violations() {
        let error = PerchError::SignUpRejected(vec!["a".into(), "b".into()]);
        let response = Response::failure(&error);
        assert_eq!(response.count, 2);
        assert_eq!(response.error_code, Some(json!(["a", "b"])));
    }
}
