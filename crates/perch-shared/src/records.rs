//! Serialized tweet and user shapes.
//!
//! The same record doubles as the persisted file content and as the
//! elements of a response envelope's `result` array, so the shape is
//! part of the interface contract. Replies and retweets nest as full
//! records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::User;
use crate::types::TweetId;

/// Public view of a user. The credential is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub followers: Vec<String>,
    pub followings: Vec<String>,
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            birth_date: user.birth_date,
            followers: user.followers.clone(),
            followings: user.followings.clone(),
        }
    }
}

/// Fully resolved tweet, with replies and retweets nested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TweetRecord {
    pub id: TweetId,
    pub author: UserRecord,
    pub text: String,
    pub likes: Vec<String>,
    pub replies: Vec<TweetRecord>,
    pub send_date: DateTime<Utc>,
    pub retweets: Vec<TweetRecord>,
    /// Id of the original tweet when this record is a retweet.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub retweet_of: Option<TweetId>,
    /// Username of the resharing user when this record is a retweet.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub retweeted_by: Option<String>,
}
