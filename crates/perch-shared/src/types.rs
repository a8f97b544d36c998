use serde::{Deserialize, Serialize};

/// Tweet identifier, allocated monotonically by the registry.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(transparent)]
pub struct TweetId(pub u64);

impl std::fmt::Display for TweetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TweetId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}
