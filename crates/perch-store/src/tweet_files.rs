//! One file per tweet, named `"<tweetId> <authorUsername>"`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use perch_shared::records::TweetRecord;
use perch_shared::types::TweetId;

use crate::error::StoreError;
use crate::Result;

/// Handle to the tweet storage directory.
#[derive(Debug, Clone)]
pub struct TweetStore {
    base_path: PathBuf,
}

impl TweetStore {
    /// Open the store, creating the directory if missing.
    pub fn new(base_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_path)?;
        info!(path = %base_path.display(), "Tweet store initialized");
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Persist a tweet record, overwriting any previous version.
    pub fn write(&self, record: &TweetRecord) -> Result<()> {
        let path = self.tweet_path(record.id, &record.author.username);
        let json = serde_json::to_string(record)?;
        fs::write(&path, json)?;
        debug!(id = %record.id, author = %record.author.username, "Stored tweet");
        Ok(())
    }

    /// Load one tweet back from its file.
    ///
    /// A missing file is [`StoreError::NotFound`]; undecodable content
    /// is [`StoreError::Malformed`]. Neither is ever reported as
    /// "zero tweets".
    pub fn read(&self, id: TweetId, username: &str) -> Result<TweetRecord> {
        let path = self.tweet_path(id, username);
        if !path.exists() {
            return Err(StoreError::NotFound {
                id,
                username: username.to_string(),
            });
        }
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|source| StoreError::Malformed {
            name: file_name(id, username),
            source,
        })
    }

    /// Scan the storage directory and return every persisted tweet
    /// whose author is in `followings`, keyed by id.
    ///
    /// Entries whose name does not parse as `"<id> <username>"` are
    /// skipped with a warning; a file that matches a followed author
    /// but fails to decode aborts the scan with [`StoreError::Malformed`].
    pub fn list_visible(&self, followings: &[String]) -> Result<BTreeMap<TweetId, TweetRecord>> {
        let mut visible = BTreeMap::new();
        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                warn!("Skipping tweet file with non-UTF-8 name");
                continue;
            };
            let Some((id, author)) = parse_file_name(name) else {
                warn!(name, "Skipping unrecognized file in tweet storage");
                continue;
            };
            if followings.iter().any(|followed| followed == author) {
                let record = self.read(id, author)?;
                visible.insert(id, record);
            }
        }
        Ok(visible)
    }

    /// Delete a tweet's file. Returns `Ok(false)` when it was already
    /// absent; absence is reported, not raised.
    pub fn remove(&self, id: TweetId, username: &str) -> Result<bool> {
        let path = self.tweet_path(id, username);
        if !path.exists() {
            info!(id = %id, author = username, "No tweet file to delete");
            return Ok(false);
        }
        fs::remove_file(&path)?;
        debug!(id = %id, author = username, "Deleted tweet file");
        Ok(true)
    }

    fn tweet_path(&self, id: TweetId, username: &str) -> PathBuf {
        self.base_path.join(file_name(id, username))
    }
}

fn file_name(id: TweetId, username: &str) -> String {
    format!("{id} {username}")
}

/// Split `"<id> <username>"` back into its parts.
fn parse_file_name(name: &str) -> Option<(TweetId, &str)> {
    let (id, username) = name.split_once(' ')?;
    if username.is_empty() {
        return None;
    }
    let id = id.parse::<u64>().ok()?;
    Some((TweetId(id), username))
}
