//! Server configuration loaded from environment variables.
//!
//! All settings have defaults so the server can start with zero
//! configuration for local development.

use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Filesystem path where tweet files are stored.
    /// Env: `TWEET_STORAGE_PATH`
    /// Default: `./tweets`
    pub storage_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("./tweets"),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("TWEET_STORAGE_PATH") {
            if path.is_empty() {
                tracing::warn!("Empty TWEET_STORAGE_PATH, using default");
            } else {
                config.storage_path = PathBuf::from(path);
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's
        // EnvFilter, so we do not store it here.

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_storage_path() {
        let config = ServerConfig::default();
        assert_eq!(config.storage_path, PathBuf::from("./tweets"));
    }
}
