//! # perch-server
//!
//! Single-process backend for a minimal social-network emulation:
//! sign up/in, post tweets, like, reply and retweet, with one flat
//! file per tweet as persistence.
//!
//! The binary runs a synchronous line-oriented loop: each stdin line
//! is one JSON request envelope, each stdout line one JSON response.
//! Requests are handled strictly one at a time; there is no concurrent
//! dispatch.

mod auth;
mod config;
mod dispatcher;
mod registry;
mod session;
mod users;

use std::io::{self, BufRead, Write};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use perch_shared::protocol::{Request, Response};
use perch_shared::PerchError;
use perch_store::TweetStore;

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::registry::TweetRegistry;
use crate::users::UserDirectory;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,perch_server=debug")),
        )
        .with_writer(io::stderr)
        .init();

    info!("Starting perch server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    let store = TweetStore::new(config.storage_path.clone())?;
    let mut dispatcher = Dispatcher::new(UserDirectory::new(), TweetRegistry::new(), store);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => dispatcher.dispatch(&request),
            Err(error) => {
                warn!(%error, "Unparsable request line");
                Response::failure(&PerchError::BadRequest(error.to_string()))
            }
        };
        serde_json::to_writer(&mut out, &response)?;
        out.write_all(b"\n")?;
        out.flush()?;
    }

    info!("Input closed, shutting down");
    Ok(())
}
