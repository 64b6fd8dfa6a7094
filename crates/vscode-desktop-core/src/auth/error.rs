use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced by session storage and loading.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("session file {}: {source}", path.display())]
    SessionFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("unsupported session file version {0}")]
    UnsupportedSessionVersion(u32),
    #[error("no session stored for profile '{0}'")]
    NotLoggedIn(String),
}
