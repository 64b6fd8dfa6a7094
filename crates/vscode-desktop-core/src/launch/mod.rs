//! Launching VS Code Desktop against a remote workspace.
//!
//! A [`Launcher`] fetches a fresh credential, builds the
//! `vscode://coder.coder-remote/open` deep link, and hands it to a
//! [`Navigator`]. Fetch failures go to a [`DiagnosticSink`] and never
//! propagate.

mod launcher;
mod navigator;
mod params;
mod uri;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub use launcher::{Activation, ButtonSize, ButtonView, Icon, Launcher, LAUNCHER_LABEL};
pub use navigator::{SystemNavigator, TracingSink};
pub use params::LaunchParams;
pub use uri::{launch_uri, LAUNCH_URI_PREFIX};

/// Errors raised while preparing a launch.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("{0} must not be empty")]
    MissingField(&'static str),
}

/// One-time token handed to VS Code.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    key: String,
}

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential").field("key", &"<redacted>").finish()
    }
}

/// Source of credentials. Every call is a live, single-attempt fetch.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn fetch_credential(&self) -> Result<Credential, Self::Error>;
}

/// Where the deep link is sent, and the origin it reports back to VS Code.
pub trait Navigator {
    fn origin(&self) -> String;

    /// Fire-and-forget; the outcome of the handoff is not observable.
    fn redirect(&self, uri: &str);
}

/// Receives non-fatal errors.
pub trait DiagnosticSink {
    fn report(&self, error: &(dyn std::error::Error + 'static));
}
