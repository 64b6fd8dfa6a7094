use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::EnvOverrides;

use super::AuthError;

/// A logged-in Coder deployment: where it lives and the token that talks to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentSession {
    pub url: Url,
    pub session_token: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default = "default_created_at")]
    pub created_at: DateTime<Utc>,
}

fn default_created_at() -> DateTime<Utc> {
    Utc::now()
}

impl DeploymentSession {
    pub fn new(url: Url, session_token: String) -> Self {
        Self {
            url,
            session_token,
            username: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// `scheme://host[:port]` of the deployment, without a trailing slash.
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    /// Replace URL and token with any values set in the environment.
    ///
    /// The stored username only describes the stored deployment and token, so
    /// it is dropped as soon as either is overridden.
    pub fn apply_overrides(mut self, overrides: &EnvOverrides) -> Result<Self, AuthError> {
        if let Some(url) = &overrides.url {
            self.url = Url::parse(url)?;
            self.username = None;
        }
        if let Some(token) = &overrides.session_token {
            self.session_token = token.clone();
            self.username = None;
        }
        Ok(self)
    }

    /// Build a session purely from the environment, if both values are present.
    pub fn from_overrides(overrides: &EnvOverrides) -> Result<Option<Self>, AuthError> {
        match (&overrides.url, &overrides.session_token) {
            (Some(url), Some(token)) => Ok(Some(Self::new(Url::parse(url)?, token.clone()))),
            _ => Ok(None),
        }
    }
}
