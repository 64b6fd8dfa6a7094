use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ConfigLocator;

use super::{AuthError, DeploymentSession};

/// Persistence abstraction for deployment sessions.
pub trait SessionStore {
    fn load(&self, profile: &str) -> Result<Option<DeploymentSession>, AuthError>;
    fn save(&self, profile: &str, session: &DeploymentSession) -> Result<(), AuthError>;
    fn delete(&self, profile: &str) -> Result<(), AuthError>;
}

/// Filesystem-backed session storage located in the user configuration directory.
pub struct FileSessionStore {
    locator: ConfigLocator,
}

impl FileSessionStore {
    pub fn new(locator: ConfigLocator) -> Self {
        Self { locator }
    }

    pub fn with_default_locator() -> Result<Self, AuthError> {
        Ok(Self::new(ConfigLocator::new()?))
    }

    /// Write an owner-only sibling temp file, then rename it over `path`.
    fn replace_file(path: &Path, payload: &str) -> Result<(), AuthError> {
        let staging = path.with_extension("json.tmp");
        let result = Self::write_owner_only(&staging, payload)
            .and_then(|()| fs::rename(&staging, path));
        if result.is_err() {
            let _ = fs::remove_file(&staging);
        }
        result.map_err(|source| session_file_error(path, source))
    }

    fn write_owner_only(path: &Path, payload: &str) -> std::io::Result<()> {
        let mut options = OpenOptions::new();
        options.create(true).write(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;
        file.write_all(payload.as_bytes())?;
        file.sync_all()
    }
}

fn session_file_error(path: &Path, source: std::io::Error) -> AuthError {
    AuthError::SessionFile {
        path: PathBuf::from(path),
        source,
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self, profile: &str) -> Result<Option<DeploymentSession>, AuthError> {
        let path = self.locator.session_file(profile);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(session_file_error(&path, err)),
        };
        let envelope: SessionEnvelope = serde_json::from_str(&raw)?;
        if envelope.version != ENVELOPE_VERSION {
            return Err(AuthError::UnsupportedSessionVersion(envelope.version));
        }
        if envelope.profile != profile {
            tracing::warn!(
                profile,
                stored = %envelope.profile,
                "session file was written for a different profile"
            );
        }
        Ok(Some(envelope.session))
    }

    fn save(&self, profile: &str, session: &DeploymentSession) -> Result<(), AuthError> {
        let path = self.locator.session_file(profile);
        let envelope = SessionEnvelope {
            profile: profile.to_owned(),
            session: session.clone(),
            version: ENVELOPE_VERSION,
        };
        let payload = serde_json::to_string_pretty(&envelope)?;
        tracing::debug!(profile, path = %path.display(), "saving deployment session");
        Self::replace_file(&path, &payload)
    }

    fn delete(&self, profile: &str) -> Result<(), AuthError> {
        let path = self.locator.session_file(profile);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(profile, "removed deployment session");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(session_file_error(&path, err)),
        }
    }
}

const ENVELOPE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SessionEnvelope {
    version: u32,
    profile: String,
    session: DeploymentSession,
}
