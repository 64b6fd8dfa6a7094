use std::env;
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;

/// Environment variable overriding the stored deployment URL.
pub const URL_ENV: &str = "CODER_URL";
/// Environment variable overriding the stored session token.
pub const SESSION_TOKEN_ENV: &str = "CODER_SESSION_TOKEN";

/// Locates the per-user configuration directory holding stored sessions.
#[derive(Debug, Clone)]
pub struct ConfigLocator {
    root: PathBuf,
}

impl ConfigLocator {
    /// Attempt to discover the persistent configuration directory, creating it if needed.
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("com", "coder", "vscode-desktop")
            .ok_or(ConfigError::MissingProjectDirs)?;
        Self::at(dirs.config_dir().to_path_buf())
    }

    /// Use `root` as the session directory, creating it owner-only.
    pub fn at(root: PathBuf) -> Result<Self, ConfigError> {
        fs::create_dir_all(&root).map_err(|source| ConfigError::CreateDir {
            path: root.clone(),
            source,
        })?;
        restrict_to_owner(&root)?;
        Ok(Self { root })
    }

    /// Path to the session file for the given profile.
    pub fn session_file(&self, profile: &str) -> PathBuf {
        self.root.join(format!("session-{profile}.json"))
    }
}

/// Values picked up from `CODER_URL` / `CODER_SESSION_TOKEN`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub url: Option<String>,
    pub session_token: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        Self {
            url: read(URL_ENV),
            session_token: read(SESSION_TOKEN_ENV),
        }
    }
}

/// Session tokens live under this directory, so nobody but the owner may list it.
fn restrict_to_owner(dir: &Path) -> Result<(), ConfigError> {
    #[cfg(unix)]
    {
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700)).map_err(|source| {
            ConfigError::Permissions {
                path: dir.to_path_buf(),
                source,
            }
        })
    }
    #[cfg(not(unix))]
    {
        let _ = dir;
        Ok(())
    }
}

/// Errors that can occur when preparing the session directory.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to determine configuration directory for vscode-desktop")]
    MissingProjectDirs,
    #[error("failed to create session directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to restrict permissions on {}: {source}", path.display())]
    Permissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn session_file_appends_profile() {
        let temp_dir = TempDir::new().unwrap();
        let locator = ConfigLocator {
            root: temp_dir.path().to_path_buf(),
        };
        let path = locator.session_file("default");
        assert!(path.ends_with("session-default.json"));
    }

    #[cfg(unix)]
    #[test]
    fn session_directory_is_created_owner_only() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("nested").join("sessions");
        let locator = ConfigLocator::at(root.clone()).unwrap();

        let mode = fs::metadata(&root).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
        assert!(locator.session_file("work").starts_with(&root));
    }

    #[test]
    fn create_failure_names_the_path() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("file");
        fs::write(&blocker, b"not a directory").unwrap();

        let err = ConfigLocator::at(blocker.join("sessions")).unwrap_err();
        assert!(matches!(err, ConfigError::CreateDir { .. }));
        assert!(err.to_string().contains("sessions"));
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let overrides = EnvOverrides::from_lookup(|key| match key {
            URL_ENV => Some("  ".into()),
            SESSION_TOKEN_ENV => Some(" secret \n".into()),
            _ => None,
        });
        assert_eq!(overrides.url, None);
        assert_eq!(overrides.session_token.as_deref(), Some("secret"));
    }

    #[test]
    fn missing_overrides_are_none() {
        let overrides = EnvOverrides::from_lookup(|_| None);
        assert_eq!(overrides, EnvOverrides::default());
    }
}
