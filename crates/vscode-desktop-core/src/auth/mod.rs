mod error;
mod session;
mod session_store;

pub use error::AuthError;
pub use session::DeploymentSession;
pub use session_store::{FileSessionStore, SessionStore};

use crate::config::EnvOverrides;

/// Resolve the session for `profile`, letting the environment override or stand in for it.
pub fn resolve_session<S>(
    store: &S,
    profile: &str,
    overrides: &EnvOverrides,
) -> Result<DeploymentSession, AuthError>
where
    S: SessionStore + ?Sized,
{
    match store.load(profile)? {
        Some(session) => session.apply_overrides(overrides),
        None => DeploymentSession::from_overrides(overrides)?
            .ok_or_else(|| AuthError::NotLoggedIn(profile.to_owned())),
    }
}
