use super::LaunchError;

/// Identifies the workspace (and optionally agent and folder) to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchParams {
    owner: String,
    workspace: String,
    agent: Option<String>,
    folder: Option<String>,
}

impl LaunchParams {
    /// Owner and workspace must both be non-empty.
    pub fn new(owner: impl Into<String>, workspace: impl Into<String>) -> Result<Self, LaunchError> {
        let owner = owner.into();
        let workspace = workspace.into();
        if owner.is_empty() {
            return Err(LaunchError::MissingField("owner"));
        }
        if workspace.is_empty() {
            return Err(LaunchError::MissingField("workspace"));
        }
        Ok(Self {
            owner,
            workspace,
            agent: None,
            folder: None,
        })
    }

    pub fn with_agent(mut self, agent: Option<String>) -> Self {
        self.agent = non_empty(agent);
        self
    }

    pub fn with_folder(mut self, folder: Option<String>) -> Self {
        self.folder = non_empty(folder);
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn agent(&self) -> Option<&str> {
        self.agent.as_deref()
    }

    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_owner_is_rejected() {
        let err = LaunchParams::new("", "devbox").unwrap_err();
        assert!(matches!(err, LaunchError::MissingField("owner")));
    }

    #[test]
    fn empty_workspace_is_rejected() {
        let err = LaunchParams::new("alice", "").unwrap_err();
        assert!(matches!(err, LaunchError::MissingField("workspace")));
    }

    #[test]
    fn empty_optionals_become_absent() {
        let params = LaunchParams::new("alice", "devbox")
            .unwrap()
            .with_agent(Some(String::new()))
            .with_folder(Some("/srv".into()));
        assert_eq!(params.agent(), None);
        assert_eq!(params.folder(), Some("/srv"));
    }
}
