use super::{DiagnosticSink, Navigator};

/// Hands deep links to the operating system's URI handler.
#[derive(Debug, Clone)]
pub struct SystemNavigator {
    origin: String,
}

impl SystemNavigator {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
        }
    }
}

impl Navigator for SystemNavigator {
    fn origin(&self) -> String {
        self.origin.clone()
    }

    fn redirect(&self, uri: &str) {
        if let Err(err) = open::that(uri) {
            tracing::warn!(error = %err, "failed to hand off deep link to the system handler");
        }
    }
}

/// Logs reported errors through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, error: &(dyn std::error::Error + 'static)) {
        tracing::error!(error = %error, "failed to fetch credential for VS Code Desktop");
    }
}
