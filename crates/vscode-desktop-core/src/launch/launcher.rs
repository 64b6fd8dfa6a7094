use std::sync::atomic::{AtomicBool, Ordering};

use super::{launch_uri, CredentialProvider, DiagnosticSink, LaunchParams, Navigator};

pub const LAUNCHER_LABEL: &str = "VS Code Desktop";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    VsCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonSize {
    Small,
}

/// What the launcher looks like right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub label: &'static str,
    pub icon: Icon,
    pub size: ButtonSize,
    pub disabled: bool,
}

/// Result of a single [`Launcher::activate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The deep link was handed to the navigator.
    Navigated(String),
    /// The credential fetch failed and was reported to the diagnostic sink.
    Failed,
    /// Another activation was still in flight.
    Ignored,
}

/// Fetches a credential and opens VS Code Desktop on the configured workspace.
///
/// Holds a busy flag that is set for exactly as long as a credential fetch is
/// in flight; activations arriving in that window are ignored.
pub struct Launcher<P, N, D> {
    params: LaunchParams,
    provider: P,
    navigator: N,
    sink: D,
    busy: AtomicBool,
}

impl<P, N, D> Launcher<P, N, D>
where
    P: CredentialProvider,
    N: Navigator,
    D: DiagnosticSink,
{
    pub fn new(params: LaunchParams, provider: P, navigator: N, sink: D) -> Self {
        Self {
            params,
            provider,
            navigator,
            sink,
            busy: AtomicBool::new(false),
        }
    }

    pub fn params(&self) -> &LaunchParams {
        &self.params
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn render(&self) -> ButtonView {
        ButtonView {
            label: LAUNCHER_LABEL,
            icon: Icon::VsCode,
            size: ButtonSize::Small,
            disabled: self.is_busy(),
        }
    }

    pub async fn activate(&self) -> Activation {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            tracing::debug!("launcher busy, ignoring activation");
            return Activation::Ignored;
        };

        tracing::debug!(
            owner = self.params.owner(),
            workspace = self.params.workspace(),
            "fetching credential"
        );
        match self.provider.fetch_credential().await {
            Ok(credential) => {
                let uri = launch_uri(&self.params, &self.navigator.origin(), credential.key());
                self.navigator.redirect(&uri);
                Activation::Navigated(uri)
            }
            Err(err) => {
                self.sink.report(&err);
                Activation::Failed
            }
        }
    }
}

/// Holds the busy flag for the lifetime of one activation.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
