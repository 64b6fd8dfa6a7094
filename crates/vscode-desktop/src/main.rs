use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use url::Url;
use vscode_desktop_core::api::{CoderClient, User};
use vscode_desktop_core::auth::{
    resolve_session, DeploymentSession, FileSessionStore, SessionStore,
};
use vscode_desktop_core::config::EnvOverrides;
use vscode_desktop_core::launch::{
    Activation, LaunchParams, Launcher, Navigator, SystemNavigator, TracingSink,
};

const DEFAULT_PROFILE: &str = "default";

#[derive(Parser, Debug)]
#[command(author, version, about = "Open Coder workspaces in VS Code Desktop")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a session token for a Coder deployment
    Login(LoginArgs),
    /// Forget the stored session for a profile
    Logout(ProfileArgs),
    /// Show the user the stored session belongs to
    Whoami(WhoamiArgs),
    /// Open a workspace in VS Code Desktop
    Open(OpenArgs),
}

#[derive(Args, Debug)]
struct ProfileArgs {
    /// Profile name for the stored session
    #[arg(long, default_value = DEFAULT_PROFILE)]
    profile: String,
}

#[derive(Args, Debug)]
struct LoginArgs {
    /// Deployment URL (e.g. https://coder.example.com)
    url: String,
    /// Session token; falls back to CODER_SESSION_TOKEN
    #[arg(long)]
    token: Option<String>,
    #[command(flatten)]
    profile: ProfileArgs,
}

#[derive(Args, Debug)]
struct WhoamiArgs {
    #[command(flatten)]
    profile: ProfileArgs,
    /// Output raw JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct OpenArgs {
    /// Workspace as `[owner/]name[.agent]`
    workspace: String,
    /// Workspace owner; defaults to the logged-in user
    #[arg(long)]
    owner: Option<String>,
    /// Agent to connect to
    #[arg(long)]
    agent: Option<String>,
    /// Folder to open inside the workspace
    #[arg(long)]
    folder: Option<String>,
    /// Print the deep link instead of handing it to the system
    #[arg(long)]
    no_open: bool,
    #[command(flatten)]
    profile: ProfileArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Login(args) => login(args).await?,
        Commands::Logout(args) => logout(args)?,
        Commands::Whoami(args) => whoami(args).await?,
        Commands::Open(args) => open_workspace(args).await?,
    }
    Ok(())
}

async fn login(args: LoginArgs) -> Result<()> {
    let overrides = EnvOverrides::from_env();
    let token = args
        .token
        .or(overrides.session_token)
        .ok_or_else(|| anyhow!("no session token given; pass --token or set CODER_SESSION_TOKEN"))?;
    let url = Url::parse(&args.url).context("invalid deployment URL")?;
    let session = DeploymentSession::new(url, token);

    let client = CoderClient::from_session(&session).context("failed to build API client")?;
    let user = client
        .current_user()
        .await
        .context("session token was rejected by the deployment")?;
    let session = session.with_username(user.username.clone());

    let store =
        FileSessionStore::with_default_locator().context("unable to initialise session store")?;
    store
        .save(&args.profile.profile, &session)
        .context("failed to store session")?;

    println!(
        "Logged in to {} as {}. Session stored for profile '{}'.",
        session.origin(),
        user.username,
        args.profile.profile
    );
    Ok(())
}

fn logout(args: ProfileArgs) -> Result<()> {
    let store =
        FileSessionStore::with_default_locator().context("unable to initialise session store")?;
    store
        .delete(&args.profile)
        .context("failed to remove stored session")?;
    println!("Deleted session for profile '{}'.", args.profile);
    Ok(())
}

async fn whoami(args: WhoamiArgs) -> Result<()> {
    let session = load_session(&args.profile.profile)?;
    let client = CoderClient::from_session(&session).context("failed to build API client")?;
    let user = client.current_user().await.context("API request failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        render_user(&user, &session);
    }
    Ok(())
}

fn render_user(user: &User, session: &DeploymentSession) {
    println!("Deployment: {}", session.origin());
    println!("Username  : {}", user.username);
    if let Some(email) = &user.email {
        println!("Email     : {}", email);
    }
    println!("User ID   : {}", user.id);
}

async fn open_workspace(args: OpenArgs) -> Result<()> {
    let session = load_session(&args.profile.profile)?;
    let target = WorkspaceTarget::parse(&args.workspace)?;

    let client = CoderClient::from_session(&session).context("failed to build API client")?;
    let owner = resolve_owner(args.owner.or(target.owner), &session, &client).await?;
    let params = LaunchParams::new(owner, target.workspace)?
        .with_agent(args.agent.or(target.agent))
        .with_folder(args.folder);

    let navigator = if args.no_open {
        CliNavigator::Print(session.origin())
    } else {
        CliNavigator::System(SystemNavigator::new(session.origin()))
    };
    let launcher = Launcher::new(params, client, navigator, TracingSink);
    let label = launcher.render().label;

    match launcher.activate().await {
        Activation::Navigated(_) => {
            if !args.no_open {
                let params = launcher.params();
                eprintln!("Opening {}/{} in {label}.", params.owner(), params.workspace());
            }
            Ok(())
        }
        Activation::Failed => bail!("could not obtain a credential to open {label}"),
        Activation::Ignored => bail!("a launch is already in progress"),
    }
}

/// Explicit owner, else the stored username, else whoever the token belongs to.
async fn resolve_owner(
    explicit: Option<String>,
    session: &DeploymentSession,
    client: &CoderClient,
) -> Result<String> {
    if let Some(owner) = explicit.or_else(|| session.username.clone()) {
        return Ok(owner);
    }
    let user = client
        .current_user()
        .await
        .context("unable to determine workspace owner; pass --owner")?;
    Ok(user.username)
}

fn load_session(profile: &str) -> Result<DeploymentSession> {
    let store =
        FileSessionStore::with_default_locator().context("unable to initialise session store")?;
    resolve_session(&store, profile, &EnvOverrides::from_env()).map_err(|err| {
        anyhow!("{err}; run `vscode-desktop login <url>` or set CODER_URL and CODER_SESSION_TOKEN")
    })
}

enum CliNavigator {
    System(SystemNavigator),
    Print(String),
}

impl Navigator for CliNavigator {
    fn origin(&self) -> String {
        match self {
            CliNavigator::System(navigator) => navigator.origin(),
            CliNavigator::Print(origin) => origin.clone(),
        }
    }

    fn redirect(&self, uri: &str) {
        match self {
            CliNavigator::System(navigator) => navigator.redirect(uri),
            CliNavigator::Print(_) => println!("{uri}"),
        }
    }
}

/// `[owner/]name[.agent]`, as accepted by the Coder CLI.
#[derive(Debug, PartialEq, Eq)]
struct WorkspaceTarget {
    owner: Option<String>,
    workspace: String,
    agent: Option<String>,
}

impl WorkspaceTarget {
    fn parse(input: &str) -> Result<Self> {
        let (owner, rest) = match input.split_once('/') {
            Some((_, rest)) if rest.contains('/') => {
                bail!("invalid workspace '{input}'; expected [owner/]name[.agent]")
            }
            Some((owner, rest)) => (Some(owner.to_owned()), rest),
            None => (None, input),
        };
        let (workspace, agent) = match rest.split_once('.') {
            Some((workspace, agent)) => (workspace, Some(agent.to_owned())),
            None => (rest, None),
        };
        if workspace.is_empty() || owner.as_deref() == Some("") || agent.as_deref() == Some("") {
            bail!("invalid workspace '{input}'; expected [owner/]name[.agent]");
        }
        Ok(Self {
            owner,
            workspace: workspace.to_owned(),
            agent,
        })
    }
}
