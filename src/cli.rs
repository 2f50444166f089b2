use std::path::{Path, PathBuf};

mod catalog;
mod edit;
mod image;
mod init;
mod inquire;
mod session;
mod terminal;

use catalog::{Catalog, Export, List, Show};
use clap::ArgAction;
use edit::{Add, Edit, Remove};
use giftdesk::{
    Config, GiftId, JsonCatalog, SessionStore,
    domain::Session,
    media::oauth::TokenCache,
};
use image::Image;
use init::Init;
use inquire::{Curate, Inquire};
use session::{Login, logout, whoami};

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the root of the catalog workspace
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Catalog(Catalog::default()))
            .run(self.root)
            .await
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Set up a workspace with a config, an admin account and a seeded catalog
    Init(Init),

    /// Sign in as the admin
    Login(Login),

    /// Sign out
    Logout,

    /// Show who is signed in
    Whoami,

    /// Show the public catalog (default)
    ///
    /// Only active gifts are shown, as visitors would see them.
    Catalog(Catalog),

    /// List every gift, including inactive ones
    List(List),

    /// Show a single gift
    Show(Show),

    /// Add a gift to the catalog
    Add(Add),

    /// Edit an existing gift
    ///
    /// Only the fields given on the command line change.
    Edit(Edit),

    /// Remove a gift from the catalog
    Remove(Remove),

    /// Export the catalog as JSON
    Export(Export),

    /// Send a sales inquiry
    Inquire(Inquire),

    /// Ask for help choosing a gift
    Curate(Curate),

    /// Preview, upload and manage product images
    #[command(subcommand)]
    Image(Image),
}

impl Command {
    async fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self {
            Self::Init(command) => command.run(&root)?,
            Self::Login(command) => command.run(root)?,
            Self::Logout => logout(root)?,
            Self::Whoami => whoami(root)?,
            Self::Catalog(command) => command.run(root)?,
            Self::List(command) => command.run(root)?,
            Self::Show(command) => command.run(root)?,
            Self::Add(command) => command.run(root)?,
            Self::Edit(command) => command.run(root)?,
            Self::Remove(command) => command.run(root)?,
            Self::Export(command) => command.run(root)?,
            Self::Inquire(command) => command.run(root).await?,
            Self::Curate(command) => command.run(root).await?,
            Self::Image(command) => command.run(root).await?,
        }
        Ok(())
    }
}

/// A catalog workspace: the root directory and its configuration.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    config: Config,
}

impl Workspace {
    const DIR: &'static str = ".giftdesk";

    pub fn config_path(root: &Path) -> PathBuf {
        root.join(Self::DIR).join("config.toml")
    }

    /// Opens the workspace at `root`. Without a config file the defaults apply.
    pub fn open(root: PathBuf) -> anyhow::Result<Self> {
        let path = Self::config_path(&root);
        let config = if path.exists() {
            Config::load(&path).map_err(|e| anyhow::anyhow!("{e}"))?
        } else {
            tracing::debug!("no config at {}, using defaults", path.display());
            Config::default()
        };
        Ok(Self { root, config })
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> anyhow::Result<JsonCatalog> {
        Ok(JsonCatalog::open(self.root.join(self.config.catalog()))?)
    }

    pub fn sessions(&self) -> SessionStore {
        SessionStore::new(self.root.join(Self::DIR).join("session.json"))
    }

    pub fn token_cache(&self) -> TokenCache {
        TokenCache::new(self.root.join(Self::DIR).join("drive-token.json"))
    }

    /// The admin session, or a refusal telling the user to log in.
    pub fn require_admin(&self) -> anyhow::Result<Session> {
        match self.sessions().current()? {
            Some(session) => Ok(session),
            None => anyhow::bail!("Admin login required; run `gift login` first"),
        }
    }
}

/// Parses a gift identifier from the command line.
fn parse_gift_id(s: &str) -> Result<GiftId, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("gift id cannot be empty".to_string());
    }
    Ok(GiftId::from(trimmed))
}
