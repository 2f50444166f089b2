use std::path::{Path, PathBuf};

use giftdesk::{
    Config, JsonCatalog,
    domain::{AdminConfig, auth::password_digest},
    storage::seed_gifts,
};
use tracing::instrument;

use super::{Workspace, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Init {
    /// Admin login name
    #[arg(long, default_value = "admin")]
    admin: String,

    /// Name shown once the admin is signed in
    #[arg(long, default_value = "Admin User")]
    display_name: String,

    /// Admin contact address
    #[arg(long, default_value = "admin@saavi.com")]
    email: String,

    /// Catalog file, relative to the workspace root
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,

    /// Start with an empty catalog instead of the sample gift
    #[arg(long)]
    empty: bool,
}

impl Init {
    #[instrument(skip(self))]
    pub fn run(&self, root: &Path) -> anyhow::Result<()> {
        let config_path = Workspace::config_path(root);
        if config_path.exists() {
            anyhow::bail!(
                "Workspace already initialized (found {})",
                config_path.display()
            );
        }

        let password = dialoguer::Password::new()
            .with_prompt(format!("Password for {}", self.admin))
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?;

        let mut config = Config::default();
        if let Some(catalog) = &self.catalog {
            config.set_catalog(catalog.clone());
        }
        config.admin = Some(AdminConfig {
            username: self.admin.clone(),
            password_sha256: password_digest(&self.admin, &password),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
        });
        config
            .save(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to create config.toml: {e}"))?;

        let catalog_path = root.join(config.catalog());
        if catalog_path.exists() {
            println!(
                "{}",
                format!("Keeping existing catalog at {}", catalog_path.display()).dim()
            );
        } else {
            let gifts = if self.empty { Vec::new() } else { seed_gifts() };
            JsonCatalog::create(catalog_path, gifts)?;
        }

        println!(
            "{}",
            format!("✅ Initialized gift catalog in {}", root.display()).success()
        );
        Ok(())
    }
}
