use std::path::PathBuf;

use giftdesk::domain::{AuthError, Authenticator, Credentials};
use tracing::instrument;

use super::{Workspace, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Login {
    /// Admin login name (prompted for when omitted)
    #[arg(long, short)]
    username: Option<String>,
}

impl Login {
    #[instrument(skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let workspace = Workspace::open(root)?;
        let authenticator = workspace
            .config()
            .admin
            .as_ref()
            .ok_or(AuthError::NotConfigured)?
            .authenticator();

        let username = match self.username {
            Some(username) => username,
            None => dialoguer::Input::<String>::new()
                .with_prompt("Username")
                .interact_text()?,
        };
        let password = dialoguer::Password::new()
            .with_prompt("Password")
            .interact()?;

        let session = authenticator.authenticate(&Credentials { username, password })?;
        workspace.sessions().save(&session)?;

        println!(
            "{}",
            format!("✅ Signed in as {}", session.user.name).success()
        );
        Ok(())
    }
}

pub fn logout(root: PathBuf) -> anyhow::Result<()> {
    let workspace = Workspace::open(root)?;
    workspace.sessions().clear()?;
    println!("{}", "Signed out".dim());
    Ok(())
}

pub fn whoami(root: PathBuf) -> anyhow::Result<()> {
    let workspace = Workspace::open(root)?;
    match workspace.sessions().current()? {
        Some(session) => {
            println!("{} <{}>", session.user.name, session.user.email);
            println!(
                "{}",
                format!("signed in since {}", session.started_at.format("%Y-%m-%d %H:%M UTC")).dim()
            );
        }
        None => println!("{}", "Not signed in".warning()),
    }
    Ok(())
}
