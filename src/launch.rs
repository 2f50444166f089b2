//! Handing URIs to the operating system.

use std::{io, process::Command};

/// Opens `uri` with the platform's default handler.
///
/// The call returns once the handler has been launched; it says nothing
/// about what the handler does with the URI.
///
/// # Errors
///
/// Returns an error if no launcher is available or it exits unsuccessfully.
pub fn open_uri(uri: &str) -> io::Result<()> {
    let mut command = launcher(uri);
    tracing::debug!(?command, "launching default handler");
    let status = command.status()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("launcher exited with {status}")))
    }
}

#[cfg(target_os = "macos")]
fn launcher(uri: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(uri);
    command
}

#[cfg(target_os = "windows")]
fn launcher(uri: &str) -> Command {
    let mut command = Command::new("rundll32");
    command.arg("url.dll,FileProtocolHandler").arg(uri);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn launcher(uri: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(uri);
    command
}
