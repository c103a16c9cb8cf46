//! Libvirt domain driver.
//!
//! Issues `virsh` commands through a [`CommandRunner`]. Every call holds the
//! driver's lock, so at most one command is in flight per driver instance
//! and the resolve-then-provision sequence is never interleaved. Names and
//! paths are shell-quoted since runners hand the line to a shell.

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::decode_document;
use crate::error::{DocumentKind, DriverError, Result};

use super::runner::CommandRunner;

/// Architectures the driver can look up an emulator for.
pub const SUPPORTED_ARCHES: &[&str] = &["x86_64", "i686"];

/// Driver for libvirt domain lifecycle commands.
#[derive(Debug)]
pub struct LibvirtDriver<R: CommandRunner> {
    runner: R,
    lock: Mutex<()>,
}

#[derive(Debug, Deserialize)]
struct Capabilities {
    #[serde(rename = "guest", default)]
    guests: Vec<Guest>,
}

#[derive(Debug, Deserialize)]
struct Guest {
    arch: GuestArch,
}

#[derive(Debug, Deserialize)]
struct GuestArch {
    #[serde(rename = "@name")]
    name: String,
    #[serde(default)]
    emulator: Option<String>,
}

/// Quotes `arg` for a POSIX shell unless it only holds safe characters.
fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@=+,%".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

impl<R: CommandRunner> LibvirtDriver<R> {
    /// Creates a driver over `runner`.
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            lock: Mutex::new(()),
        }
    }

    async fn run(&self, command: &str) -> Result<String> {
        let _guard = self.lock.lock().await;
        self.runner.run(command).await
    }

    /// Defines a domain from an XML file on the hypervisor host.
    ///
    /// # Errors
    ///
    /// Returns an error if `virsh define` fails.
    pub async fn define_domain(&self, domain_config: &str) -> Result<()> {
        info!("Defining domain from {domain_config}");
        self.run(&format!("virsh define {}", shell_quote(domain_config))).await?;
        Ok(())
    }

    /// Starts a defined domain.
    ///
    /// # Errors
    ///
    /// Returns an error if `virsh start` fails.
    pub async fn start_domain(&self, name: &str) -> Result<()> {
        info!("Starting domain {name}");
        self.run(&format!("virsh start {}", shell_quote(name))).await?;
        Ok(())
    }

    /// Forcefully stops a running domain.
    ///
    /// # Errors
    ///
    /// Returns an error if `virsh destroy` fails.
    pub async fn destroy_domain(&self, name: &str) -> Result<()> {
        info!("Destroying domain {name}");
        self.run(&format!("virsh destroy {}", shell_quote(name))).await?;
        Ok(())
    }

    /// Removes a domain definition.
    ///
    /// # Errors
    ///
    /// Returns an error if `virsh undefine` fails.
    pub async fn undefine_domain(&self, name: &str) -> Result<()> {
        info!("Undefining domain {name}");
        self.run(&format!("virsh undefine {}", shell_quote(name))).await?;
        Ok(())
    }

    /// Marks a domain to start with the hypervisor.
    ///
    /// # Errors
    ///
    /// Returns an error if `virsh autostart` fails.
    pub async fn set_autostart(&self, name: &str) -> Result<()> {
        info!("Enabling autostart for domain {name}");
        self.run(&format!("virsh autostart {}", shell_quote(name))).await?;
        Ok(())
    }

    /// Returns true if the hypervisor knows the domain.
    ///
    /// # Errors
    ///
    /// Returns an error only if `virsh` cannot be started at all.
    pub async fn domain_exists(&self, name: &str) -> Result<bool> {
        match self.run(&format!("virsh dominfo {}", shell_quote(name))).await {
            Ok(_) => Ok(true),
            Err(crate::error::DeployerError::Driver(DriverError::CommandFailed { .. })) => {
                debug!("Domain {name} not found");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Returns the emulator path the hypervisor uses for `arch`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedArch` for architectures other than `x86_64` and
    /// `i686`, and `UnexpectedOutput` if the capabilities list no emulator.
    pub async fn emulator(&self, arch: &str) -> Result<String> {
        if !SUPPORTED_ARCHES.contains(&arch) {
            return Err(DriverError::UnsupportedArch {
                arch: arch.to_string(),
            }
            .into());
        }

        let command = "virsh capabilities";
        let out = self.run(command).await?;
        let caps: Capabilities = decode_document(DocumentKind::Capabilities, out.as_bytes())?;

        caps.guests
            .into_iter()
            .find(|g| g.arch.name == arch)
            .and_then(|g| g.arch.emulator)
            .ok_or_else(|| {
                DriverError::UnexpectedOutput {
                    command: command.to_string(),
                    message: format!("no emulator listed for {arch}"),
                }
                .into()
            })
    }

    /// Returns the libvirt version.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedOutput` if the version line has fewer than three
    /// words.
    pub async fn version(&self) -> Result<String> {
        let command = "libvirtd --version";
        let out = self.run(command).await?;
        out.split_whitespace()
            .nth(2)
            .map(String::from)
            .ok_or_else(|| {
                DriverError::UnexpectedOutput {
                    command: command.to_string(),
                    message: format!("cannot read version from '{}'", out.trim()),
                }
                .into()
            })
    }
}
