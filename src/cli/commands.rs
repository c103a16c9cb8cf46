//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Deployer - virtual appliance configuration and provisioning tool.
#[derive(Parser, Debug)]
#[command(name = "deployer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Installation root holding the `.product` file.
    #[arg(short, long, global = true, env = "DEPLOYER_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate an input specification document.
    Validate {
        /// Path to the input specification.
        #[arg(short, long, env = "DEPLOYER_INPUT")]
        input: PathBuf,
    },

    /// List the bundles that fit into the host.
    Bundles {
        /// Path to the bundle catalog.
        #[arg(short, long, env = "DEPLOYER_BUNDLES")]
        catalog: PathBuf,

        /// Host RAM in MB (detected when omitted).
        #[arg(long)]
        host_ram: Option<u64>,

        /// Host CPU count (detected when omitted).
        #[arg(long)]
        host_cpus: Option<u32>,
    },

    /// Resolve a bundle interactively and print the deployment plan.
    Plan {
        /// Path to the bundle catalog.
        #[arg(short, long, env = "DEPLOYER_BUNDLES")]
        catalog: PathBuf,

        /// Path to the storage catalog.
        #[arg(short, long, env = "DEPLOYER_STORAGE")]
        storage: PathBuf,

        /// Input specification bounding a custom configuration.
        #[arg(short, long, env = "DEPLOYER_INPUT")]
        input: Option<PathBuf>,

        /// Directory for disk images (defaults to the installation root).
        #[arg(short, long)]
        export_dir: Option<PathBuf>,

        /// Host RAM in MB (detected when omitted).
        #[arg(long)]
        host_ram: Option<u64>,

        /// Host CPU count (detected when omitted).
        #[arg(long)]
        host_cpus: Option<u32>,
    },

    /// Run libvirt domain commands.
    Domain {
        /// Run on a remote hypervisor (`user@host`).
        #[arg(long)]
        ssh: Option<String>,

        /// Domain subcommand.
        #[command(subcommand)]
        action: DomainCommands,
    },
}

/// Libvirt domain subcommands.
#[derive(Subcommand, Debug)]
pub enum DomainCommands {
    /// Define a domain from an XML file.
    Define {
        /// Domain XML path on the hypervisor host.
        config: String,
    },

    /// Start a domain.
    Start {
        /// Domain name.
        name: String,
    },

    /// Forcefully stop a domain.
    Destroy {
        /// Domain name.
        name: String,
    },

    /// Remove a domain definition.
    Undefine {
        /// Domain name.
        name: String,
    },

    /// Start a domain with the hypervisor.
    Autostart {
        /// Domain name.
        name: String,
    },

    /// Check whether a domain exists.
    Exists {
        /// Domain name.
        name: String,
    },

    /// Show the emulator for an architecture.
    Emulator {
        /// Guest architecture (defaults to the installation's).
        arch: Option<String>,
    },

    /// Show the libvirt version.
    Version,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_plan() {
        let cli = Cli::try_parse_from([
            "deployer",
            "--output",
            "json",
            "plan",
            "-c",
            "bundles.xml",
            "-s",
            "storage.xml",
            "--host-ram",
            "8192",
        ])
        .unwrap();

        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Commands::Plan {
                catalog,
                host_ram,
                host_cpus,
                ..
            } => {
                assert_eq!(catalog, PathBuf::from("bundles.xml"));
                assert_eq!(host_ram, Some(8192));
                assert_eq!(host_cpus, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_domain() {
        let cli = Cli::try_parse_from(["deployer", "domain", "--ssh", "root@hv1", "start", "edge"])
            .unwrap();
        match cli.command {
            Commands::Domain { ssh, action } => {
                assert_eq!(ssh.as_deref(), Some("root@hv1"));
                assert!(matches!(action, DomainCommands::Start { name } if name == "edge"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
