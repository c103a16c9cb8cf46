//! CLI module for the appliance deployer.
//!
//! This module provides the command-line interface for validating
//! documents, resolving bundles and driving libvirt.

mod commands;
mod output;
mod prompt;

pub use commands::{Cli, Commands, DomainCommands, OutputFormat};
pub use output::OutputFormatter;
pub use prompt::{StdioPrompt, prompt_choice, prompt_number, prompt_overcommit};
