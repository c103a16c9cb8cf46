//! Provisioning driver module.
//!
//! The driver is the collaborator that acts on a deployment plan. It runs
//! `virsh` commands locally or over `ssh` and serializes them per instance.

mod libvirt;
mod runner;

pub use libvirt::{LibvirtDriver, SUPPORTED_ARCHES};
pub use runner::{CommandRunner, LocalRunner, SshRunner};
