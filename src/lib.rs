// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Appliance Deployer
//!
//! A configuration validation and resolution engine for virtual appliance
//! installers.
//!
//! ## Overview
//!
//! Before a virtual machine is provisioned, three declarative documents are
//! resolved into a concrete, validated hardware and storage profile:
//!
//! - The **input specification** (`<input_data>`): CPU and RAM ranges,
//!   networks with their modes, NIC allow/deny rules
//! - The **bundle catalog** (`<bundle>`): predefined hardware profiles
//! - The **storage catalog** (`<storage>`): disk and partition layouts
//!
//! Malformed or internally inconsistent documents are rejected early with
//! a precise field, rule and value.
//!
//! ## Architecture
//!
//! 1. **Parse**: documents are decoded from XML and validated fail-fast
//! 2. **Resolve**: bundles are filtered against host RAM, and the operator
//!    picks one (confirming CPU overcommit) or opts for a custom profile
//! 3. **Plan**: the accepted profile is joined with its storage layout
//!
//! ## Modules
//!
//! - [`config`]: Input specification parsing and validation
//! - [`storage`]: Storage catalog decoding and lookup
//! - [`bundle`]: Bundle catalog and interactive resolution
//! - [`host`]: Host capability facts
//! - [`planner`]: Deployment plan assembly
//! - [`driver`]: Libvirt provisioning driver
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```xml
//! <input_data>
//!   <cpu>
//!     <configure>true</configure>
//!     <min>2</min>
//!     <max>4</max>
//!     <default_value>2</default_value>
//!   </cpu>
//!   <ram>
//!     <configure>true</configure>
//!     <min>2500</min>
//!     <max>0</max>
//!     <default_value>2500</default_value>
//!   </ram>
//!   <networks>
//!     <configure>true</configure>
//!     <network name="mgmt" max_ifaces="1">
//!       <mode type="bridged" vnic_driver="virtio"/>
//!     </network>
//!   </networks>
//! </input_data>
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod bundle;
pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod host;
pub mod planner;
pub mod storage;

// ============================================================================
// Re-exports
// ============================================================================

pub use bundle::{BundleCatalog, BundleResolver, Chooser, Confirmer, ResolvedBundle};
pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{InputSpec, InputSpecParser, InputValidator, InstallContext};
pub use driver::{CommandRunner, LibvirtDriver};
pub use error::{DeployerError, Result};
pub use host::{HostInfo, LocalHostInfo};
pub use planner::DeploymentPlan;
pub use storage::{StorageCatalog, StorageConfig};

// ============================================================================
// Engine entry points
// ============================================================================

/// Decodes and validates an input specification document.
///
/// # Errors
///
/// Returns a decode error for malformed XML and the first validation
/// failure otherwise.
pub fn parse_input_spec(raw: &[u8]) -> Result<InputSpec> {
    InputSpecParser::new().parse(raw)
}

/// Decodes a storage catalog document.
///
/// # Errors
///
/// Returns a decode error for malformed XML.
pub fn parse_storage_catalog(raw: &[u8]) -> Result<StorageCatalog> {
    StorageCatalog::parse(raw)
}

/// Returns the storage configuration at `index`.
///
/// # Errors
///
/// Returns `IndexOutOfRange` if `index` is not below the catalog size.
pub fn lookup_storage_config(catalog: &StorageCatalog, index: usize) -> Result<&StorageConfig> {
    catalog.lookup(index)
}

/// Decodes a bundle catalog document.
///
/// # Errors
///
/// Returns a decode error for malformed XML.
pub fn parse_bundle_catalog(raw: &[u8]) -> Result<BundleCatalog> {
    BundleCatalog::parse(raw)
}

/// Runs the interactive bundle resolution for a host.
///
/// Returns `Ok(None)` when the operator opts for a custom configuration.
///
/// # Errors
///
/// Returns `NoEligibleConfiguration` if no bundle fits `host_ram_mb`, and
/// propagates collaborator errors.
pub fn resolve_bundle<C, F>(
    catalog: &BundleCatalog,
    host_ram_mb: u64,
    host_cpu_count: u32,
    chooser: &mut C,
    confirmer: &mut F,
) -> Result<Option<ResolvedBundle>>
where
    C: Chooser + ?Sized,
    F: Confirmer + ?Sized,
{
    BundleResolver::new(catalog).resolve(host_ram_mb, host_cpu_count, chooser, confirmer)
}
