//! Bundle module.
//!
//! This module handles predefined hardware bundles:
//! - Decoding the `<bundle>` catalog
//! - Filtering bundles against host RAM
//! - The interactive choose-or-override resolution loop

mod catalog;
mod resolver;

pub use catalog::{BundleCatalog, BundleConfig};
pub use resolver::{
    BundleResolver, CUSTOM_CONFIGURATION_LABEL, CUSTOM_PROFILE_NAME, Chooser, Confirmer,
    MenuEntry, ResolvedBundle, Selection,
};
