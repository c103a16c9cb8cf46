//! Hardware bundle catalog.
//!
//! A bundle is a named combination of CPU count, RAM size and a storage
//! layout index. Document order is the display order.

use crate::config::{decode_document, read_document};
use crate::error::{DocumentKind, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Ordered list of predefined bundles.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleCatalog {
    /// Bundles in document order.
    #[serde(rename = "config", default)]
    pub configs: Vec<BundleConfig>,
}

/// A predefined hardware bundle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleConfig {
    /// Display name.
    pub name: String,
    /// Virtual CPU count.
    pub cpus: u32,
    /// RAM size in megabytes.
    pub ram: u64,
    /// Index into the storage catalog.
    pub storage_config_index: usize,
}

impl BundleCatalog {
    /// Decodes a bundle catalog.
    ///
    /// # Errors
    ///
    /// Returns a decode error for malformed documents.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let catalog: Self = decode_document(DocumentKind::BundleCatalog, raw)?;
        debug!("Parsed bundle catalog with {} bundles", catalog.configs.len());
        Ok(catalog)
    }

    /// Loads and decodes a bundle catalog file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = read_document(DocumentKind::BundleCatalog, path.as_ref())?;
        Self::parse(&raw)
    }

    /// Returns the bundles whose RAM fits into `host_ram_mb`, in document
    /// order. The catalog itself is left untouched.
    #[must_use]
    pub fn eligible(&self, host_ram_mb: u64) -> Vec<&BundleConfig> {
        self.configs.iter().filter(|c| c.ram <= host_ram_mb).collect()
    }
}

impl BundleConfig {
    /// Menu label, e.g. `Test1           [ vCPU 2  | RAM 4096MB]`.
    #[must_use]
    pub fn menu_label(&self) -> String {
        format!("{:<15} [ vCPU {:<2} | RAM {:<3}MB]", self.name, self.cpus, self.ram)
    }
}
