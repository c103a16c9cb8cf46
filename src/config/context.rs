//! Installation context.
//!
//! The root directory, target architecture and product identity used by the
//! installer are carried as an explicit value instead of being read from
//! process state inside the engine.

use crate::error::{ConfigError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the product metadata file in the installation root.
pub const PRODUCT_FILE: &str = ".product";

/// Product identity read from the product metadata file.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProductInfo {
    /// Product type (`Product=` line).
    pub product_type: String,
    /// Default appliance name (`Name=` line).
    pub name: String,
}

/// Explicit installation context handed to the engine entry points.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InstallContext {
    /// Installation root directory.
    pub root_dir: PathBuf,
    /// Directory receiving disk images.
    pub export_dir: PathBuf,
    /// Guest architecture (`x86_64` or `i686`).
    pub arch: String,
    /// Product identity.
    pub product: ProductInfo,
}

impl ProductInfo {
    /// Parses `key=value` lines; unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the `Name` key is missing or empty.
    pub fn parse(content: &str, source: &Path) -> Result<Self> {
        let mut product_type = String::new();
        let mut name = String::new();

        for line in content.lines() {
            match line.split_once('=') {
                Some(("Product", value)) => value.trim().clone_into(&mut product_type),
                Some(("Name", value)) => value.trim().clone_into(&mut name),
                _ => {}
            }
        }

        if name.is_empty() {
            return Err(ConfigError::ProductInfo {
                path: source.to_path_buf(),
                message: String::from("missing Name entry"),
            }
            .into());
        }

        Ok(Self { product_type, name })
    }

    /// Loads the product file from `root_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or unusable.
    pub fn load(root_dir: &Path) -> Result<Self> {
        let path = root_dir.join(PRODUCT_FILE);
        if !path.exists() {
            return Err(ConfigError::FileNotFound { path }.into());
        }
        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content, &path)
    }
}

impl InstallContext {
    /// Creates a context from explicit values.
    #[must_use]
    pub fn new(
        root_dir: impl Into<PathBuf>,
        arch: impl Into<String>,
        product: ProductInfo,
    ) -> Self {
        let root_dir = root_dir.into();
        Self {
            export_dir: root_dir.clone(),
            root_dir,
            arch: arch.into(),
            product,
        }
    }

    /// Builds a context for `root_dir`, reading the product file and the
    /// architecture of the running binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the product file cannot be loaded.
    pub fn discover(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let root_dir = root_dir.into();
        let product = ProductInfo::load(&root_dir)?;
        let arch = host_arch(std::env::consts::ARCH);
        debug!(
            "Install context: root={}, arch={arch}, product={}",
            root_dir.display(),
            product.name
        );
        Ok(Self::new(root_dir, arch, product))
    }

    /// Overrides the export directory.
    #[must_use]
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }
}

/// Maps a Rust target architecture name onto the hypervisor's naming.
#[must_use]
pub fn host_arch(target_arch: &str) -> String {
    match target_arch {
        "x86" => String::from("i686"),
        other => other.to_string(),
    }
}
