//! Storage topology catalog.
//!
//! The `<storage>` document lists disk/partition layouts. Bundles refer to a
//! layout by its zero-based position in the document, so the catalog keeps
//! document order and only checks the index when a layout is looked up.

use crate::config::{decode_document, read_document};
use crate::error::{ConfigError, DocumentKind, Result, StorageError, ValidationRule};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Indexed collection of storage layouts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageCatalog {
    /// Layouts in document order.
    #[serde(rename = "config", default)]
    pub configs: Vec<StorageConfig>,
}

/// A single storage layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Disks in attachment order.
    #[serde(rename = "disk", default)]
    pub disks: Vec<Disk>,
}

/// A virtual disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Disk {
    /// Image path, filled in during plan assembly when empty.
    #[serde(default)]
    pub path: String,
    /// Image format.
    #[serde(default)]
    pub storage_type: StorageType,
    /// Disk size in gigabytes.
    pub size_gb: u64,
    /// Whether the guest boots from this disk.
    #[serde(default)]
    pub bootable: bool,
    /// Keystroke script fed to `fdisk`.
    #[serde(rename = "fdisk_cmd", default)]
    pub fdisk_script: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Partitions in document order.
    #[serde(rename = "partition", default)]
    pub partitions: Vec<Partition>,
}

/// A partition of a disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Partition {
    /// Partition number on the disk.
    pub sequence: u32,
    /// Whether the partition carries the boot flag.
    #[serde(default)]
    pub boot_flag: bool,
    /// Partition size in megabytes.
    pub size_mb: u64,
    /// Filesystem label.
    #[serde(default)]
    pub label: String,
    /// Mount point, or `SWAP`.
    #[serde(default)]
    pub mount_point: String,
    /// Filesystem type.
    #[serde(default)]
    pub file_system: String,
    /// Extra arguments for the filesystem creation tool.
    #[serde(default)]
    pub file_system_args: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// Disk image formats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Raw image.
    #[default]
    Raw,
    /// QEMU copy-on-write image.
    Qcow2,
    /// VMware disk image.
    Vmdk,
}

impl StorageType {
    /// File extension used for images of this type.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Raw => "img",
            Self::Qcow2 => "qcow2",
            Self::Vmdk => "vmdk",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => write!(f, "raw"),
            Self::Qcow2 => write!(f, "qcow2"),
            Self::Vmdk => write!(f, "vmdk"),
        }
    }
}

impl StorageCatalog {
    /// Decodes a storage catalog. No semantic checks are applied.
    ///
    /// # Errors
    ///
    /// Returns a decode error for malformed documents.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let catalog: Self = decode_document(DocumentKind::StorageCatalog, raw)?;
        debug!("Parsed storage catalog with {} configurations", catalog.len());
        Ok(catalog)
    }

    /// Loads and decodes a storage catalog file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = read_document(DocumentKind::StorageCatalog, path.as_ref())?;
        Self::parse(&raw)
    }

    /// Returns the layout at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` when `index >= len()`.
    pub fn lookup(&self, index: usize) -> Result<&StorageConfig> {
        self.configs.get(index).ok_or_else(|| {
            StorageError::IndexOutOfRange {
                index,
                size: self.configs.len(),
            }
            .into()
        })
    }

    /// Number of layouts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Returns true if the catalog holds no layouts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

impl StorageConfig {
    /// Checks that partition sequence numbers increase strictly on every
    /// disk. `index` is the layout's catalog position, used in error paths.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the first out-of-order partition.
    pub fn validate_partitions(&self, index: usize) -> Result<()> {
        for (d, disk) in self.disks.iter().enumerate() {
            for (p, pair) in disk.partitions.windows(2).enumerate() {
                if pair[1].sequence <= pair[0].sequence {
                    return Err(ConfigError::validation(
                        format!("storage.config[{index}].disk[{d}].partition[{}].sequence", p + 1),
                        ValidationRule::PartitionSequenceOrder,
                        format!("{} after {}", pair[1].sequence, pair[0].sequence),
                    )
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Total disk size in gigabytes.
    #[must_use]
    pub fn total_size_gb(&self) -> u64 {
        self.disks.iter().map(|d| d.size_gb).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeployerError;

    const STORAGE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<storage>
  <config>
    <disk>
      <size_gb>5</size_gb>
      <bootable>true</bootable>
      <fdisk_cmd>n\np\n1\n\n+3045M\nn\np\n2\n\n\nt\n2\n82\na\n1\nw\n</fdisk_cmd>
      <description>Topology for release xxxx</description>
      <partition>
        <sequence>1</sequence>
        <size_mb>3045</size_mb>
        <label>SLASH</label>
        <mount_point>/</mount_point>
        <file_system>ext4</file_system>
        <file_system_args></file_system_args>
      </partition>
      <partition>
        <sequence>2</sequence>
        <size_mb>400</size_mb>
        <label>SWAP</label>
        <mount_point>SWAP</mount_point>
        <file_system>swap</file_system>
        <file_system_args></file_system_args>
      </partition>
    </disk>
  </config>
  <config>
    <disk>
      <storage_type>qcow2</storage_type>
      <size_gb>20</size_gb>
      <bootable>true</bootable>
      <partition>
        <sequence>1</sequence>
        <size_mb>20000</size_mb>
        <mount_point>/</mount_point>
        <file_system>xfs</file_system>
      </partition>
    </disk>
    <disk>
      <size_gb>50</size_gb>
    </disk>
  </config>
</storage>"#;

    #[test]
    fn test_parse_storage_catalog() {
        let catalog = StorageCatalog::parse(STORAGE_XML.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 2);

        let first = catalog.lookup(0).unwrap();
        let disk = &first.disks[0];
        assert_eq!(disk.size_gb, 5);
        assert!(disk.bootable);
        assert_eq!(disk.storage_type, StorageType::Raw);
        assert!(disk.fdisk_script.starts_with("n\\np"));
        assert_eq!(disk.partitions.len(), 2);
        assert_eq!(disk.partitions[1].label, "SWAP");
        assert!(disk.partitions[0].file_system_args.is_empty());

        let second = catalog.lookup(1).unwrap();
        assert_eq!(second.disks[0].storage_type, StorageType::Qcow2);
        assert!(second.disks[1].partitions.is_empty());
        assert_eq!(second.total_size_gb(), 70);
    }

    #[test]
    fn test_lookup_out_of_range() {
        let catalog = StorageCatalog::parse(STORAGE_XML.as_bytes()).unwrap();
        let err = catalog.lookup(2).unwrap_err();
        assert!(matches!(
            err,
            DeployerError::Storage(StorageError::IndexOutOfRange { index: 2, size: 2 })
        ));
    }

    #[test]
    fn test_lookup_empty_catalog() {
        let catalog = StorageCatalog::parse(b"<storage></storage>").unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.lookup(0).is_err());
    }

    #[test]
    fn test_partition_sequence_order() {
        let catalog = StorageCatalog::parse(STORAGE_XML.as_bytes()).unwrap();
        assert!(catalog.lookup(0).unwrap().validate_partitions(0).is_ok());

        let mut config = catalog.lookup(0).unwrap().clone();
        config.disks[0].partitions[1].sequence = 1;
        let err = config.validate_partitions(0).unwrap_err();
        match err {
            DeployerError::Config(ConfigError::Validation { field, rule, .. }) => {
                assert_eq!(rule, ValidationRule::PartitionSequenceOrder);
                assert_eq!(field, "storage.config[0].disk[0].partition[1].sequence");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_storage_type_extension() {
        assert_eq!(StorageType::Raw.extension(), "img");
        assert_eq!(StorageType::Qcow2.extension(), "qcow2");
        assert_eq!(StorageType::Vmdk.to_string(), "vmdk");
    }
}
