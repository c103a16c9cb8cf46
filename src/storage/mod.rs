//! Storage topology module.
//!
//! Decodes the `<storage>` document into an indexed catalog of disk and
//! partition layouts and provides bounds-checked lookup by index.

mod topology;

pub use topology::{Disk, Partition, StorageCatalog, StorageConfig, StorageType};
