//! Deployment plan fingerprinting.
//!
//! A plan fingerprint is a deterministic hash of everything a provisioning
//! collaborator acts on, so two runs that resolve to the same appliance
//! produce the same fingerprint.

use sha2::{Digest, Sha256};

use crate::bundle::ResolvedBundle;
use crate::storage::{Disk, StorageConfig};

/// Hasher for computing plan fingerprints.
#[derive(Debug, Default)]
pub struct PlanHasher;

impl PlanHasher {
    /// Creates a new plan hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the fingerprint of a resolved appliance.
    #[must_use]
    pub fn hash_plan(
        &self,
        domain_name: &str,
        arch: &str,
        hardware: &ResolvedBundle,
        storage: &StorageConfig,
    ) -> String {
        let mut hasher = Sha256::new();

        hasher.update(domain_name.as_bytes());
        hasher.update(arch.as_bytes());

        // Hardware
        hasher.update(hardware.name.as_bytes());
        hasher.update(hardware.cpus.to_be_bytes());
        hasher.update(hardware.ram_mb.to_be_bytes());
        hasher.update((hardware.storage_config_index as u64).to_be_bytes());

        // Disks are hashed in attachment order since order is significant
        for disk in &storage.disks {
            hasher.update(self.hash_disk(disk).as_bytes());
        }

        hex::encode(hasher.finalize())
    }

    /// Computes a hash for a single disk and its partitions.
    #[must_use]
    pub fn hash_disk(&self, disk: &Disk) -> String {
        let mut hasher = Sha256::new();

        hasher.update(disk.path.as_bytes());
        hasher.update(disk.storage_type.extension().as_bytes());
        hasher.update(disk.size_gb.to_be_bytes());
        hasher.update([u8::from(disk.bootable)]);
        hasher.update(disk.fdisk_script.as_bytes());

        for partition in &disk.partitions {
            hasher.update(partition.sequence.to_be_bytes());
            hasher.update([u8::from(partition.boot_flag)]);
            hasher.update(partition.size_mb.to_be_bytes());
            hasher.update(partition.label.as_bytes());
            hasher.update(partition.mount_point.as_bytes());
            hasher.update(partition.file_system.as_bytes());
            hasher.update(partition.file_system_args.as_bytes());
        }

        hex::encode(hasher.finalize())
    }

    /// Computes a short hash (first 8 characters) for display purposes.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(8).collect()
    }
}
