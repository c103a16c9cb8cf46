//! Deployment plan assembly.
//!
//! The bundle catalog and the storage catalog are parsed independently, so
//! the bundle's storage index is only checked here, once both documents
//! are loaded.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};
use uuid::Uuid;

use crate::bundle::ResolvedBundle;
use crate::config::InstallContext;
use crate::error::Result;
use crate::storage::{Disk, StorageCatalog, StorageConfig};

use super::hash::PlanHasher;

/// A fully validated deployment descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentPlan {
    /// Unique plan identifier.
    pub plan_id: Uuid,
    /// When the plan was assembled.
    pub created_at: DateTime<Utc>,
    /// Name of the virtual machine.
    pub domain_name: String,
    /// Guest architecture.
    pub arch: String,
    /// Accepted hardware profile.
    pub hardware: ResolvedBundle,
    /// Storage layout with image paths resolved.
    pub storage: StorageConfig,
    /// Deterministic hash of the plan contents.
    pub fingerprint: String,
}

impl DeploymentPlan {
    /// Assembles a plan from an accepted hardware profile and the storage
    /// catalog.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if the profile references a missing storage
    /// layout, or a validation error if the layout's partition sequences are
    /// not strictly increasing.
    pub fn assemble(
        ctx: &InstallContext,
        hardware: &ResolvedBundle,
        catalog: &StorageCatalog,
    ) -> Result<Self> {
        let index = hardware.storage_config_index;
        let mut storage = catalog.lookup(index)?.clone();
        storage.validate_partitions(index)?;

        let domain_name = ctx.product.name.clone();
        for (i, disk) in storage.disks.iter_mut().enumerate() {
            if disk.path.is_empty() {
                disk.path = disk_image_path(ctx, i, disk).display().to_string();
                debug!("Disk {i} image path: {}", disk.path);
            }
        }

        let fingerprint = PlanHasher::new().hash_plan(&domain_name, &ctx.arch, hardware, &storage);

        info!(
            "Assembled plan for '{domain_name}': {} vCPU, {}MB RAM, {} disks",
            hardware.cpus,
            hardware.ram_mb,
            storage.disks.len()
        );

        Ok(Self {
            plan_id: Uuid::new_v4(),
            created_at: Utc::now(),
            domain_name,
            arch: ctx.arch.clone(),
            hardware: hardware.clone(),
            storage,
            fingerprint,
        })
    }

    /// Returns the first bootable disk, if any.
    #[must_use]
    pub fn boot_disk(&self) -> Option<&Disk> {
        self.storage.disks.iter().find(|d| d.bootable)
    }

    /// Total disk size in gigabytes.
    #[must_use]
    pub fn total_disk_gb(&self) -> u64 {
        self.storage.total_size_gb()
    }
}

/// Image path for the `index`-th disk of the appliance.
#[must_use]
pub fn disk_image_path(ctx: &InstallContext, index: usize, disk: &Disk) -> PathBuf {
    ctx.export_dir.join(format!(
        "{}-disk{index}.{}",
        ctx.product.name,
        disk.storage_type.extension()
    ))
}
