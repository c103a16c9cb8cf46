//! Planning module for deployment descriptors.
//!
//! This module joins an accepted hardware profile with its storage layout,
//! checking the cross-document reference, and fingerprints the result.

mod hash;
mod plan;

pub use hash::PlanHasher;
pub use plan::{DeploymentPlan, disk_image_path};
