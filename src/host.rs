//! Host capability facts.
//!
//! The resolver only needs two facts about the machine it installs on:
//! installed RAM and CPU count. They are read through [`HostInfo`] so the
//! resolution logic never touches the running machine directly.

use crate::error::{HostError, Result};
use std::path::PathBuf;
use tracing::debug;

/// Source of host capability facts.
#[cfg_attr(test, mockall::automock)]
pub trait HostInfo {
    /// Installed RAM in megabytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the fact cannot be read.
    fn ram_size_mb(&self) -> Result<u64>;

    /// Number of CPUs available to guests.
    ///
    /// # Errors
    ///
    /// Returns an error if the fact cannot be read.
    fn cpu_count(&self) -> Result<u32>;
}

/// Reads facts from the local Linux host.
///
/// The CPU count is the number of processors listed in `/proc/cpuinfo`,
/// not the affinity- or cgroup-limited parallelism of this process.
#[derive(Debug, Clone)]
pub struct LocalHostInfo {
    meminfo_path: PathBuf,
    cpuinfo_path: PathBuf,
}

impl Default for LocalHostInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalHostInfo {
    /// Creates a reader using `/proc/meminfo`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meminfo_path: PathBuf::from("/proc/meminfo"),
            cpuinfo_path: PathBuf::from("/proc/cpuinfo"),
        }
    }

    /// Reads memory facts from another meminfo-formatted file.
    #[must_use]
    pub fn with_meminfo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.meminfo_path = path.into();
        self
    }

    /// Reads CPU facts from another cpuinfo-formatted file.
    #[must_use]
    pub fn with_cpuinfo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cpuinfo_path = path.into();
        self
    }
}

impl HostInfo for LocalHostInfo {
    fn ram_size_mb(&self) -> Result<u64> {
        let content = std::fs::read_to_string(&self.meminfo_path)
            .map_err(|e| HostError::unavailable("RAM size", e))?;
        let kb = parse_mem_total_kb(&content)
            .ok_or_else(|| HostError::unavailable("RAM size", "MemTotal not found"))?;
        let mb = kb / 1024;
        debug!("Host RAM: {mb}MB");
        Ok(mb)
    }

    fn cpu_count(&self) -> Result<u32> {
        let content = std::fs::read_to_string(&self.cpuinfo_path)
            .map_err(|e| HostError::unavailable("CPU count", e))?;
        let count = count_processors(&content);
        if count == 0 {
            return Err(HostError::unavailable("CPU count", "no processor entries").into());
        }
        debug!("Host CPUs: {count}");
        Ok(count)
    }
}

/// Extracts the `MemTotal` value in kB from meminfo content.
fn parse_mem_total_kb(content: &str) -> Option<u64> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("MemTotal:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|value| value.parse().ok())
}

/// Counts `processor` entries in cpuinfo content.
fn count_processors(content: &str) -> u32 {
    let count = content
        .lines()
        .filter_map(|line| line.split_once(':'))
        .filter(|(key, _)| key.trim() == "processor")
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}
