//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying validated
//! documents, eligible bundles and deployment plans.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::bundle::BundleConfig;
use crate::config::{InputSpec, NetworkSpec, ResourceRange};
use crate::planner::{DeploymentPlan, PlanHasher};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Network row for table display.
#[derive(Tabled)]
struct NetworkRow {
    #[tabled(rename = "Network")]
    name: String,
    #[tabled(rename = "Max ifaces")]
    max_interfaces: u32,
    #[tabled(rename = "Modes")]
    modes: String,
}

/// Bundle row for table display.
#[derive(Tabled)]
struct BundleRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "vCPU")]
    cpus: String,
    #[tabled(rename = "RAM (MB)")]
    ram: u64,
    #[tabled(rename = "Storage")]
    storage: usize,
}

/// Disk row for table display.
#[derive(Tabled)]
struct DiskRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Type")]
    storage_type: String,
    #[tabled(rename = "Size (GB)")]
    size_gb: u64,
    #[tabled(rename = "Boot")]
    bootable: String,
    #[tabled(rename = "Partitions")]
    partitions: String,
}

#[derive(Serialize)]
struct InputSummaryJson<'a> {
    cpu: RangeJson,
    ram: RangeJson,
    networks: Vec<NetworkJson<'a>>,
    allowed_nics: usize,
    denied_nics: usize,
}

#[derive(Serialize)]
struct RangeJson {
    configure: bool,
    min: i64,
    max: Option<i64>,
    default: i64,
}

#[derive(Serialize)]
struct NetworkJson<'a> {
    name: &'a str,
    max_interfaces: u32,
    modes: Vec<&'a str>,
}

#[derive(Serialize)]
struct BundleJson<'a> {
    name: &'a str,
    cpus: u32,
    ram_mb: u64,
    storage_config_index: usize,
    overcommit: bool,
}

impl From<&ResourceRange> for RangeJson {
    fn from(range: &ResourceRange) -> Self {
        Self {
            configure: range.configure,
            min: range.min,
            max: (!range.is_unbounded()).then_some(range.max),
            default: range.default,
        }
    }
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a validated input specification.
    #[must_use]
    pub fn format_input(&self, spec: &InputSpec) -> String {
        match self.format {
            OutputFormat::Json => {
                let summary = InputSummaryJson {
                    cpu: RangeJson::from(&spec.cpu),
                    ram: RangeJson::from(&spec.ram),
                    networks: spec
                        .networks
                        .networks
                        .iter()
                        .map(|n| NetworkJson {
                            name: &n.name,
                            max_interfaces: n.max_interfaces,
                            modes: n.mode_types().map(|m| n.mode_label(m)).collect(),
                        })
                        .collect(),
                    allowed_nics: spec.nics.allowed.len(),
                    denied_nics: spec.nics.denied.len(),
                };
                serde_json::to_string_pretty(&summary).unwrap_or_default()
            }
            OutputFormat::Text => Self::format_input_text(spec),
        }
    }

    fn format_input_text(spec: &InputSpec) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "{} Input specification is valid\n", "✓".green());
        let _ = writeln!(output, "   CPU: {}", Self::format_range(&spec.cpu, ""));
        let _ = writeln!(output, "   RAM: {}", Self::format_range(&spec.ram, "MB"));

        let rows: Vec<NetworkRow> = spec
            .networks
            .networks
            .iter()
            .map(|n| NetworkRow {
                name: n.name.clone(),
                max_interfaces: n.max_interfaces,
                modes: Self::format_modes(n),
            })
            .collect();

        if !rows.is_empty() {
            output.push('\n');
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');
        }

        let _ = writeln!(
            output,
            "\nNIC rules: {} allowed, {} denied",
            spec.nics.allowed.len().to_string().green(),
            spec.nics.denied.len().to_string().red()
        );

        output
    }

    fn format_range(range: &ResourceRange, unit: &str) -> String {
        let max = if range.is_unbounded() {
            String::from("unbounded")
        } else {
            format!("{}{unit}", range.max)
        };
        let fixed = if range.configure { "" } else { " (fixed)" };
        format!("{}{unit}..{max}, default {}{unit}{fixed}", range.min, range.default)
    }

    fn format_modes(network: &NetworkSpec) -> String {
        network
            .mode_types()
            .map(|m| match network.vnic_driver(m) {
                Some(driver) => format!("{} ({driver})", network.mode_label(m)),
                None => network.mode_label(m).to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Formats the bundles eligible for a host.
    #[must_use]
    pub fn format_bundles(
        &self,
        eligible: &[&BundleConfig],
        host_ram_mb: u64,
        host_cpus: u32,
    ) -> String {
        match self.format {
            OutputFormat::Json => {
                let bundles: Vec<BundleJson<'_>> = eligible
                    .iter()
                    .map(|c| BundleJson {
                        name: &c.name,
                        cpus: c.cpus,
                        ram_mb: c.ram,
                        storage_config_index: c.storage_config_index,
                        overcommit: c.cpus > host_cpus,
                    })
                    .collect();
                serde_json::to_string_pretty(&bundles).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = String::new();
                let _ = writeln!(output, "\nHost: {host_ram_mb}MB RAM, {host_cpus} CPUs\n");

                if eligible.is_empty() {
                    let _ = writeln!(output, "{} No bundle fits into the host RAM", "✗".red());
                    return output;
                }

                let rows: Vec<BundleRow> = eligible
                    .iter()
                    .enumerate()
                    .map(|(i, c)| BundleRow {
                        index: i + 1,
                        name: c.name.clone(),
                        cpus: if c.cpus > host_cpus {
                            format!("{} (overcommit)", c.cpus).yellow().to_string()
                        } else {
                            c.cpus.to_string()
                        },
                        ram: c.ram,
                        storage: c.storage_config_index,
                    })
                    .collect();
                output.push_str(&Table::new(rows).to_string());
                output.push('\n');
                output
            }
        }
    }

    /// Formats a deployment plan.
    #[must_use]
    pub fn format_plan(&self, plan: &DeploymentPlan) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(plan).unwrap_or_default(),
            OutputFormat::Text => Self::format_plan_text(plan),
        }
    }

    fn format_plan_text(plan: &DeploymentPlan) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "\n📋 Deployment Plan");
        let _ = writeln!(output, "   Plan ID:     {}", plan.plan_id);
        let _ = writeln!(
            output,
            "   Fingerprint: {}",
            PlanHasher::new().short_hash(&plan.fingerprint)
        );
        let _ = writeln!(output, "   Domain:      {} ({})", plan.domain_name.bold(), plan.arch);
        let _ = writeln!(
            output,
            "   Hardware:    {} - {} vCPU, {}MB RAM",
            plan.hardware.name, plan.hardware.cpus, plan.hardware.ram_mb
        );
        let _ = writeln!(
            output,
            "   Storage:     layout #{}, {}GB total\n",
            plan.hardware.storage_config_index,
            plan.total_disk_gb()
        );

        let rows: Vec<DiskRow> = plan
            .storage
            .disks
            .iter()
            .enumerate()
            .map(|(i, d)| DiskRow {
                index: i,
                path: d.path.clone(),
                storage_type: d.storage_type.to_string(),
                size_gb: d.size_gb,
                bootable: if d.bootable { "yes" } else { "no" }.to_string(),
                partitions: d
                    .partitions
                    .iter()
                    .map(|p| format!("{}:{}MB {}", p.sequence, p.size_mb, p.mount_point))
                    .collect::<Vec<_>>()
                    .join(", "),
            })
            .collect();

        if !rows.is_empty() {
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(name: &str, cpus: u32, ram: u64) -> BundleConfig {
        BundleConfig {
            name: name.to_string(),
            cpus,
            ram,
            storage_config_index: 0,
        }
    }

    #[test]
    fn test_bundles_json_flags_overcommit() {
        let small = bundle("Small", 2, 4096);
        let large = bundle("Large", 8, 8192);
        let formatter = OutputFormatter::new(OutputFormat::Json);

        let json = formatter.format_bundles(&[&small, &large], 8192, 4);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["overcommit"], false);
        assert_eq!(value[1]["overcommit"], true);
        assert_eq!(value[1]["ram_mb"], 8192);
    }

    #[test]
    fn test_bundles_text_empty() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let text = formatter.format_bundles(&[], 1024, 2);
        assert!(text.contains("No bundle fits"));
    }

    #[test]
    fn test_range_text() {
        let ram = ResourceRange {
            configure: true,
            min: 2500,
            max: 0,
            default: 2500,
        };
        assert_eq!(
            OutputFormatter::format_range(&ram, "MB"),
            "2500MB..unbounded, default 2500MB"
        );
    }
}
