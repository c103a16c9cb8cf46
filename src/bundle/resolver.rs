//! Interactive bundle resolution.
//!
//! The resolver filters the catalog against host RAM, presents the eligible
//! bundles plus a trailing "custom configuration" entry, and loops until the
//! operator accepts a bundle or opts for a custom configuration.
//!
//! The loop has no iteration bound: it terminates once the operator accepts
//! a bundle, picks the custom entry, or cancels through a collaborator.

use crate::config::InputSpec;
use crate::error::{BundleError, ConfigError, Result, ValidationRule};
use crate::host::HostInfo;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::catalog::{BundleCatalog, BundleConfig};

/// Label of the trailing menu entry that selects a custom configuration.
pub const CUSTOM_CONFIGURATION_LABEL: &str = "Custom configuration";

/// Name given to operator-defined profiles.
pub const CUSTOM_PROFILE_NAME: &str = "custom";

/// A menu line presented to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    /// One-based tag typed or clicked by the operator.
    pub tag: String,
    /// Text shown next to the tag.
    pub label: String,
}

/// Operator's answer to the bundle menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Zero-based index into the presented bundles.
    Bundle(usize),
    /// The trailing custom configuration entry.
    Custom,
}

/// Presents the bundle menu and blocks until the operator selects an entry.
pub trait Chooser {
    /// Returns the operator's selection among `entries`.
    ///
    /// # Errors
    ///
    /// Returns `OperatorCancelled` if the operator aborts.
    fn choose(&mut self, entries: &[MenuEntry]) -> Result<Selection>;
}

/// Asks the operator to approve CPU overcommit.
#[cfg_attr(test, mockall::automock)]
pub trait Confirmer {
    /// Returns true if the operator accepts `requested` vCPUs on a host with
    /// `installed` CPUs.
    ///
    /// # Errors
    ///
    /// Returns `OperatorCancelled` if the operator aborts.
    fn confirm_overcommit(&mut self, requested: u32, installed: u32) -> Result<bool>;
}

/// Hardware profile accepted by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedBundle {
    /// Bundle name, or `custom`.
    pub name: String,
    /// Virtual CPU count.
    pub cpus: u32,
    /// RAM size in megabytes.
    pub ram_mb: u64,
    /// Index into the storage catalog.
    pub storage_config_index: usize,
}

impl From<&BundleConfig> for ResolvedBundle {
    fn from(config: &BundleConfig) -> Self {
        Self {
            name: config.name.clone(),
            cpus: config.cpus,
            ram_mb: config.ram,
            storage_config_index: config.storage_config_index,
        }
    }
}

impl ResolvedBundle {
    /// Builds an operator-defined profile, bounds-checked against the input
    /// specification's CPU and RAM ranges.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `cpus` or `ram_mb` is out of range.
    pub fn custom(
        spec: &InputSpec,
        cpus: u32,
        ram_mb: u64,
        storage_config_index: usize,
    ) -> Result<Self> {
        if !spec.cpu.accepts(i64::from(cpus)) {
            let err = ConfigError::validation("cpu", ValidationRule::ValueOutOfRange, cpus);
            return Err(err.into());
        }
        if !i64::try_from(ram_mb).is_ok_and(|ram| spec.ram.accepts(ram)) {
            let err = ConfigError::validation("ram", ValidationRule::ValueOutOfRange, ram_mb);
            return Err(err.into());
        }

        Ok(Self {
            name: String::from(CUSTOM_PROFILE_NAME),
            cpus,
            ram_mb,
            storage_config_index,
        })
    }
}

impl Selection {
    /// Maps a menu tag back to a selection. Tags `1..=bundles` select a
    /// bundle and `bundles + 1` selects the custom entry.
    #[must_use]
    pub fn from_tag(tag: &str, bundles: usize) -> Option<Self> {
        match tag.trim().parse::<usize>().ok()? {
            0 => None,
            n if n <= bundles => Some(Self::Bundle(n - 1)),
            n if n == bundles + 1 => Some(Self::Custom),
            _ => None,
        }
    }
}

/// Resolves a hardware bundle against host capacity.
#[derive(Debug)]
pub struct BundleResolver<'a> {
    catalog: &'a BundleCatalog,
}

impl<'a> BundleResolver<'a> {
    /// Creates a resolver over `catalog`.
    #[must_use]
    pub const fn new(catalog: &'a BundleCatalog) -> Self {
        Self { catalog }
    }

    /// Builds the menu for `eligible`, ending with the custom entry.
    #[must_use]
    pub fn menu_entries(eligible: &[&BundleConfig]) -> Vec<MenuEntry> {
        eligible
            .iter()
            .map(|c| c.menu_label())
            .chain(std::iter::once(String::from(CUSTOM_CONFIGURATION_LABEL)))
            .enumerate()
            .map(|(i, label)| MenuEntry {
                tag: (i + 1).to_string(),
                label,
            })
            .collect()
    }

    /// Runs the choose-or-override loop for a host with the given RAM and
    /// CPU count.
    ///
    /// Returns `Ok(None)` when the operator opts for a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns `NoEligibleConfiguration` if no bundle fits `host_ram_mb`,
    /// and propagates collaborator errors such as `OperatorCancelled`.
    pub fn resolve<C, F>(
        &self,
        host_ram_mb: u64,
        host_cpu_count: u32,
        chooser: &mut C,
        confirmer: &mut F,
    ) -> Result<Option<ResolvedBundle>>
    where
        C: Chooser + ?Sized,
        F: Confirmer + ?Sized,
    {
        let eligible = self.eligible_or_fail(host_ram_mb)?;
        Self::choose_loop(&eligible, host_cpu_count, chooser, confirmer)
    }

    /// Like [`resolve`](Self::resolve), reading RAM and CPU count from
    /// `host`. CPUs are only queried once at least one bundle is eligible.
    ///
    /// # Errors
    ///
    /// Returns host errors in addition to those of `resolve`.
    pub fn resolve_with_host<H, C, F>(
        &self,
        host: &H,
        chooser: &mut C,
        confirmer: &mut F,
    ) -> Result<Option<ResolvedBundle>>
    where
        H: HostInfo + ?Sized,
        C: Chooser + ?Sized,
        F: Confirmer + ?Sized,
    {
        let host_ram_mb = host.ram_size_mb()?;
        let eligible = self.eligible_or_fail(host_ram_mb)?;
        let host_cpu_count = host.cpu_count()?;
        Self::choose_loop(&eligible, host_cpu_count, chooser, confirmer)
    }

    fn eligible_or_fail(&self, host_ram_mb: u64) -> Result<Vec<&'a BundleConfig>> {
        let eligible = self.catalog.eligible(host_ram_mb);
        debug!(
            "{} of {} bundles fit into {host_ram_mb}MB",
            eligible.len(),
            self.catalog.configs.len()
        );

        if eligible.is_empty() {
            return Err(BundleError::NoEligibleConfiguration {
                host_ram_mb,
                catalog_size: self.catalog.configs.len(),
            }
            .into());
        }
        Ok(eligible)
    }

    fn choose_loop<C, F>(
        eligible: &[&BundleConfig],
        host_cpu_count: u32,
        chooser: &mut C,
        confirmer: &mut F,
    ) -> Result<Option<ResolvedBundle>>
    where
        C: Chooser + ?Sized,
        F: Confirmer + ?Sized,
    {
        let entries = Self::menu_entries(eligible);

        loop {
            let config = match chooser.choose(&entries)? {
                Selection::Custom => {
                    info!("Operator chose a custom configuration");
                    return Ok(None);
                }
                Selection::Bundle(i) => {
                    eligible.get(i).copied().ok_or(BundleError::InvalidSelection {
                        selected: i,
                        available: eligible.len(),
                    })?
                }
            };

            if config.cpus > host_cpu_count {
                warn!(
                    "Bundle '{}' requests {} vCPUs but only {host_cpu_count} are installed",
                    config.name, config.cpus
                );
                if !confirmer.confirm_overcommit(config.cpus, host_cpu_count)? {
                    debug!("Overcommit declined, presenting bundles again");
                    continue;
                }
            }

            info!("Selected bundle '{}'", config.name);
            return Ok(Some(ResolvedBundle::from(config)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceRange;
    use crate::error::DeployerError;
    use crate::host::MockHostInfo;
    use std::collections::VecDeque;

    /// Replays a fixed list of selections and records every menu shown.
    struct ScriptedChooser {
        picks: VecDeque<Selection>,
        shown: Vec<Vec<MenuEntry>>,
    }

    impl ScriptedChooser {
        fn new(picks: &[Selection]) -> Self {
            Self {
                picks: picks.iter().copied().collect(),
                shown: Vec::new(),
            }
        }
    }

    impl Chooser for ScriptedChooser {
        fn choose(&mut self, entries: &[MenuEntry]) -> Result<Selection> {
            self.shown.push(entries.to_vec());
            self.picks
                .pop_front()
                .ok_or_else(|| BundleError::OperatorCancelled.into())
        }
    }

    fn bundle(name: &str, cpus: u32, ram: u64, index: usize) -> BundleConfig {
        BundleConfig {
            name: name.to_string(),
            cpus,
            ram,
            storage_config_index: index,
        }
    }

    fn catalog() -> BundleCatalog {
        BundleCatalog {
            configs: vec![
                bundle("Small", 2, 4096, 0),
                bundle("Medium", 8, 8192, 1),
                bundle("Large", 8, 16384, 2),
            ],
        }
    }

    #[test]
    fn test_menu_has_trailing_custom_entry() {
        let catalog = catalog();
        let eligible = catalog.eligible(8000);
        let entries = BundleResolver::menu_entries(&eligible);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tag, "1");
        assert!(entries[0].label.starts_with("Small"));
        assert_eq!(entries[1].tag, "2");
        assert_eq!(entries[1].label, CUSTOM_CONFIGURATION_LABEL);
    }

    #[test]
    fn test_accepts_bundle_within_host_cpus() {
        let catalog = catalog();
        let mut chooser = ScriptedChooser::new(&[Selection::Bundle(0)]);
        let mut confirmer = MockConfirmer::new();
        confirmer.expect_confirm_overcommit().never();

        let resolved = BundleResolver::new(&catalog)
            .resolve(16384, 4, &mut chooser, &mut confirmer)
            .unwrap()
            .unwrap();

        assert_eq!(
            resolved,
            ResolvedBundle {
                name: String::from("Small"),
                cpus: 2,
                ram_mb: 4096,
                storage_config_index: 0,
            }
        );
    }

    #[test]
    fn test_declined_overcommit_represents_same_list() {
        let catalog = catalog();
        let mut chooser = ScriptedChooser::new(&[Selection::Bundle(1), Selection::Custom]);
        let mut confirmer = MockConfirmer::new();
        confirmer
            .expect_confirm_overcommit()
            .withf(|requested, installed| *requested == 8 && *installed == 4)
            .times(1)
            .returning(|_, _| Ok(false));

        let resolved = BundleResolver::new(&catalog)
            .resolve(16384, 4, &mut chooser, &mut confirmer)
            .unwrap();

        assert!(resolved.is_none());
        assert_eq!(chooser.shown.len(), 2);
        assert_eq!(chooser.shown[0], chooser.shown[1]);
        assert_eq!(chooser.shown[1].len(), 4);
        assert!(chooser.shown[1][1].label.starts_with("Medium"));
    }

    #[test]
    fn test_accepted_overcommit_resolves() {
        let catalog = catalog();
        let mut chooser = ScriptedChooser::new(&[Selection::Bundle(2)]);
        let mut confirmer = MockConfirmer::new();
        confirmer
            .expect_confirm_overcommit()
            .times(1)
            .returning(|_, _| Ok(true));

        let resolved = BundleResolver::new(&catalog)
            .resolve(16384, 4, &mut chooser, &mut confirmer)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.name, "Large");
        assert_eq!(resolved.storage_config_index, 2);
    }

    #[test]
    fn test_no_eligible_configuration() {
        let catalog = catalog();
        let mut chooser = ScriptedChooser::new(&[]);
        let mut confirmer = MockConfirmer::new();

        let err = BundleResolver::new(&catalog)
            .resolve(2048, 4, &mut chooser, &mut confirmer)
            .unwrap_err();

        assert!(matches!(
            err,
            DeployerError::Bundle(BundleError::NoEligibleConfiguration {
                host_ram_mb: 2048,
                catalog_size: 3,
            })
        ));
        assert!(chooser.shown.is_empty());
    }

    #[test]
    fn test_cancellation_propagates() {
        let catalog = catalog();
        let mut chooser = ScriptedChooser::new(&[]);
        let mut confirmer = MockConfirmer::new();

        let err = BundleResolver::new(&catalog)
            .resolve(16384, 4, &mut chooser, &mut confirmer)
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_invalid_selection() {
        let catalog = catalog();
        let mut chooser = ScriptedChooser::new(&[Selection::Bundle(5)]);
        let mut confirmer = MockConfirmer::new();

        let err = BundleResolver::new(&catalog)
            .resolve(4096, 4, &mut chooser, &mut confirmer)
            .unwrap_err();
        assert!(matches!(
            err,
            DeployerError::Bundle(BundleError::InvalidSelection { selected: 5, available: 1 })
        ));
    }

    #[test]
    fn test_resolve_with_host_skips_cpu_query_when_nothing_fits() {
        let catalog = catalog();
        let mut host = MockHostInfo::new();
        host.expect_ram_size_mb().returning(|| Ok(1024));
        host.expect_cpu_count().never();

        let mut chooser = ScriptedChooser::new(&[]);
        let mut confirmer = MockConfirmer::new();
        let err = BundleResolver::new(&catalog)
            .resolve_with_host(&host, &mut chooser, &mut confirmer)
            .unwrap_err();
        assert!(err.is_authoring_defect());
    }

    #[test]
    fn test_resolve_with_host() {
        let catalog = catalog();
        let mut host = MockHostInfo::new();
        host.expect_ram_size_mb().returning(|| Ok(8192));
        host.expect_cpu_count().returning(|| Ok(16));

        let mut chooser = ScriptedChooser::new(&[Selection::Bundle(1)]);
        let mut confirmer = MockConfirmer::new();
        confirmer.expect_confirm_overcommit().never();

        let resolved = BundleResolver::new(&catalog)
            .resolve_with_host(&host, &mut chooser, &mut confirmer)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.name, "Medium");
    }

    #[test]
    fn test_selection_from_tag() {
        assert_eq!(Selection::from_tag("1", 2), Some(Selection::Bundle(0)));
        assert_eq!(Selection::from_tag(" 2\n", 2), Some(Selection::Bundle(1)));
        assert_eq!(Selection::from_tag("3", 2), Some(Selection::Custom));
        assert_eq!(Selection::from_tag("0", 2), None);
        assert_eq!(Selection::from_tag("4", 2), None);
        assert_eq!(Selection::from_tag("abc", 2), None);
    }

    #[test]
    fn test_custom_profile_bounds() {
        let spec = InputSpec {
            cpu: ResourceRange { configure: true, min: 1, max: 16, default: 1 },
            ram: ResourceRange { configure: true, min: 2500, max: 0, default: 2500 },
            networks: crate::config::NetworksConfig::default(),
            nics: crate::config::NicFilterSpec::default(),
        };

        let custom = ResolvedBundle::custom(&spec, 4, 4096, 1).unwrap();
        assert_eq!(custom.name, CUSTOM_PROFILE_NAME);

        let err = ResolvedBundle::custom(&spec, 32, 4096, 1).unwrap_err();
        assert!(err.to_string().contains("cpu"));

        assert!(ResolvedBundle::custom(&spec, 4, 1024, 1).is_err());
    }
}
