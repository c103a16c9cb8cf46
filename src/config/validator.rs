//! Semantic validation of input specifications.
//!
//! Validation is fail-fast and deterministic: checks run in document order
//! and the first violation is returned, so the same document always reports
//! the same offending field.

use crate::error::{ConfigError, Result, ValidationRule};
use std::collections::HashSet;
use tracing::debug;

use super::spec::{InputSpec, ModeType, NetworkSpec, NicFilterSpec, NicRule, ResourceRange};

/// Validator for input specifications.
#[derive(Debug, Default)]
pub struct InputValidator;

impl InputValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a decoded input specification.
    ///
    /// Order: `cpu`, `ram`, each network in document order, NIC rules.
    ///
    /// # Errors
    ///
    /// Returns the first validation error encountered.
    pub fn validate(&self, spec: &InputSpec) -> Result<()> {
        validate_range("cpu", &spec.cpu)?;
        validate_range("ram", &spec.ram)?;

        let mut seen_names = HashSet::new();
        for (i, network) in spec.networks.networks.iter().enumerate() {
            let prefix = format!("networks.network[{i}]");
            if !seen_names.insert(network.name.as_str()) && !network.name.is_empty() {
                return Err(ConfigError::validation(
                    format!("{prefix}.name"),
                    ValidationRule::DuplicateNetworkName,
                    &network.name,
                )
                .into());
            }
            validate_network(&prefix, network)?;
        }

        validate_nic_filter(&spec.nics)?;

        debug!(
            "Input specification valid: {} networks, {} allow / {} deny NIC rules",
            spec.networks.networks.len(),
            spec.nics.allowed.len(),
            spec.nics.denied.len()
        );
        Ok(())
    }
}

/// Validates a `min`/`max`/`default` triple.
///
/// Non-configurable ranges are UI hints and are not checked.
///
/// # Errors
///
/// Returns a validation error naming `field` if the range is inconsistent.
pub fn validate_range(field: &str, range: &ResourceRange) -> Result<()> {
    if !range.configure {
        return Ok(());
    }

    if range.min < 0 {
        return Err(ConfigError::validation(
            format!("{field}.min"),
            ValidationRule::NegativeMinimum,
            range.min,
        )
        .into());
    }

    if range.max > 0 {
        if range.min > range.max {
            return Err(ConfigError::validation(
                format!("{field}.min"),
                ValidationRule::MinimumExceedsMaximum,
                format!("{} > {}", range.min, range.max),
            )
            .into());
        }
        if range.default < range.min || range.default > range.max {
            return Err(ConfigError::validation(
                format!("{field}.default_value"),
                ValidationRule::DefaultOutOfRange,
                range.default,
            )
            .into());
        }
    }

    Ok(())
}

/// Validates a single network definition.
///
/// `prefix` is the field path used in error reports.
///
/// # Errors
///
/// Returns the first violated rule for this network.
pub fn validate_network(prefix: &str, network: &NetworkSpec) -> Result<()> {
    if network.name.is_empty() {
        return Err(ConfigError::validation(
            format!("{prefix}.name"),
            ValidationRule::EmptyNetworkName,
            "",
        )
        .into());
    }

    if network.max_interfaces == 0 {
        return Err(ConfigError::validation(
            format!("{prefix}.max_ifaces"),
            ValidationRule::NoInterfaces,
            network.max_interfaces,
        )
        .into());
    }

    if network.modes.is_empty() {
        return Err(ConfigError::validation(
            format!("{prefix}.mode"),
            ValidationRule::NoModes,
            &network.name,
        )
        .into());
    }

    let mut declared = HashSet::new();
    for (i, mode) in network.modes.iter().enumerate() {
        if !declared.insert(mode.mode_type) {
            return Err(ConfigError::validation(
                format!("{prefix}.mode[{i}].type"),
                ValidationRule::DuplicateMode,
                mode.mode_type,
            )
            .into());
        }
    }

    for (i, mode) in network.modes.iter().enumerate() {
        if mode.mode_type.requires_vnic_driver()
            && mode.vnic_driver.as_deref().is_none_or(str::is_empty)
        {
            return Err(ConfigError::validation(
                format!("{prefix}.mode[{i}].vnic_driver"),
                ValidationRule::MissingVnicDriver,
                mode.mode_type,
            )
            .into());
        }
    }

    validate_ui_mode_selection(prefix, network, &declared)
}

/// Checks that an enabled UI mode selection covers the declared modes
/// exactly once each.
fn validate_ui_mode_selection(
    prefix: &str,
    network: &NetworkSpec,
    declared: &HashSet<ModeType>,
) -> Result<()> {
    let Some(selection) = network.ui_mode_selection.as_ref().filter(|s| s.enabled) else {
        return Ok(());
    };
    let field = format!("{prefix}.ui_mode_selection");

    let mut covered = HashSet::new();
    for appearance in &selection.appearances {
        let mode = ModeType::from_name(&appearance.mode_type)
            .filter(|m| declared.contains(m))
            .ok_or_else(|| {
                ConfigError::validation(
                    &field,
                    ValidationRule::UnknownUiMode,
                    &appearance.mode_type,
                )
            })?;
        if !covered.insert(mode) {
            return Err(ConfigError::validation(
                &field,
                ValidationRule::DuplicateUiModeAppearance,
                mode,
            )
            .into());
        }
    }

    if let Some(missing) = network.mode_types().find(|m| !covered.contains(m)) {
        return Err(ConfigError::validation(
            &field,
            ValidationRule::IncompleteUiModeSelection,
            missing,
        )
        .into());
    }

    Ok(())
}

/// Validates NIC allow/deny rules.
///
/// Wildcard models and repeated identical rules are legal.
///
/// # Errors
///
/// Returns a validation error for the first rule without a vendor.
pub fn validate_nic_filter(filter: &NicFilterSpec) -> Result<()> {
    check_vendors("nics.allow", &filter.allowed)?;
    check_vendors("nics.deny", &filter.denied)
}

fn check_vendors(field: &str, rules: &[NicRule]) -> Result<()> {
    match rules.iter().position(|r| r.vendor.trim().is_empty()) {
        Some(i) => Err(ConfigError::validation(
            format!("{field}[{i}].vendor"),
            ValidationRule::EmptyNicVendor,
            format!("vendor=\"{}\" model=\"{}\"", rules[i].vendor, rules[i].model),
        )
        .into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InputSpecParser;
    use crate::config::spec::{Appearance, NetworkMode, UiModeSelection};
    use crate::error::DeployerError;

    fn rule_of(result: Result<()>) -> Option<ValidationRule> {
        match result {
            Err(DeployerError::Config(e)) => e.rule(),
            _ => None,
        }
    }

    /// Parses `xml` and returns the reported field and rule.
    fn first_violation(xml: &str) -> (String, ValidationRule) {
        match InputSpecParser::new().parse(xml.as_bytes()).unwrap_err() {
            DeployerError::Config(ConfigError::Validation { field, rule, .. }) => (field, rule),
            other => panic!("unexpected error: {other}"),
        }
    }

    const fn range(configure: bool, min: i64, max: i64, default: i64) -> ResourceRange {
        ResourceRange {
            configure,
            min,
            max,
            default,
        }
    }

    fn range_xml(tag: &str, min: i64, max: i64, default: i64) -> String {
        format!(
            "<{tag}><configure>true</configure><min>{min}</min><max>{max}</max>\
             <default_value>{default}</default_value></{tag}>"
        )
    }

    fn document(ram: &str, networks: &str, nics: &str) -> String {
        format!(
            "<input_data>{}{ram}<networks><configure>true</configure>{networks}</networks>\
             <nics>{nics}</nics></input_data>",
            range_xml("cpu", 1, 16, 1)
        )
    }

    const GOOD_NETWORK: &str = r#"<network name="Management" max_ifaces="1">
        <mode type="bridged" vnic_driver="e1000"/></network>"#;

    fn mode(mode_type: ModeType, driver: Option<&str>) -> NetworkMode {
        NetworkMode {
            mode_type,
            vnic_driver: driver.map(String::from),
        }
    }

    fn network(modes: Vec<NetworkMode>, selection: Option<UiModeSelection>) -> NetworkSpec {
        NetworkSpec {
            name: String::from("Traffic"),
            max_interfaces: 9,
            modes,
            ui_mode_selection: selection,
        }
    }

    fn selection(enabled: bool, types: &[&str]) -> UiModeSelection {
        UiModeSelection {
            enabled,
            appearances: types
                .iter()
                .map(|t| Appearance {
                    mode_type: (*t).to_string(),
                    label: (*t).to_string(),
                })
                .collect(),
        }
    }

    fn nic(vendor: &str, model: &str) -> NicRule {
        NicRule {
            vendor: vendor.to_string(),
            model: model.to_string(),
        }
    }

    #[test]
    fn test_range_rules() {
        assert!(validate_range("cpu", &range(true, 1, 16, 1)).is_ok());
        assert!(validate_range("ram", &range(true, 2500, 0, 2500)).is_ok());

        assert_eq!(
            rule_of(validate_range("cpu", &range(true, -1, 0, 0))),
            Some(ValidationRule::NegativeMinimum)
        );
        assert_eq!(
            rule_of(validate_range("cpu", &range(true, 8, 4, 4))),
            Some(ValidationRule::MinimumExceedsMaximum)
        );
        assert_eq!(
            rule_of(validate_range("cpu", &range(true, 1, 4, 5))),
            Some(ValidationRule::DefaultOutOfRange)
        );
    }

    #[test]
    fn test_range_not_configurable_is_not_checked() {
        assert!(validate_range("cpu", &range(false, -5, 1, 9)).is_ok());
    }

    #[test]
    fn test_network_requires_name() {
        let mut net = network(vec![mode(ModeType::Bridged, Some("virtio"))], None);
        net.name = String::new();

        let err = validate_network("networks.network[0]", &net).unwrap_err();
        match err {
            DeployerError::Config(ConfigError::Validation { field, rule, .. }) => {
                assert_eq!(field, "networks.network[0].name");
                assert_eq!(rule, ValidationRule::EmptyNetworkName);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_network_requires_interfaces() {
        let mut net = network(vec![mode(ModeType::Bridged, Some("virtio"))], None);
        net.max_interfaces = 0;
        assert_eq!(
            rule_of(validate_network("n", &net)),
            Some(ValidationRule::NoInterfaces)
        );
    }

    #[test]
    fn test_network_requires_modes() {
        let net = network(vec![], None);
        assert_eq!(
            rule_of(validate_network("n", &net)),
            Some(ValidationRule::NoModes)
        );
    }

    #[test]
    fn test_network_rejects_duplicate_modes() {
        let net = network(
            vec![
                mode(ModeType::Bridged, Some("virtio")),
                mode(ModeType::Bridged, Some("e1000")),
            ],
            None,
        );
        assert_eq!(
            rule_of(validate_network("n", &net)),
            Some(ValidationRule::DuplicateMode)
        );
    }

    #[test]
    fn test_network_requires_vnic_driver() {
        let net = network(vec![mode(ModeType::Direct, Some(""))], None);
        assert_eq!(
            rule_of(validate_network("n", &net)),
            Some(ValidationRule::MissingVnicDriver)
        );

        let pass = network(vec![mode(ModeType::Passthrough, None)], None);
        assert!(validate_network("n", &pass).is_ok());
    }

    #[test]
    fn test_incomplete_ui_selection_names_missing_mode() {
        let net = network(
            vec![
                mode(ModeType::Bridged, Some("virtio")),
                mode(ModeType::Passthrough, None),
                mode(ModeType::Direct, Some("virtio")),
            ],
            Some(selection(true, &["bridged", "passthrough"])),
        );
        let err = validate_network("networks.network[1]", &net).unwrap_err();
        match err {
            DeployerError::Config(ConfigError::Validation { rule, value, .. }) => {
                assert_eq!(rule, ValidationRule::IncompleteUiModeSelection);
                assert_eq!(value, "direct");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ui_selection_unknown_mode() {
        let net = network(
            vec![mode(ModeType::Bridged, Some("virtio"))],
            Some(selection(true, &["bridged", "direct"])),
        );
        assert_eq!(
            rule_of(validate_network("n", &net)),
            Some(ValidationRule::UnknownUiMode)
        );
    }

    #[test]
    fn test_ui_selection_duplicate_appearance() {
        let net = network(
            vec![mode(ModeType::Bridged, Some("virtio"))],
            Some(selection(true, &["bridged", "bridged"])),
        );
        assert_eq!(
            rule_of(validate_network("n", &net)),
            Some(ValidationRule::DuplicateUiModeAppearance)
        );
    }

    #[test]
    fn test_disabled_ui_selection_is_ignored() {
        let net = network(
            vec![
                mode(ModeType::Bridged, Some("virtio")),
                mode(ModeType::Direct, Some("e1000")),
            ],
            Some(selection(false, &["passthrough"])),
        );
        assert!(validate_network("n", &net).is_ok());
    }

    #[test]
    fn test_nic_filter_vendor_required() {
        let filter = NicFilterSpec {
            allowed: vec![nic("Intel", "")],
            denied: vec![nic("", "X710")],
        };

        let err = validate_nic_filter(&filter).unwrap_err();
        match err {
            DeployerError::Config(ConfigError::Validation { field, rule, value }) => {
                assert_eq!(field, "nics.deny[0].vendor");
                assert_eq!(rule, ValidationRule::EmptyNicVendor);
                assert_eq!(value, r#"vendor="" model="X710""#);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nic_filter_duplicates_tolerated() {
        let filter = NicFilterSpec {
            allowed: vec![nic("Intel", ""), nic("Intel", "")],
            denied: vec![nic("Intel", "")],
        };
        assert!(validate_nic_filter(&filter).is_ok());
    }

    #[test]
    fn test_duplicate_network_name_reports_second() {
        let networks = format!("{GOOD_NETWORK}{GOOD_NETWORK}");
        let xml = document(&range_xml("ram", 2500, 0, 2500), &networks, "");

        assert_eq!(
            first_violation(&xml),
            (
                String::from("networks.network[1].name"),
                ValidationRule::DuplicateNetworkName
            )
        );
    }

    #[test]
    fn test_first_invalid_network_in_document_order_reported() {
        let networks = format!(
            r#"{GOOD_NETWORK}
            <network name="Traffic" max_ifaces="0"><mode type="passthrough"/></network>
            <network name="Bkp" max_ifaces="2"><mode type="direct"/></network>"#
        );
        let xml = document(&range_xml("ram", 2500, 0, 2500), &networks, "");

        assert_eq!(
            first_violation(&xml),
            (
                String::from("networks.network[1].max_ifaces"),
                ValidationRule::NoInterfaces
            )
        );
    }

    #[test]
    fn test_ram_checked_before_networks() {
        let networks = r#"<network name="Traffic" max_ifaces="1"/>"#;
        let xml = document(&range_xml("ram", 4096, 2048, 4096), networks, "");

        assert_eq!(
            first_violation(&xml),
            (
                String::from("ram.min"),
                ValidationRule::MinimumExceedsMaximum
            )
        );
    }

    #[test]
    fn test_networks_checked_before_nic_filter() {
        let networks = r#"<network name="Traffic" max_ifaces="1">
            <mode type="bridged"/></network>"#;
        let nics = r#"<allow vendor="" model="X710"/>"#;
        let xml = document(&range_xml("ram", 2500, 0, 2500), networks, nics);

        assert_eq!(
            first_violation(&xml),
            (
                String::from("networks.network[0].mode[0].vnic_driver"),
                ValidationRule::MissingVnicDriver
            )
        );
    }

    #[test]
    fn test_nic_filter_checked_last() {
        let nics = r#"<allow vendor="Intel" model=""/><deny vendor=" " model=""/>"#;
        let xml = document(&range_xml("ram", 2500, 0, 2500), GOOD_NETWORK, nics);

        assert_eq!(
            first_violation(&xml),
            (
                String::from("nics.deny[0].vendor"),
                ValidationRule::EmptyNicVendor
            )
        );
    }
}
