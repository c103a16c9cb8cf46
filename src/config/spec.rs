//! Input specification types.
//!
//! This module defines the structs that map onto the operator-facing
//! capability document (`<input_data>`). The types are decoded once and
//! consumed read-only by the installer for menu population and for
//! bounds-checking operator input.

use serde::Deserialize;
use std::fmt;

/// Root of the input specification document.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct InputSpec {
    /// Virtual CPU count range.
    pub cpu: ResourceRange,
    /// RAM size range in megabytes.
    pub ram: ResourceRange,
    /// Network definitions.
    #[serde(default)]
    pub networks: NetworksConfig,
    /// NIC allow/deny rules.
    #[serde(default)]
    pub nics: NicFilterSpec,
}

/// A numeric `min`/`max`/`default` triple.
///
/// `max == 0` means the range is unbounded above. When `configure` is
/// false the values are advisory only.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct ResourceRange {
    /// Whether the operator may change the value.
    #[serde(default)]
    pub configure: bool,
    /// Lower bound.
    pub min: i64,
    /// Upper bound, 0 for unbounded.
    #[serde(default)]
    pub max: i64,
    /// Value proposed to the operator.
    #[serde(rename = "default_value")]
    pub default: i64,
}

/// The `<networks>` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct NetworksConfig {
    /// Whether the operator may configure networks at all.
    #[serde(default)]
    pub configure: bool,
    /// Networks in document order.
    #[serde(rename = "network", default)]
    pub networks: Vec<NetworkSpec>,
}

/// A single network definition.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NetworkSpec {
    /// Network name, unique within the document.
    #[serde(rename = "@name")]
    pub name: String,
    /// Maximum number of interfaces attached to this network.
    #[serde(rename = "@max_ifaces")]
    pub max_interfaces: u32,
    /// Connection modes offered for this network.
    #[serde(rename = "mode", default)]
    pub modes: Vec<NetworkMode>,
    /// Optional operator-facing labels for the modes.
    #[serde(default)]
    pub ui_mode_selection: Option<UiModeSelection>,
}

/// A connection mode of a network.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NetworkMode {
    /// Mode type.
    #[serde(rename = "@type")]
    pub mode_type: ModeType,
    /// Emulated NIC driver, required for bridged and direct modes.
    #[serde(rename = "@vnic_driver", default)]
    pub vnic_driver: Option<String>,
}

/// Network connection mode types.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ModeType {
    /// Attached to a host bridge.
    Bridged,
    /// Attached directly to a host interface (macvtap).
    Direct,
    /// Host PCI device passed through to the guest.
    Passthrough,
}

/// Mapping from each network mode to an operator-facing label.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UiModeSelection {
    /// Whether the selection is shown. Defaults to true when the element
    /// is present without an `enable` attribute.
    #[serde(rename = "@enable", default = "default_enabled")]
    pub enabled: bool,
    /// Labels in display order.
    #[serde(rename = "appearance", default)]
    pub appearances: Vec<Appearance>,
}

/// A single UI label for a mode.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Appearance {
    /// Mode type name this label applies to.
    #[serde(rename = "@mode_type")]
    pub mode_type: String,
    /// Label shown to the operator.
    #[serde(rename = "@appear", default)]
    pub label: String,
}

/// The `<nics>` section: allowed and denied NIC vendors/models.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct NicFilterSpec {
    /// Allow rules in document order.
    #[serde(rename = "allow", default)]
    pub allowed: Vec<NicRule>,
    /// Deny rules in document order.
    #[serde(rename = "deny", default)]
    pub denied: Vec<NicRule>,
}

/// A vendor/model rule. An empty model matches every model of the vendor.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct NicRule {
    /// NIC vendor.
    #[serde(rename = "@vendor", default)]
    pub vendor: String,
    /// NIC model, empty for wildcard.
    #[serde(rename = "@model", default)]
    pub model: String,
}

const fn default_enabled() -> bool {
    true
}

impl ResourceRange {
    /// Returns true if `value` is acceptable operator input for this range.
    ///
    /// Non-configurable ranges accept anything since they are only hints.
    #[must_use]
    pub const fn accepts(&self, value: i64) -> bool {
        if !self.configure {
            return true;
        }
        value >= self.min && (self.max == 0 || value <= self.max)
    }

    /// Returns true if the range has no upper bound.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.max == 0
    }
}

impl ModeType {
    /// Returns the document name of the mode type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bridged => "bridged",
            Self::Direct => "direct",
            Self::Passthrough => "passthrough",
        }
    }

    /// Parses a document mode type name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bridged" => Some(Self::Bridged),
            "direct" => Some(Self::Direct),
            "passthrough" => Some(Self::Passthrough),
            _ => None,
        }
    }

    /// Returns true if the mode needs an emulated NIC driver.
    #[must_use]
    pub const fn requires_vnic_driver(self) -> bool {
        matches!(self, Self::Bridged | Self::Direct)
    }
}

impl fmt::Display for ModeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl NetworkSpec {
    /// Returns the declared mode types in document order.
    pub fn mode_types(&self) -> impl Iterator<Item = ModeType> + '_ {
        self.modes.iter().map(|m| m.mode_type)
    }

    /// Returns the vNIC driver configured for `mode`, if any.
    #[must_use]
    pub fn vnic_driver(&self, mode: ModeType) -> Option<&str> {
        self.modes
            .iter()
            .find(|m| m.mode_type == mode)
            .and_then(|m| m.vnic_driver.as_deref())
    }

    /// Returns the label to show for `mode`.
    ///
    /// Uses the UI appearance when the selection is enabled, else the
    /// mode name.
    #[must_use]
    pub fn mode_label(&self, mode: ModeType) -> &str {
        self.ui_mode_selection
            .as_ref()
            .filter(|s| s.enabled)
            .and_then(|s| s.appearances.iter().find(|a| a.mode_type == mode.as_str()))
            .map_or_else(|| mode.as_str(), |a| a.label.as_str())
    }
}

impl InputSpec {
    /// Looks up a network by name.
    #[must_use]
    pub fn network(&self, name: &str) -> Option<&NetworkSpec> {
        self.networks.networks.iter().find(|n| n.name == name)
    }
}
