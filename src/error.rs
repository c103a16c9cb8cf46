//! Error types for the appliance deployer.
//!
//! This module provides the error hierarchy for every stage between the raw
//! configuration documents and the provisioning collaborator: document
//! decoding and validation, bundle resolution, storage lookup, host facts,
//! and the libvirt driver.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the appliance deployer.
#[derive(Debug, Error)]
pub enum DeployerError {
    /// Configuration document errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Bundle resolution errors.
    #[error("Bundle error: {0}")]
    Bundle(#[from] BundleError),

    /// Storage topology errors.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Host capability errors.
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// Provisioning driver errors.
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Kind of configuration document being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Operator-facing input specification.
    InputSpec,
    /// Hardware bundle catalog.
    BundleCatalog,
    /// Storage topology catalog.
    StorageCatalog,
    /// Hypervisor capabilities reported by the host.
    Capabilities,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputSpec => write!(f, "input specification"),
            Self::BundleCatalog => write!(f, "bundle catalog"),
            Self::StorageCatalog => write!(f, "storage catalog"),
            Self::Capabilities => write!(f, "capabilities"),
        }
    }
}

/// Semantic rule a well-formed document violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    /// A range minimum below zero.
    NegativeMinimum,
    /// A bounded range whose minimum exceeds its maximum.
    MinimumExceedsMaximum,
    /// A bounded range whose default lies outside `[min, max]`.
    DefaultOutOfRange,
    /// Operator input outside a configurable range.
    ValueOutOfRange,
    /// A network without a name.
    EmptyNetworkName,
    /// Two networks sharing a name.
    DuplicateNetworkName,
    /// A network allowing zero interfaces.
    NoInterfaces,
    /// A network declaring no modes.
    NoModes,
    /// A mode type declared twice on one network.
    DuplicateMode,
    /// A bridged or direct mode without a vNIC driver.
    MissingVnicDriver,
    /// An enabled UI mode selection missing a declared mode.
    IncompleteUiModeSelection,
    /// An enabled UI mode selection naming an undeclared mode.
    UnknownUiMode,
    /// An enabled UI mode selection listing a mode twice.
    DuplicateUiModeAppearance,
    /// A NIC rule without a vendor.
    EmptyNicVendor,
    /// Partition sequence numbers not strictly increasing on a disk.
    PartitionSequenceOrder,
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NegativeMinimum => "minimum must not be negative",
            Self::MinimumExceedsMaximum => "minimum exceeds maximum",
            Self::DefaultOutOfRange => "default value outside [min, max]",
            Self::ValueOutOfRange => "value outside the allowed range",
            Self::EmptyNetworkName => "network name must not be empty",
            Self::DuplicateNetworkName => "duplicate network name",
            Self::NoInterfaces => "max_ifaces must be greater than zero",
            Self::NoModes => "network declares no modes",
            Self::DuplicateMode => "duplicate network mode",
            Self::MissingVnicDriver => "vnic_driver is required for bridged and direct modes",
            Self::IncompleteUiModeSelection => "incomplete UI mode selection",
            Self::UnknownUiMode => "UI mode selection references unknown mode",
            Self::DuplicateUiModeAppearance => "duplicate UI mode appearance",
            Self::EmptyNicVendor => "NIC rule vendor must not be empty",
            Self::PartitionSequenceOrder => "partition sequence must be strictly increasing",
        };
        f.write_str(text)
    }
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The document is malformed or does not map onto the expected entities.
    #[error("Failed to decode {document}: {message}")]
    Decode {
        /// Document being decoded.
        document: DocumentKind,
        /// Description of the decode error.
        message: String,
    },

    /// The document is well-formed but semantically invalid.
    #[error("Validation failed for {field}: {rule} ({value})")]
    Validation {
        /// Path of the offending field.
        field: String,
        /// Rule that was violated.
        rule: ValidationRule,
        /// Offending value.
        value: String,
    },

    /// The product metadata file is unusable.
    #[error("Invalid product metadata at {path}: {message}")]
    ProductInfo {
        /// Path to the product file.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },
}

/// Bundle resolution errors.
#[derive(Debug, Error)]
pub enum BundleError {
    /// No bundle fits into the host RAM.
    #[error("No eligible configuration is available for the host ({host_ram_mb}MB RAM, {catalog_size} bundles in catalog)")]
    NoEligibleConfiguration {
        /// Host RAM in megabytes.
        host_ram_mb: u64,
        /// Number of bundles in the catalog.
        catalog_size: usize,
    },

    /// The operator aborted an interactive step.
    #[error("Operation cancelled by operator")]
    OperatorCancelled,

    /// The chooser returned an entry that was never presented.
    #[error("Selection {selected} is out of range ({available} bundles presented)")]
    InvalidSelection {
        /// Zero-based index returned by the chooser.
        selected: usize,
        /// Number of bundles presented.
        available: usize,
    },
}

/// Storage topology errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A bundle references a storage index absent from the catalog.
    #[error("Storage configuration index {index} out of range (catalog holds {size})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of configurations in the catalog.
        size: usize,
    },
}

/// Host capability errors.
#[derive(Debug, Error)]
pub enum HostError {
    /// A host fact could not be read.
    #[error("Failed to read host {fact}: {message}")]
    Unavailable {
        /// Name of the fact (e.g. "RAM size").
        fact: String,
        /// Description of the failure.
        message: String,
    },
}

/// Provisioning driver errors.
#[derive(Debug, Error)]
pub enum DriverError {
    /// A command could not be started.
    #[error("Failed to spawn '{command}': {message}")]
    Spawn {
        /// Command line.
        command: String,
        /// Description of the failure.
        message: String,
    },

    /// A command exited unsuccessfully.
    #[error("Command '{command}' failed with status {status:?}: {stderr}")]
    CommandFailed {
        /// Command line.
        command: String,
        /// Exit code if available.
        status: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// Architecture the hypervisor cannot emulate.
    #[error("Unsupported architecture ({arch}), supported i686 and x86_64 only")]
    UnsupportedArch {
        /// Requested architecture.
        arch: String,
    },

    /// A command produced output that could not be interpreted.
    #[error("Unexpected output from '{command}': {message}")]
    UnexpectedOutput {
        /// Command line.
        command: String,
        /// Description of the problem.
        message: String,
    },
}

/// Result type alias for deployer operations.
pub type Result<T> = std::result::Result<T, DeployerError>;

impl DeployerError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if the error points at a defect in the configuration
    /// documents rather than at the operator or the host.
    #[must_use]
    pub const fn is_authoring_defect(&self) -> bool {
        matches!(
            self,
            Self::Config(ConfigError::Decode { .. } | ConfigError::Validation { .. })
                | Self::Bundle(BundleError::NoEligibleConfiguration { .. })
                | Self::Storage(StorageError::IndexOutOfRange { .. })
        )
    }

    /// Returns true if the operator aborted an interactive step.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Bundle(BundleError::OperatorCancelled))
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(
        field: impl Into<String>,
        rule: ValidationRule,
        value: impl fmt::Display,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            rule,
            value: value.to_string(),
        }
    }

    /// Creates a decode error for the given document.
    #[must_use]
    pub fn decode(document: DocumentKind, message: impl fmt::Display) -> Self {
        Self::Decode {
            document,
            message: message.to_string(),
        }
    }

    /// Returns the violated rule if this is a validation error.
    #[must_use]
    pub const fn rule(&self) -> Option<ValidationRule> {
        match self {
            Self::Validation { rule, .. } => Some(*rule),
            _ => None,
        }
    }
}

impl HostError {
    /// Creates an unavailable-fact error.
    #[must_use]
    pub fn unavailable(fact: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Unavailable {
            fact: fact.into(),
            message: message.to_string(),
        }
    }
}
