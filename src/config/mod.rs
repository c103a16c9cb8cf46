//! Configuration module for the appliance deployer.
//!
//! This module handles the operator-facing input specification:
//! - Decoding `<input_data>` documents
//! - Fail-fast semantic validation of ranges, networks and NIC rules
//! - NIC eligibility policies
//! - The explicit installation context

mod context;
mod nic;
mod parser;
mod spec;
mod validator;

pub use context::{InstallContext, PRODUCT_FILE, ProductInfo, host_arch};
pub use nic::NicPolicy;
pub use parser::{InputSpecParser, decode_document, read_document};
pub use spec::{
    Appearance, InputSpec, ModeType, NetworkMode, NetworkSpec, NetworksConfig, NicFilterSpec,
    NicRule, ResourceRange, UiModeSelection,
};
pub use validator::{InputValidator, validate_network, validate_nic_filter, validate_range};
