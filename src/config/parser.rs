//! Document loading and decoding.
//!
//! Every configuration document is XML. Decoding maps the markup onto the
//! entity structs; a decode failure is always reported before any semantic
//! check runs.

use crate::error::{ConfigError, DocumentKind, Result};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, info};

use super::spec::InputSpec;
use super::validator::InputValidator;

/// Reads a document from disk.
///
/// # Errors
///
/// Returns `FileNotFound` if the path does not exist, or a decode error if
/// it cannot be read.
pub fn read_document(kind: DocumentKind, path: &Path) -> Result<Vec<u8>> {
    info!("Loading {kind} from: {}", path.display());

    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    std::fs::read(path).map_err(|e| {
        ConfigError::decode(kind, format!("failed to read {}: {e}", path.display())).into()
    })
}

/// Decodes an XML document into `T`.
///
/// The root element name is not checked; its children are mapped onto `T`.
///
/// # Errors
///
/// Returns a decode error for non UTF-8 input, malformed markup, or
/// missing/mistyped fields.
pub fn decode_document<T: DeserializeOwned>(kind: DocumentKind, raw: &[u8]) -> Result<T> {
    let text = std::str::from_utf8(raw).map_err(|e| ConfigError::decode(kind, e))?;
    quick_xml::de::from_str(text).map_err(|e| ConfigError::decode(kind, e).into())
}

/// Parser for the input specification document.
#[derive(Debug, Default)]
pub struct InputSpecParser {
    validator: InputValidator,
}

impl InputSpecParser {
    /// Creates a new input specification parser.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            validator: InputValidator::new(),
        }
    }

    /// Decodes and validates an input specification.
    ///
    /// # Errors
    ///
    /// Returns a decode error for malformed documents, otherwise the first
    /// validation error in document order.
    pub fn parse(&self, raw: &[u8]) -> Result<InputSpec> {
        debug!("Parsing input specification ({} bytes)", raw.len());

        let spec: InputSpec = decode_document(DocumentKind::InputSpec, raw)?;
        self.validator.validate(&spec)?;

        debug!(
            "Input specification parsed: cpu {}..{}, ram {}..{}",
            spec.cpu.min, spec.cpu.max, spec.ram.min, spec.ram.max
        );
        Ok(spec)
    }

    /// Loads, decodes and validates an input specification file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, decoded or validated.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<InputSpec> {
        let raw = read_document(DocumentKind::InputSpec, path.as_ref())?;
        self.parse(&raw)
    }
}
