//! Shared error types returned by the operations layer.
//!
//! Variants cover handle resolution against a provider, point-set integrity violations, and
//! marker output failures so callers can report precisely which input was at fault.

use thiserror::Error;

/// Error conditions surfaced by the operations layer.
#[derive(Debug, Error)]
pub enum Error {
    /// The provider holds no structure under the requested object name.
    #[error("no structure named '{name}' has been loaded")]
    UnknownStructure { name: String },

    /// The handle restricts extraction to a chain the structure does not contain.
    #[error("structure '{structure}' has no chain '{chain}'")]
    UnknownChain { structure: String, chain: String },

    /// A structure handle string could not be parsed.
    #[error("invalid structure handle '{handle}': {reason}")]
    InvalidHandle { handle: String, reason: String },

    /// Two points of one point set share a residue identifier.
    #[error("duplicate residue '{id}' in point set")]
    DuplicateResidue { id: String },

    /// A point carries a coordinate that is not a finite real number.
    #[error("malformed point for residue '{id}': {details}")]
    MalformedPoint { id: String, details: String },

    /// Writing marker output failed.
    #[error("failed to write residue marks: {source}")]
    MarkOutput {
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Helper for constructing an [`Error::UnknownStructure`] variant.
    pub fn unknown_structure(name: impl Into<String>) -> Self {
        Self::UnknownStructure { name: name.into() }
    }

    /// Helper for constructing an [`Error::UnknownChain`] variant.
    ///
    /// # Arguments
    ///
    /// * `structure` - Object name of the structure that was searched.
    /// * `chain` - Chain identifier requested by the handle.
    pub fn unknown_chain(structure: impl Into<String>, chain: impl Into<String>) -> Self {
        Self::UnknownChain {
            structure: structure.into(),
            chain: chain.into(),
        }
    }

    /// Helper for constructing an [`Error::InvalidHandle`] variant.
    pub fn invalid_handle(handle: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHandle {
            handle: handle.into(),
            reason: reason.into(),
        }
    }

    /// Helper for constructing an [`Error::MalformedPoint`] variant.
    ///
    /// # Arguments
    ///
    /// * `id` - Display form of the offending residue identifier.
    /// * `details` - Description of the integrity violation.
    pub fn malformed_point(id: impl Into<String>, details: impl Into<String>) -> Self {
        Self::MalformedPoint {
            id: id.into(),
            details: details.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::MarkOutput { source }
    }
}
