//! Error types for the mzlayout binary layout engine.
//!
//! Construction-time failures (region partition, hex row preconditions,
//! catalog definition) are reported as [`MzError`]. Per-structure decode
//! failures are reported as [`DecodeError`] so callers can turn them into a
//! placeholder instead of aborting the whole view.

use thiserror::Error;

/// Main error type for mzlayout operations.
#[derive(Debug, Error)]
pub enum MzError {
    /// Bad address, length or row length for a byte range
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Structure decode failure
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Machine type maps to neither 32 nor 64 bits
    #[error("Unknown bitness for machine type {0:#06x}")]
    UnknownBitness(u16),

    /// The leading header region cannot be derived without sections
    #[error("Empty section list")]
    EmptySectionList,

    /// The computed regions do not partition the buffer
    #[error("Region layout error: {0}")]
    RegionLayout(String),

    /// Defect in a structure catalog definition
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// The format collaborator could not make sense of the buffer
    #[error("Invalid binary format: {0}")]
    InvalidFormat(String),

    /// File exceeds the configured size limit
    #[error("File size of {found} bytes exceeds the maximum allowed size of {limit} bytes")]
    FileTooLarge { limit: u64, found: u64 },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to decode a structure occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Raw bytes end before the named field does
    #[error("{type_name}.{field}: needed {needed} bytes, only {available} available")]
    Truncated {
        type_name: String,
        field: String,
        needed: usize,
        available: usize,
    },

    /// Type name is not present in the catalog
    #[error("unknown structure type: {0}")]
    UnknownType(String),

    /// Structure occurrence address falls inside no region
    #[error("{type_name} at {address:#x} is not contained in any region")]
    Unmatched { address: u64, type_name: String },
}

/// Result type alias for mzlayout operations
pub type Result<T> = std::result::Result<T, MzError>;
