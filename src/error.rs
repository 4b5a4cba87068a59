//! Error types for geohash and membership filter operations.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, GeoFilterError>;

/// Errors returned by encoding, decoding, and filter construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoFilterError {
    /// A geohash contained a character outside the base32 alphabet.
    #[error("invalid geohash symbol '{0}'")]
    InvalidSymbol(char),

    /// An empty string was given where a geohash was expected.
    #[error("geohash must contain at least one symbol")]
    EmptyGeohash,

    /// A coordinate lay outside the geographic domain.
    #[error("coordinate out of range: {0}")]
    OutOfRange(String),

    /// A geohash length that cannot produce any symbols.
    #[error("invalid precision {0}: at least one symbol is required")]
    InvalidPrecision(usize),

    /// Filter sizing parameters outside their valid domain.
    #[error("invalid filter parameters: {0}")]
    InvalidParameters(String),

    /// A configuration document that could not be parsed.
    #[error("invalid configuration format: {0}")]
    InvalidFormat(String),
}
