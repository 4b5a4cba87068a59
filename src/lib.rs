//! Geohash codec and Bloom filter membership for geospatial workloads.
//!
//! ```rust
//! use geofilter::{BloomFilter, Coord, DEFAULT_PRECISION, encode};
//!
//! let chicago = Coord {
//!     x: -87.629799,
//!     y: 41.878113,
//! };
//! let hash = encode(chicago, DEFAULT_PRECISION)?;
//! assert_eq!(hash, "dp3wjztvtwjf");
//!
//! let mut visited = BloomFilter::new(1000, 0.01)?;
//! visited.add(&hash);
//! assert!(visited.contains(&hash));
//! assert!(!visited.contains("u09tvw0f64r7"));
//! # Ok::<(), geofilter::GeoFilterError>(())
//! ```

pub mod bloom;
pub mod error;
pub mod geohash;
pub mod hash;

pub use bloom::{BloomFilter, DEFAULT_FALSE_POSITIVE_RATE, FilterConfig};
pub use error::{GeoFilterError, Result};
pub use geohash::{DEFAULT_PRECISION, DecodedPosition, decode, encode};
pub use hash::{BloomHasher, Murmur3};

pub use geo::{Coord, Point, Rect};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{BloomFilter, FilterConfig, GeoFilterError, Result};

    pub use crate::geohash::{DEFAULT_PRECISION, DecodedPosition, decode, encode};

    pub use crate::hash::{BloomHasher, Murmur3};

    pub use geo::{Coord, Point, Rect};
}
