//! Geohash encoding and decoding by interval bisection.
//!
//! A geohash names a rectangular cell of the latitude/longitude grid with a
//! short base32 string. Each symbol contributes five interval bisections,
//! alternating longitude and latitude starting with longitude, so every
//! added symbol shrinks the cell by half per bisection and every prefix of
//! a geohash names an enclosing cell. Decoding recovers the cell's center
//! together with its half-width along each axis.

use crate::error::{GeoFilterError, Result};
use geo::{Coord, Point, Rect};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Symbol alphabet, indexed by 5-bit cell value. The letters `a`, `i`, `l`
/// and `o` are excluded to avoid transcription ambiguity.
const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Bit masks applied to a symbol value, most significant first.
const BITS: [u8; 5] = [16, 8, 4, 2, 1];

/// Default geohash length, giving sub-meter cells at the equator.
pub const DEFAULT_PRECISION: usize = 12;

/// Reverse lookup from symbol to its 5-bit value.
static DECODE_MAP: Lazy<HashMap<char, u8>> = Lazy::new(|| {
    BASE32
        .iter()
        .enumerate()
        .map(|(index, &symbol)| (symbol as char, index as u8))
        .collect()
});

/// Search interval over one coordinate axis.
#[derive(Debug, Clone, Copy)]
struct Interval {
    low: f64,
    high: f64,
}

impl Interval {
    const LATITUDE: Self = Self {
        low: -90.0,
        high: 90.0,
    };
    const LONGITUDE: Self = Self {
        low: -180.0,
        high: 180.0,
    };

    fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    fn half_width(&self) -> f64 {
        (self.high - self.low) / 2.0
    }
}

/// A position recovered from a geohash, with the residual uncertainty of
/// its cell.
///
/// `latitude` and `longitude` are the cell center; the `*_error` fields are
/// the cell's half-widths, so the encoded position lies within
/// `center ± error` on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecodedPosition {
    /// Cell center latitude in degrees.
    pub latitude: f64,
    /// Cell center longitude in degrees.
    pub longitude: f64,
    /// Half-width of the cell along the latitude axis, in degrees.
    pub latitude_error: f64,
    /// Half-width of the cell along the longitude axis, in degrees.
    pub longitude_error: f64,
}

impl DecodedPosition {
    /// The cell center as a point.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use geofilter::geohash::decode;
    ///
    /// let position = decode("ezs42").unwrap();
    /// let center = position.center();
    /// assert_eq!(center.x(), position.longitude);
    /// assert_eq!(center.y(), position.latitude);
    /// ```
    pub fn center(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    /// The full cell as an axis-aligned rectangle.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use geofilter::geohash::decode;
    ///
    /// let position = decode("ezs42").unwrap();
    /// let rect = position.bounding_rect();
    /// assert!(rect.min().x <= position.longitude && position.longitude <= rect.max().x);
    /// ```
    pub fn bounding_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.longitude - self.longitude_error,
                y: self.latitude - self.latitude_error,
            },
            Coord {
                x: self.longitude + self.longitude_error,
                y: self.latitude + self.latitude_error,
            },
        )
    }
}

/// Encode a position as a geohash of `precision` symbols.
///
/// Longitude is bisected first. At each step the value's half of the
/// current interval becomes the new interval; a value exactly on the
/// midpoint goes to the lower half. Five bisections are packed into one
/// base32 symbol, most significant bit first.
///
/// # Arguments
///
/// * `coord` - Position with `x` as longitude and `y` as latitude, in
///   degrees. Anything convertible to [`Coord<f64>`] is accepted, including
///   [`Point<f64>`] and `(f64, f64)` pairs in `(x, y)` order.
/// * `precision` - Number of symbols to produce. Must be at least 1.
///
/// # Returns
///
/// The geohash string, or an error if the precision is zero or the
/// coordinate lies outside the geographic domain.
///
/// # Examples
///
/// ```rust
/// use geo::Coord;
/// use geofilter::geohash::{DEFAULT_PRECISION, encode};
///
/// let chicago = Coord {
///     x: -87.629799,
///     y: 41.878113,
/// };
/// assert_eq!(encode(chicago, DEFAULT_PRECISION).unwrap(), "dp3wjztvtwjf");
/// assert_eq!(encode(chicago, 5).unwrap(), "dp3wj");
/// ```
///
/// # Errors
///
/// Returns [`GeoFilterError::InvalidPrecision`] when `precision` is zero and
/// [`GeoFilterError::OutOfRange`] when the latitude is outside `[-90, 90]`,
/// the longitude is outside `[-180, 180]`, or either coordinate is not
/// finite.
pub fn encode(coord: impl Into<Coord<f64>>, precision: usize) -> Result<String> {
    let coord = coord.into();
    if precision == 0 {
        return Err(GeoFilterError::InvalidPrecision(precision));
    }
    validate_coord(&coord)?;

    let mut latitude = Interval::LATITUDE;
    let mut longitude = Interval::LONGITUDE;
    let mut encoded = String::with_capacity(precision);
    let mut symbol = 0u8;
    let mut bit = 0usize;
    let mut bisect_longitude = true;

    while encoded.len() < precision {
        let (interval, value) = if bisect_longitude {
            (&mut longitude, coord.x)
        } else {
            (&mut latitude, coord.y)
        };
        let mid = interval.midpoint();
        if value > mid {
            symbol |= BITS[bit];
            interval.low = mid;
        } else {
            interval.high = mid;
        }
        bisect_longitude = !bisect_longitude;

        if bit < 4 {
            bit += 1;
        } else {
            encoded.push(BASE32[symbol as usize] as char);
            symbol = 0;
            bit = 0;
        }
    }

    Ok(encoded)
}

/// Decode a geohash to its cell center and per-axis uncertainty.
///
/// Replays the bisections named by each symbol, narrowing the latitude and
/// longitude intervals, and returns the midpoints of the final intervals
/// together with their half-widths. Longer geohashes yield smaller errors;
/// a prefix of a geohash decodes to an enclosing cell.
///
/// # Arguments
///
/// * `geohash` - Geohash string in the lowercase base32 alphabet.
///
/// # Returns
///
/// The decoded position, or an error if the string is empty or contains a
/// symbol outside the alphabet.
///
/// # Examples
///
/// ```rust
/// use geofilter::geohash::decode;
///
/// let position = decode("dp3wjztvtwjf").unwrap();
/// assert!((position.latitude - 41.878113).abs() < 1e-6);
/// assert!((position.longitude - -87.629799).abs() < 1e-6);
/// assert!(position.latitude_error < 1e-7);
/// ```
///
/// # Errors
///
/// Returns [`GeoFilterError::EmptyGeohash`] for the empty string and
/// [`GeoFilterError::InvalidSymbol`] for any character outside the
/// alphabet, including uppercase variants of valid symbols.
pub fn decode(geohash: &str) -> Result<DecodedPosition> {
    if geohash.is_empty() {
        return Err(GeoFilterError::EmptyGeohash);
    }

    let mut latitude = Interval::LATITUDE;
    let mut longitude = Interval::LONGITUDE;
    let mut bisect_longitude = true;

    for symbol in geohash.chars() {
        let value = *DECODE_MAP
            .get(&symbol)
            .ok_or(GeoFilterError::InvalidSymbol(symbol))?;
        for mask in BITS {
            let interval = if bisect_longitude {
                &mut longitude
            } else {
                &mut latitude
            };
            let mid = interval.midpoint();
            if value & mask != 0 {
                interval.low = mid;
            } else {
                interval.high = mid;
            }
            bisect_longitude = !bisect_longitude;
        }
    }

    Ok(DecodedPosition {
        latitude: latitude.midpoint(),
        longitude: longitude.midpoint(),
        latitude_error: latitude.half_width(),
        longitude_error: longitude.half_width(),
    })
}

fn validate_coord(coord: &Coord<f64>) -> Result<()> {
    if !coord.y.is_finite() || coord.y < Interval::LATITUDE.low || coord.y > Interval::LATITUDE.high
    {
        return Err(GeoFilterError::OutOfRange(format!(
            "latitude {} is outside [-90, 90]",
            coord.y
        )));
    }
    if !coord.x.is_finite()
        || coord.x < Interval::LONGITUDE.low
        || coord.x > Interval::LONGITUDE.high
    {
        return Err(GeoFilterError::OutOfRange(format!(
            "longitude {} is outside [-180, 180]",
            coord.x
        )));
    }
    Ok(())
}
