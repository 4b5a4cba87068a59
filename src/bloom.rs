//! Probabilistic set membership with a Bloom filter.
//!
//! A Bloom filter answers "have I seen this element?" in constant space with
//! one-sided error: `contains` never reports an added element as absent, but
//! may report an absent element as present. The filter is a fixed bit array;
//! each element is projected to `hash_count` bit positions by hashing it
//! under distinct seeds, `add` sets those bits, and `contains` checks them.
//!
//! Sizing follows the standard analysis. For `n` expected elements at target
//! false positive rate `p`, the bit count is `ceil(-n * ln(p) / (ln 2)^2)`
//! and the projection count is `floor((bits / n) * ln 2)`, at least one.

use crate::error::{GeoFilterError, Result};
use crate::hash::{BloomHasher, Murmur3};
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;

/// Default target false positive rate for filters sized without an explicit
/// rate, matching [`FilterConfig`]'s serde default.
pub const DEFAULT_FALSE_POSITIVE_RATE: f64 = 0.05;

const WORD_BITS: usize = 64;

const fn default_false_positive_rate() -> f64 {
    DEFAULT_FALSE_POSITIVE_RATE
}

/// Number of bits needed to hold `expected_items` elements at
/// `false_positive_rate`.
///
/// Evaluates `-n * ln(p) / (ln 2)^2`, rounded up so truncation can never
/// push the realized rate above the target. The inputs are assumed to be in
/// their valid domain; constructors validate before calling.
///
/// # Examples
///
/// ```rust
/// use geofilter::bloom::{optimal_bit_count, optimal_hash_count};
///
/// let bits = optimal_bit_count(20, 0.05);
/// assert_eq!(bits, 125);
/// assert_eq!(optimal_hash_count(bits, 20), 4);
/// ```
pub fn optimal_bit_count(expected_items: usize, false_positive_rate: f64) -> usize {
    let bits = -(expected_items as f64 * false_positive_rate.ln()) / (LN_2 * LN_2);
    bits.ceil() as usize
}

/// Number of hash projections that minimizes the false positive rate for a
/// filter of `bit_count` bits holding `expected_items` elements.
///
/// Evaluates `(bit_count / n) * ln 2`, rounded down and clamped to at least
/// one so undersized filters still probe a bit per element.
pub fn optimal_hash_count(bit_count: usize, expected_items: usize) -> u32 {
    let per_item = bit_count as f64 / expected_items as f64;
    ((per_item * LN_2).floor() as u32).max(1)
}

/// Sizing parameters for a [`BloomFilter`].
///
/// Serializable so deployments can keep filter sizing in configuration
/// files. `false_positive_rate` defaults to
/// [`DEFAULT_FALSE_POSITIVE_RATE`] when absent from the source document.
///
/// # Examples
///
/// ```rust
/// use geofilter::bloom::FilterConfig;
///
/// let config = FilterConfig::from_json(r#"{"expected_items": 500}"#).unwrap();
/// assert_eq!(config.expected_items, 500);
/// assert_eq!(config.false_positive_rate, 0.05);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Number of distinct elements the filter is sized for.
    pub expected_items: usize,
    /// Target probability of a false positive once `expected_items`
    /// elements have been added.
    #[serde(default = "default_false_positive_rate")]
    pub false_positive_rate: f64,
}

impl FilterConfig {
    /// Create a configuration with explicit sizing parameters.
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Self {
        Self {
            expected_items,
            false_positive_rate,
        }
    }

    /// Set the target false positive rate.
    pub fn with_false_positive_rate(mut self, false_positive_rate: f64) -> Self {
        self.false_positive_rate = false_positive_rate;
        self
    }

    /// Check that the parameters are in their valid domain.
    ///
    /// # Errors
    ///
    /// Returns [`GeoFilterError::InvalidParameters`] when `expected_items`
    /// is zero or `false_positive_rate` is not strictly between 0 and 1.
    pub fn validate(&self) -> Result<()> {
        if self.expected_items == 0 {
            return Err(GeoFilterError::InvalidParameters(
                "expected_items must be at least 1".to_string(),
            ));
        }
        if !self.false_positive_rate.is_finite()
            || self.false_positive_rate <= 0.0
            || self.false_positive_rate >= 1.0
        {
            return Err(GeoFilterError::InvalidParameters(format!(
                "false_positive_rate {} must be strictly between 0 and 1",
                self.false_positive_rate
            )));
        }
        Ok(())
    }

    /// Parse and validate a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`GeoFilterError::InvalidFormat`] when the document does not
    /// parse and [`GeoFilterError::InvalidParameters`] when the parsed
    /// values fail [`FilterConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| GeoFilterError::InvalidFormat(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| GeoFilterError::InvalidFormat(e.to_string()))
    }
}

/// Space-efficient probabilistic membership set.
///
/// The bit array and projection count are derived from the expected element
/// count and target false positive rate at construction and never change.
/// Projection `i` hashes the element bytes under seed `i`, so the hash
/// family behaves as `hash_count` independent projections of the element
/// into the bit array. The hash implementation is injected through
/// [`BloomHasher`] and defaults to [`Murmur3`].
///
/// Added elements are always reported present. Absent elements are reported
/// present with probability near the target rate while the filter holds at
/// most the expected number of elements; the filter never rehashes, so
/// overfilling degrades the rate rather than failing.
///
/// # Examples
///
/// ```rust
/// use geofilter::BloomFilter;
///
/// let mut filter = BloomFilter::new(20, 0.05).unwrap();
/// assert_eq!(filter.size(), 125);
/// assert_eq!(filter.hash_count(), 4);
///
/// filter.add("chicago");
/// assert!(filter.contains("chicago"));
/// assert!(!filter.contains("paris"));
/// ```
#[derive(Debug, Clone)]
pub struct BloomFilter<H: BloomHasher = Murmur3> {
    size: usize,
    hash_count: u32,
    bits: Vec<u64>,
    expected_items: usize,
    target_false_positive_rate: f64,
    hasher: H,
}

impl BloomFilter {
    /// Create a filter sized for `expected_items` elements at
    /// `false_positive_rate`, using the default hash family.
    ///
    /// # Arguments
    ///
    /// * `expected_items` - Number of distinct elements the filter should
    ///   hold before the false positive rate reaches the target. Must be at
    ///   least 1.
    /// * `false_positive_rate` - Target probability of a false positive,
    ///   strictly between 0 and 1.
    ///
    /// # Errors
    ///
    /// Returns [`GeoFilterError::InvalidParameters`] when either parameter
    /// is outside its domain.
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Result<Self> {
        Self::with_hasher(expected_items, false_positive_rate, Murmur3)
    }

    /// Create a filter sized for `expected_items` elements at
    /// [`DEFAULT_FALSE_POSITIVE_RATE`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use geofilter::BloomFilter;
    ///
    /// let filter = BloomFilter::with_expected_items(20).unwrap();
    /// assert_eq!(filter.target_false_positive_rate(), 0.05);
    /// assert_eq!(filter.size(), 125);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`GeoFilterError::InvalidParameters`] when `expected_items`
    /// is zero.
    pub fn with_expected_items(expected_items: usize) -> Result<Self> {
        Self::new(expected_items, DEFAULT_FALSE_POSITIVE_RATE)
    }

    /// Create a filter from a sizing configuration.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use geofilter::bloom::{BloomFilter, FilterConfig};
    ///
    /// let config = FilterConfig::new(20, 0.05);
    /// let filter = BloomFilter::from_config(&config).unwrap();
    /// assert_eq!(filter.size(), 125);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`GeoFilterError::InvalidParameters`] when the configuration
    /// fails [`FilterConfig::validate`].
    pub fn from_config(config: &FilterConfig) -> Result<Self> {
        Self::new(config.expected_items, config.false_positive_rate)
    }
}

impl<H: BloomHasher> BloomFilter<H> {
    /// Create a filter backed by a caller-provided hash family.
    ///
    /// The sizing math is independent of the hasher; the realized false
    /// positive rate matches the target only if the hasher distributes
    /// well, as [`Murmur3`] does.
    pub fn with_hasher(expected_items: usize, false_positive_rate: f64, hasher: H) -> Result<Self> {
        FilterConfig::new(expected_items, false_positive_rate).validate()?;

        let size = optimal_bit_count(expected_items, false_positive_rate);
        let hash_count = optimal_hash_count(size, expected_items);
        log::debug!(
            "sized bloom filter at {size} bits with {hash_count} projections for {expected_items} expected items (target rate {false_positive_rate})"
        );

        Ok(Self {
            size,
            hash_count,
            bits: vec![0u64; size.div_ceil(WORD_BITS)],
            expected_items,
            target_false_positive_rate: false_positive_rate,
            hasher,
        })
    }

    /// Add an element to the filter.
    ///
    /// Sets the element's projected bits. Adding is idempotent; re-adding
    /// an element sets the same bits and leaves the filter unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use geofilter::BloomFilter;
    ///
    /// let mut filter = BloomFilter::new(100, 0.01).unwrap();
    /// filter.add("dp3wjztvtwjf");
    /// filter.add(b"raw bytes work too".as_slice());
    /// assert!(filter.contains("dp3wjztvtwjf"));
    /// ```
    pub fn add(&mut self, element: impl AsRef<[u8]>) {
        let element = element.as_ref();
        for seed in 0..self.hash_count {
            let index = self.project(element, seed);
            self.bits[index / WORD_BITS] |= 1 << (index % WORD_BITS);
        }
    }

    /// Report whether the element may have been added.
    ///
    /// `false` is definitive. `true` means either the element was added or
    /// every one of its projected bits was set by other elements, which
    /// happens with probability near the target rate for a filter within
    /// its expected capacity.
    pub fn contains(&self, element: impl AsRef<[u8]>) -> bool {
        let element = element.as_ref();
        (0..self.hash_count).all(|seed| {
            let index = self.project(element, seed);
            self.bits[index / WORD_BITS] & (1 << (index % WORD_BITS)) != 0
        })
    }

    /// Number of bits in the filter.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of hash projections per element.
    pub fn hash_count(&self) -> u32 {
        self.hash_count
    }

    /// Number of elements the filter was sized for.
    pub fn expected_items(&self) -> usize {
        self.expected_items
    }

    /// The false positive rate the filter was sized for.
    pub fn target_false_positive_rate(&self) -> f64 {
        self.target_false_positive_rate
    }

    /// Number of bits currently set.
    pub fn bits_set(&self) -> usize {
        self.bits.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Whether no bit is set.
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|word| *word == 0)
    }

    /// Fraction of bits currently set, in `[0, 1]`.
    pub fn load_factor(&self) -> f64 {
        self.bits_set() as f64 / self.size as f64
    }

    /// Estimate of the current false positive rate.
    ///
    /// A lookup of an absent element reports present only when all of its
    /// `hash_count` probed bits are set, so the estimate is the load factor
    /// raised to that power. Starts at zero and approaches the target rate
    /// as the filter fills toward its expected capacity.
    pub fn estimated_false_positive_rate(&self) -> f64 {
        self.load_factor().powi(self.hash_count as i32)
    }

    fn project(&self, element: &[u8], seed: u32) -> usize {
        self.hasher.hash(element, seed) as usize % self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_derivation() {
        let cases = [
            (20, 0.05, 125, 4),
            (100, 0.01, 959, 6),
            (1000, 0.01, 9586, 6),
            (50, 0.02, 408, 5),
        ];
        for (items, rate, size, hashes) in cases {
            let filter = BloomFilter::new(items, rate).unwrap();
            assert_eq!(filter.size(), size, "bit count for ({items}, {rate})");
            assert_eq!(filter.hash_count(), hashes, "hash count for ({items}, {rate})");
            assert_eq!(filter.target_false_positive_rate(), rate);
        }
    }

    #[test]
    fn test_default_rate_constructor() {
        let filter = BloomFilter::with_expected_items(20).unwrap();
        assert_eq!(filter.target_false_positive_rate(), DEFAULT_FALSE_POSITIVE_RATE);
        assert_eq!(filter.size(), 125);
        assert_eq!(filter.hash_count(), 4);
        assert_eq!(filter.expected_items(), 20);
    }

    #[test]
    fn test_hash_count_clamped_to_one() {
        // A 1-bit filter would otherwise round down to zero projections.
        let tiny = BloomFilter::new(1, 0.99).unwrap();
        assert_eq!(tiny.size(), 1);
        assert_eq!(tiny.hash_count(), 1);

        let small = BloomFilter::new(2, 0.5).unwrap();
        assert_eq!(small.size(), 3);
        assert_eq!(small.hash_count(), 1);
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(matches!(
            BloomFilter::new(0, 0.05),
            Err(GeoFilterError::InvalidParameters(_))
        ));
        for rate in [0.0, 1.0, -0.1, 1.5, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(
                    BloomFilter::new(20, rate),
                    Err(GeoFilterError::InvalidParameters(_))
                ),
                "rate {rate} should be rejected"
            );
        }
    }

    #[test]
    fn test_empty_filter() {
        let filter = BloomFilter::new(20, 0.05).unwrap();
        assert!(filter.is_empty());
        assert_eq!(filter.expected_items(), 20);
        assert_eq!(filter.bits_set(), 0);
        assert_eq!(filter.load_factor(), 0.0);
        assert_eq!(filter.estimated_false_positive_rate(), 0.0);
        assert!(!filter.contains("anything"));
    }

    #[test]
    fn test_add_and_contains() {
        let mut filter = BloomFilter::new(20, 0.05).unwrap();
        let cities = ["chicago", "new york", "london", "tokyo", "sydney"];
        for city in cities {
            filter.add(city);
        }

        for city in cities {
            assert!(filter.contains(city));
        }
        assert!(!filter.contains("paris"));
        assert!(!filter.contains("berlin"));

        assert!(!filter.is_empty());
        // Five elements at four projections each set at most twenty bits.
        assert!(filter.bits_set() > 0 && filter.bits_set() <= 20);
    }

    #[test]
    fn test_no_false_negatives() {
        let mut filter = BloomFilter::new(100, 0.01).unwrap();
        for i in 0..100 {
            filter.add(format!("item-{i}"));
        }
        for i in 0..100 {
            assert!(filter.contains(format!("item-{i}")), "item-{i} must be present");
        }
    }

    #[test]
    fn test_false_positive_rate_is_bounded() {
        let mut filter = BloomFilter::new(100, 0.01).unwrap();
        for i in 0..100 {
            filter.add(format!("item-{i}"));
        }

        let false_positives = (0..1000)
            .filter(|i| filter.contains(format!("absent-{i}")))
            .count();
        // At capacity the realized rate stays near the 1% target.
        assert!(
            false_positives < 30,
            "{false_positives} false positives out of 1000 lookups"
        );
    }

    #[test]
    fn test_estimated_rate_tracks_target_at_capacity() {
        let mut filter = BloomFilter::new(20, 0.05).unwrap();
        assert_eq!(filter.estimated_false_positive_rate(), 0.0);

        for i in 0..20 {
            filter.add(format!("city-{i}"));
        }

        assert!(filter.load_factor() > 0.3 && filter.load_factor() < 0.6);
        let estimate = filter.estimated_false_positive_rate();
        assert!(estimate > 0.0 && estimate < 0.1, "estimate {estimate}");

        let false_positives = (0..200)
            .filter(|i| filter.contains(format!("town-{i}")))
            .count();
        assert!(
            false_positives <= 20,
            "{false_positives} false positives out of 200 lookups"
        );
    }

    #[test]
    fn test_duplicate_adds_touch_same_bits() {
        let mut filter = BloomFilter::new(20, 0.05).unwrap();
        filter.add("chicago");
        let bits_after_first = filter.bits_set();

        filter.add("chicago");
        assert_eq!(filter.bits_set(), bits_after_first);
        assert!(filter.contains("chicago"));
    }

    #[test]
    fn test_single_bit_filter_saturates() {
        // Every projection reduces modulo 1, so one add sets the only bit
        // and every lookup afterwards reports present.
        let mut filter = BloomFilter::new(1, 0.99).unwrap();
        assert!(!filter.contains("anything"));
        filter.add("x");
        assert!(filter.contains("x"));
        assert!(filter.contains("y"));
        assert_eq!(filter.load_factor(), 1.0);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut filter = BloomFilter::new(20, 0.05).unwrap();
        filter.add("chicago");
        let snapshot = filter.clone();

        filter.add("tokyo");
        assert!(filter.contains("tokyo"));
        assert!(!snapshot.contains("tokyo"));
        assert!(snapshot.contains("chicago"));
    }

    #[derive(Debug, Clone, Copy, Default)]
    struct WeakHasher;

    impl BloomHasher for WeakHasher {
        fn hash(&self, data: &[u8], seed: u32) -> u32 {
            data.iter().fold(seed.wrapping_mul(31).wrapping_add(1), |acc, &byte| {
                acc.wrapping_mul(131).wrapping_add(u32::from(byte))
            })
        }
    }

    #[test]
    fn test_custom_hasher_keeps_membership_guarantee() {
        let mut filter = BloomFilter::with_hasher(10, 0.05, WeakHasher).unwrap();
        // Sizing is independent of the hash family.
        assert_eq!(filter.size(), optimal_bit_count(10, 0.05));

        for i in 0..10 {
            filter.add(format!("key-{i}"));
        }
        for i in 0..10 {
            assert!(filter.contains(format!("key-{i}")));
        }
    }

    #[test]
    fn test_config_validate() {
        assert!(FilterConfig::new(20, 0.05).validate().is_ok());
        assert!(FilterConfig::new(0, 0.05).validate().is_err());
        assert!(FilterConfig::new(20, 0.0).validate().is_err());
        assert!(FilterConfig::new(20, 1.0).validate().is_err());
        assert!(FilterConfig::new(20, f64::NAN).validate().is_err());
    }

    #[test]
    fn test_config_builder_style() {
        let config = FilterConfig::new(500, DEFAULT_FALSE_POSITIVE_RATE)
            .with_false_positive_rate(0.01);
        assert_eq!(config.expected_items, 500);
        assert_eq!(config.false_positive_rate, 0.01);
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = FilterConfig::new(500, 0.01);
        let json = config.to_json().unwrap();
        assert_eq!(FilterConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_config_json_applies_default_rate() {
        let config = FilterConfig::from_json(r#"{"expected_items": 500}"#).unwrap();
        assert_eq!(config.expected_items, 500);
        assert_eq!(config.false_positive_rate, DEFAULT_FALSE_POSITIVE_RATE);
    }

    #[test]
    fn test_config_json_rejects_bad_input() {
        assert!(matches!(
            FilterConfig::from_json("not json"),
            Err(GeoFilterError::InvalidFormat(_))
        ));
        assert!(matches!(
            FilterConfig::from_json(r#"{"expected_items": 0}"#),
            Err(GeoFilterError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let config = FilterConfig::new(20, 0.05);
        let mut filter = BloomFilter::from_config(&config).unwrap();
        assert_eq!(filter.size(), 125);
        assert_eq!(filter.hash_count(), 4);

        filter.add("dp3wjztvtwjf");
        assert!(filter.contains("dp3wjztvtwjf"));
    }
}
