//! Seeded non-cryptographic hashing for Bloom filter projections.
//!
//! The filter needs `hash_count` statistically independent projections of an
//! element into its bit array. Independence comes from seeding one fast hash
//! function with a distinct seed per projection index rather than chaining
//! digests, so the hash requirement is expressed as a trait and injected
//! into the filter.

const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;

/// Hash family contract consumed by [`BloomFilter`](crate::BloomFilter).
///
/// Implementations must be deterministic for identical `(data, seed)` pairs
/// and well distributed over `u32`; distinct seeds must behave as
/// statistically independent projections. The filter's correctness argument
/// depends only on this contract, not on a particular algorithm.
pub trait BloomHasher {
    /// Digest `data` under the given `seed`.
    fn hash(&self, data: &[u8], seed: u32) -> u32;
}

/// Default [`BloomHasher`]: MurmurHash3, x86 32-bit variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Murmur3;

impl BloomHasher for Murmur3 {
    fn hash(&self, data: &[u8], seed: u32) -> u32 {
        murmur3_32(data, seed)
    }
}

/// MurmurHash3 (x86, 32-bit variant) of `data` under `seed`.
///
/// Fast and non-cryptographic with good avalanche behavior. The digest is a
/// pure function of its inputs, so it is stable across calls, processes, and
/// runs.
///
/// # Examples
///
/// ```rust
/// use geofilter::hash::murmur3_32;
///
/// assert_eq!(murmur3_32(b"test", 0), 0xba6b_d213);
/// // A different seed is an independent projection of the same data.
/// assert_ne!(murmur3_32(b"test", 0), murmur3_32(b"test", 1));
/// ```
pub fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    let mut h = seed;

    let mut chunks = data.chunks_exact(4);
    for chunk in chunks.by_ref() {
        let k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        h ^= mix_k(k);
        h = h.rotate_left(13);
        h = h.wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    // Remaining 1-3 tail bytes, little-endian into the low lanes.
    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut k = 0u32;
        for (i, &byte) in tail.iter().enumerate() {
            k |= u32::from(byte) << (8 * i);
        }
        h ^= mix_k(k);
    }

    h ^= data.len() as u32;
    fmix32(h)
}

#[inline]
fn mix_k(mut k: u32) -> u32 {
    k = k.wrapping_mul(C1);
    k = k.rotate_left(15);
    k.wrapping_mul(C2)
}

/// Final avalanche mix.
#[inline]
fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^ (h >> 16)
}
