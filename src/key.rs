//! Key codec: maps integer keys onto unsigned bit patterns.
//!
//! The trie only ever compares bit patterns most-significant-bit first, so a
//! key type has to provide a pattern whose unsigned order equals the key's
//! numeric order. Unsigned integers already have that property. Signed
//! integers do not (two's complement puts negatives above positives), so their
//! sign bit is flipped on the way in and flipped back on the way out.

use std::fmt;
use std::hash::Hash;

/// Unsigned bit pattern the trie works on.
///
/// Bit positions are counted from the most significant bit: position `0` is
/// the MSB and `WIDTH - 1` is the LSB. A lower position is a higher-order bit.
pub trait KeyBits: Copy + Eq + Ord + Hash + fmt::Debug + fmt::Binary {
    /// Number of bits in the pattern.
    const WIDTH: u32;

    /// Returns the bit at `pos` as `0` or `1`, suitable for indexing a child pair.
    fn bit(self, pos: u32) -> usize;

    /// Highest-order bit at which `self` and `other` differ, looking only at
    /// positions strictly above `below` (positions `0..below`).
    ///
    /// Returns `None` when the two patterns agree on all of those bits.
    fn high_diff(self, other: Self, below: u32) -> Option<u32>;

    /// Highest-order differing bit over the full width.
    #[inline]
    fn first_diff(self, other: Self) -> Option<u32> {
        self.high_diff(other, Self::WIDTH)
    }
}

/// Integer type usable as a [`CritBitMap`](crate::CritBitMap) key.
///
/// `to_bits` and `from_bits` must be inverse bijections, and
/// `a < b` must hold exactly when `a.to_bits() < b.to_bits()`.
pub trait CritBitKey: Copy + Ord + fmt::Debug {
    /// Bit pattern stored in the trie.
    type Bits: KeyBits;

    /// Encode the key.
    fn to_bits(self) -> Self::Bits;

    /// Decode a pattern produced by [`CritBitKey::to_bits`].
    fn from_bits(bits: Self::Bits) -> Self;
}

macro_rules! impl_unsigned_key {
    ($($t:ty),* $(,)?) => {$(
        impl KeyBits for $t {
            const WIDTH: u32 = <$t>::BITS;

            #[inline]
            fn bit(self, pos: u32) -> usize {
                debug_assert!(pos < Self::WIDTH);
                ((self >> (Self::WIDTH - 1 - pos)) & 1) as usize
            }

            #[inline]
            fn high_diff(self, other: Self, below: u32) -> Option<u32> {
                debug_assert!(below <= Self::WIDTH);
                // Positions 0..below, i.e. everything above `below`.
                let mask = !<$t>::MAX.checked_shr(below).unwrap_or(0);
                let diff = (self ^ other) & mask;
                (diff != 0).then(|| diff.leading_zeros())
            }
        }

        impl CritBitKey for $t {
            type Bits = $t;

            #[inline(always)]
            fn to_bits(self) -> $t {
                self
            }

            #[inline(always)]
            fn from_bits(bits: $t) -> Self {
                bits
            }
        }
    )*};
}

macro_rules! impl_signed_key {
    ($($t:ty => $u:ty),* $(,)?) => {$(
        impl CritBitKey for $t {
            type Bits = $u;

            #[inline(always)]
            fn to_bits(self) -> $u {
                (self as $u) ^ (1 << (<$u>::BITS - 1))
            }

            #[inline(always)]
            fn from_bits(bits: $u) -> Self {
                (bits ^ (1 << (<$u>::BITS - 1))) as $t
            }
        }
    )*};
}

impl_unsigned_key!(u8, u16, u32, u64, u128, usize);
impl_signed_key!(
    i8 => u8,
    i16 => u16,
    i32 => u32,
    i64 => u64,
    i128 => u128,
    isize => usize,
);
