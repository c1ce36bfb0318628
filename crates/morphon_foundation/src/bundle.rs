//! Fixed-width feature bundles.
//!
//! A [`FeatureBundle`] is a 128-bit set over the bit indices a bounded
//! [`FeatureSystem`](crate::FeatureSystem) assigns to its values. Unification
//! is a subset test on two raw words, so it costs the same no matter how many
//! features are registered.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::feature::ValueId;

/// Number of distinct values a bundle can hold.
pub const BUNDLE_CAPACITY: usize = 128;

/// A set of feature values encoded as a 128-bit bitset.
///
/// `a.unifies(&b)` holds when every value set in `b` is also set in `a`.
/// Unification is directional; disjointness is symmetric.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeatureBundle {
    bits: [u64; 2],
}

impl FeatureBundle {
    /// The empty bundle. Every bundle unifies with it.
    pub const EMPTY: Self = Self { bits: [0, 0] };

    /// Creates an empty bundle.
    #[must_use]
    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// Creates a bundle from its raw words (low word first).
    #[must_use]
    pub const fn from_words(low: u64, high: u64) -> Self {
        Self { bits: [low, high] }
    }

    /// Returns the raw words (low word first).
    #[must_use]
    pub const fn words(self) -> [u64; 2] {
        self.bits
    }

    /// Creates a bundle containing the given values.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = ValueId>,
    {
        let mut bundle = Self::new();
        for value in values {
            bundle.set(value);
        }
        bundle
    }

    fn locate(value: ValueId) -> Option<(usize, u64)> {
        let index = value.index() as usize;
        if index >= BUNDLE_CAPACITY {
            return None;
        }
        Some((index / 64, 1u64 << (index % 64)))
    }

    /// Sets a value.
    ///
    /// Values outside the bundle capacity come from unbounded systems and are
    /// ignored.
    pub fn set(&mut self, value: ValueId) {
        debug_assert!((value.index() as usize) < BUNDLE_CAPACITY);
        if let Some((word, mask)) = Self::locate(value) {
            self.bits[word] |= mask;
        }
    }

    /// Clears a value.
    pub fn unset(&mut self, value: ValueId) {
        if let Some((word, mask)) = Self::locate(value) {
            self.bits[word] &= !mask;
        }
    }

    /// Returns true if the value is set.
    #[must_use]
    pub fn contains(&self, value: ValueId) -> bool {
        Self::locate(value).is_some_and(|(word, mask)| self.bits[word] & mask != 0)
    }

    /// Returns a copy of this bundle with the value set.
    #[must_use]
    pub fn with(mut self, value: ValueId) -> Self {
        self.set(value);
        self
    }

    /// Returns the union of two bundles.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            bits: [self.bits[0] | other.bits[0], self.bits[1] | other.bits[1]],
        }
    }

    /// Returns the intersection of two bundles.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            bits: [self.bits[0] & other.bits[0], self.bits[1] & other.bits[1]],
        }
    }

    /// Returns the values set in this bundle but not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self {
            bits: [self.bits[0] & !other.bits[0], self.bits[1] & !other.bits[1]],
        }
    }

    /// Returns true if no value is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits[0] == 0 && self.bits[1] == 0
    }

    /// Returns the number of values set.
    #[must_use]
    pub fn len(&self) -> usize {
        (self.bits[0].count_ones() + self.bits[1].count_ones()) as usize
    }

    /// Returns true if every value set in `other` is set in `self`.
    #[must_use]
    #[inline]
    pub fn unifies(&self, other: &Self) -> bool {
        (self.bits[0] & other.bits[0]) == other.bits[0]
            && (self.bits[1] & other.bits[1]) == other.bits[1]
    }

    /// Returns true if the two bundles share no value.
    #[must_use]
    #[inline]
    pub fn disjoint(&self, other: &Self) -> bool {
        (self.bits[0] & other.bits[0]) == 0 && (self.bits[1] & other.bits[1]) == 0
    }

    /// ORs `other` in when `polarity` is true, ANDs its complement out otherwise.
    #[inline]
    pub fn apply(&mut self, other: &Self, polarity: bool) {
        if polarity {
            self.bits[0] |= other.bits[0];
            self.bits[1] |= other.bits[1];
        } else {
            self.bits[0] &= !other.bits[0];
            self.bits[1] &= !other.bits[1];
        }
    }

    /// Iterates the set values in ascending index order.
    pub fn values(&self) -> impl Iterator<Item = ValueId> + '_ {
        (0..BUNDLE_CAPACITY)
            .filter(|index| self.bits[index / 64] & (1u64 << (index % 64)) != 0)
            .map(|index| ValueId(u32::try_from(index).unwrap_or(u32::MAX)))
    }
}

impl fmt::Debug for FeatureBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.values().map(ValueId::index))
            .finish()
    }
}
