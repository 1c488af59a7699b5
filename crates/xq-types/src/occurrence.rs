//! Occurrence indicators
//!
//! An occurrence indicator restricts the number of items of a sequence to an
//! inclusive range `[min, max]`. Only five ranges are expressible in the
//! language, so every operation on indicators snaps its result back to one of
//! them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum of the unbounded indicators
pub const UNBOUNDED: u64 = u64::MAX;

/// Occurrence indicator of a sequence type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occ {
    /// Exactly zero items (`empty-sequence()`)
    Zero,
    /// Zero or one item (`?`)
    ZeroOne,
    /// Exactly one item (no indicator)
    One,
    /// One or more items (`+`)
    OneMore,
    /// Any number of items (`*`)
    ZeroMore,
}

impl Occ {
    /// All indicators
    pub const ALL: [Occ; 5] = [Occ::Zero, Occ::ZeroOne, Occ::One, Occ::OneMore, Occ::ZeroMore];

    /// Smallest admitted item count
    pub const fn min(self) -> u64 {
        match self {
            Occ::Zero | Occ::ZeroOne | Occ::ZeroMore => 0,
            Occ::One | Occ::OneMore => 1,
        }
    }

    /// Largest admitted item count
    pub const fn max(self) -> u64 {
        match self {
            Occ::Zero => 0,
            Occ::ZeroOne | Occ::One => 1,
            Occ::OneMore | Occ::ZeroMore => UNBOUNDED,
        }
    }

    /// Indicator suffix as written after an item type
    pub const fn suffix(self) -> &'static str {
        match self {
            Occ::Zero | Occ::One => "",
            Occ::ZeroOne => "?",
            Occ::OneMore => "+",
            Occ::ZeroMore => "*",
        }
    }

    /// Check whether a sequence of `count` items satisfies this indicator
    pub const fn admits(self, count: u64) -> bool {
        self.min() <= count && count <= self.max()
    }

    /// Range containment
    pub const fn subtype_of(self, other: Occ) -> bool {
        self.min() >= other.min() && self.max() <= other.max()
    }

    /// Intersection of the ranges, `None` if they are disjoint
    pub fn intersect(self, other: Occ) -> Option<Occ> {
        let min = self.min().max(other.min());
        let max = self.max().min(other.max());
        (max >= min).then(|| Self::canonical(min, max))
    }

    /// Smallest indicator covering both ranges
    pub fn union(self, other: Occ) -> Occ {
        Self::canonical(self.min().min(other.min()), self.max().max(other.max()))
    }

    /// Indicator describing a sequence of known (or unknown) size
    pub const fn from_size(size: Option<u64>) -> Occ {
        match size {
            Some(0) => Occ::Zero,
            Some(1) => Occ::One,
            Some(_) => Occ::OneMore,
            None => Occ::ZeroMore,
        }
    }

    const fn canonical(min: u64, max: u64) -> Occ {
        if max == 0 {
            Occ::Zero
        } else if min == max {
            Occ::One
        } else if max == 1 {
            Occ::ZeroOne
        } else if min == 0 {
            Occ::ZeroMore
        } else {
            Occ::OneMore
        }
    }
}

impl fmt::Display for Occ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert_eq!((Occ::Zero.min(), Occ::Zero.max()), (0, 0));
        assert_eq!((Occ::ZeroOne.min(), Occ::ZeroOne.max()), (0, 1));
        assert_eq!((Occ::One.min(), Occ::One.max()), (1, 1));
        assert_eq!((Occ::OneMore.min(), Occ::OneMore.max()), (1, UNBOUNDED));
        assert_eq!((Occ::ZeroMore.min(), Occ::ZeroMore.max()), (0, UNBOUNDED));
    }

    #[test]
    fn test_admits() {
        assert!(Occ::Zero.admits(0));
        assert!(!Occ::Zero.admits(1));
        assert!(Occ::ZeroOne.admits(1));
        assert!(!Occ::One.admits(2));
        assert!(Occ::OneMore.admits(1_000));
        assert!(!Occ::OneMore.admits(0));
    }

    #[test]
    fn test_subtype() {
        assert!(Occ::One.subtype_of(Occ::ZeroOne));
        assert!(Occ::OneMore.subtype_of(Occ::ZeroMore));
        assert!(Occ::Zero.subtype_of(Occ::ZeroMore));
        assert!(!Occ::ZeroOne.subtype_of(Occ::One));
        assert!(!Occ::OneMore.subtype_of(Occ::ZeroOne));
    }

    #[test]
    fn test_intersect() {
        assert_eq!(Occ::ZeroOne.intersect(Occ::OneMore), Some(Occ::One));
        assert_eq!(Occ::ZeroMore.intersect(Occ::ZeroOne), Some(Occ::ZeroOne));
        assert_eq!(Occ::ZeroOne.intersect(Occ::ZeroMore), Some(Occ::ZeroOne));
        assert_eq!(Occ::Zero.intersect(Occ::ZeroMore), Some(Occ::Zero));
        assert_eq!(Occ::Zero.intersect(Occ::One), None);
        assert_eq!(Occ::Zero.intersect(Occ::OneMore), None);
    }

    #[test]
    fn test_union() {
        assert_eq!(Occ::Zero.union(Occ::One), Occ::ZeroOne);
        assert_eq!(Occ::One.union(Occ::OneMore), Occ::OneMore);
        assert_eq!(Occ::ZeroOne.union(Occ::OneMore), Occ::ZeroMore);
        assert_eq!(Occ::One.union(Occ::One), Occ::One);
    }

    #[test]
    fn test_from_size() {
        assert_eq!(Occ::from_size(Some(0)), Occ::Zero);
        assert_eq!(Occ::from_size(Some(1)), Occ::One);
        assert_eq!(Occ::from_size(Some(7)), Occ::OneMore);
        assert_eq!(Occ::from_size(None), Occ::ZeroMore);
    }

    #[test]
    fn test_display() {
        let rendered: Vec<String> = Occ::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["", "?", "", "+", "*"]);
    }
}
