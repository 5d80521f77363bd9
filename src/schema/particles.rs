//! Occurrence bounds of structural children
//!
//! A list child carries a `min..max` occurrence range. `max` uses `u64::MAX`
//! as the unbounded marker.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The unbounded `max` marker
pub const UNBOUNDED: u64 = u64::MAX;

/// Occurrence bounds for a child member (min, max)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occurs {
    /// Minimum number of occurrences
    pub min: u64,
    /// Maximum number of occurrences (`UNBOUNDED` for no limit)
    pub max: u64,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: 1 }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: 1 }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self {
            min: 0,
            max: UNBOUNDED,
        }
    }

    /// One or more (1, unbounded)
    pub fn one_or_more() -> Self {
        Self {
            min: 1,
            max: UNBOUNDED,
        }
    }

    /// Whether `min <= max` and `max > 0`
    pub fn is_valid(&self) -> bool {
        self.min <= self.max && self.max > 0
    }

    /// Check if the member can be absent (min == 0)
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// Check if max == 1
    pub fn is_single(&self) -> bool {
        self.max == 1
    }

    /// Check if max is unbounded
    pub fn is_unbounded(&self) -> bool {
        self.max == UNBOUNDED
    }

    /// Check if an occurrence count is under the minimum
    pub fn is_missing(&self, count: u64) -> bool {
        count < self.min
    }

    /// Check if an occurrence count exceeds the maximum
    pub fn is_exceeded(&self, count: u64) -> bool {
        count > self.max
    }

    /// Check if these bounds are a valid restriction of `other`
    pub fn has_occurs_restriction(&self, other: &Occurs) -> bool {
        self.min >= other.min && self.max <= other.max
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

impl fmt::Display for Occurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            write!(f, "[{}..]", self.min)
        } else {
            write!(f, "[{}..{}]", self.min, self.max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurs_defaults() {
        let occurs = Occurs::default();
        assert_eq!(occurs.min, 1);
        assert_eq!(occurs.max, 1);
        assert!(occurs.is_single());
        assert!(!occurs.is_emptiable());
    }

    #[test]
    fn test_occurs_validity() {
        assert!(Occurs::new(0, 5).is_valid());
        assert!(Occurs::zero_or_more().is_valid());
        assert!(!Occurs::new(3, 2).is_valid());
        assert!(!Occurs::new(0, 0).is_valid());
    }

    #[test]
    fn test_occurs_counts() {
        let occurs = Occurs::new(2, 4);
        assert!(occurs.is_missing(1));
        assert!(!occurs.is_missing(2));
        assert!(occurs.is_exceeded(5));
        assert!(!occurs.is_exceeded(4));
        assert!(!Occurs::one_or_more().is_exceeded(u64::MAX - 1));
    }

    #[test]
    fn test_occurs_restriction() {
        let base = Occurs::zero_or_more();
        assert!(Occurs::new(1, 10).has_occurs_restriction(&base));
        assert!(Occurs::one_or_more().has_occurs_restriction(&base));
        assert!(!base.has_occurs_restriction(&Occurs::new(1, 10)));
        assert!(!Occurs::new(0, 5).has_occurs_restriction(&Occurs::new(1, 5)));
    }

    #[test]
    fn test_occurs_display() {
        assert_eq!(Occurs::new(1, 3).to_string(), "[1..3]");
        assert_eq!(Occurs::zero_or_more().to_string(), "[0..]");
    }
}
