use std::fmt;

use crate::error::TypeError;

/// A half-open span of bytes `[position, position + length)`.
///
/// Ranges are never empty and never overflow `u64`; both are checked when
/// the range is built. Ordering is by `position`, then by `length`, which is
/// the order siblings are kept in inside a group.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Range {
    position: u64,
    length: u64,
}

impl Range {
    /// Create a range, rejecting empty or overflowing spans.
    pub fn new(position: u64, length: u64) -> Result<Self, TypeError> {
        if length == 0 {
            return Err(TypeError::EmptyRange { position });
        }
        if position.checked_add(length).is_none() {
            return Err(TypeError::RangeOverflow { position, length });
        }
        Ok(Self { position, length })
    }

    /// First byte covered by the range.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Number of bytes covered.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// One past the last byte covered.
    pub fn end(&self) -> u64 {
        self.position + self.length
    }

    /// Returns `true` if `position` falls inside this range.
    pub fn contains_position(&self, position: u64) -> bool {
        position >= self.position && position < self.end()
    }

    /// Returns `true` if `other` is a subset of this range (equal ranges
    /// contain each other).
    pub fn contains(&self, other: &Range) -> bool {
        other.position >= self.position && other.end() <= self.end()
    }

    /// Returns `true` if the two ranges share at least one byte.
    pub fn overlaps(&self, other: &Range) -> bool {
        self.position < other.end() && other.position < self.end()
    }

    /// Returns `true` if the ranges share bytes but neither contains the
    /// other.
    pub fn partially_overlaps(&self, other: &Range) -> bool {
        self.overlaps(other) && !self.contains(other) && !other.contains(self)
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Range({}, {})", self.position, self.length)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.position, self.end())
    }
}
