//! Identifiers shared by every participant.

use std::fmt;

/// A skier's identifier, 1-based in spawn order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SkierId(pub u32);

impl fmt::Display for SkierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A boarding stop, in `1..=stops`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Stop(pub u8);

impl Stop {
    /// The stop the bus starts from and returns to after the terminal.
    pub const FIRST: Self = Self(1);

    /// Index into per-stop tables (slot 0 is unused).
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
