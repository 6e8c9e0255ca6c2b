//! Peer identity.
//!
//! A `PeerId` is the opaque 64-bit token the underlying platform assigns to
//! each session participant. The core uses it purely as a routing key: it is
//! a weak reference into session membership, never ownership of anything.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque 64-bit participant identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(u64);

impl PeerId {
    /// The reserved "no peer" value.
    pub const NIL: PeerId = PeerId(0);

    pub const fn from_u64(raw: u64) -> Self {
        PeerId(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::NIL
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self.0)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PeerId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(PeerId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_is_invalid() {
        assert!(!PeerId::NIL.is_valid());
        assert!(PeerId::from_u64(1).is_valid());
    }

    #[test]
    fn parses_from_decimal_string() {
        let id: PeerId = "76561198012345678".parse().unwrap();
        assert_eq!(id.as_u64(), 76561198012345678);
        assert!(" nonsense ".parse::<PeerId>().is_err());
    }

    #[test]
    fn high_bit_values_survive() {
        let id = PeerId::from_u64(u64::MAX);
        assert_eq!(id.as_u64(), u64::MAX);
    }
}
