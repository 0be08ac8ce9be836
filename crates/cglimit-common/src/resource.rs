//! Memory quantity parsing and representation.
//!
//! Accepts the container-style shorthand used for memory limits:
//! - "512m", "1g", "64k" (binary, case-insensitive, optional trailing "b")
//! - "128Mi", "1Gi" (Kubernetes-style binary)
//! - "1048576" (bytes)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CgError, CgResult};

const KI: u64 = 1024;
const MI: u64 = 1024 * KI;
const GI: u64 = 1024 * MI;
const TI: u64 = 1024 * GI;

/// A memory quantity in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryQuantity(u64);

impl MemoryQuantity {
    /// Create a quantity from bytes.
    #[must_use]
    pub const fn bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Create a quantity from mebibytes (MiB).
    #[must_use]
    pub const fn mebibytes(mib: u64) -> Self {
        Self(mib * MI)
    }

    /// Create a quantity from gibibytes (GiB).
    #[must_use]
    pub const fn gibibytes(gib: u64) -> Self {
        Self(gib * GI)
    }

    /// Value in bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> u64 {
        self.0
    }

    /// Parse a memory quantity string.
    ///
    /// All suffixes are powers of 1024, matching what container tooling
    /// means by `--memory 512m`.
    pub fn parse(s: &str) -> CgResult<Self> {
        let s = s.trim();
        let invalid = || CgError::InvalidResourceQuantity {
            value: s.to_string(),
        };

        let lower = s.to_ascii_lowercase();
        let unit = lower.strip_suffix('b').unwrap_or(&lower);
        let unit = unit.strip_suffix('i').unwrap_or(unit);

        let (digits, multiplier) = match unit.chars().last() {
            Some('k') => (&unit[..unit.len() - 1], KI),
            Some('m') => (&unit[..unit.len() - 1], MI),
            Some('g') => (&unit[..unit.len() - 1], GI),
            Some('t') => (&unit[..unit.len() - 1], TI),
            Some(c) if c.is_ascii_digit() => (unit, 1),
            _ => return Err(invalid()),
        };

        let value: u64 = digits.parse().map_err(|_| invalid())?;
        value.checked_mul(multiplier).map(Self).ok_or_else(invalid)
    }
}

impl fmt::Display for MemoryQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= GI && self.0 % GI == 0 {
            write!(f, "{}Gi", self.0 / GI)
        } else if self.0 >= MI && self.0 % MI == 0 {
            write!(f, "{}Mi", self.0 / MI)
        } else if self.0 >= KI && self.0 % KI == 0 {
            write!(f, "{}Ki", self.0 / KI)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for MemoryQuantity {
    type Err = CgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_container_shorthand() {
        assert_eq!(MemoryQuantity::parse("512m").unwrap().as_bytes(), 536_870_912);
        assert_eq!(MemoryQuantity::parse("1g").unwrap().as_bytes(), GI);
        assert_eq!(MemoryQuantity::parse("64K").unwrap().as_bytes(), 64 * KI);
        assert_eq!(MemoryQuantity::parse("2gb").unwrap().as_bytes(), 2 * GI);
    }

    #[test]
    fn parse_binary_suffixes() {
        assert_eq!(MemoryQuantity::parse("128Mi").unwrap().as_bytes(), 128 * MI);
        assert_eq!(MemoryQuantity::parse("1Gi").unwrap().as_bytes(), GI);
        assert_eq!(MemoryQuantity::parse("1Ti").unwrap().as_bytes(), TI);
    }

    #[test]
    fn parse_plain_bytes() {
        assert_eq!(MemoryQuantity::parse("1024").unwrap().as_bytes(), 1024);
        assert_eq!(MemoryQuantity::parse(" 4096 ").unwrap().as_bytes(), 4096);
    }

    #[test]
    fn reject_garbage() {
        assert!(MemoryQuantity::parse("").is_err());
        assert!(MemoryQuantity::parse("m").is_err());
        assert!(MemoryQuantity::parse("12x").is_err());
        assert!(MemoryQuantity::parse("-5m").is_err());
        assert!(MemoryQuantity::parse("99999999999t").is_err());
    }

    #[test]
    fn display_memory() {
        assert_eq!(MemoryQuantity::gibibytes(1).to_string(), "1Gi");
        assert_eq!(MemoryQuantity::mebibytes(512).to_string(), "512Mi");
        assert_eq!(MemoryQuantity::bytes(1024).to_string(), "1Ki");
        assert_eq!(MemoryQuantity::bytes(500).to_string(), "500");
    }

    proptest::proptest! {
        #[test]
        fn mebibyte_shorthand_matches_constructor(n in 1u64..1_000_000) {
            let parsed = MemoryQuantity::parse(&format!("{n}m")).unwrap();
            proptest::prop_assert_eq!(parsed, MemoryQuantity::mebibytes(n));
        }
    }
}
