//! Workload ID validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CgError, CgResult};

/// A validated workload ID.
///
/// The ID doubles as the name of the workload's cgroup directory, so it
/// must be a single path component. Workload IDs must:
/// - Be 1-64 characters long
/// - Contain only alphanumeric characters, hyphens, dots and underscores
/// - Start with an alphanumeric character
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkloadId(String);

impl WorkloadId {
    /// Maximum length of a workload ID.
    pub const MAX_LENGTH: usize = 64;

    /// Create a new workload ID, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the ID format is invalid.
    pub fn new(id: impl Into<String>) -> CgResult<Self> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Get the workload ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> CgResult<()> {
        let invalid = || CgError::InvalidWorkloadId { id: id.to_string() };

        if id.len() > Self::MAX_LENGTH {
            return Err(invalid());
        }

        match id.chars().next() {
            Some(first) if first.is_ascii_alphanumeric() => {}
            _ => return Err(invalid()),
        }

        if id
            .chars()
            .any(|c| !c.is_ascii_alphanumeric() && !matches!(c, '-' | '_' | '.'))
        {
            return Err(invalid());
        }

        Ok(())
    }
}

impl fmt::Display for WorkloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WorkloadId {
    type Err = CgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for WorkloadId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
