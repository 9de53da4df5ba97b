//! Identity types for runs, adventurers and catalog definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a game run (one play-through)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub u64);

impl RunId {
    /// Create a new run ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run:{}", self.0)
    }
}

/// Unique identifier for an adventurer within a run
///
/// Ids are allocated by the run and never reused, so a departed
/// adventurer's id can't be confused with a later hire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AdventurerId(pub u64);

impl AdventurerId {
    /// Create a new adventurer ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AdventurerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "adventurer:{}", self.0)
    }
}

/// Identifier for a catalog definition (dungeon, equipment, template, candidate)
///
/// Uses a string-based ID for easy reference from RON content files
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefId(pub String);

impl DefId {
    /// Create a new definition ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DefId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DefId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id() {
        let id = RunId::new(7);
        assert_eq!(id.raw(), 7);
        assert_eq!(format!("{}", id), "run:7");
    }

    #[test]
    fn test_adventurer_id() {
        let id = AdventurerId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(format!("{}", id), "adventurer:42");
    }

    #[test]
    fn test_def_id() {
        let id = DefId::new("quarterly_review");
        assert_eq!(id.as_str(), "quarterly_review");
        assert_eq!(format!("{}", id), "quarterly_review");
        assert_eq!(DefId::from("a"), DefId::from("a".to_string()));
    }
}
