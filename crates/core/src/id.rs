//! Unique identifiers for Pathway entities.
//!
//! Course, talent, and learning-path ids are opaque identities supplied by
//! the catalog and user layers; the progression engine never looks behind
//! them. Progress and enrollment ids are minted by the stores.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseId(Ulid);

impl CourseId {
    /// Generate a new CourseId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for CourseId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CourseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for CourseId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Unique identifier for a talent (an enrolled user)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TalentId(Ulid);

impl TalentId {
    /// Generate a new TalentId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for TalentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TalentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for TalentId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Unique identifier for a learning path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LearningPathId(Ulid);

impl LearningPathId {
    /// Generate a new LearningPathId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for LearningPathId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LearningPathId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for LearningPathId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Unique identifier for a ProgressRecord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressId(Ulid);

impl ProgressId {
    /// Generate a new ProgressId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ProgressId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProgressId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique identifier for an EnrollmentRecord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnrollmentId(Ulid);

impl EnrollmentId {
    /// Generate a new EnrollmentId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for EnrollmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_id_roundtrips_through_display() {
        let id = CourseId::new();
        let parsed: CourseId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(ProgressId::new(), ProgressId::new());
        assert_ne!(EnrollmentId::new(), EnrollmentId::new());
    }
}
