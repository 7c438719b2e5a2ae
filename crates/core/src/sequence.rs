//! Ordered course sequences.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::id::CourseId;

/// Errors building a course sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    /// The deduplicated input contained no courses.
    #[error("sequence must contain at least one course")]
    Empty,
}

/// Ordered, duplicate-free list of courses belonging to one learning path.
///
/// Built once when a learning path is created or edited, and read-only to
/// the progression engine afterwards. [`CourseSequence::normalize`] is the
/// only constructor, so every value of this type holds at least one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSequence {
    courses: Vec<CourseId>,
}

impl CourseSequence {
    /// Build a sequence from an ordered list of course ids.
    ///
    /// Duplicates are dropped keeping the first occurrence; relative order
    /// is preserved. Fails with [`SequenceError::Empty`] when the
    /// deduplicated result is empty.
    pub fn normalize<I>(course_ids: I) -> Result<Self, SequenceError>
    where
        I: IntoIterator<Item = CourseId>,
    {
        let mut seen = HashSet::new();
        let courses: Vec<CourseId> = course_ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();

        if courses.is_empty() {
            return Err(SequenceError::Empty);
        }
        Ok(Self { courses })
    }

    /// Courses in path order.
    pub fn courses(&self) -> &[CourseId] {
        &self.courses
    }

    /// Number of courses in the sequence (always at least one).
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    /// Whether the course is a member of this sequence.
    pub fn contains(&self, course_id: CourseId) -> bool {
        self.courses.contains(&course_id)
    }

    /// Index of the course within the sequence.
    pub fn position(&self, course_id: CourseId) -> Option<usize> {
        self.courses.iter().position(|c| *c == course_id)
    }

    /// The courses strictly after `course_id`.
    ///
    /// Returns `None` when the course is not a member of the sequence; the
    /// slice is empty when it is the final course.
    pub fn tail_after(&self, course_id: CourseId) -> Option<&[CourseId]> {
        self.position(course_id).map(|idx| &self.courses[idx + 1..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_dedups_keeping_first_occurrence() {
        let a = CourseId::new();
        let b = CourseId::new();

        let sequence = CourseSequence::normalize([b, a, a]).unwrap();
        assert_eq!(sequence.courses(), &[b, a]);
    }

    #[test]
    fn normalize_preserves_relative_order() {
        let a = CourseId::new();
        let b = CourseId::new();
        let c = CourseId::new();

        let sequence = CourseSequence::normalize([c, a, b, a, c]).unwrap();
        assert_eq!(sequence.courses(), &[c, a, b]);
        assert_eq!(sequence.len(), 3);
    }

    #[test]
    fn normalize_rejects_empty_input() {
        let result = CourseSequence::normalize([]);
        assert_eq!(result.unwrap_err(), SequenceError::Empty);
    }

    #[test]
    fn tail_after_returns_remaining_courses() {
        let a = CourseId::new();
        let b = CourseId::new();
        let c = CourseId::new();
        let sequence = CourseSequence::normalize([a, b, c]).unwrap();

        assert_eq!(sequence.tail_after(a).unwrap(), &[b, c]);
        assert_eq!(sequence.tail_after(b).unwrap(), &[c]);
    }

    #[test]
    fn tail_after_final_course_is_empty() {
        let a = CourseId::new();
        let b = CourseId::new();
        let sequence = CourseSequence::normalize([a, b]).unwrap();

        assert!(sequence.tail_after(b).unwrap().is_empty());
    }

    #[test]
    fn tail_after_missing_course_is_none() {
        let a = CourseId::new();
        let sequence = CourseSequence::normalize([a]).unwrap();

        assert!(sequence.tail_after(CourseId::new()).is_none());
    }

    #[test]
    fn position_and_contains() {
        let a = CourseId::new();
        let b = CourseId::new();
        let sequence = CourseSequence::normalize([a, b]).unwrap();

        assert_eq!(sequence.position(b), Some(1));
        assert!(sequence.contains(a));
        assert!(!sequence.contains(CourseId::new()));
    }
}
