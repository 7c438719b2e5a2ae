//! Pathway core data models.
//!
//! This crate defines the identifiers and records that power the
//! learning-path progression engine.

#![warn(missing_docs)]

// Core identities
mod id;

// Learning-path structure
mod sequence;

// Per-talent state
mod enrollment;
mod progress;

// Re-exports
pub use id::*;

pub use enrollment::EnrollmentRecord;
pub use progress::{ProgressRecord, ProgressStatus};
pub use sequence::{CourseSequence, SequenceError};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
