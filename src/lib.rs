//! Student Grade Tracking
//!
//! Students and their grades are held in an in-memory roster that can be
//! saved to, and appended from, comma-separated text files.

pub mod domain;
pub use domain::{Config, Roster, RosterError, Student, StudentName};

/// Plain-text storage of rosters.
pub mod storage;
pub use storage::{LoadError, SaveError};
