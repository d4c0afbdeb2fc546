//! Domain models for grade tracking.
//!
//! This module contains the core domain types: students, the roster that
//! holds them, and configuration.

/// Student records and validated student names.
pub mod student;
pub use student::{InvalidNameError, Student, StudentName};

/// The ordered, in-memory collection of students.
pub mod roster;
pub use roster::{Error as RosterError, LoadReport, Roster, SubjectScore};

mod config;
pub use config::Config;
