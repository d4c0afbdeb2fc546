//! Persistence of rosters to plain-text files.

pub mod roster_file;

pub use roster_file::{LineError, LoadError, Parsed, SaveError, SkippedLine, load, save};
