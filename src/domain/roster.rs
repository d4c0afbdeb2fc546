//! The in-memory roster of students.
//!
//! The [`Roster`] is an ordered collection of [`Student`] records. Insertion
//! order is display order and names are not required to be unique. Lookups
//! by name are exact, and the first matching record wins.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::{
    domain::Student,
    storage::{self, LoadError, SaveError, roster_file::SkippedLine},
};

/// Errors returned by roster operations.
///
/// None of these are fatal. They describe a request that could not be
/// satisfied by the current roster contents.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// No student with the given name exists in the roster.
    #[error("Student '{0}' not found")]
    NotFound(String),

    /// The operation needs at least one student.
    #[error("The roster is empty")]
    EmptyRoster,

    /// No student has a grade for the requested subject.
    #[error("Invalid subject index {index}: students have at most {subjects} subject(s)")]
    InvalidSubject {
        /// The requested (0-based) subject index.
        index: usize,
        /// The largest number of grades held by any student.
        subjects: usize,
    },
}

/// One row of a subject-wise performance report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectScore<'a> {
    /// The student the row describes.
    pub student: &'a Student,
    /// The student's grade for the subject, or `None` if they have no grade
    /// recorded for it.
    pub grade: Option<i32>,
}

/// The outcome of appending a roster file to a [`Roster`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of students appended to the roster.
    pub loaded: usize,
    /// Lines that could not be parsed and were left out.
    pub skipped: Vec<SkippedLine>,
}

/// An ordered, in-memory collection of students.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Roster {
    students: Vec<Student>,
}

impl Roster {
    /// Create an empty roster.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            students: Vec::new(),
        }
    }

    /// Append a student to the end of the roster.
    #[instrument(level = "debug", skip_all, fields(name = %student.name()))]
    pub fn add(&mut self, student: Student) {
        self.students.push(student);
        debug!(len = self.students.len(), "student added");
    }

    /// All students, in insertion order.
    #[must_use]
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    /// Iterate over the students in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Student> {
        self.students.iter()
    }

    /// The number of students in the roster.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.students.len()
    }

    /// Returns `true` if the roster holds no students.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// The mean of every grade of every student.
    ///
    /// Each grade carries equal weight, so students with more grades count
    /// for more. Returns `0.0` when the roster holds no grades at all.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average(&self) -> f64 {
        let (total, count) = self
            .students
            .iter()
            .fold((0i64, 0usize), |(total, count), student| {
                (total + student.total(), count + student.grades().len())
            });

        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    /// The student with the strictly greatest grade total.
    ///
    /// Ties go to the student that appears first. A student without grades
    /// has a total of zero and is still a candidate. Returns `None` only for
    /// an empty roster.
    #[must_use]
    pub fn top_scorer(&self) -> Option<&Student> {
        let mut students = self.students.iter();
        let first = students.next()?;
        let (top, _) = students.fold((first, first.total()), |(top, best), student| {
            let total = student.total();
            if total > best {
                (student, total)
            } else {
                (top, best)
            }
        });
        Some(top)
    }

    /// Students whose average grade is at least `threshold`.
    ///
    /// A student without any grades has no average and is never passing.
    pub fn passing_students(&self, threshold: f64) -> impl Iterator<Item = &Student> {
        self.students.iter().filter(move |student| {
            student
                .average()
                .is_some_and(|average| average >= threshold)
        })
    }

    /// Replace the grades of the first student called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no student has that name.
    #[instrument(level = "debug", skip(self))]
    pub fn update(&mut self, name: &str, grades: Vec<i32>) -> Result<(), Error> {
        let student = self
            .students
            .iter_mut()
            .find(|student| student.name() == name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;

        student.set_grades(grades);
        debug!("grades replaced");
        Ok(())
    }

    /// Remove every student called `name`.
    ///
    /// Names are not unique, and all matching records are removed, not just
    /// the first. Returns the number of students removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no student has that name.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&mut self, name: &str) -> Result<usize, Error> {
        let before = self.students.len();
        self.students.retain(|student| student.name() != name);
        let removed = before - self.students.len();

        if removed == 0 {
            return Err(Error::NotFound(name.to_string()));
        }

        debug!(removed, "students deleted");
        Ok(removed)
    }

    /// Find the first student called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no student has that name.
    pub fn search(&self, name: &str) -> Result<&Student, Error> {
        self.students
            .iter()
            .find(|student| student.name() == name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Every student's grade for one subject.
    ///
    /// `subject` is a 0-based index into each student's grade list. The index
    /// is accepted as long as at least one student has a grade for it; rows
    /// for students with fewer grades carry `None`.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyRoster`] if there are no students
    /// - [`Error::InvalidSubject`] if no student has a grade at `subject`
    pub fn subject_performance(&self, subject: usize) -> Result<Vec<SubjectScore<'_>>, Error> {
        if self.students.is_empty() {
            return Err(Error::EmptyRoster);
        }

        let subjects = self
            .students
            .iter()
            .map(|student| student.grades().len())
            .max()
            .unwrap_or_default();

        if subject >= subjects {
            return Err(Error::InvalidSubject {
                index: subject,
                subjects,
            });
        }

        Ok(self
            .students
            .iter()
            .map(|student| SubjectScore {
                student,
                grade: student.grade(subject),
            })
            .collect())
    }

    /// Write the roster to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn save_to_file(&self, path: &Path) -> Result<(), SaveError> {
        storage::save(path, &self.students)?;
        info!(count = self.students.len(), "roster saved");
        Ok(())
    }

    /// Append the students stored in `path` to this roster.
    ///
    /// Existing students are kept, and loaded students are not de-duplicated
    /// against them. The whole file is parsed before anything is appended, so
    /// a file that cannot be read leaves the roster unchanged. Lines that
    /// cannot be parsed are skipped and listed in the returned report.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn load_from_file(&mut self, path: &Path) -> Result<LoadReport, LoadError> {
        let parsed = storage::load(path)?;
        let loaded = parsed.students.len();
        self.students.extend(parsed.students);

        info!(loaded, skipped = parsed.skipped.len(), "roster file loaded");
        Ok(LoadReport {
            loaded,
            skipped: parsed.skipped,
        })
    }
}

impl Extend<Student> for Roster {
    fn extend<T: IntoIterator<Item = Student>>(&mut self, iter: T) {
        self.students.extend(iter);
    }
}

impl FromIterator<Student> for Roster {
    fn from_iter<T: IntoIterator<Item = Student>>(iter: T) -> Self {
        Self {
            students: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a Student;
    type IntoIter = std::slice::Iter<'a, Student>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
