use std::{fmt, ops::Deref, str::FromStr};

use non_empty_string::NonEmptyString;

/// A validated student name.
///
/// Names are the lookup key of a roster and are written verbatim as the first
/// field of a roster file line, so they must contain a non-whitespace
/// character and may not contain a comma or a line break.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StudentName(NonEmptyString);

impl StudentName {
    /// Creates a new `StudentName` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidNameError`] if the string is blank or contains a
    /// comma, `\n` or `\r`.
    pub fn new(s: String) -> Result<Self, InvalidNameError> {
        // A blank name would be written as a blank line, which is never read back.
        if s.trim().is_empty() || s.contains([',', '\n', '\r']) {
            return Err(InvalidNameError(s));
        }

        let non_empty = NonEmptyString::new(s).map_err(InvalidNameError)?;
        Ok(Self(non_empty))
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for StudentName {
    type Error = InvalidNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for StudentName {
    type Error = InvalidNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl FromStr for StudentName {
    type Err = InvalidNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl AsRef<str> for StudentName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for StudentName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl PartialEq<str> for StudentName {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl fmt::Display for StudentName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a student name is empty or contains a field or line
/// separator.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("Invalid student name '{0}': must not be blank and must contain no commas or line breaks")]
pub struct InvalidNameError(pub String);

/// A student and their grades.
///
/// Grades are stored in subject order. Different students may have different
/// numbers of grades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    name: StudentName,
    grades: Vec<i32>,
}

impl Student {
    /// Construct a new [`Student`].
    #[must_use]
    pub const fn new(name: StudentName, grades: Vec<i32>) -> Self {
        Self { name, grades }
    }

    /// The student's name.
    #[must_use]
    pub const fn name(&self) -> &StudentName {
        &self.name
    }

    /// The student's grades, in subject order.
    #[must_use]
    pub fn grades(&self) -> &[i32] {
        &self.grades
    }

    /// Replace the full grade list.
    ///
    /// This is a replacement, not a merge. Values are not range checked.
    pub fn set_grades(&mut self, grades: Vec<i32>) {
        self.grades = grades;
    }

    /// The grade recorded for a (0-based) subject, if the student has one.
    #[must_use]
    pub fn grade(&self, subject: usize) -> Option<i32> {
        self.grades.get(subject).copied()
    }

    /// Sum of all grades. `0` for a student without grades.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.grades.iter().copied().map(i64::from).sum()
    }

    /// Mean of this student's grades, or `None` if there are none.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average(&self) -> Option<f64> {
        if self.grades.is_empty() {
            return None;
        }
        Some(self.total() as f64 / self.grades.len() as f64)
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name: {}\nGrades:", self.name)?;
        for grade in &self.grades {
            write!(f, " {grade}")?;
        }
        Ok(())
    }
}
