//! The roster file format.
//!
//! A roster file is plain text with one student per line. Fields are comma
//! separated: the first is the student's name and the rest are integer
//! grades.
//!
//! ```text
//! Ann,80,90
//! Ben,40,30,55
//! Cat
//! ```
//!
//! There is no header, no escaping and no padding between lines with
//! different numbers of grades.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use tracing::warn;

use crate::domain::{InvalidNameError, Student, StudentName};

/// Serialize students to a writer, one line per student.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write<'a, W, I>(students: I, writer: &mut W) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Student>,
{
    for student in students {
        write!(writer, "{}", student.name())?;
        for grade in student.grades() {
            write!(writer, ",{grade}")?;
        }
        writeln!(writer)?;
    }
    writer.flush()
}

/// The students read from a roster file, along with the lines that were
/// skipped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Parsed {
    /// Successfully parsed students, in file order.
    pub students: Vec<Student>,
    /// Lines that could not be parsed.
    pub skipped: Vec<SkippedLine>,
}

/// A line of a roster file that was left out because it could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// The 1-based line number.
    pub line: usize,
    /// Why the line was skipped.
    pub error: LineError,
}

/// Reasons a single roster file line can fail to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    /// The line is not valid UTF-8.
    #[error("line is not valid UTF-8")]
    InvalidEncoding,

    /// The name field is blank or contains a line break.
    #[error(transparent)]
    InvalidName(#[from] InvalidNameError),

    /// A grade field is not an integer.
    #[error("invalid grade '{token}'")]
    InvalidGrade {
        /// The offending field, trimmed of surrounding whitespace.
        token: String,
    },
}

/// Read every student from a roster file stream.
///
/// A line with a malformed grade or bad encoding is rejected as a whole
/// rather than being truncated at the bad field. Blank lines are ignored.
///
/// # Errors
///
/// Returns an error only if reading from the stream fails. Parse failures
/// are reported per line in [`Parsed::skipped`].
pub fn read<R: BufRead>(reader: R) -> io::Result<Parsed> {
    let mut parsed = Parsed::default();

    for (index, bytes) in reader.split(b'\n').enumerate() {
        let result = String::from_utf8(bytes?)
            .map_err(|_| LineError::InvalidEncoding)
            .and_then(|line| parse_line(&line));
        match result {
            Ok(Some(student)) => parsed.students.push(student),
            Ok(None) => {}
            Err(error) => {
                let line = index + 1;
                warn!(line, %error, "skipping roster file line");
                parsed.skipped.push(SkippedLine { line, error });
            }
        }
    }

    Ok(parsed)
}

/// Parse one line of a roster file.
///
/// Returns `Ok(None)` for a blank line. Grade fields may be padded with
/// whitespace; the name is taken verbatim.
///
/// # Errors
///
/// Returns an error if the name is invalid or any grade is not an `i32`.
pub fn parse_line(line: &str) -> Result<Option<Student>, LineError> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.trim().is_empty() {
        return Ok(None);
    }

    let mut fields = line.split(',');
    let name = fields.next().unwrap_or_default();
    let name = StudentName::new(name.to_string())?;

    let grades = fields
        .map(|field| {
            let token = field.trim();
            token.parse::<i32>().map_err(|_| LineError::InvalidGrade {
                token: token.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Student::new(name, grades)))
}

/// Write students to `path`, replacing the file if it exists.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn save<'a, I>(path: &Path, students: I) -> Result<(), SaveError>
where
    I: IntoIterator<Item = &'a Student>,
{
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write(students, &mut writer)?;
    Ok(())
}

/// Read every student stored in `path`.
///
/// # Errors
///
/// Returns [`LoadError::NotFound`] if the file does not exist, and
/// [`LoadError::Io`] if it cannot be read.
pub fn load(path: &Path) -> Result<Parsed, LoadError> {
    let file = File::open(path).map_err(|io_error| match io_error.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound,
        _ => LoadError::Io(io_error),
    })?;

    Ok(read(BufReader::new(file))?)
}

/// Errors that can occur when loading a roster file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The roster file was not found.
    #[error("file not found")]
    NotFound,
    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors that can occur when saving a roster file.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tempfile::TempDir;
    use test_case::test_case;

    use super::*;

    fn student(name: &str, grades: &[i32]) -> Student {
        Student::new(name.parse().unwrap(), grades.to_vec())
    }

    #[test]
    fn write_one_line_per_student() {
        let students = [
            student("Ann", &[80, 90]),
            student("Ben", &[40, 30, 55]),
            student("Cat", &[]),
        ];

        let mut bytes = Vec::new();
        write(&students, &mut bytes).unwrap();

        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "Ann,80,90\nBen,40,30,55\nCat\n"
        );
    }

    #[test_case("Ann,80,90", "Ann", &[80, 90]; "simple")]
    #[test_case("Ann", "Ann", &[]; "no grades")]
    #[test_case("Ann, 80 , 90", "Ann", &[80, 90]; "padded grades")]
    #[test_case("Ann,-5,+7", "Ann", &[-5, 7]; "signed grades")]
    #[test_case("Mary Jane,70", "Mary Jane", &[70]; "name with space")]
    #[test_case("Ann,80,90\r", "Ann", &[80, 90]; "crlf line ending")]
    fn parse_valid_line(line: &str, name: &str, grades: &[i32]) {
        let parsed = parse_line(line).unwrap().unwrap();
        assert_eq!(parsed, student(name, grades));
    }

    #[test_case(""; "empty")]
    #[test_case("   "; "whitespace")]
    #[test_case("\r"; "carriage return")]
    fn parse_blank_line(line: &str) {
        assert_eq!(parse_line(line), Ok(None));
    }

    #[test_case("Ann,eighty", "eighty"; "word")]
    #[test_case("Ann,80,,90", ""; "empty field")]
    #[test_case("Ann,80,", ""; "trailing comma")]
    #[test_case("Ann,85.5", "85.5"; "decimal")]
    #[test_case("Ann,99999999999", "99999999999"; "overflow")]
    fn parse_invalid_grade(line: &str, token: &str) {
        assert_eq!(
            parse_line(line).unwrap_err(),
            LineError::InvalidGrade {
                token: token.to_string()
            }
        );
    }

    #[test_case(",80,90", ""; "missing name")]
    #[test_case("  ,80", "  "; "blank name")]
    #[test_case("A\rB,1", "A\rB"; "embedded carriage return")]
    fn parse_invalid_name(line: &str, name: &str) {
        let error = parse_line(line).unwrap_err();
        assert_eq!(
            error,
            LineError::InvalidName(InvalidNameError(name.to_string()))
        );
        assert!(error.to_string().starts_with("Invalid student name"));
    }

    #[test]
    fn read_skips_bad_lines_and_keeps_the_rest() {
        let input = "Ann,80,90\n\nBen,40,x,30\nCat,70\n,10\n";
        let parsed = read(Cursor::new(input)).unwrap();

        assert_eq!(
            parsed.students,
            [student("Ann", &[80, 90]), student("Cat", &[70])]
        );
        assert_eq!(
            parsed.skipped,
            [
                SkippedLine {
                    line: 3,
                    error: LineError::InvalidGrade {
                        token: "x".to_string()
                    },
                },
                SkippedLine {
                    line: 5,
                    error: LineError::InvalidName(InvalidNameError(String::new())),
                },
            ]
        );
    }

    #[test]
    fn read_skips_line_with_invalid_utf8() {
        let input: &[u8] = b"Ann,80\nB\xffn,40\nCat,70\n";
        let parsed = read(Cursor::new(input)).unwrap();

        assert_eq!(
            parsed.students,
            [student("Ann", &[80]), student("Cat", &[70])]
        );
        assert_eq!(
            parsed.skipped,
            [SkippedLine {
                line: 2,
                error: LineError::InvalidEncoding,
            }]
        );
    }

    #[test]
    fn read_last_line_without_newline() {
        let parsed = read(Cursor::new("Ann,80\nBen,40")).unwrap();
        assert_eq!(
            parsed.students,
            [student("Ann", &[80]), student("Ben", &[40])]
        );
    }

    #[test]
    fn round_trip() {
        let students = vec![
            student("Ann", &[80, 90]),
            student("Ben", &[40]),
            student("Cat", &[i32::MIN, i32::MAX]),
        ];

        let mut bytes = Vec::new();
        write(&students, &mut bytes).unwrap();
        let parsed = read(Cursor::new(bytes)).unwrap();

        assert_eq!(parsed.students, students);
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn save_overwrites_existing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("students.txt");
        std::fs::write(&path, "Old,1\nOlder,2\nOldest,3\n").unwrap();

        save(&path, &[student("Ann", &[80])]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Ann,80\n");
    }

    #[test]
    fn load_nonexistent_file() {
        let tmp = TempDir::new().unwrap();
        let result = load(&tmp.path().join("missing.txt"));
        assert!(matches!(result, Err(LoadError::NotFound)));
    }

    #[test]
    fn load_directory_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(load(tmp.path()).is_err());
    }
}
