//! The interactive, menu-driven roster session.

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use gradebook::{Config, Roster, RosterError, Student, StudentName};
use tracing::{debug, instrument};

use crate::cli::terminal::Palette;

const MENU: &str = "\
======= Menu =======
1. Add a new student
2. Display all students
3. Calculate average grades
4. Find the top scorer
5. Display passing students
6. Update a student's information
7. Delete a student
8. Save student details to a file
9. Load student details from a file
10. Search for a student
11. View subject-wise performance
0. Exit
====================";

/// The largest number of grades accepted for one student at the prompt.
const MAX_GRADES: usize = 1_000;

/// A menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Exit,
    Add,
    List,
    Average,
    TopScorer,
    Passing,
    Update,
    Delete,
    Save,
    Load,
    Search,
    Subject,
}

impl Action {
    /// Maps a menu number to its action.
    const fn from_choice(choice: i64) -> Option<Self> {
        Some(match choice {
            0 => Self::Exit,
            1 => Self::Add,
            2 => Self::List,
            3 => Self::Average,
            4 => Self::TopScorer,
            5 => Self::Passing,
            6 => Self::Update,
            7 => Self::Delete,
            8 => Self::Save,
            9 => Self::Load,
            10 => Self::Search,
            11 => Self::Subject,
            _ => return None,
        })
    }
}

/// Whether the session should keep reading menu choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// The answer to a file name prompt.
#[derive(Debug)]
enum PathAnswer {
    Path(PathBuf),
    /// Blank answer and no configured default.
    Missing,
    EndOfInput,
}

/// An interactive session over a roster.
///
/// Reads menu choices and their arguments line by line from `input` and
/// writes prompts and results to `output`. Invalid input is reported and
/// re-prompted; it never reaches the roster. The session ends on menu choice
/// `0` or at the end of the input.
pub struct Shell<R, W> {
    input: R,
    output: W,
    roster: Roster,
    config: Config,
    palette: Palette,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    /// Create a session over an existing roster.
    pub const fn new(input: R, output: W, roster: Roster, config: Config, palette: Palette) -> Self {
        Self {
            input,
            output,
            roster,
            config,
            palette,
        }
    }

    /// Run the menu loop until the user exits.
    ///
    /// Returns the roster as it stands at the end of the session.
    ///
    /// # Errors
    ///
    /// Returns an error only if reading input or writing output fails.
    #[instrument(skip_all)]
    pub fn run(mut self) -> io::Result<Roster> {
        debug!(students = self.roster.len(), "session started");
        loop {
            writeln!(self.output, "{MENU}")?;
            let Some(line) = self.prompt("Enter your choice: ")? else {
                debug!("end of input");
                break;
            };

            let Some(action) = line.parse().ok().and_then(Action::from_choice) else {
                let message = self.palette.warning("Invalid choice. Please enter a valid option.");
                writeln!(self.output, "{message}")?;
                continue;
            };

            debug!(?action, "menu choice");
            if self.dispatch(action)? == Flow::Exit {
                break;
            }
        }

        Ok(self.roster)
    }

    fn dispatch(&mut self, action: Action) -> io::Result<Flow> {
        match action {
            Action::Exit => {
                writeln!(self.output, "Exiting program. Goodbye!")?;
                return Ok(Flow::Exit);
            }
            Action::Add => return self.add(),
            Action::List => self.list()?,
            Action::Average => self.average()?,
            Action::TopScorer => self.top_scorer()?,
            Action::Passing => self.passing()?,
            Action::Update => return self.update(),
            Action::Delete => return self.delete(),
            Action::Save => return self.save(),
            Action::Load => return self.load(),
            Action::Search => return self.search(),
            Action::Subject => return self.subject(),
        }
        Ok(Flow::Continue)
    }

    fn add(&mut self) -> io::Result<Flow> {
        let Some(name) = self.read_student_name()? else {
            return Ok(Flow::Exit);
        };
        let Some(grades) = self.read_grades("Enter grades for the student: ")? else {
            return Ok(Flow::Exit);
        };

        self.roster.add(Student::new(name, grades));
        self.success("Student added successfully.")?;
        Ok(Flow::Continue)
    }

    fn list(&mut self) -> io::Result<()> {
        if self.roster.is_empty() {
            let message = self.palette.dim("No students in the roster.");
            return writeln!(self.output, "{message}");
        }
        for student in &self.roster {
            writeln!(self.output, "{student}")?;
        }
        Ok(())
    }

    fn average(&mut self) -> io::Result<()> {
        writeln!(self.output, "Average grades: {:.2}", self.roster.average())
    }

    fn top_scorer(&mut self) -> io::Result<()> {
        match self.roster.top_scorer() {
            Some(student) => writeln!(self.output, "Top Scorer: {student}"),
            None => {
                let message = self.palette.warning("No students to find a top scorer.");
                writeln!(self.output, "{message}")
            }
        }
    }

    fn passing(&mut self) -> io::Result<()> {
        let heading = self.palette.info("Passing Students:");
        writeln!(self.output, "{heading}")?;

        let threshold = f64::from(self.config.passing_threshold());
        for student in self.roster.passing_students(threshold) {
            writeln!(self.output, "{student}")?;
        }
        Ok(())
    }

    fn update(&mut self) -> io::Result<Flow> {
        let Some(name) = self.prompt("Enter student name to update: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(grades) = self.read_grades("Enter new grades for the student: ")? else {
            return Ok(Flow::Exit);
        };

        match self.roster.update(&name, grades) {
            Ok(()) => self.success("Student information updated successfully.")?,
            Err(error) => self.report(&error)?,
        }
        Ok(Flow::Continue)
    }

    fn delete(&mut self) -> io::Result<Flow> {
        let Some(name) = self.prompt("Enter student name to delete: ")? else {
            return Ok(Flow::Exit);
        };

        match self.roster.delete(&name) {
            Ok(1) => self.success("Student deleted successfully.")?,
            Ok(removed) => self.success(&format!("{removed} students deleted successfully."))?,
            Err(error) => self.report(&error)?,
        }
        Ok(Flow::Continue)
    }

    fn search(&mut self) -> io::Result<Flow> {
        let Some(name) = self.prompt("Enter student name to search: ")? else {
            return Ok(Flow::Exit);
        };

        match self.roster.search(&name) {
            Ok(student) => writeln!(self.output, "Student found:\n{student}")?,
            Err(error) => self.report(&error)?,
        }
        Ok(Flow::Continue)
    }

    fn save(&mut self) -> io::Result<Flow> {
        let path = match self.read_path("Enter file name to save: ")? {
            PathAnswer::Path(path) => path,
            PathAnswer::Missing => return Ok(Flow::Continue),
            PathAnswer::EndOfInput => return Ok(Flow::Exit),
        };

        match self.roster.save_to_file(&path) {
            Ok(()) => self.success(&format!("Student details saved to {}", path.display()))?,
            Err(error) => {
                let message = format!("File error: could not save to {}: {error}", path.display());
                let message = self.palette.warning(&message);
                writeln!(self.output, "{message}")?;
            }
        }
        Ok(Flow::Continue)
    }

    fn load(&mut self) -> io::Result<Flow> {
        let path = match self.read_path("Enter file name to load: ")? {
            PathAnswer::Path(path) => path,
            PathAnswer::Missing => return Ok(Flow::Continue),
            PathAnswer::EndOfInput => return Ok(Flow::Exit),
        };

        match self.roster.load_from_file(&path) {
            Ok(report) => {
                for skipped in &report.skipped {
                    let message = format!("Skipped line {}: {}", skipped.line, skipped.error);
                    let message = self.palette.warning(&message);
                    writeln!(self.output, "{message}")?;
                }
                self.success(&format!(
                    "Loaded {} student(s) from {}",
                    report.loaded,
                    path.display()
                ))?;
            }
            Err(error) => {
                let message = format!("File error: could not load {}: {error}", path.display());
                let message = self.palette.warning(&message);
                writeln!(self.output, "{message}")?;
            }
        }
        Ok(Flow::Continue)
    }

    fn subject(&mut self) -> io::Result<Flow> {
        let Some(line) = self.prompt("Enter subject index to view performance: ")? else {
            return Ok(Flow::Exit);
        };

        // Subjects are numbered from 1 at the prompt.
        let Some(index) = line
            .parse::<usize>()
            .ok()
            .and_then(|number| number.checked_sub(1))
        else {
            self.invalid_subject()?;
            return Ok(Flow::Continue);
        };

        match self.roster.subject_performance(index) {
            Ok(rows) => {
                let heading = format!("Subject-wise Performance (Subject {}):", index + 1);
                writeln!(self.output, "{}", self.palette.info(&heading))?;
                for row in rows {
                    match row.grade {
                        Some(grade) => writeln!(self.output, "{}: {grade}", row.student.name())?,
                        None => writeln!(
                            self.output,
                            "{}: {}",
                            row.student.name(),
                            self.palette.dim("-")
                        )?,
                    }
                }
            }
            Err(RosterError::EmptyRoster) => {
                let message = self.palette.warning("No students to show.");
                writeln!(self.output, "{message}")?;
            }
            Err(_) => {
                let message = self.palette.warning("Invalid subject index.");
                writeln!(self.output, "{message}")?;
            }
        }
        Ok(Flow::Continue)
    }

    fn invalid_subject(&mut self) -> io::Result<()> {
        let message = self.palette.warning("Invalid subject index.");
        writeln!(self.output, "{message}")
    }

    /// Prompts until a valid student name is entered.
    fn read_student_name(&mut self) -> io::Result<Option<StudentName>> {
        loop {
            let Some(line) = self.prompt("Enter student name: ")? else {
                return Ok(None);
            };
            match StudentName::new(line) {
                Ok(name) => return Ok(Some(name)),
                Err(error) => {
                    let message = self.palette.warning(&error.to_string());
                    writeln!(self.output, "{message}")?;
                }
            }
        }
    }

    /// Prompts for a grade count and then that many integer grades.
    ///
    /// Grades may be entered one per line or several to a line. A token that
    /// is not an integer discards the rest of its line.
    fn read_grades(&mut self, prompt: &str) -> io::Result<Option<Vec<i32>>> {
        let count = loop {
            let Some(line) = self.prompt("Enter the number of grades: ")? else {
                return Ok(None);
            };
            match line.parse::<usize>() {
                Ok(count) if count <= MAX_GRADES => break count,
                Ok(_) => {
                    let message = format!("Too many grades. Please enter at most {MAX_GRADES}.");
                    let message = self.palette.warning(&message);
                    writeln!(self.output, "{message}")?;
                }
                Err(_) => {
                    let message = self
                        .palette
                        .warning("Invalid number. Please enter a non-negative integer.");
                    writeln!(self.output, "{message}")?;
                }
            }
        };

        let mut grades = Vec::new();
        if count > 0 {
            write!(self.output, "{prompt}")?;
            self.output.flush()?;
        }

        while grades.len() < count {
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            for token in line.split_whitespace().take(count - grades.len()) {
                if let Ok(grade) = token.parse() {
                    grades.push(grade);
                } else {
                    let message = self
                        .palette
                        .warning("Invalid grade. Please enter a valid integer.");
                    writeln!(self.output, "{message}")?;
                    break;
                }
            }
        }

        Ok(Some(grades))
    }

    /// Prompts for a file path, falling back to the configured default file
    /// when the answer is blank.
    fn read_path(&mut self, prompt: &str) -> io::Result<PathAnswer> {
        let Some(line) = self.prompt(prompt)? else {
            return Ok(PathAnswer::EndOfInput);
        };

        if !line.is_empty() {
            return Ok(PathAnswer::Path(PathBuf::from(line)));
        }

        if let Some(default) = self.config.default_file() {
            return Ok(PathAnswer::Path(default.to_path_buf()));
        }

        let message = self.palette.warning("No file name given.");
        writeln!(self.output, "{message}")?;
        Ok(PathAnswer::Missing)
    }

    fn prompt(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        self.read_line()
    }

    /// Reads one line of input with surrounding whitespace removed, or `None`
    /// at the end of input.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn success(&mut self, message: &str) -> io::Result<()> {
        let message = self.palette.success(message);
        writeln!(self.output, "{message}")
    }

    fn report(&mut self, error: &RosterError) -> io::Result<()> {
        let message = match error {
            RosterError::NotFound(_) => "Student not found.".to_string(),
            other => other.to_string(),
        };
        let message = self.palette.warning(&message);
        writeln!(self.output, "{message}")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tempfile::TempDir;

    use super::*;

    fn student(name: &str, grades: &[i32]) -> Student {
        Student::new(name.parse().unwrap(), grades.to_vec())
    }

    fn ann_and_ben() -> Roster {
        [student("Ann", &[80, 90]), student("Ben", &[40, 30])]
            .into_iter()
            .collect()
    }

    fn session_with(input: &str, roster: Roster, config: Config) -> (String, Roster) {
        let mut output = Vec::new();
        let roster = Shell::new(
            Cursor::new(input),
            &mut output,
            roster,
            config,
            Palette::plain(),
        )
        .run()
        .unwrap();
        (String::from_utf8(output).unwrap(), roster)
    }

    fn session(input: &str, roster: Roster) -> (String, Roster) {
        session_with(input, roster, Config::default())
    }

    #[test]
    fn exit_says_goodbye() {
        let (output, _) = session("0\n", Roster::new());
        assert!(output.starts_with("======= Menu ======="));
        assert!(output.ends_with("Exiting program. Goodbye!\n"));
    }

    #[test]
    fn end_of_input_ends_the_session() {
        let (output, roster) = session("", ann_and_ben());
        assert!(!output.contains("Goodbye"));
        assert_eq!(roster, ann_and_ben());
    }

    #[test]
    fn invalid_choices_are_reported() {
        let (output, _) = session("12\nabc\n-1\n0\n", Roster::new());
        assert_eq!(
            output
                .matches("Invalid choice. Please enter a valid option.")
                .count(),
            3
        );
        assert!(output.contains("Goodbye"));
    }

    #[test]
    fn add_student() {
        let (output, roster) = session("1\nAnn\n2\n80 90\n0\n", Roster::new());
        assert!(output.contains("Student added successfully."));
        assert_eq!(roster.students(), &[student("Ann", &[80, 90])]);
    }

    #[test]
    fn add_retries_bad_input() {
        let input = "1\n\nSmith, John\nAnn\nmany\n3\n80\nx 70\n70 60\n0\n";
        let (output, roster) = session(input, Roster::new());

        assert!(output.contains("Invalid student name"));
        assert!(output.contains("Invalid number. Please enter a non-negative integer."));
        assert_eq!(
            output
                .matches("Invalid grade. Please enter a valid integer.")
                .count(),
            1
        );
        assert_eq!(roster.students(), &[student("Ann", &[80, 70, 60])]);
    }

    #[test]
    fn add_rejects_implausible_grade_count() {
        let input = "1\nAnn\n18446744073709551615\n1000000000000\n99999999999999999999\n1\n75\n0\n";
        let (output, roster) = session(input, Roster::new());

        assert_eq!(
            output
                .matches("Too many grades. Please enter at most 1000.")
                .count(),
            2
        );
        assert!(output.contains("Invalid number. Please enter a non-negative integer."));
        assert!(output.ends_with("Exiting program. Goodbye!\n"));
        assert_eq!(roster.students(), &[student("Ann", &[75])]);
    }

    #[test]
    fn add_student_without_grades() {
        let (_, roster) = session("1\nAnn\n0\n0\n", Roster::new());
        assert_eq!(roster.students(), &[student("Ann", &[])]);
    }

    #[test]
    fn list_students() {
        let (output, _) = session("2\n0\n", ann_and_ben());
        assert!(output.contains("Name: Ann\nGrades: 80 90\nName: Ben\nGrades: 40 30\n"));
    }

    #[test]
    fn statistics() {
        let (output, _) = session("3\n4\n5\n0\n", ann_and_ben());
        assert!(output.contains("Average grades: 60.00"));
        assert!(output.contains("Top Scorer: Name: Ann\nGrades: 80 90"));
        assert!(output.contains("Passing Students:\nName: Ann\nGrades: 80 90\n======="));
    }

    #[test]
    fn passing_uses_configured_threshold() {
        let mut config = Config::default();
        config.set_passing_threshold(30);
        let (output, _) = session_with("5\n0\n", ann_and_ben(), config);
        assert!(output.contains("Passing Students:\nName: Ann\nGrades: 80 90\nName: Ben\n"));
    }

    #[test]
    fn top_scorer_of_empty_roster() {
        let (output, _) = session("4\n0\n", Roster::new());
        assert!(output.contains("No students to find a top scorer."));
    }

    #[test]
    fn update_then_search() {
        let input = "6\nAnn\n2\n90 85\n10\nAnn\n6\nZed\n1\n5\n0\n";
        let (output, roster) = session(input, ann_and_ben());

        assert!(output.contains("Student information updated successfully."));
        assert!(output.contains("Student found:\nName: Ann\nGrades: 90 85"));
        assert!(output.contains("Student not found."));
        assert_eq!(roster.search("Ann").unwrap().grades(), &[90, 85]);
    }

    #[test]
    fn delete_removes_all_matches() {
        let mut roster = ann_and_ben();
        roster.add(student("Ben", &[99]));

        let (output, roster) = session("7\nBen\n7\nBen\n0\n", roster);
        assert!(output.contains("2 students deleted successfully."));
        assert!(output.contains("Student not found."));
        assert_eq!(roster.students(), &[student("Ann", &[80, 90])]);
    }

    #[test]
    fn subject_performance() {
        let (output, _) = session("11\n1\n11\n3\n11\n0\n11\nfirst\n0\n", ann_and_ben());
        assert!(output.contains("Subject-wise Performance (Subject 1):\nAnn: 80\nBen: 40\n"));
        assert_eq!(output.matches("Invalid subject index.").count(), 3);
    }

    #[test]
    fn subject_performance_with_missing_grade() {
        let roster: Roster = [student("Ann", &[80]), student("Ben", &[40, 30])]
            .into_iter()
            .collect();
        let (output, _) = session("11\n2\n0\n", roster);
        assert!(output.contains("Subject-wise Performance (Subject 2):\nAnn: -\nBen: 30\n"));
    }

    #[test]
    fn subject_performance_of_empty_roster() {
        let (output, _) = session("11\n1\n0\n", Roster::new());
        assert!(output.contains("No students to show."));
    }

    #[test]
    fn save_then_load_appends() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("students.txt");
        let input = format!("8\n{0}\n9\n{0}\n0\n", path.display());

        let (output, roster) = session(&input, ann_and_ben());

        assert!(output.contains(&format!("Student details saved to {}", path.display())));
        assert!(output.contains(&format!("Loaded 2 student(s) from {}", path.display())));
        assert_eq!(roster.len(), 4);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Ann,80,90\nBen,40,30\n"
        );
    }

    #[test]
    fn load_reports_skipped_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("students.txt");
        std::fs::write(&path, "Ann,80\nBen,forty\n").unwrap();

        let (output, roster) = session(&format!("9\n{}\n0\n", path.display()), Roster::new());

        assert!(output.contains("Skipped line 2: invalid grade 'forty'"));
        assert!(output.contains("Loaded 1 student(s)"));
        assert_eq!(roster.students(), &[student("Ann", &[80])]);
    }

    #[test]
    fn file_errors_are_reported() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.txt");
        let unwritable = tmp.path().join("no-such-dir").join("out.txt");
        let input = format!("9\n{}\n8\n{}\n0\n", missing.display(), unwritable.display());

        let (output, roster) = session(&input, ann_and_ben());

        assert!(output.contains("File error: could not load"));
        assert!(output.contains("File error: could not save to"));
        assert!(!output.contains("Student details saved"));
        assert_eq!(roster, ann_and_ben());
    }

    #[test]
    fn blank_file_name_uses_configured_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("default.txt");
        let mut config = Config::default();
        config.default_file = Some(path.clone());

        let (output, _) = session_with("8\n\n0\n", ann_and_ben(), config);

        assert!(output.contains("Student details saved to"));
        assert!(path.exists());
    }

    #[test]
    fn blank_file_name_without_default() {
        let (output, _) = session("8\n\n0\n", ann_and_ben());
        assert!(output.contains("No file name given."));
    }
}
