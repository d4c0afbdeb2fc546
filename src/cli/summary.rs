use std::io::{self, Write};

use gradebook::{Config, Roster};
use tracing::instrument;

/// Print a one-shot report of the loaded roster.
#[derive(Debug, Default, clap::Parser)]
pub struct Summary {
    /// Minimum average grade for a passing student (overrides the config)
    #[arg(long, value_name = "GRADE")]
    passing_threshold: Option<i32>,
}

impl Summary {
    #[instrument(skip_all)]
    pub fn run(self, config: &Config, roster: &Roster) -> anyhow::Result<()> {
        let stdout = io::stdout();
        self.write(config, roster, &mut stdout.lock())?;
        Ok(())
    }

    fn write<W: Write>(&self, config: &Config, roster: &Roster, out: &mut W) -> io::Result<()> {
        let threshold = self
            .passing_threshold
            .unwrap_or_else(|| config.passing_threshold());

        writeln!(out, "Students: {}", roster.len())?;
        writeln!(out, "Average grades: {:.2}", roster.average())?;

        match roster.top_scorer() {
            Some(student) => writeln!(
                out,
                "Top scorer: {} ({})",
                student.name(),
                student.total()
            )?,
            None => writeln!(out, "Top scorer: none")?,
        }

        let passing: Vec<_> = roster
            .passing_students(f64::from(threshold))
            .map(|student| student.name().as_str())
            .collect();
        writeln!(
            out,
            "Passing (average >= {threshold}): {}/{}",
            passing.len(),
            roster.len()
        )?;
        for name in passing {
            writeln!(out, "  • {name}")?;
        }

        Ok(())
    }
}
