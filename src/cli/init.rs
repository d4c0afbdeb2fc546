use std::path::{Path, PathBuf};

use gradebook::Config;
use tracing::instrument;

/// Write a configuration file with default settings.
#[derive(Debug, Default, clap::Parser)]
pub struct Init {
    /// Minimum average grade for a passing student
    #[arg(long, value_name = "GRADE")]
    passing_threshold: Option<i32>,

    /// Roster file offered when a save or load prompt is left blank
    #[arg(long, value_name = "FILE")]
    default_file: Option<PathBuf>,
}

impl Init {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, path: &Path) -> anyhow::Result<()> {
        self.write(path)?;
        println!("Initialized configuration in {}", path.display());
        Ok(())
    }

    fn write(self, path: &Path) -> anyhow::Result<Config> {
        if path.exists() {
            anyhow::bail!(
                "Configuration already initialized (found existing {})",
                path.display()
            );
        }

        let mut config = Config::default();
        if let Some(threshold) = self.passing_threshold {
            config.set_passing_threshold(threshold);
        }
        config.default_file = self.default_file;

        config
            .save(path)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", path.display()))?;
        Ok(config)
    }
}
