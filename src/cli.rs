use std::{
    io,
    path::{Path, PathBuf},
};

mod init;
mod shell;
mod summary;
mod terminal;

use anyhow::Context;
use clap::ArgAction;
use gradebook::{Config, Roster};
use init::Init;
use shell::Shell;
use summary::Summary;
use terminal::Palette;
use tracing::{info, instrument};

/// The config file picked up from the working directory when `--config` is
/// not given.
const DEFAULT_CONFIG: &str = "gradebook.toml";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the configuration file [default: ./gradebook.toml, if present]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Roster files to load before running the command
    #[arg(short, long, value_name = "FILE", global = true)]
    load: Vec<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or(Command::Shell)
            .run(self.config, &self.load)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        // stdout belongs to the menu
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Run the interactive menu (default)
    Shell,

    /// Print a summary of the loaded roster and exit
    Summary(Summary),

    /// Write a default configuration file
    Init(Init),
}

impl Command {
    fn run(self, config_path: Option<PathBuf>, load: &[PathBuf]) -> anyhow::Result<()> {
        match self {
            // init creates the config file, so it must not try to read one first
            Self::Init(command) => {
                let path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
                command.run(&path)?;
            }
            Self::Shell => {
                let config = load_config(config_path.as_deref())?;
                let roster = preload(load)?;
                let stdin = io::stdin();
                let stdout = io::stdout();
                Shell::new(stdin.lock(), stdout.lock(), roster, config, Palette::detect())
                    .run()
                    .context("Failed to read from the terminal")?;
            }
            Self::Summary(command) => {
                let config = load_config(config_path.as_deref())?;
                let roster = preload(load)?;
                command.run(&config, &roster)?;
            }
        }
        Ok(())
    }
}

/// Load the configuration named on the command line, or the default config
/// file if it exists, or fall back to defaults.
#[instrument]
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = path {
        return Config::load(path).map_err(|e| anyhow::anyhow!(e));
    }

    let default = Path::new(DEFAULT_CONFIG);
    if default.exists() {
        info!("using {DEFAULT_CONFIG}");
        return Config::load(default).map_err(|e| anyhow::anyhow!(e));
    }

    Ok(Config::default())
}

/// Build the starting roster from the files given with `--load`.
fn preload(paths: &[PathBuf]) -> anyhow::Result<Roster> {
    let palette = Palette::detect();
    let mut roster = Roster::new();

    for path in paths {
        let report = roster
            .load_from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?;

        for skipped in &report.skipped {
            let message = format!(
                "{}: skipped line {}: {}",
                path.display(),
                skipped.line,
                skipped.error
            );
            eprintln!("{}", palette.warning(&message));
        }
    }

    Ok(roster)
}
