pub mod add;
pub mod list;
pub mod output;
pub mod report;

use std::{
    env,
    fmt::Display,
    path::{Path, PathBuf},
};

use add::{process_add_command, AddCommand};
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use list::{process_list_command, ListCommand};
use report::{process_report_command, process_subjects_command, ReportCommand};
use tokio::io;
use tracing::level_filters::LevelFilter;

use crate::{
    config::{AppConfig, ChartTheme, DurationUnit},
    store::{
        migrate::{migrate_file, MigrationOutcome},
        record_store::{CsvRecordStore, SkippedRow},
    },
    utils::logging::enable_logging,
};

#[derive(Parser, Debug)]
#[command(name = "Studylog", version, long_about = None)]
#[command(about = "Command line study diary", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Add a study session to the diary")]
    Add {
        #[command(flatten)]
        command: AddCommand,
    },
    #[command(about = "Show day/week/month study charts and totals by subject")]
    Report {
        #[command(flatten)]
        command: ReportCommand,
    },
    #[command(about = "Browse logged study sessions, newest first")]
    List {
        #[command(flatten)]
        command: ListCommand,
    },
    #[command(about = "List distinct subjects with their total study time")]
    Subjects {},
    #[command(about = "Convert a diary written with a legacy column layout")]
    Migrate {},
    #[command(about = "Show or update presentation settings")]
    Config {
        #[arg(long, help = "Color used for chart bars")]
        theme: Option<ChartTheme>,
        #[arg(long, help = "Unit durations are entered and shown in")]
        unit: Option<DurationUnit>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = create_application_default_path()?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&app_dir, logging_level, args.log)?;

    let config = AppConfig::load(&app_dir);
    let store = CsvRecordStore::new(app_dir.clone())?;

    match args.commands {
        Commands::Add { command } => process_add_command(command, &store, &config).await,
        Commands::Report { command } => process_report_command(command, &store, &config).await,
        Commands::List { command } => process_list_command(command, &store, &config).await,
        Commands::Subjects {} => process_subjects_command(&store, &config).await,
        Commands::Migrate {} => process_migrate_command(&store).await,
        Commands::Config { theme, unit } => process_config_command(&app_dir, config, theme, unit),
    }
}

async fn process_migrate_command(store: &CsvRecordStore) -> Result<()> {
    match migrate_file(store).await? {
        MigrationOutcome::Missing => println!("No diary file yet, nothing to migrate."),
        MigrationOutcome::AlreadyCanonical => {
            println!("The diary already uses the canonical column layout.")
        }
        MigrationOutcome::Migrated { rows, skipped } => {
            println!("Migrated {rows} records to the canonical column layout.");
            report_skipped(&skipped);
        }
    }
    Ok(())
}

fn process_config_command(
    app_dir: &Path,
    mut config: AppConfig,
    theme: Option<ChartTheme>,
    unit: Option<DurationUnit>,
) -> Result<()> {
    if theme.is_none() && unit.is_none() {
        println!("theme: {}", config.theme);
        println!("unit: {}", config.unit);
        return Ok(());
    }

    if let Some(theme) = theme {
        config.theme = theme;
    }
    if let Some(unit) = unit {
        config.unit = unit;
    }
    config.save(app_dir)?;
    println!("Settings updated.");
    Ok(())
}

/// Rows the load pass had to drop are always surfaced, the diary never
/// loses data silently.
pub(crate) fn report_skipped(skipped: &[SkippedRow]) {
    for row in skipped {
        eprintln!(
            "Warning: skipped line {} of the diary file, unparsable date {:?}",
            row.line, row.date
        );
    }
}

pub fn create_application_default_path() -> Result<PathBuf> {
    let path = {
        #[cfg(windows)]
        {
            let mut path =
                PathBuf::from(env::var("APPDATA").expect("APPDATA should be present on Windows"));
            path.push("studylog");
            path
        }
        #[cfg(not(windows))]
        {
            let mut path = env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .expect("Couldn't find neither XDG_STATE_HOME nor HOME");
            path.push("studylog");
            path
        }
    };

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}
