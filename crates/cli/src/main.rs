// tagtrend - daily snapshots of a workbook and per-tag matched-row history

mod exit_codes;
mod report;
mod track;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "tagtrend")]
#[command(about = "Track daily matched-row counts of filter tags over workbook snapshots")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file (relative state paths resolve against its directory)
    #[arg(long, short = 'c', global = true, env = "TAGTREND_CONFIG", default_value = tagtrend_config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// More logging (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Snapshot the source, reconcile tag history, and commit it
    #[command(after_help = "\
Runs must not overlap: two concurrent runs against the same state directory
can lose history records.

Examples:
  tagtrend run
  tagtrend run --config tracking/orders.toml
  tagtrend run --date 2026-03-10 --json
  tagtrend run --sheet Orders")]
    Run {
        /// File snapshots and records under this date instead of today; a past
        /// date may only fill a day with no cached snapshot
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,

        /// Track only this sheet (overrides the config's sheet; "" = all sheets)
        #[arg(long)]
        sheet: Option<String>,

        /// Print the run report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Check the config and that the source and selected sheet can be opened
    #[command(after_help = "\
Examples:
  tagtrend validate
  tagtrend validate --config tracking/orders.toml")]
    Validate,

    /// Show per-tag trends from the recorded history
    #[command(after_help = "\
Examples:
  tagtrend report
  tagtrend report --sheet Orders
  tagtrend report --date 2026-03-10 --json")]
    Report {
        /// Restrict to one sheet (default: sum over all sheets)
        #[arg(long)]
        sheet: Option<String>,

        /// Report as of this date instead of today
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,

        #[arg(long)]
        json: bool,
    },

    /// List configured tags with their signatures and new/changed status
    Signatures {
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\ntarget:  ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let result = match cli.command {
        None => Err(CliError {
            code: EXIT_USAGE,
            message: "Usage: tagtrend <command> [options]".into(),
            hint: Some("tagtrend --help for more information".into()),
        }),
        Some(Commands::Run { date, sheet, json }) => track::cmd_run(&cli.config, date, sheet, json),
        Some(Commands::Validate) => track::cmd_validate(&cli.config),
        Some(Commands::Report { sheet, date, json }) => report::cmd_report(&cli.config, sheet, date, json),
        Some(Commands::Signatures { json }) => track::cmd_signatures(&cli.config, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// Engine warnings about skipped conditions are already printed as
/// diagnostic lines, so the engine stays at error level unless asked.
fn init_logger(verbose: u8) {
    let (level, engine_level) = match verbose {
        0 => (LevelFilter::Warn, LevelFilter::Error),
        1 => (LevelFilter::Info, LevelFilter::Info),
        2 => (LevelFilter::Debug, LevelFilter::Debug),
        _ => (LevelFilter::Trace, LevelFilter::Trace),
    };
    env_logger::Builder::new()
        .filter_level(level)
        .filter_module("tagtrend_recon", engine_level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

/// Today in the local timezone.
fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: exit_codes::EXIT_ERROR, message: msg.into(), hint: None }
    }
}

/// Pretty JSON on stdout, nothing else.
fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
    println!("{json}");
    Ok(())
}
