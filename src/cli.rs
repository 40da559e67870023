//! CLI argument parsing for cyclecast

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default)
    Text,
    /// JSON for other tools
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "cyclecast")]
#[command(version)]
#[command(about = "Period calendar with cycle prediction", long_about = None)]
pub struct Cli {
    /// Log file (JSON array of date/type/value records)
    #[arg(long = "log", value_name = "PATH", global = true)]
    pub log: Option<PathBuf>,

    /// JSON config file with predictor tuning
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Predict upcoming periods
    Predict,
    /// List every predicted day
    Dates,
    /// Show one month with logged and predicted days
    Month {
        year: i32,
        /// 1-12
        month: u32,
        /// Also show this many months before and after
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u16).range(0..=12))]
        around: u16,
    },
    /// Show everything logged on one day
    Day { date: NaiveDate },
    /// Cycle history summary
    Stats,
    /// Toggle a log value for a day (same value again clears it)
    Log {
        date: NaiveDate,
        /// period, cramps or sex
        kind: String,
        value: String,
    },
    /// Add or remove period logs across a range of days
    Paint {
        anchor: NaiveDate,
        end: NaiveDate,
        /// Flow for added days (defaults to the configured flow)
        #[arg(long)]
        flow: Option<String>,
    },
    /// Print all logs as JSON
    Export,
}
