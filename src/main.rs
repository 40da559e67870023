use anyhow::{Context, Result};
use clap::Parser;
use cyclecast::cli::{Cli, Command};
use cyclecast::commands::{self, AppState};
use cyclecast::config::Config;
use cyclecast::storage;
use tracing_subscriber::EnvFilter;

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => {
            Config::load(path).with_context(|| format!("loading config {}", path.display()))?
        }
        None => Config::default(),
    };
    let log_path = match cli.log {
        Some(path) => path,
        None => storage::default_log_path()?,
    };
    let mut state = AppState::open(log_path, config)?;
    let format = cli.format;

    let output = match cli.command {
        Command::Predict => commands::get_predictions(&state, format)?,
        Command::Dates => commands::get_dates(&state, format)?,
        Command::Month {
            year,
            month,
            around,
        } => {
            let today = chrono::Local::now().date_naive();
            commands::get_month(&state, year, month, usize::from(around), today, format)?
        }
        Command::Day { date } => commands::get_day(&state, date, format)?,
        Command::Stats => commands::get_stats(&state, format)?,
        Command::Log { date, kind, value } => commands::log_day(&mut state, date, &kind, &value)?,
        Command::Paint { anchor, end, flow } => {
            commands::paint_period(&mut state, anchor, end, flow.as_deref())?
        }
        Command::Export => commands::export_data(&state)?,
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
