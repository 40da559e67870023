use std::fmt::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::calendar::{self, MonthKey};
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::logbook::{Logbook, PaintMode, ToggleOutcome};
use crate::models::*;
use crate::prediction;
use crate::storage;

/// Loaded log plus the settings it is read with.
pub struct AppState {
    pub config: Config,
    pub log_path: PathBuf,
    pub logbook: Logbook,
}

impl AppState {
    pub fn open(log_path: PathBuf, config: Config) -> Result<Self> {
        let entries = storage::load(&log_path)
            .with_context(|| format!("reading {}", log_path.display()))?;
        Ok(Self {
            config,
            log_path,
            logbook: Logbook::from_entries(entries),
        })
    }

    fn save_data(&self) -> Result<()> {
        storage::save(&self.log_path, &self.logbook)
            .with_context(|| format!("writing {}", self.log_path.display()))
    }

    fn predictions(&self) -> Option<PredictionResult> {
        prediction::compute_predictions_with(
            &self.logbook.prediction_inputs(),
            &self.config.predictor,
        )
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn get_predictions(state: &AppState, format: OutputFormat) -> Result<String> {
    let result = state.predictions();
    if format == OutputFormat::Json {
        return to_json(&result);
    }

    let Some(result) = result else {
        let periods = state.config.predictor.min_completed_cycles + 1;
        return Ok(format!(
            "not enough data: log at least {periods} periods to get predictions"
        ));
    };

    let completed = result.cycles.iter().filter(|c| c.is_completed()).count();
    let mut out = String::new();
    writeln!(
        out,
        "cycle length {:.1} days (sd {:.1}) from {} completed cycles",
        result.avg_cycle_length, result.std_dev, completed
    )?;
    for p in &result.predictions {
        writeln!(out, "{} .. {}  {}", p.start_date, p.end_date, p.confidence)?;
    }
    Ok(out.trim_end().to_string())
}

pub fn get_dates(state: &AppState, format: OutputFormat) -> Result<String> {
    let dates = state
        .predictions()
        .map(|r| prediction::prediction_date_set(&r.predictions))
        .unwrap_or_default();
    match format {
        OutputFormat::Json => to_json(&dates),
        OutputFormat::Text => Ok(dates
            .iter()
            .map(NaiveDate::to_string)
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

pub fn get_month(
    state: &AppState,
    year: i32,
    month: u32,
    around: usize,
    today: NaiveDate,
    format: OutputFormat,
) -> Result<String> {
    let key = MonthKey::new(year, month).ok_or_else(|| anyhow!("invalid month {year}-{month}"))?;
    let months = calendar::visible_months(key, around, around);
    let predicted = state
        .predictions()
        .map(|r| prediction::prediction_date_set(&r.predictions))
        .unwrap_or_default();
    let views = calendar::month_views(&months, &state.logbook, &predicted, today);

    match format {
        OutputFormat::Json => to_json(&views),
        OutputFormat::Text => {
            let grids = views
                .iter()
                .map(render_month)
                .collect::<Result<Vec<_>>>()?;
            Ok(grids.join("\n\n"))
        }
    }
}

pub fn get_day(state: &AppState, date: NaiveDate, format: OutputFormat) -> Result<String> {
    let entries = state.logbook.day(date);
    if format == OutputFormat::Json {
        return to_json(&entries);
    }
    if entries.is_empty() {
        return Ok(format!("{date}: nothing logged"));
    }

    let mut out = format!("{date}");
    for entry in entries {
        write!(out, "\n  {}: {}", entry.kind, entry.value.as_deref().unwrap_or("-"))?;
    }
    Ok(out)
}

/// Sunday-first grid. `P` logged period, `~` predicted, `c` cramps, `s` sex,
/// `<` today.
fn render_month(view: &MonthView) -> Result<String> {
    let key = MonthKey::new(view.year, view.month)
        .ok_or_else(|| anyhow!("invalid month {}-{}", view.year, view.month))?;
    let mut out = String::new();
    writeln!(out, "{}", key.first_day().format("%B %Y"))?;
    writeln!(out, "Sun   Mon   Tue   Wed   Thu   Fri   Sat")?;

    let mut cells: Vec<String> = vec![String::from("     "); view.first_weekday_offset as usize];
    for marks in &view.days {
        let flow = if marks.period {
            'P'
        } else if marks.predicted {
            '~'
        } else {
            ' '
        };
        let symptom = match (marks.cramps, marks.sex) {
            (true, _) => 'c',
            (false, true) => 's',
            _ => ' ',
        };
        let today = if marks.today { '<' } else { ' ' };
        cells.push(format!("{:>2}{flow}{symptom}{today}", marks.date.day()));
    }

    for week in cells.chunks(7) {
        writeln!(out, "{}", week.join(" ").trim_end())?;
    }
    Ok(out.trim_end().to_string())
}

pub fn get_stats(state: &AppState, format: OutputFormat) -> Result<String> {
    let cycles = prediction::extract_cycles(
        &state.logbook.prediction_inputs(),
        state.config.predictor.period_gap_days,
    );
    let stats = prediction::cycle_stats(&cycles);
    if format == OutputFormat::Json {
        return to_json(&stats);
    }

    let days = |v: Option<f64>| v.map_or("-".to_string(), |d| format!("{d:.1} days"));
    let whole = |v: Option<i64>| v.map_or("-".to_string(), |d| format!("{d} days"));
    let date = |v: Option<NaiveDate>| v.map_or("-".to_string(), |d| d.to_string());

    let mut out = String::new();
    writeln!(out, "periods logged:   {}", stats.total_cycles)?;
    writeln!(out, "completed cycles: {}", stats.completed_cycles)?;
    writeln!(out, "average cycle:    {}", days(stats.avg_cycle_length))?;
    writeln!(out, "average period:   {}", days(stats.avg_period_length))?;
    writeln!(out, "shortest cycle:   {}", whole(stats.shortest_cycle))?;
    writeln!(out, "longest cycle:    {}", whole(stats.longest_cycle))?;
    writeln!(
        out,
        "last period:      {} .. {}",
        date(stats.last_period_start),
        date(stats.last_period_end)
    )?;
    Ok(out.trim_end().to_string())
}

pub fn log_day(state: &mut AppState, date: NaiveDate, kind: &str, value: &str) -> Result<String> {
    let kind = LogKind::from(kind);
    if let LogKind::Other(name) = &kind {
        return Err(anyhow!("unknown log type {name:?}"));
    }

    let outcome = state.logbook.toggle(date, kind.clone(), value)?;
    state.save_data()?;
    Ok(match outcome {
        ToggleOutcome::Set => format!("{date}: {kind} set to {value}"),
        ToggleOutcome::Cleared => format!("{date}: {kind} cleared"),
    })
}

pub fn paint_period(
    state: &mut AppState,
    anchor: NaiveDate,
    end: NaiveDate,
    flow: Option<&str>,
) -> Result<String> {
    let flow = flow.unwrap_or(&state.config.default_flow).to_string();
    let mode = state.logbook.paint_period(anchor, end, &flow)?;
    state.save_data()?;

    let days = calendar::dates_between(anchor, end).len();
    Ok(match mode {
        PaintMode::Add => format!("marked {days} days as period"),
        PaintMode::Remove => format!("cleared period from {days} days"),
    })
}

pub fn export_data(state: &AppState) -> Result<String> {
    Ok(storage::export(&state.logbook)?)
}
