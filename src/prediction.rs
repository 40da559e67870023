use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::config::PredictorConfig;
use crate::models::{
    Confidence, Cycle, CycleStats, LogEntry, LogKind, Period, Prediction, PredictionResult,
};

/// Group logged flow days into periods. Input order does not matter.
pub fn extract_periods(entries: &[LogEntry], max_gap_days: i64) -> Vec<Period> {
    let mut flow_days: Vec<NaiveDate> = entries
        .iter()
        .filter(|e| e.kind == LogKind::Period)
        .map(|e| e.date)
        .collect();
    flow_days.sort_unstable();

    flow_days
        .into_iter()
        .fold(Vec::new(), |mut periods: Vec<Period>, day| {
            match periods.last_mut() {
                Some(current) if (day - current.end).num_days() <= max_gap_days => {
                    current.end = day;
                }
                _ => periods.push(Period {
                    start: day,
                    end: day,
                }),
            }
            periods
        })
}

/// One cycle per period; every cycle but the last knows its length.
pub fn cycles_from_periods(periods: &[Period]) -> Vec<Cycle> {
    periods
        .iter()
        .enumerate()
        .map(|(i, p)| Cycle {
            start_date: p.start,
            duration: (p.end - p.start).num_days() + 1,
            cycle_length: periods
                .get(i + 1)
                .map(|next| (next.start - p.start).num_days()),
        })
        .collect()
}

pub fn extract_cycles(entries: &[LogEntry], max_gap_days: i64) -> Vec<Cycle> {
    cycles_from_periods(&extract_periods(entries, max_gap_days))
}

/// Predict upcoming periods with the default tuning.
/// Returns `None` until at least 2 cycles are completed.
pub fn compute_predictions(entries: &[LogEntry]) -> Option<PredictionResult> {
    compute_predictions_with(entries, &PredictorConfig::default())
}

pub fn compute_predictions_with(
    entries: &[LogEntry],
    config: &PredictorConfig,
) -> Option<PredictionResult> {
    let cycles = extract_cycles(entries, config.period_gap_days);
    let lengths: Vec<f64> = cycles
        .iter()
        .filter_map(|c| c.cycle_length)
        .map(|len| len as f64)
        .collect();

    if lengths.len() < config.min_completed_cycles {
        debug!(
            completed = lengths.len(),
            required = config.min_completed_cycles,
            "not enough completed cycles to predict"
        );
        return None;
    }
    let last = cycles.last()?;

    let avg_cycle = weighted_average(&lengths, &config.weights);
    let spread = std_deviation(&lengths).unwrap_or(config.default_spread);
    let confidence = config.classify(lengths.len(), spread);
    let avg_duration = mean_duration(&cycles);

    let step = Duration::try_days(avg_cycle.round() as i64)?;
    let nominal_start = last.start_date.checked_add_signed(step)?;
    let next_start = match cramp_based_start(entries, last, config.cramp_lead_days) {
        Some(early) if early < nominal_start => {
            debug!(%nominal_start, %early, "cramps pulled the next period forward");
            early
        }
        _ => nominal_start,
    };

    let predictions = project(
        next_start,
        step,
        avg_duration,
        confidence,
        config.prediction_count,
    );

    Some(PredictionResult {
        cycles,
        predictions,
        avg_cycle_length: round_to_tenth(avg_cycle),
        std_dev: round_to_tenth(spread),
    })
}

/// Every day covered by the given predictions.
pub fn prediction_date_set(predictions: &[Prediction]) -> BTreeSet<NaiveDate> {
    predictions
        .iter()
        .flat_map(|p| {
            p.start_date
                .iter_days()
                .take_while(move |day| *day <= p.end_date)
        })
        .collect()
}

/// Compute cycle statistics for the stats view.
pub fn cycle_stats(cycles: &[Cycle]) -> CycleStats {
    let cycle_lengths: Vec<i64> = cycles.iter().filter_map(|c| c.cycle_length).collect();
    let durations: Vec<f64> = cycles.iter().map(|c| c.duration as f64).collect();
    let last = cycles.iter().max_by_key(|c| c.start_date);

    CycleStats {
        total_cycles: cycles.len(),
        completed_cycles: cycle_lengths.len(),
        avg_cycle_length: if cycle_lengths.is_empty() {
            None
        } else {
            Some(round_to_tenth(
                cycle_lengths.iter().sum::<i64>() as f64 / cycle_lengths.len() as f64,
            ))
        },
        avg_period_length: if durations.is_empty() {
            None
        } else {
            Some(round_to_tenth(mean(&durations)))
        },
        shortest_cycle: cycle_lengths.iter().copied().min(),
        longest_cycle: cycle_lengths.iter().copied().max(),
        last_period_start: last.map(|c| c.start_date),
        last_period_end: last.map(Cycle::period_end),
    }
}

/// Recency-weighted mean. `weights[0]` applies to the most recent length;
/// only as many weights as there are lengths are used.
fn weighted_average(lengths: &[f64], weights: &[f64]) -> f64 {
    let used = lengths.len().min(weights.len());
    if used == 0 {
        return 0.0;
    }
    let total: f64 = weights[..used].iter().sum();
    let sum: f64 = weights[..used]
        .iter()
        .zip(lengths.iter().rev())
        .map(|(w, len)| w * len)
        .sum();
    sum / total
}

fn mean_duration(cycles: &[Cycle]) -> i64 {
    let durations: Vec<f64> = cycles.iter().map(|c| c.duration as f64).collect();
    mean(&durations).round() as i64
}

/// Latest cramp after the last logged period, shifted by the usual lead time.
/// `None` when the shift would leave the calendar.
fn cramp_based_start(entries: &[LogEntry], last: &Cycle, lead_days: i64) -> Option<NaiveDate> {
    let period_end = last.period_end();
    entries
        .iter()
        .filter(|e| e.kind == LogKind::Cramps && e.date > period_end)
        .map(|e| e.date)
        .max()
        .and_then(|latest| latest.checked_add_signed(Duration::try_days(lead_days)?))
}

fn project(
    first_start: NaiveDate,
    step: Duration,
    duration: i64,
    confidence: Confidence,
    count: usize,
) -> Vec<Prediction> {
    let window = Duration::try_days(duration - 1).unwrap_or_else(Duration::zero);
    std::iter::successors(Some(first_start), |cursor| cursor.checked_add_signed(step))
        .take(count)
        .enumerate()
        .map_while(|(i, start_date)| {
            Some(Prediction {
                start_date,
                end_date: start_date.checked_add_signed(window)?,
                confidence: if i == 0 { confidence } else { Confidence::Low },
            })
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; `None` below two values.
fn std_deviation(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values);
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
