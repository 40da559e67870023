use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::{Confidence, LogKind};

/// Recency weights, most recent completed cycle first.
pub const CYCLE_WEIGHTS: [f64; 6] = [0.30, 0.25, 0.20, 0.12, 0.08, 0.05];
pub const PREDICTION_COUNT: usize = 6;
/// Spread assumed when fewer than two cycle lengths are known.
pub const DEFAULT_SPREAD: f64 = 3.0;
/// Flow days further apart than this start a new period.
pub const PERIOD_GAP_DAYS: i64 = 2;
/// Cramps usually precede flow by about this many days.
pub const CRAMP_LEAD_DAYS: i64 = 2;
pub const MIN_COMPLETED_CYCLES: usize = 2;
pub const DEFAULT_FLOW: &str = "medium";
/// Upper bound for any configured day offset.
pub const MAX_DAY_OFFSET: i64 = 366;
/// Upper bound for `prediction_count`; 24 predictions cover about two years.
pub const MAX_PREDICTIONS: usize = 24;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tuning parameters for the prediction engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub weights: Vec<f64>,
    pub prediction_count: usize,
    pub default_spread: f64,
    pub period_gap_days: i64,
    pub cramp_lead_days: i64,
    pub min_completed_cycles: usize,
    pub high_min_cycles: usize,
    pub high_max_spread: f64,
    pub medium_min_cycles: usize,
    pub medium_max_spread: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            weights: CYCLE_WEIGHTS.to_vec(),
            prediction_count: PREDICTION_COUNT,
            default_spread: DEFAULT_SPREAD,
            period_gap_days: PERIOD_GAP_DAYS,
            cramp_lead_days: CRAMP_LEAD_DAYS,
            min_completed_cycles: MIN_COMPLETED_CYCLES,
            high_min_cycles: 6,
            high_max_spread: 3.0,
            medium_min_cycles: 3,
            medium_max_spread: 5.0,
        }
    }
}

impl PredictorConfig {
    /// Grade the first upcoming prediction from sample size and spread.
    pub fn classify(&self, completed: usize, spread: f64) -> Confidence {
        if completed >= self.high_min_cycles && spread <= self.high_max_spread {
            Confidence::High
        } else if completed >= self.medium_min_cycles && spread <= self.medium_max_spread {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.weights.is_empty() {
            return Err(ConfigError::Invalid("weights must not be empty".into()));
        }
        if self.weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(ConfigError::Invalid("weights must be positive".into()));
        }
        if !(1..=MAX_PREDICTIONS).contains(&self.prediction_count) {
            return Err(ConfigError::Invalid(format!(
                "prediction_count must be between 1 and {MAX_PREDICTIONS}"
            )));
        }
        if self.min_completed_cycles == 0 {
            return Err(ConfigError::Invalid(
                "min_completed_cycles must be at least 1".into(),
            ));
        }
        if !(1..=MAX_DAY_OFFSET).contains(&self.period_gap_days) {
            return Err(ConfigError::Invalid(format!(
                "period_gap_days must be between 1 and {MAX_DAY_OFFSET}"
            )));
        }
        if !(0..=MAX_DAY_OFFSET).contains(&self.cramp_lead_days) {
            return Err(ConfigError::Invalid(format!(
                "cramp_lead_days must be between 0 and {MAX_DAY_OFFSET}"
            )));
        }
        for (name, spread) in [
            ("default_spread", self.default_spread),
            ("high_max_spread", self.high_max_spread),
            ("medium_max_spread", self.medium_max_spread),
        ] {
            if !spread.is_finite() || spread < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a finite, non-negative number of days"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub predictor: PredictorConfig,
    /// Flow value used when painting a range of period days.
    pub default_flow: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            predictor: PredictorConfig::default(),
            default_flow: DEFAULT_FLOW.to_string(),
        }
    }
}

impl Config {
    /// Load and validate a JSON config file. Missing keys take defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.predictor.validate()?;
        if !LogKind::Period.accepts(&self.default_flow) {
            return Err(ConfigError::Invalid(format!(
                "unknown default flow {:?}",
                self.default_flow
            )));
        }
        Ok(())
    }
}
