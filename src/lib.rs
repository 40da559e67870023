//! Period calendar with on-device cycle prediction.
//!
//! The [`prediction`] module turns an unordered event log into cycles and
//! forward predictions; the rest of the crate keeps that log and renders it.

pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logbook;
pub mod models;
pub mod prediction;
pub mod storage;

pub use config::{Config, PredictorConfig};
pub use logbook::Logbook;
pub use models::{Confidence, Cycle, LogEntry, LogKind, Prediction, PredictionResult};
pub use prediction::{compute_predictions, compute_predictions_with, prediction_date_set};
