use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::calendar::dates_between;
use crate::models::{LogEntry, LogKind};

#[derive(Debug, thiserror::Error)]
pub enum LogbookError {
    #[error("{value:?} is not a valid {kind} value")]
    InvalidValue { kind: LogKind, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Set,
    Cleared,
}

/// What a drag across several days does to their period logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintMode {
    Add,
    Remove,
}

/// In-memory event log holding at most one entry per (date, kind).
#[derive(Debug, Clone, Default)]
pub struct Logbook {
    entries: BTreeMap<(NaiveDate, LogKind), LogEntry>,
}

impl Logbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw entries. A repeated (date, kind) keeps the last one.
    pub fn from_entries(entries: impl IntoIterator<Item = LogEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|e| ((e.date, e.kind.clone()), e))
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries ordered by date, then kind.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.values()
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries.into_values().collect()
    }

    pub fn get(&self, date: NaiveDate, kind: &LogKind) -> Option<&LogEntry> {
        self.entries.get(&(date, kind.clone()))
    }

    pub fn has_period(&self, date: NaiveDate) -> bool {
        self.get(date, &LogKind::Period).is_some()
    }

    pub fn day(&self, date: NaiveDate) -> Vec<&LogEntry> {
        self.span(date, date).collect()
    }

    /// Entries from `start` to `end` inclusive, grouped by date.
    pub fn range(&self, start: NaiveDate, end: NaiveDate) -> BTreeMap<NaiveDate, Vec<LogEntry>> {
        let mut grouped: BTreeMap<NaiveDate, Vec<LogEntry>> = BTreeMap::new();
        for entry in self.span(start, end) {
            grouped.entry(entry.date).or_default().push(entry.clone());
        }
        grouped
    }

    /// The subset the predictor reads: period and cramps logs.
    pub fn prediction_inputs(&self) -> Vec<LogEntry> {
        self.entries()
            .filter(|e| matches!(e.kind, LogKind::Period | LogKind::Cramps))
            .cloned()
            .collect()
    }

    /// Set the value for (date, kind), keeping the entry id when one exists.
    pub fn upsert(
        &mut self,
        date: NaiveDate,
        kind: LogKind,
        value: &str,
    ) -> Result<&LogEntry, LogbookError> {
        if !kind.accepts(value) {
            return Err(LogbookError::InvalidValue {
                kind,
                value: value.to_string(),
            });
        }
        debug!(%date, %kind, value, "upsert log");
        let entry = self
            .entries
            .entry((date, kind.clone()))
            .and_modify(|e| e.value = Some(value.to_string()))
            .or_insert_with(|| LogEntry::new(date, kind, Some(value.to_string())));
        Ok(&*entry)
    }

    pub fn remove(&mut self, date: NaiveDate, kind: &LogKind) -> bool {
        let removed = self.entries.remove(&(date, kind.clone())).is_some();
        if removed {
            debug!(%date, %kind, "removed log");
        }
        removed
    }

    /// Selecting the value a day already has clears it; anything else sets it.
    pub fn toggle(
        &mut self,
        date: NaiveDate,
        kind: LogKind,
        value: &str,
    ) -> Result<ToggleOutcome, LogbookError> {
        let current = self.get(date, &kind).and_then(|e| e.value.as_deref());
        if current == Some(value) {
            self.remove(date, &kind);
            return Ok(ToggleOutcome::Cleared);
        }
        self.upsert(date, kind, value)?;
        Ok(ToggleOutcome::Set)
    }

    /// Apply a drag from `anchor` to `end`. Starting on a logged period day
    /// removes period logs across the range; otherwise missing days get
    /// `flow`. Existing period values are never overwritten.
    pub fn paint_period(
        &mut self,
        anchor: NaiveDate,
        end: NaiveDate,
        flow: &str,
    ) -> Result<PaintMode, LogbookError> {
        if !LogKind::Period.accepts(flow) {
            return Err(LogbookError::InvalidValue {
                kind: LogKind::Period,
                value: flow.to_string(),
            });
        }

        let mode = if self.has_period(anchor) {
            PaintMode::Remove
        } else {
            PaintMode::Add
        };

        for date in dates_between(anchor, end) {
            match mode {
                PaintMode::Remove => {
                    self.remove(date, &LogKind::Period);
                }
                PaintMode::Add if !self.has_period(date) => {
                    self.upsert(date, LogKind::Period, flow)?;
                }
                PaintMode::Add => {}
            }
        }
        Ok(mode)
    }

    fn span(&self, start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = &LogEntry> {
        self.entries
            .range((start, LogKind::Period)..)
            .take_while(move |((date, _), _)| *date <= end)
            .map(|(_, entry)| entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn upsert_replaces_value_and_keeps_id() {
        let mut book = Logbook::new();
        let id = book
            .upsert(day("2024-03-01"), LogKind::Period, "light")
            .unwrap()
            .id;
        let entry = book
            .upsert(day("2024-03-01"), LogKind::Period, "heavy")
            .unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.value.as_deref(), Some("heavy"));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn one_entry_per_kind_per_day() {
        let mut book = Logbook::new();
        book.upsert(day("2024-03-01"), LogKind::Period, "light").unwrap();
        book.upsert(day("2024-03-01"), LogKind::Cramps, "light").unwrap();
        book.upsert(day("2024-03-01"), LogKind::Sex, "protected").unwrap();
        assert_eq!(book.day(day("2024-03-01")).len(), 3);
    }

    #[test]
    fn rejects_unknown_values() {
        let mut book = Logbook::new();
        let err = book
            .upsert(day("2024-03-01"), LogKind::Sex, "heavy")
            .unwrap_err();
        assert!(matches!(err, LogbookError::InvalidValue { .. }));
        assert!(book.is_empty());
    }

    #[test]
    fn toggle_same_value_clears() {
        let mut book = Logbook::new();
        let date = day("2024-03-01");
        assert_eq!(
            book.toggle(date, LogKind::Cramps, "medium").unwrap(),
            ToggleOutcome::Set
        );
        assert_eq!(
            book.toggle(date, LogKind::Cramps, "heavy").unwrap(),
            ToggleOutcome::Set
        );
        assert_eq!(
            book.get(date, &LogKind::Cramps).unwrap().value.as_deref(),
            Some("heavy")
        );
        assert_eq!(
            book.toggle(date, LogKind::Cramps, "heavy").unwrap(),
            ToggleOutcome::Cleared
        );
        assert!(book.is_empty());
    }

    #[test]
    fn paint_adds_without_overwriting() {
        let mut book = Logbook::new();
        book.upsert(day("2024-03-03"), LogKind::Period, "heavy").unwrap();

        let mode = book
            .paint_period(day("2024-03-04"), day("2024-03-01"), "medium")
            .unwrap();
        assert_eq!(mode, PaintMode::Add);
        assert_eq!(book.len(), 4);
        assert_eq!(
            book.get(day("2024-03-03"), &LogKind::Period)
                .unwrap()
                .value
                .as_deref(),
            Some("heavy")
        );
    }

    #[test]
    fn paint_from_logged_day_removes() {
        let mut book = Logbook::new();
        book.paint_period(day("2024-03-01"), day("2024-03-05"), "light")
            .unwrap();
        book.upsert(day("2024-03-02"), LogKind::Cramps, "light").unwrap();

        let mode = book
            .paint_period(day("2024-03-02"), day("2024-03-04"), "light")
            .unwrap();
        assert_eq!(mode, PaintMode::Remove);
        let left: Vec<NaiveDate> = book
            .entries()
            .filter(|e| e.kind == LogKind::Period)
            .map(|e| e.date)
            .collect();
        assert_eq!(left, vec![day("2024-03-01"), day("2024-03-05")]);
        assert!(book.get(day("2024-03-02"), &LogKind::Cramps).is_some());
    }

    #[test]
    fn range_groups_by_date() {
        let mut book = Logbook::new();
        book.upsert(day("2024-02-28"), LogKind::Period, "light").unwrap();
        book.upsert(day("2024-03-01"), LogKind::Period, "light").unwrap();
        book.upsert(day("2024-03-01"), LogKind::Cramps, "heavy").unwrap();
        book.upsert(day("2024-04-01"), LogKind::Sex, "protected").unwrap();

        let march = book.range(day("2024-03-01"), day("2024-03-31"));
        assert_eq!(march.len(), 1);
        assert_eq!(march[&day("2024-03-01")].len(), 2);
    }

    #[test]
    fn prediction_inputs_skip_other_kinds() {
        let entries = vec![
            LogEntry::new(day("2024-03-01"), LogKind::Period, Some("light".into())),
            LogEntry::new(day("2024-03-01"), LogKind::Sex, Some("protected".into())),
            LogEntry::new(day("2024-03-02"), LogKind::from("mood"), None),
            LogEntry::new(day("2024-03-09"), LogKind::Cramps, Some("light".into())),
        ];
        let inputs = Logbook::from_entries(entries).prediction_inputs();
        assert_eq!(inputs.len(), 2);
    }

    #[test]
    fn from_entries_keeps_last_duplicate() {
        let entries = vec![
            LogEntry::new(day("2024-03-01"), LogKind::Period, Some("light".into())),
            LogEntry::new(day("2024-03-01"), LogKind::Period, Some("heavy".into())),
        ];
        let book = Logbook::from_entries(entries);
        assert_eq!(book.len(), 1);
        assert_eq!(
            book.get(day("2024-03-01"), &LogKind::Period)
                .unwrap()
                .value
                .as_deref(),
            Some("heavy")
        );
    }
}
