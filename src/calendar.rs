use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate};

use crate::logbook::Logbook;
use crate::models::{DayMarks, LogEntry, LogKind, MonthView};

pub const PAST_MONTHS: usize = 6;
pub const FUTURE_MONTHS: usize = 6;

/// Every day from `a` to `b` inclusive, in either order.
pub fn dates_between(a: NaiveDate, b: NaiveDate) -> Vec<NaiveDate> {
    let (start, end) = if a <= b { (a, b) } else { (b, a) };
    start.iter_days().take_while(|d| *d <= end).collect()
}

/// A calendar month, identified by its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    first: NaiveDate,
}

impl MonthKey {
    /// `month` is 1-based.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date - Duration::days(i64::from(date.day0())),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first + Duration::days(i64::from(self.days_in_month()) - 1)
    }

    pub fn days_in_month(&self) -> u32 {
        match self.month() {
            4 | 6 | 9 | 11 => 30,
            2 if NaiveDate::from_ymd_opt(self.year(), 2, 29).is_some() => 29,
            2 => 28,
            _ => 31,
        }
    }

    /// Leading blank cells in a grid whose weeks start on Sunday.
    pub fn first_weekday_offset(&self) -> u32 {
        self.first.weekday().num_days_from_sunday()
    }

    pub fn next(&self) -> Option<Self> {
        self.last_day().succ_opt().map(|first| Self { first })
    }

    pub fn prev(&self) -> Option<Self> {
        self.first.pred_opt().map(Self::containing)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.first.iter_days().take(self.days_in_month() as usize)
    }
}

/// `past` months before `anchor`, the anchor itself, then `future` months.
pub fn visible_months(anchor: MonthKey, past: usize, future: usize) -> Vec<MonthKey> {
    let earliest: Vec<MonthKey> = std::iter::successors(Some(anchor), MonthKey::prev)
        .take(past + 1)
        .collect();
    let before = earliest.len() - 1;
    let start = earliest.last().copied().unwrap_or(anchor);

    std::iter::successors(Some(start), MonthKey::next)
        .take(before + 1 + future)
        .collect()
}

/// First and last day covered by `months`, for fetching their logs at once.
pub fn month_span(months: &[MonthKey]) -> Option<(NaiveDate, NaiveDate)> {
    let first = months.iter().min()?;
    let last = months.iter().max()?;
    Some((first.first_day(), last.last_day()))
}

/// Markers for every day of `month`. A day with a logged period is never
/// shown as predicted.
pub fn month_view(
    month: MonthKey,
    logbook: &Logbook,
    predicted: &BTreeSet<NaiveDate>,
    today: NaiveDate,
) -> MonthView {
    let logs = logbook.range(month.first_day(), month.last_day());
    build_view(month, &logs, predicted, today)
}

/// Views for several months, reading their logs in one range query.
pub fn month_views(
    months: &[MonthKey],
    logbook: &Logbook,
    predicted: &BTreeSet<NaiveDate>,
    today: NaiveDate,
) -> Vec<MonthView> {
    let Some((start, end)) = month_span(months) else {
        return Vec::new();
    };
    let logs = logbook.range(start, end);
    months
        .iter()
        .map(|month| build_view(*month, &logs, predicted, today))
        .collect()
}

fn build_view(
    month: MonthKey,
    logs: &BTreeMap<NaiveDate, Vec<LogEntry>>,
    predicted: &BTreeSet<NaiveDate>,
    today: NaiveDate,
) -> MonthView {
    let days = month
        .days()
        .map(|date| {
            let day_logs = logs.get(&date).map(Vec::as_slice).unwrap_or_default();
            let has = |kind: LogKind| day_logs.iter().any(|e| e.kind == kind);
            let period = has(LogKind::Period);
            DayMarks {
                date,
                period,
                cramps: has(LogKind::Cramps),
                sex: has(LogKind::Sex),
                predicted: !period && predicted.contains(&date),
                today: date == today,
            }
        })
        .collect();

    MonthView {
        year: month.year(),
        month: month.month(),
        first_weekday_offset: month.first_weekday_offset(),
        days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn dates_between_either_order() {
        let forward = dates_between(day("2024-02-27"), day("2024-03-01"));
        let backward = dates_between(day("2024-03-01"), day("2024-02-27"));
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 4);
        assert_eq!(dates_between(day("2024-02-27"), day("2024-02-27")).len(), 1);
    }

    #[test]
    fn month_lengths() {
        assert_eq!(MonthKey::new(2024, 2).unwrap().days_in_month(), 29);
        assert_eq!(MonthKey::new(2023, 2).unwrap().days_in_month(), 28);
        assert_eq!(MonthKey::new(1900, 2).unwrap().days_in_month(), 28);
        assert_eq!(MonthKey::new(2024, 4).unwrap().days_in_month(), 30);
        assert_eq!(MonthKey::new(2024, 12).unwrap().last_day(), day("2024-12-31"));
        assert!(MonthKey::new(2024, 13).is_none());
    }

    #[test]
    fn next_and_prev_wrap_years() {
        let dec = MonthKey::new(2023, 12).unwrap();
        let jan = dec.next().unwrap();
        assert_eq!((jan.year(), jan.month()), (2024, 1));
        assert_eq!(jan.prev(), Some(dec));
        assert_eq!(MonthKey::containing(day("2024-01-17")), jan);
    }

    #[test]
    fn weekday_offset() {
        // 2024-09-01 was a Sunday, 2024-02-01 a Thursday.
        assert_eq!(MonthKey::new(2024, 9).unwrap().first_weekday_offset(), 0);
        assert_eq!(MonthKey::new(2024, 2).unwrap().first_weekday_offset(), 4);
    }

    #[test]
    fn visible_window_around_anchor() {
        let anchor = MonthKey::new(2024, 3).unwrap();
        let months = visible_months(anchor, PAST_MONTHS, FUTURE_MONTHS);
        assert_eq!(months.len(), 13);
        assert_eq!(months[0], MonthKey::new(2023, 9).unwrap());
        assert_eq!(months[6], anchor);
        assert_eq!(months[12], MonthKey::new(2024, 9).unwrap());

        let (start, end) = month_span(&months).unwrap();
        assert_eq!(start, day("2023-09-01"));
        assert_eq!(end, day("2024-09-30"));
        assert!(month_span(&[]).is_none());
    }

    #[test]
    fn views_for_a_window_of_months() {
        let mut book = Logbook::new();
        book.upsert(day("2024-01-31"), LogKind::Period, "light").unwrap();
        book.upsert(day("2024-03-01"), LogKind::Sex, "protected").unwrap();
        let months = visible_months(MonthKey::new(2024, 2).unwrap(), 1, 1);

        let views = month_views(&months, &book, &BTreeSet::new(), day("2024-02-10"));
        assert_eq!(views.len(), 3);
        assert_eq!((views[0].month, views[2].month), (1, 3));
        assert!(views[0].days[30].period);
        assert_eq!(views[1].days.len(), 29);
        assert!(views[1].days[9].today);
        assert!(views[2].days[0].sex);
        assert!(month_views(&[], &book, &BTreeSet::new(), day("2024-02-10")).is_empty());
    }

    #[test]
    fn logged_period_hides_predicted_marker() {
        let mut book = Logbook::new();
        book.upsert(day("2024-03-02"), LogKind::Period, "light").unwrap();
        book.upsert(day("2024-03-03"), LogKind::Cramps, "light").unwrap();
        let predicted: BTreeSet<NaiveDate> =
            dates_between(day("2024-03-02"), day("2024-03-04")).into_iter().collect();

        let view = month_view(
            MonthKey::new(2024, 3).unwrap(),
            &book,
            &predicted,
            day("2024-03-03"),
        );
        assert_eq!(view.days.len(), 31);
        assert_eq!(view.first_weekday_offset, 5);

        let marks = |n: usize| &view.days[n - 1];
        assert!(marks(2).period && !marks(2).predicted);
        assert!(marks(3).predicted && marks(3).cramps && marks(3).today);
        assert!(marks(4).predicted);
        assert!(!marks(5).predicted && !marks(5).period);
    }
}
