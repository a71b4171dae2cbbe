use std::collections::BTreeMap;

use chrono::{Month, NaiveDate, NaiveDateTime, Weekday};

use crate::calendar::{build_calendar, month_grid, MonthGrid};
use crate::merge::merge;
use crate::models::{DayBucket, Kind, PeriodAggregate, TimedItem};
use crate::rollup::{earnings_by_month, earnings_by_year, overdue_count};

pub const DEFAULT_EARNING_STATUSES: [&str; 2] = ["paid", "sent"];

/// Read-only dashboard views over one merged item sequence.
///
/// Earnings rollups are computed once on construction; everything else is
/// derived on request. Nothing here reads the clock.
#[derive(Debug, Clone)]
pub struct Projector {
    items: Vec<TimedItem>,
    now: NaiveDateTime,
    monthly: BTreeMap<String, PeriodAggregate>,
    yearly: BTreeMap<String, PeriodAggregate>,
}

impl Projector {
    pub fn new(lists: &[Vec<TimedItem>], now: NaiveDateTime) -> Self {
        Self::with_earning_statuses(lists, now, &DEFAULT_EARNING_STATUSES)
    }

    pub fn with_earning_statuses(
        lists: &[Vec<TimedItem>],
        now: NaiveDateTime,
        statuses: &[&str],
    ) -> Self {
        Self::build(lists, now, statuses, None)
    }

    /// Earnings only count invoices billed in `currency`.
    pub fn in_currency(
        lists: &[Vec<TimedItem>],
        now: NaiveDateTime,
        statuses: &[&str],
        currency: &str,
    ) -> Self {
        Self::build(lists, now, statuses, Some(currency))
    }

    fn build(
        lists: &[Vec<TimedItem>],
        now: NaiveDateTime,
        statuses: &[&str],
        currency: Option<&str>,
    ) -> Self {
        let items = merge(lists);
        let monthly = earnings_by_month(&items, statuses, currency);
        let yearly = earnings_by_year(&items, statuses, currency);

        Self {
            items,
            now,
            monthly,
            yearly,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }

    /// First `n` items dated today or later, in merge order.
    pub fn upcoming(&self, n: usize) -> Vec<&TimedItem> {
        let today = self.today();
        self.items
            .iter()
            .filter(|item| item.day() >= today)
            .take(n)
            .collect()
    }

    pub fn calendar(&self, window_days: usize) -> Vec<DayBucket> {
        build_calendar(&self.items, self.today(), window_days, self.today())
    }

    pub fn month_grid(&self, year: i32, month: Month, first_weekday: Weekday) -> Option<MonthGrid> {
        month_grid(&self.items, year, month, first_weekday, self.today())
    }

    pub fn monthly_total(&self, year: i32, month: Month) -> f64 {
        let key = format!("{:04}-{:02}", year, month.number_from_month());
        self.monthly.get(&key).map(|agg| agg.total).unwrap_or(0.0)
    }

    pub fn yearly_total(&self, year: i32) -> f64 {
        self.yearly
            .get(&format!("{:04}", year))
            .map(|agg| agg.total)
            .unwrap_or(0.0)
    }

    pub fn monthly_series(&self, year: i32) -> [f64; 12] {
        let mut series = [0.0; 12];
        let mut month = Month::January;
        for slot in series.iter_mut() {
            *slot = self.monthly_total(year, month);
            month = month.succ();
        }
        series
    }

    pub fn overdue(&self, kind: Kind) -> usize {
        overdue_count(&self.items, kind, self.today())
    }
}

/// Whole-percent completion; an empty denominator means no progress.
pub fn progress(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * completed as f64 / total as f64).round() as u32
}

pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn format_amount(value: f64, currency: &str) -> String {
    format!("{} {:.2}", currency, round_currency(value))
}
