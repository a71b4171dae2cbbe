use std::collections::BTreeSet;
use std::iter;

use chrono::{Datelike, Duration, Month, NaiveDate, Weekday};
use serde::Serialize;

use crate::models::{DayBucket, Kind, TimedItem};

/// Buckets items into `window_days` consecutive days starting at `window_start`.
///
/// Items outside the window are ignored. An item appears at most once per
/// day, keyed on `(kind, id)`. `today` is supplied by the caller; when it
/// falls outside the window no bucket is flagged.
pub fn build_calendar(
    items: &[TimedItem],
    window_start: NaiveDate,
    window_days: usize,
    today: NaiveDate,
) -> Vec<DayBucket> {
    // `iter_days` never yields `NaiveDate::MAX`
    let mut buckets: Vec<DayBucket> = iter::successors(Some(window_start), |date| date.succ_opt())
        .take(window_days)
        .map(|date| DayBucket::empty(date, date == today))
        .collect();

    for item in items {
        let offset = (item.day() - window_start).num_days();
        if offset < 0 || offset >= buckets.len() as i64 {
            continue;
        }

        let bucket = &mut buckets[offset as usize];
        let seen = bucket
            .items
            .iter()
            .any(|existing| existing.kind == item.kind && existing.id == item.id);
        if seen {
            continue;
        }

        bucket.kinds.insert(item.kind);
        bucket.items.push(item.clone());
    }

    buckets
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCell {
    pub date: NaiveDate,
    /// False for padding days borrowed from the neighbouring months.
    pub in_month: bool,
    pub is_today: bool,
    pub kinds: BTreeSet<Kind>,
    pub item_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<Vec<GridCell>>,
}

/// Lays a month out as whole weeks beginning on `first_weekday`.
///
/// Returns `None` when the padded weeks would leave chrono's date range.
pub fn month_grid(
    items: &[TimedItem],
    year: i32,
    month: Month,
    first_weekday: Weekday,
    today: NaiveDate,
) -> Option<MonthGrid> {
    let first = NaiveDate::from_ymd_opt(year, month.number_from_month(), 1)?;
    let last = match month {
        Month::December => NaiveDate::from_ymd_opt(year, 12, 31)?,
        _ => NaiveDate::from_ymd_opt(year, month.succ().number_from_month(), 1)?.pred_opt()?,
    };

    let lead = (7 + first.weekday().num_days_from_monday()
        - first_weekday.num_days_from_monday())
        % 7;
    let start = first.checked_sub_signed(Duration::days(i64::from(lead)))?;
    let span = (last - start).num_days() + 1;
    let end = start.checked_add_signed(Duration::days((span + 6) / 7 * 7 - 1))?;
    let window_days = ((end - start).num_days() + 1) as usize;

    let buckets = build_calendar(items, start, window_days, today);
    let weeks: Vec<Vec<GridCell>> = buckets
        .chunks(7)
        .map(|week| {
            week.iter()
                .map(|bucket| GridCell {
                    date: bucket.date,
                    in_month: bucket.date.month() == first.month()
                        && bucket.date.year() == year,
                    is_today: bucket.is_today,
                    kinds: bucket.kinds.clone(),
                    item_count: bucket.items.len(),
                })
                .collect::<Vec<GridCell>>()
        })
        .collect();

    Some(MonthGrid {
        year,
        month: month.number_from_month(),
        weeks,
    })
}
