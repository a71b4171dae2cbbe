use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::CoreError;
use crate::models::{DateField, SourceRecord, TimedItem};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses the date strings the backend hands out into local wall-clock time.
///
/// Offset-carrying timestamps are shifted into the local zone; naive ones are
/// taken as already local, and a bare date means local midnight.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Local).naive_local());
    }

    // Postgres text form, e.g. "2024-03-10 09:00:00+00"
    if let Ok(timestamp) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(timestamp.with_timezone(&Local).naive_local());
    }

    for format in NAIVE_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, format) {
            return Some(timestamp);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Turns records of one kind into timed items keyed on `field`.
///
/// Records without a usable date are unscheduled and simply skipped. A record
/// without an id is a contract violation and aborts the whole batch.
pub fn normalize<R: SourceRecord>(
    records: &[R],
    field: DateField,
) -> Result<Vec<TimedItem>, CoreError> {
    let mut items = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        if record.id().trim().is_empty() {
            return Err(CoreError::MissingId {
                kind: R::KIND,
                index,
            });
        }

        let Some(date) = record.date_value(field).and_then(parse_date) else {
            continue;
        };

        items.push(TimedItem {
            id: record.id().to_string(),
            kind: R::KIND,
            date,
            title: record.title(),
            amount: record.amount(),
            status: record.status().map(str::to_string),
            source: record.to_source(),
        });
    }

    Ok(items)
}
