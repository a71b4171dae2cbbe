use crate::models::TimedItem;

/// Combines per-source item lists into one sequence ordered by day.
///
/// Within a day items are ordered by kind priority, then by time of day, so a
/// date-only task never jumps ahead of a meeting on the same day. Equal keys
/// keep their input order.
pub fn merge(lists: &[Vec<TimedItem>]) -> Vec<TimedItem> {
    let mut merged: Vec<TimedItem> = lists.iter().flatten().cloned().collect();
    merged.sort_by(|a, b| {
        a.day()
            .cmp(&b.day())
            .then(a.kind.cmp(&b.kind))
            .then(a.date.cmp(&b.date))
    });
    merged
}
