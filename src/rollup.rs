use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::models::{Kind, PeriodAggregate, TimedItem};

/// Filters, groups and sums items.
///
/// Keys come back sorted so two calls over the same input are identical.
/// Values are accumulated unrounded.
pub fn aggregate<P, G, V>(
    items: &[TimedItem],
    predicate: P,
    group_by: G,
    value_of: V,
) -> BTreeMap<String, PeriodAggregate>
where
    P: Fn(&TimedItem) -> bool,
    G: Fn(&TimedItem) -> String,
    V: Fn(&TimedItem) -> f64,
{
    let mut groups: BTreeMap<String, PeriodAggregate> = BTreeMap::new();

    for item in items.iter().filter(|item| predicate(*item)) {
        let key = group_by(item);
        let entry = groups
            .entry(key.clone())
            .or_insert_with(|| PeriodAggregate {
                period_key: key,
                total: 0.0,
                count: 0,
            });
        entry.total += value_of(item);
        entry.count += 1;
    }

    groups
}

pub fn month_key(date: &NaiveDateTime) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

pub fn year_key(date: &NaiveDateTime) -> String {
    format!("{:04}", date.year())
}

pub fn is_earning(item: &TimedItem, statuses: &[&str]) -> bool {
    item.kind == Kind::Invoice && item.has_status(statuses)
}

// amounts are never converted
fn counts_toward(item: &TimedItem, statuses: &[&str], currency: Option<&str>) -> bool {
    is_earning(item, statuses)
        && currency.map_or(true, |wanted| {
            item.currency()
                .is_some_and(|own| own.trim().eq_ignore_ascii_case(wanted.trim()))
        })
}

pub fn earnings_by_month(
    items: &[TimedItem],
    statuses: &[&str],
    currency: Option<&str>,
) -> BTreeMap<String, PeriodAggregate> {
    aggregate(
        items,
        |item| counts_toward(item, statuses, currency),
        |item| month_key(&item.date),
        |item| item.amount.unwrap_or(0.0),
    )
}

pub fn earnings_by_year(
    items: &[TimedItem],
    statuses: &[&str],
    currency: Option<&str>,
) -> BTreeMap<String, PeriodAggregate> {
    aggregate(
        items,
        |item| counts_toward(item, statuses, currency),
        |item| year_key(&item.date),
        |item| item.amount.unwrap_or(0.0),
    )
}

pub fn count_by_status(items: &[TimedItem], kind: Kind) -> BTreeMap<String, usize> {
    aggregate(
        items,
        |item| item.kind == kind,
        |item| item.status.clone().unwrap_or_else(|| "unknown".to_string()),
        |_| 0.0,
    )
    .into_iter()
    .map(|(status, agg)| (status, agg.count))
    .collect()
}

pub fn overdue_count(items: &[TimedItem], kind: Kind, today: NaiveDate) -> usize {
    items
        .iter()
        .filter(|item| item.kind == kind && item.day() < today && item.is_open())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateField, Invoice, Task};
    use crate::normalize::normalize;

    const EARNING: [&str; 2] = ["paid", "sent"];

    fn invoice(id: &str, status: &str, amount: f64, due: &str) -> Invoice {
        priced(id, status, amount, "USD", due)
    }

    fn priced(id: &str, status: &str, amount: f64, currency: &str, due: &str) -> Invoice {
        Invoice {
            id: id.to_string(),
            status: status.to_string(),
            total_amount: amount,
            currency: currency.to_string(),
            due_date: Some(due.to_string()),
            project_id: None,
            invoice_number: None,
        }
    }

    fn invoices(records: &[Invoice]) -> Vec<TimedItem> {
        normalize(records, DateField::DueDate).unwrap()
    }

    #[test]
    fn drafts_do_not_count_as_earnings() {
        let items = invoices(&[
            invoice("a", "paid", 100.0, "2024-01-10"),
            invoice("b", "paid", 50.0, "2024-01-20"),
            invoice("c", "draft", 999.0, "2024-01-25"),
        ]);

        let monthly = earnings_by_month(&items, &EARNING, None);
        let january = &monthly["2024-01"];
        assert_eq!(january.total, 150.0);
        assert_eq!(january.count, 2);
        assert_eq!(monthly.len(), 1);
    }

    #[test]
    fn status_match_ignores_case() {
        let items = invoices(&[invoice("a", "Sent", 80.0, "2024-02-01")]);
        assert_eq!(earnings_by_month(&items, &EARNING, None)["2024-02"].total, 80.0);
    }

    #[test]
    fn currency_filter_keeps_other_currencies_out() {
        let items = invoices(&[
            priced("a", "paid", 100.0, "USD", "2024-05-02"),
            priced("b", "paid", 90.0, "EUR", "2024-05-03"),
            priced("c", "sent", 10.0, "usd", "2024-05-04"),
        ]);

        let usd = earnings_by_month(&items, &EARNING, Some("USD"));
        assert_eq!(usd["2024-05"].total, 110.0);
        assert_eq!(usd["2024-05"].count, 2);
        assert_eq!(earnings_by_year(&items, &EARNING, Some("EUR"))["2024"].total, 90.0);
        assert_eq!(earnings_by_year(&items, &EARNING, None)["2024"].total, 200.0);
        assert!(earnings_by_month(&items, &EARNING, Some("JPY")).is_empty());
    }

    #[test]
    fn months_add_up_to_year() {
        let items = invoices(&[
            invoice("a", "paid", 0.1, "2024-01-03"),
            invoice("b", "sent", 0.2, "2024-01-30"),
            invoice("c", "paid", 1234.56, "2024-06-15"),
            invoice("d", "paid", 19.99, "2024-12-31T23:30"),
            invoice("e", "paid", 500.0, "2023-12-31"),
            invoice("f", "paid", 7.0, "2025-01-01"),
        ]);

        let monthly = earnings_by_month(&items, &EARNING, None);
        let yearly = earnings_by_year(&items, &EARNING, None);

        let sum_2024: f64 = monthly
            .iter()
            .filter(|(key, _)| key.starts_with("2024-"))
            .map(|(_, agg)| agg.total)
            .sum();
        assert!((sum_2024 - yearly["2024"].total).abs() < 1e-9);
        assert_eq!(yearly["2024"].count, 4);
        assert_eq!(yearly["2023"].total, 500.0);
    }

    #[test]
    fn aggregate_is_repeatable_and_pure() {
        let items = invoices(&[
            invoice("a", "paid", 10.25, "2024-03-01"),
            invoice("b", "paid", 3.5, "2024-04-01"),
        ]);
        let before = items.clone();

        let first = earnings_by_month(&items, &EARNING, None);
        let second = earnings_by_month(&items, &EARNING, None);
        assert_eq!(first, second);
        assert_eq!(items, before);
        let keys: Vec<&String> = first.keys().collect();
        assert_eq!(keys, vec!["2024-03", "2024-04"]);
    }

    #[test]
    fn custom_grouping() {
        let items = invoices(&[
            invoice("a", "paid", 10.0, "2024-03-01"),
            invoice("b", "draft", 5.0, "2024-03-02"),
            invoice("c", "draft", 2.5, "2024-03-03"),
        ]);
        let by_status = aggregate(
            &items,
            |_| true,
            |item| item.status.clone().unwrap_or_default(),
            |item| item.amount.unwrap_or(0.0),
        );
        assert_eq!(by_status["draft"].total, 7.5);
        assert_eq!(by_status["draft"].count, 2);
        assert_eq!(by_status["paid"].period_key, "paid");
    }

    #[test]
    fn overdue_skips_closed_and_future_work() {
        let tasks = vec![
            Task {
                id: "t1".to_string(),
                title: "late".to_string(),
                status: "todo".to_string(),
                due_date: Some("2024-03-01".to_string()),
                project_id: "p1".to_string(),
            },
            Task {
                id: "t2".to_string(),
                title: "late but done".to_string(),
                status: "Done".to_string(),
                due_date: Some("2024-03-01".to_string()),
                project_id: "p1".to_string(),
            },
            Task {
                id: "t3".to_string(),
                title: "due today".to_string(),
                status: "todo".to_string(),
                due_date: Some("2024-03-10".to_string()),
                project_id: "p1".to_string(),
            },
        ];
        let items = normalize(&tasks, DateField::DueDate).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        assert_eq!(overdue_count(&items, Kind::Task, today), 1);
        assert_eq!(overdue_count(&items, Kind::Invoice, today), 0);

        let statuses = count_by_status(&items, Kind::Task);
        assert_eq!(statuses["todo"], 2);
        assert_eq!(statuses["Done"], 1);
    }
}
