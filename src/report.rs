use std::fmt::Write;

use chrono::{Datelike, Month, NaiveTime, Weekday};

use crm_rollups::calendar::MonthGrid;
use crm_rollups::{
    format_amount, lead_pipeline, DayBucket, Kind, ProjectSummary, Projector, Snapshot, SourceRef,
    TimedItem,
};

pub struct ReportOptions<'a> {
    pub year: i32,
    pub window_days: usize,
    pub upcoming_limit: usize,
    pub currency: &'a str,
}

pub fn item_line(item: &TimedItem, currency: &str) -> String {
    let when = if item.date.time() == NaiveTime::MIN {
        item.date.format("%Y-%m-%d").to_string()
    } else {
        item.date.format("%Y-%m-%d %H:%M").to_string()
    };

    let mut line = format!("{} [{}] {}", when, item.kind, item.title);
    if let Some(amount) = item.amount {
        let currency = match &item.source {
            SourceRef::Invoice(invoice) => invoice.currency.as_str(),
            _ => currency,
        };
        let _ = write!(line, " {}", format_amount(amount, currency));
    }
    if let Some(status) = &item.status {
        let _ = write!(line, " ({status})");
    }
    line
}

pub fn bucket_line(bucket: &DayBucket) -> String {
    let kinds: Vec<&str> = bucket.kinds.iter().map(Kind::as_str).collect();
    format!(
        "{}{}: {} ({} items)",
        bucket.date,
        if bucket.is_today { " today" } else { "" },
        kinds.join(", "),
        bucket.items.len()
    )
}

pub fn project_line(summary: &ProjectSummary, currency: &str) -> String {
    let client = summary
        .client
        .as_deref()
        .map(|client| format!(" for {client}"))
        .unwrap_or_default();
    format!(
        "{}{} [{}]: {}/{} tasks done ({}%), invoiced {}, collected {}, outstanding {}",
        summary.title,
        client,
        summary.status,
        summary.task_completed,
        summary.task_total,
        summary.progress,
        format_amount(summary.invoiced_total, currency),
        format_amount(summary.collected_total, currency),
        format_amount(summary.outstanding_total, currency),
    )
}

/// Plain-text month view; `*` marks today, `+` marks days with items.
pub fn render_month_grid(grid: &MonthGrid, first_weekday: Weekday) -> String {
    let mut output = String::new();
    let month_name = Month::try_from(grid.month as u8)
        .map(|month| month.name())
        .unwrap_or("?");
    let _ = writeln!(output, "{} {}", month_name, grid.year);

    let mut weekday = first_weekday;
    for _ in 0..7 {
        let name = weekday.to_string();
        let _ = write!(output, "{:>4}", &name[..2]);
        weekday = weekday.succ();
    }
    let _ = writeln!(output);

    for week in &grid.weeks {
        for cell in week {
            if !cell.in_month {
                let _ = write!(output, "{:>4}", ".");
                continue;
            }
            let marker = if cell.is_today {
                '*'
            } else if cell.item_count > 0 {
                '+'
            } else {
                ' '
            };
            let _ = write!(output, "{:>3}{}", cell.date.day(), marker);
        }
        let _ = writeln!(output);
    }

    output
}

pub fn build_report(snapshot: &Snapshot, projector: &Projector, options: &ReportOptions) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Business Dashboard");
    let _ = writeln!(
        output,
        "Generated for {} ({} records loaded)",
        projector.today(),
        snapshot.record_count()
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Upcoming");
    let upcoming = projector.upcoming(options.upcoming_limit);
    if upcoming.is_empty() {
        let _ = writeln!(output, "Nothing scheduled from today on.");
    } else {
        for item in upcoming {
            let _ = writeln!(output, "- {}", item_line(item, options.currency));
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Next {} Days", options.window_days);
    let busy: Vec<DayBucket> = projector
        .calendar(options.window_days)
        .into_iter()
        .filter(|bucket| !bucket.is_empty())
        .collect();
    if busy.is_empty() {
        let _ = writeln!(output, "No scheduled items in this window.");
    } else {
        for bucket in &busy {
            let _ = writeln!(output, "- {}", bucket_line(bucket));
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Earnings {}", options.year);
    let series = projector.monthly_series(options.year);
    let mut month = Month::January;
    for total in series {
        if total != 0.0 {
            let _ = writeln!(
                output,
                "- {}: {}",
                month.name(),
                format_amount(total, options.currency)
            );
        }
        month = month.succ();
    }
    let _ = writeln!(
        output,
        "Total: {}",
        format_amount(projector.yearly_total(options.year), options.currency)
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Projects");
    let summaries = snapshot.project_summaries();
    if summaries.is_empty() {
        let _ = writeln!(output, "No projects yet.");
    } else {
        for summary in &summaries {
            let _ = writeln!(output, "- {}", project_line(summary, options.currency));
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Lead Pipeline");
    let pipeline = lead_pipeline(&snapshot.leads);
    if pipeline.is_empty() {
        let _ = writeln!(output, "No leads recorded.");
    } else {
        for (status, count) in &pipeline {
            let _ = writeln!(output, "- {status}: {count}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Overdue");
    for kind in [Kind::Task, Kind::Project, Kind::Invoice, Kind::Lead] {
        let _ = writeln!(output, "- {}: {}", kind, projector.overdue(kind));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn snapshot() -> Snapshot {
        serde_json::from_value(serde_json::json!({
            "projects": [{ "id": "p1", "title": "Site", "status": "active", "deadline": "2024-03-15", "client": "Acme" }],
            "tasks": [
                { "id": "t1", "title": "Copy", "status": "done", "due_date": "2024-03-05", "project_id": "p1" },
                { "id": "t2", "title": "Deploy", "status": "todo", "due_date": "2024-03-08", "project_id": "p1" }
            ],
            "leads": [{ "id": "l1", "full_name": "Dana", "status": "new", "next_follow_up": "2024-03-11" }],
            "meetings": [{ "id": "m1", "title": "Call", "start_time": "2024-03-10T09:30:00" }],
            "invoices": [
                { "id": "i1", "status": "paid", "total_amount": 100.0, "currency": "EUR", "due_date": "2024-01-10", "project_id": "p1" },
                { "id": "i2", "status": "draft", "total_amount": 999.0, "currency": "EUR", "due_date": "2024-01-25", "project_id": "p1" }
            ]
        }))
        .unwrap()
    }

    fn projector(snapshot: &Snapshot) -> Projector {
        let now = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        Projector::new(&snapshot.timed_item_lists().unwrap(), now)
    }

    #[test]
    fn report_covers_every_section() {
        let snapshot = snapshot();
        let projector = projector(&snapshot);
        let report = build_report(
            &snapshot,
            &projector,
            &ReportOptions {
                year: 2024,
                window_days: 30,
                upcoming_limit: 5,
                currency: "EUR",
            },
        );

        assert!(report.contains("# Business Dashboard"));
        assert!(report.contains("- 2024-03-10 09:30 [meeting] Call"));
        assert!(report.contains("2024-03-15: project (1 items)"));
        assert!(report.contains("- January: EUR 100.00"));
        assert!(report.contains("Total: EUR 100.00"));
        assert!(report.contains("1/2 tasks done (50%)"));
        assert!(report.contains("- new: 1"));
        assert!(report.contains("- task: 1"));
    }

    #[test]
    fn item_line_uses_invoice_currency() {
        let snapshot = snapshot();
        let items = snapshot.timed_items().unwrap();
        let invoice = items.iter().find(|item| item.id == "i1").unwrap();
        assert_eq!(
            item_line(invoice, "USD"),
            "2024-01-10 [invoice] Invoice i1 EUR 100.00 (paid)"
        );
    }

    #[test]
    fn month_grid_marks_today_and_busy_days() {
        let snapshot = snapshot();
        let projector = projector(&snapshot);
        let grid = projector.month_grid(2024, Month::March, Weekday::Sun).unwrap();
        let text = render_month_grid(&grid, Weekday::Sun);

        assert!(text.starts_with("March 2024\n"));
        assert!(text.contains("  Su  Mo  Tu"));
        assert!(text.contains(" 10*"));
        assert!(text.contains(" 15+"));
    }
}
