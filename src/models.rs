use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Source collection an item came from.
///
/// Variant order is the tie-break priority for items on the same day:
/// meetings first, invoices last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Meeting,
    Project,
    Task,
    Lead,
    Reminder,
    Invoice,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Meeting => "meeting",
            Kind::Project => "project",
            Kind::Task => "task",
            Kind::Lead => "lead",
            Kind::Reminder => "reminder",
            Kind::Invoice => "invoice",
        }
    }

    pub fn default_date_field(&self) -> DateField {
        match self {
            Kind::Project => DateField::Deadline,
            Kind::Task | Kind::Reminder | Kind::Invoice => DateField::DueDate,
            Kind::Lead => DateField::NextFollowUp,
            Kind::Meeting => DateField::StartTime,
        }
    }

    pub fn closed_statuses(&self) -> &'static [&'static str] {
        match self {
            Kind::Task => &["done", "completed"],
            Kind::Project => &["completed", "cancelled"],
            Kind::Invoice => &["paid", "cancelled"],
            Kind::Lead => &["won", "lost", "converted"],
            Kind::Meeting | Kind::Reminder => &[],
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateField {
    Deadline,
    DueDate,
    StartTime,
    NextFollowUp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub status: String,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: String,
    #[serde(default)]
    pub due_date: Option<String>,
    pub project_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub full_name: String,
    pub status: String,
    #[serde(default)]
    pub next_follow_up: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(rename = "type")]
    pub reminder_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub status: String,
    pub total_amount: f64,
    pub currency: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub invoice_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceRef {
    Project(Project),
    Task(Task),
    Lead(Lead),
    Meeting(Meeting),
    Reminder(Reminder),
    Invoice(Invoice),
}

pub trait SourceRecord: Clone {
    const KIND: Kind;

    fn id(&self) -> &str;

    fn title(&self) -> String;

    /// Raw value of `field`, or `None` when this kind has no such field or it is unset.
    fn date_value(&self, field: DateField) -> Option<&str>;

    fn status(&self) -> Option<&str> {
        None
    }

    fn amount(&self) -> Option<f64> {
        None
    }

    fn to_source(&self) -> SourceRef;
}

impl SourceRecord for Project {
    const KIND: Kind = Kind::Project;

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn date_value(&self, field: DateField) -> Option<&str> {
        match field {
            DateField::Deadline => self.deadline.as_deref(),
            _ => None,
        }
    }

    fn status(&self) -> Option<&str> {
        Some(&self.status)
    }

    fn to_source(&self) -> SourceRef {
        SourceRef::Project(self.clone())
    }
}

impl SourceRecord for Task {
    const KIND: Kind = Kind::Task;

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn date_value(&self, field: DateField) -> Option<&str> {
        match field {
            DateField::DueDate => self.due_date.as_deref(),
            _ => None,
        }
    }

    fn status(&self) -> Option<&str> {
        Some(&self.status)
    }

    fn to_source(&self) -> SourceRef {
        SourceRef::Task(self.clone())
    }
}

impl SourceRecord for Lead {
    const KIND: Kind = Kind::Lead;

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> String {
        self.full_name.clone()
    }

    fn date_value(&self, field: DateField) -> Option<&str> {
        match field {
            DateField::NextFollowUp => self.next_follow_up.as_deref(),
            _ => None,
        }
    }

    fn status(&self) -> Option<&str> {
        Some(&self.status)
    }

    fn to_source(&self) -> SourceRef {
        SourceRef::Lead(self.clone())
    }
}

impl SourceRecord for Meeting {
    const KIND: Kind = Kind::Meeting;

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn date_value(&self, field: DateField) -> Option<&str> {
        match field {
            DateField::StartTime => self.start_time.as_deref(),
            _ => None,
        }
    }

    fn to_source(&self) -> SourceRef {
        SourceRef::Meeting(self.clone())
    }
}

impl SourceRecord for Reminder {
    const KIND: Kind = Kind::Reminder;

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn date_value(&self, field: DateField) -> Option<&str> {
        match field {
            DateField::DueDate => self.due_date.as_deref(),
            _ => None,
        }
    }

    fn to_source(&self) -> SourceRef {
        SourceRef::Reminder(self.clone())
    }
}

impl SourceRecord for Invoice {
    const KIND: Kind = Kind::Invoice;

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> String {
        match &self.invoice_number {
            Some(number) if !number.trim().is_empty() => format!("Invoice {number}"),
            _ => format!("Invoice {}", self.id),
        }
    }

    fn date_value(&self, field: DateField) -> Option<&str> {
        match field {
            DateField::DueDate => self.due_date.as_deref(),
            _ => None,
        }
    }

    fn status(&self) -> Option<&str> {
        Some(&self.status)
    }

    fn amount(&self) -> Option<f64> {
        Some(self.total_amount)
    }

    fn to_source(&self) -> SourceRef {
        SourceRef::Invoice(self.clone())
    }
}

/// Case-insensitive membership test; the backend is not consistent about casing.
pub fn status_matches(status: &str, statuses: &[&str]) -> bool {
    statuses
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(status.trim()))
}

/// A record reduced to the single date that places it on the calendar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedItem {
    pub id: String,
    pub kind: Kind,
    pub date: NaiveDateTime,
    pub title: String,
    pub amount: Option<f64>,
    pub status: Option<String>,
    pub source: SourceRef,
}

impl TimedItem {
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    pub fn has_status(&self, statuses: &[&str]) -> bool {
        self.status
            .as_deref()
            .map(|status| status_matches(status, statuses))
            .unwrap_or(false)
    }

    pub fn currency(&self) -> Option<&str> {
        match &self.source {
            SourceRef::Invoice(invoice) => Some(invoice.currency.as_str()),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.has_status(self.kind.closed_statuses())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub items: Vec<TimedItem>,
    pub kinds: BTreeSet<Kind>,
    pub is_today: bool,
}

impl DayBucket {
    pub fn empty(date: NaiveDate, is_today: bool) -> Self {
        Self {
            date,
            items: Vec::new(),
            kinds: BTreeSet::new(),
            is_today,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodAggregate {
    pub period_key: String,
    pub total: f64,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_order_follows_tie_break_priority() {
        let mut kinds = vec![Kind::Invoice, Kind::Task, Kind::Meeting, Kind::Lead];
        kinds.sort();
        assert_eq!(kinds, vec![Kind::Meeting, Kind::Task, Kind::Lead, Kind::Invoice]);
        assert!(Kind::Project < Kind::Task);
        assert!(Kind::Reminder < Kind::Invoice);
    }

    #[test]
    fn records_only_expose_their_own_date_field() {
        let project = Project {
            id: "p1".to_string(),
            title: "Website".to_string(),
            status: "active".to_string(),
            deadline: Some("2024-03-15".to_string()),
            client: None,
        };
        assert_eq!(project.date_value(DateField::Deadline), Some("2024-03-15"));
        assert_eq!(project.date_value(DateField::DueDate), None);
        assert_eq!(Kind::Project.default_date_field(), DateField::Deadline);
    }

    #[test]
    fn reminder_type_uses_wire_name() {
        let reminder: Reminder = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "title": "Renew domain",
            "due_date": "2024-05-01",
            "type": "renewal",
        }))
        .unwrap();
        assert_eq!(reminder.reminder_type, "renewal");
    }

    #[test]
    fn invoice_title_prefers_number() {
        let mut invoice = Invoice {
            id: "inv-1".to_string(),
            status: "sent".to_string(),
            total_amount: 120.0,
            currency: "EUR".to_string(),
            due_date: None,
            project_id: None,
            invoice_number: Some("2024-007".to_string()),
        };
        assert_eq!(invoice.title(), "Invoice 2024-007");
        invoice.invoice_number = None;
        assert_eq!(invoice.title(), "Invoice inv-1");
    }

    #[test]
    fn only_invoices_carry_a_currency() {
        let items = crate::normalize::normalize(
            &[Invoice {
                id: "inv-1".to_string(),
                status: "paid".to_string(),
                total_amount: 80.0,
                currency: "GBP".to_string(),
                due_date: Some("2024-02-01".to_string()),
                project_id: None,
                invoice_number: None,
            }],
            DateField::DueDate,
        )
        .unwrap();
        assert_eq!(items[0].currency(), Some("GBP"));

        let meetings = crate::normalize::normalize(
            &[Meeting {
                id: "m1".to_string(),
                title: "Call".to_string(),
                start_time: Some("2024-02-01T10:00".to_string()),
            }],
            DateField::StartTime,
        )
        .unwrap();
        assert_eq!(meetings[0].currency(), None);
    }
}
