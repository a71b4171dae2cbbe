use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::merge::merge;
use crate::models::{Invoice, Lead, Meeting, Project, Reminder, SourceRecord, Task, TimedItem};
use crate::normalize::normalize;
use crate::portfolio::{project_summaries, ProjectSummary};

/// One consistent fetch of every collection the dashboards read.
///
/// A collection that has not loaded yet is simply empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub projects: Vec<Project>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tasks: Vec<Task>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub leads: Vec<Lead>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub meetings: Vec<Meeting>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reminders: Vec<Reminder>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub invoices: Vec<Invoice>,
}

// The backend sends `null` for tables it has not loaded yet.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn normalize_default<R: SourceRecord>(records: &[R]) -> Result<Vec<TimedItem>, CoreError> {
    normalize(records, R::KIND.default_date_field())
}

impl Snapshot {
    pub fn timed_item_lists(&self) -> Result<Vec<Vec<TimedItem>>, CoreError> {
        Ok(vec![
            normalize_default(&self.projects)?,
            normalize_default(&self.tasks)?,
            normalize_default(&self.leads)?,
            normalize_default(&self.meetings)?,
            normalize_default(&self.reminders)?,
            normalize_default(&self.invoices)?,
        ])
    }

    pub fn timed_items(&self) -> Result<Vec<TimedItem>, CoreError> {
        Ok(merge(&self.timed_item_lists()?))
    }

    pub fn project_summaries(&self) -> Vec<ProjectSummary> {
        project_summaries(&self.projects, &self.tasks, &self.invoices)
    }

    pub fn record_count(&self) -> usize {
        self.projects.len()
            + self.tasks.len()
            + self.leads.len()
            + self.meetings.len()
            + self.reminders.len()
            + self.invoices.len()
    }
}
