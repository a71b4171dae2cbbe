use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::{status_matches, Invoice, Kind, Lead, Project, Task};
use crate::projector::progress;

const PAID: [&str; 1] = ["paid"];
const NOT_BILLED: [&str; 2] = ["draft", "cancelled"];

/// Per-project rollup of the tasks and invoices that reference it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub project_id: String,
    pub title: String,
    pub status: String,
    pub client: Option<String>,
    pub task_total: usize,
    pub task_completed: usize,
    pub progress: u32,
    pub invoice_count: usize,
    pub invoiced_total: f64,
    pub collected_total: f64,
    pub outstanding_total: f64,
}

/// Joins tasks and invoices onto projects by exact `project_id`.
///
/// Undated tasks still count toward progress. Tasks and invoices pointing at
/// unknown projects are left out. Drafts and cancelled invoices are not billed.
pub fn project_summaries(
    projects: &[Project],
    tasks: &[Task],
    invoices: &[Invoice],
) -> Vec<ProjectSummary> {
    let mut tasks_by_project: HashMap<&str, Vec<&Task>> = HashMap::new();
    for task in tasks {
        tasks_by_project
            .entry(task.project_id.as_str())
            .or_default()
            .push(task);
    }

    let mut invoices_by_project: HashMap<&str, Vec<&Invoice>> = HashMap::new();
    for invoice in invoices {
        if let Some(project_id) = invoice.project_id.as_deref() {
            invoices_by_project.entry(project_id).or_default().push(invoice);
        }
    }

    projects
        .iter()
        .map(|project| {
            let project_tasks = tasks_by_project
                .get(project.id.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            let task_completed = project_tasks
                .iter()
                .filter(|task| status_matches(&task.status, Kind::Task.closed_statuses()))
                .count();

            let billed: Vec<&Invoice> = invoices_by_project
                .get(project.id.as_str())
                .map(|list| {
                    list.iter()
                        .copied()
                        .filter(|invoice| !status_matches(&invoice.status, &NOT_BILLED))
                        .collect()
                })
                .unwrap_or_default();

            let mut invoiced_total = 0.0;
            let mut collected_total = 0.0;
            let mut outstanding_total = 0.0;
            for invoice in &billed {
                invoiced_total += invoice.total_amount;
                if status_matches(&invoice.status, &PAID) {
                    collected_total += invoice.total_amount;
                } else {
                    outstanding_total += invoice.total_amount;
                }
            }

            ProjectSummary {
                project_id: project.id.clone(),
                title: project.title.clone(),
                status: project.status.clone(),
                client: project.client.clone(),
                task_total: project_tasks.len(),
                task_completed,
                progress: progress(task_completed, project_tasks.len()),
                invoice_count: billed.len(),
                invoiced_total,
                collected_total,
                outstanding_total,
            }
        })
        .collect()
}

pub fn lead_pipeline(leads: &[Lead]) -> BTreeMap<String, usize> {
    let mut pipeline = BTreeMap::new();
    for lead in leads {
        *pipeline
            .entry(lead.status.trim().to_lowercase())
            .or_insert(0) += 1;
    }
    pipeline
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: &str) -> Project {
        Project {
            id: id.to_string(),
            title: format!("project {id}"),
            status: "active".to_string(),
            deadline: None,
            client: Some("Acme".to_string()),
        }
    }

    fn task(id: &str, project_id: &str, status: &str) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task {id}"),
            status: status.to_string(),
            due_date: None,
            project_id: project_id.to_string(),
        }
    }

    fn invoice(id: &str, project_id: Option<&str>, status: &str, amount: f64) -> Invoice {
        Invoice {
            id: id.to_string(),
            status: status.to_string(),
            total_amount: amount,
            currency: "USD".to_string(),
            due_date: Some("2024-04-01".to_string()),
            project_id: project_id.map(str::to_string),
            invoice_number: None,
        }
    }

    #[test]
    fn joins_tasks_and_invoices_by_project() {
        let projects = vec![project("p1"), project("p2")];
        let tasks = vec![
            task("t1", "p1", "done"),
            task("t2", "p1", "todo"),
            task("t3", "p1", "in_progress"),
            task("t4", "p2", "completed"),
            task("t5", "ghost", "done"),
        ];
        let invoices = vec![
            invoice("i1", Some("p1"), "paid", 300.0),
            invoice("i2", Some("p1"), "sent", 200.0),
            invoice("i3", Some("p1"), "draft", 999.0),
            invoice("i4", None, "paid", 50.0),
        ];

        let summaries = project_summaries(&projects, &tasks, &invoices);
        assert_eq!(summaries.len(), 2);

        let p1 = &summaries[0];
        assert_eq!(p1.task_total, 3);
        assert_eq!(p1.task_completed, 1);
        assert_eq!(p1.progress, 33);
        assert_eq!(p1.invoice_count, 2);
        assert_eq!(p1.invoiced_total, 500.0);
        assert_eq!(p1.collected_total, 300.0);
        assert_eq!(p1.outstanding_total, 200.0);

        let p2 = &summaries[1];
        assert_eq!(p2.progress, 100);
        assert_eq!(p2.invoice_count, 0);
        assert_eq!(p2.invoiced_total, 0.0);
    }

    #[test]
    fn project_without_tasks_has_zero_progress() {
        let summaries = project_summaries(&[project("p1")], &[], &[]);
        assert_eq!(summaries[0].task_total, 0);
        assert_eq!(summaries[0].progress, 0);
    }

    #[test]
    fn pipeline_normalizes_status_casing() {
        let leads = vec![
            Lead {
                id: "l1".to_string(),
                full_name: "Dana".to_string(),
                status: "New".to_string(),
                next_follow_up: None,
            },
            Lead {
                id: "l2".to_string(),
                full_name: "Sam".to_string(),
                status: "new ".to_string(),
                next_follow_up: None,
            },
            Lead {
                id: "l3".to_string(),
                full_name: "Kai".to_string(),
                status: "won".to_string(),
                next_follow_up: None,
            },
        ];
        let pipeline = lead_pipeline(&leads);
        assert_eq!(pipeline["new"], 2);
        assert_eq!(pipeline["won"], 1);
    }
}
