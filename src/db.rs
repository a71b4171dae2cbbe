use anyhow::Context;
use chrono::{Duration, Local, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crm_rollups::{Invoice, Lead, Meeting, Project, Reminder, Snapshot, Task};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub fn seed_user() -> anyhow::Result<Uuid> {
    Ok(Uuid::parse_str("5b0d3c3e-7a51-4f0e-9a43-2d1f6c7e8a90")?)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let user_id = seed_user()?;
    let today = Local::now().date_naive();
    let day = |offset: i64| today + Duration::days(offset);

    let projects = vec![
        (
            Uuid::parse_str("a3c1f7e2-1b6d-4c1e-8f0a-6f2d9b1c4e01")?,
            "Brand refresh",
            "active",
            Some(day(12)),
            Some("Northwind Studio"),
        ),
        (
            Uuid::parse_str("a3c1f7e2-1b6d-4c1e-8f0a-6f2d9b1c4e02")?,
            "Lisbon group tour",
            "active",
            Some(day(25)),
            Some("Harbor Travel Club"),
        ),
        (
            Uuid::parse_str("a3c1f7e2-1b6d-4c1e-8f0a-6f2d9b1c4e03")?,
            "Retainer Q1",
            "completed",
            Some(day(-40)),
            None,
        ),
    ];

    for (id, title, status, deadline, client) in projects.iter().copied() {
        sqlx::query(
            r#"
            INSERT INTO crm.projects (id, user_id, title, status, deadline, client)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET title = EXCLUDED.title, status = EXCLUDED.status, deadline = EXCLUDED.deadline
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(title)
        .bind(status)
        .bind(deadline)
        .bind(client)
        .execute(pool)
        .await?;
    }

    let brand = projects[0].0;
    let tour = projects[1].0;
    let retainer = projects[2].0;

    let tasks = vec![
        ("c4d2e8f3-2c7e-4d2f-9a1b-7a3e0c2d5f01", brand, "Moodboard", "done", Some(day(-5))),
        ("c4d2e8f3-2c7e-4d2f-9a1b-7a3e0c2d5f02", brand, "Logo drafts", "in_progress", Some(day(3))),
        ("c4d2e8f3-2c7e-4d2f-9a1b-7a3e0c2d5f03", brand, "Style guide", "todo", None),
        ("c4d2e8f3-2c7e-4d2f-9a1b-7a3e0c2d5f04", tour, "Book hotel block", "todo", Some(day(-2))),
        ("c4d2e8f3-2c7e-4d2f-9a1b-7a3e0c2d5f05", tour, "Confirm guides", "todo", Some(day(12))),
    ];

    for (id, project_id, title, status, due_date) in tasks {
        sqlx::query(
            r#"
            INSERT INTO crm.tasks (id, user_id, project_id, title, status, due_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(user_id)
        .bind(project_id)
        .bind(title)
        .bind(status)
        .bind(due_date)
        .execute(pool)
        .await?;
    }

    let leads = vec![
        ("d5e3f9a4-3d8f-4e3a-8b2c-8b4f1d3e6a01", "Priya Raman", "contacted", Some(day(1))),
        ("d5e3f9a4-3d8f-4e3a-8b2c-8b4f1d3e6a02", "Tomás Ortega", "new", Some(day(-1))),
        ("d5e3f9a4-3d8f-4e3a-8b2c-8b4f1d3e6a03", "Mei Chen", "won", None),
    ];

    for (id, full_name, status, next_follow_up) in leads {
        sqlx::query(
            r#"
            INSERT INTO crm.leads (id, user_id, full_name, status, next_follow_up)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(user_id)
        .bind(full_name)
        .bind(status)
        .bind(next_follow_up)
        .execute(pool)
        .await?;
    }

    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO crm.meetings (id, user_id, title, start_time)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(Uuid::parse_str("e6f4a0b5-4e9a-4f4b-9c3d-9c5a2e4f7b01")?)
    .bind(user_id)
    .bind("Kickoff with Northwind")
    .bind(now + Duration::days(3))
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO crm.reminders (id, user_id, title, reminder_type, due_date)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(Uuid::parse_str("f7a5b1c6-5fab-4a5c-8d4e-ad6b3f5a8c01")?)
    .bind(user_id)
    .bind("Passport copies for tour group")
    .bind("document")
    .bind(day(7))
    .execute(pool)
    .await?;

    let invoices = vec![
        ("seed-inv-001", Some(retainer), "INV-001", "paid", 1800.0, day(-45)),
        ("seed-inv-002", Some(brand), "INV-002", "sent", 950.0, day(10)),
        ("seed-inv-003", Some(tour), "INV-003", "draft", 4200.0, day(20)),
        ("seed-inv-004", None, "INV-004", "paid", 120.5, day(-3)),
    ];

    for (source_key, project_id, number, status, amount, due_date) in invoices {
        sqlx::query(
            r#"
            INSERT INTO crm.invoices
            (id, user_id, project_id, invoice_number, status, total_amount, currency, due_date, source_key)
            VALUES ($1, $2, $3, $4, $5, $6::float8::numeric, 'USD', $7, $8)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(project_id)
        .bind(number)
        .bind(status)
        .bind(amount)
        .bind(due_date)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

async fn fetch_rows(
    pool: &PgPool,
    select: &str,
    user: Option<Uuid>,
) -> anyhow::Result<Vec<PgRow>> {
    let mut query = String::from(select);
    if user.is_some() {
        query.push_str(" WHERE user_id = $1");
    }
    query.push_str(" ORDER BY created_at, id");

    let mut rows = sqlx::query(&query);
    if let Some(value) = user {
        rows = rows.bind(value);
    }

    Ok(rows.fetch_all(pool).await?)
}

/// Loads every collection, optionally limited to one owner.
///
/// Dates come back in Postgres text form; the core parses them.
pub async fn fetch_snapshot(pool: &PgPool, user: Option<Uuid>) -> anyhow::Result<Snapshot> {
    let projects = fetch_rows(
        pool,
        "SELECT id::text AS id, title, status, deadline::text AS deadline, client \
         FROM crm.projects",
        user,
    )
    .await
    .context("failed to load projects")?
    .into_iter()
    .map(|row| Project {
        id: row.get("id"),
        title: row.get("title"),
        status: row.get("status"),
        deadline: row.get("deadline"),
        client: row.get("client"),
    })
    .collect();

    let tasks = fetch_rows(
        pool,
        "SELECT id::text AS id, title, status, due_date::text AS due_date, \
         project_id::text AS project_id FROM crm.tasks",
        user,
    )
    .await
    .context("failed to load tasks")?
    .into_iter()
    .map(|row| Task {
        id: row.get("id"),
        title: row.get("title"),
        status: row.get("status"),
        due_date: row.get("due_date"),
        project_id: row.get("project_id"),
    })
    .collect();

    let leads = fetch_rows(
        pool,
        "SELECT id::text AS id, full_name, status, next_follow_up::text AS next_follow_up \
         FROM crm.leads",
        user,
    )
    .await
    .context("failed to load leads")?
    .into_iter()
    .map(|row| Lead {
        id: row.get("id"),
        full_name: row.get("full_name"),
        status: row.get("status"),
        next_follow_up: row.get("next_follow_up"),
    })
    .collect();

    let meetings = fetch_rows(
        pool,
        "SELECT id::text AS id, title, start_time::text AS start_time FROM crm.meetings",
        user,
    )
    .await
    .context("failed to load meetings")?
    .into_iter()
    .map(|row| Meeting {
        id: row.get("id"),
        title: row.get("title"),
        start_time: row.get("start_time"),
    })
    .collect();

    let reminders = fetch_rows(
        pool,
        "SELECT id::text AS id, title, reminder_type, due_date::text AS due_date \
         FROM crm.reminders",
        user,
    )
    .await
    .context("failed to load reminders")?
    .into_iter()
    .map(|row| Reminder {
        id: row.get("id"),
        title: row.get("title"),
        reminder_type: row.get("reminder_type"),
        due_date: row.get("due_date"),
    })
    .collect();

    let invoices = fetch_rows(
        pool,
        "SELECT id::text AS id, status, total_amount::float8 AS total_amount, currency, \
         due_date::text AS due_date, project_id::text AS project_id, invoice_number \
         FROM crm.invoices",
        user,
    )
    .await
    .context("failed to load invoices")?
    .into_iter()
    .map(|row| Invoice {
        id: row.get("id"),
        status: row.get("status"),
        total_amount: row.get("total_amount"),
        currency: row.get("currency"),
        due_date: row.get("due_date"),
        project_id: row.get("project_id"),
        invoice_number: row.get("invoice_number"),
    })
    .collect();

    Ok(Snapshot {
        projects,
        tasks,
        leads,
        meetings,
        reminders,
        invoices,
    })
}

pub async fn import_invoices_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
    user_id: Uuid,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        invoice_number: String,
        status: String,
        total_amount: f64,
        currency: String,
        due_date: Option<NaiveDate>,
        project_id: Option<Uuid>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", row.invoice_number));

        let result = sqlx::query(
            r#"
            INSERT INTO crm.invoices
            (id, user_id, project_id, invoice_number, status, total_amount, currency, due_date, source_key)
            VALUES ($1, $2, $3, $4, $5, $6::float8::numeric, $7, $8, $9)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(row.project_id)
        .bind(&row.invoice_number)
        .bind(row.status.trim().to_lowercase())
        .bind(row.total_amount)
        .bind(&row.currency)
        .bind(row.due_date)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        } else {
            tracing::debug!(invoice = %row.invoice_number, "invoice already imported");
        }
    }

    Ok(inserted)
}
