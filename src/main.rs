use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use chrono::{Datelike, Local, Month};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crm_rollups::{Projector, Snapshot};

mod db;
mod report;
mod settings;
mod snapshot_file;

use settings::Settings;

#[derive(Parser)]
#[command(name = "crm-rollups")]
#[command(about = "Dashboard and calendar rollups for the freelancer and travel-agent CRM", long_about = None)]
struct Cli {
    /// Read records from a JSON snapshot instead of Postgres
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,
    /// Only include rows owned by this user
    #[arg(long, global = true)]
    user: Option<Uuid>,
    /// Settings file; defaults to ./crm-rollups.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo records relative to today
    Seed,
    /// Import invoices from a CSV file (requires --user)
    ImportInvoices {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show the rolling calendar window starting today
    Calendar {
        #[arg(long)]
        days: Option<usize>,
        /// Also list days with nothing scheduled
        #[arg(long)]
        all: bool,
    },
    /// Show one month as a week grid
    Month {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
    /// List the next scheduled items
    Upcoming {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Earnings by month for a year
    Earnings {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Progress and billing per project
    Projects,
    /// Generate a markdown dashboard report
    Report {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, default_value = "dashboard.md")]
        out: PathBuf,
    },
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set when no --snapshot file is given")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn load_snapshot(path: Option<&Path>, user: Option<Uuid>) -> anyhow::Result<Snapshot> {
    let snapshot = match path {
        Some(path) => {
            if user.is_some() {
                tracing::warn!("--user is ignored when reading a snapshot file");
            }
            snapshot_file::load_snapshot(path)?
        }
        None => {
            let pool = connect().await?;
            db::fetch_snapshot(&pool, user).await?
        }
    };

    tracing::debug!(
        projects = snapshot.projects.len(),
        tasks = snapshot.tasks.len(),
        leads = snapshot.leads.len(),
        meetings = snapshot.meetings.len(),
        reminders = snapshot.reminders.len(),
        invoices = snapshot.invoices.len(),
        "records loaded"
    );
    Ok(snapshot)
}

fn build_projector(snapshot: &Snapshot, settings: &Settings) -> anyhow::Result<Projector> {
    let lists = snapshot.timed_item_lists()?;
    let scheduled: usize = lists.iter().map(Vec::len).sum();
    tracing::debug!(
        scheduled,
        unscheduled = snapshot.record_count() - scheduled,
        "records normalized"
    );

    // amounts are not converted; totals only cover the configured currency
    Ok(Projector::in_currency(
        &lists,
        Local::now().naive_local(),
        &settings.earning_statuses(),
        &settings.currency,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let Cli {
        snapshot,
        user,
        config,
        command,
    } = Cli::parse();
    let settings = Settings::load(config.as_deref()).context("failed to load settings")?;
    let this_year = Local::now().year();

    match command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            db::seed(&pool).await?;
            println!("Seed data inserted for user {}.", db::seed_user()?);
        }
        Commands::ImportInvoices { csv } => {
            let user = user.context("--user is required to import invoices")?;
            let pool = connect().await?;
            let inserted = db::import_invoices_csv(&pool, &csv, user).await?;
            tracing::info!(inserted, path = %csv.display(), "invoice import finished");
            println!("Inserted {inserted} invoices from {}.", csv.display());
        }
        Commands::Calendar { days, all } => {
            let snapshot = load_snapshot(snapshot.as_deref(), user).await?;
            let projector = build_projector(&snapshot, &settings)?;
            let buckets = projector.calendar(days.unwrap_or(settings.window_days));

            let mut printed = 0usize;
            for bucket in buckets.iter().filter(|bucket| all || !bucket.is_empty()) {
                println!("{}", report::bucket_line(bucket));
                printed += 1;
            }
            if printed == 0 {
                println!("No scheduled items in this window.");
            }
        }
        Commands::Month { year, month } => {
            let today = Local::now().date_naive();
            let month_number = month.unwrap_or(today.month());
            let month = u8::try_from(month_number)
                .ok()
                .and_then(|value| Month::try_from(value).ok())
                .ok_or_else(|| anyhow!("--month must be between 1 and 12, got {month_number}"))?;

            let snapshot = load_snapshot(snapshot.as_deref(), user).await?;
            let projector = build_projector(&snapshot, &settings)?;
            let year = year.unwrap_or(today.year());
            let grid = projector
                .month_grid(year, month, settings.first_weekday())
                .ok_or_else(|| anyhow!("{year} is outside the supported calendar range"))?;

            print!("{}", report::render_month_grid(&grid, settings.first_weekday()));
        }
        Commands::Upcoming { limit } => {
            let snapshot = load_snapshot(snapshot.as_deref(), user).await?;
            let projector = build_projector(&snapshot, &settings)?;
            let upcoming = projector.upcoming(limit.unwrap_or(settings.upcoming_limit));

            if upcoming.is_empty() {
                println!("Nothing scheduled from today on.");
                return Ok(());
            }

            println!("Coming up:");
            for item in upcoming {
                println!("- {}", report::item_line(item, &settings.currency));
            }
        }
        Commands::Earnings { year } => {
            let snapshot = load_snapshot(snapshot.as_deref(), user).await?;
            let projector = build_projector(&snapshot, &settings)?;
            let year = year.unwrap_or(this_year);

            println!("Earnings for {year}:");
            let mut month = Month::January;
            for total in projector.monthly_series(year) {
                println!(
                    "- {:<9} {}",
                    month.name(),
                    crm_rollups::format_amount(total, &settings.currency)
                );
                month = month.succ();
            }
            println!(
                "Total: {}",
                crm_rollups::format_amount(projector.yearly_total(year), &settings.currency)
            );
        }
        Commands::Projects => {
            let snapshot = load_snapshot(snapshot.as_deref(), user).await?;
            let summaries = snapshot.project_summaries();

            if summaries.is_empty() {
                println!("No projects found.");
                return Ok(());
            }

            for summary in &summaries {
                println!("- {}", report::project_line(summary, &settings.currency));
            }
        }
        Commands::Report { year, out } => {
            let snapshot = load_snapshot(snapshot.as_deref(), user).await?;
            let projector = build_projector(&snapshot, &settings)?;
            let report = report::build_report(
                &snapshot,
                &projector,
                &report::ReportOptions {
                    year: year.unwrap_or(this_year),
                    window_days: settings.window_days,
                    upcoming_limit: settings.upcoming_limit,
                    currency: &settings.currency,
                },
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
