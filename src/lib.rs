//! Derived views for the freelancer and travel-agent dashboards.
//!
//! Records flow one way: typed source records are normalized into
//! [`TimedItem`]s, merged into one ordered sequence, then bucketed by day,
//! rolled up by period and projected for presentation. Every stage is a pure
//! function of its inputs; "now" is always passed in.

pub mod calendar;
pub mod error;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod portfolio;
pub mod projector;
pub mod rollup;
pub mod snapshot;

pub use calendar::{build_calendar, month_grid, GridCell, MonthGrid};
pub use error::CoreError;
pub use merge::merge;
pub use models::{
    DateField, DayBucket, Invoice, Kind, Lead, Meeting, PeriodAggregate, Project, Reminder,
    SourceRecord, SourceRef, Task, TimedItem,
};
pub use normalize::{normalize, parse_date};
pub use portfolio::{lead_pipeline, project_summaries, ProjectSummary};
pub use projector::{format_amount, progress, round_currency, Projector};
pub use rollup::aggregate;
pub use snapshot::Snapshot;
