use std::path::Path;

use chrono::Weekday;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Presentation knobs for the dashboards.
///
/// Layered as built-in defaults, then `crm-rollups.toml` (or `--config`),
/// then `CRM_ROLLUPS_*` environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub window_days: usize,
    pub upcoming_limit: usize,
    pub earning_statuses: Vec<String>,
    pub week_starts_on_monday: bool,
    pub currency: String,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("window_days", 30_i64)?
            .set_default("upcoming_limit", 5_i64)?
            .set_default("earning_statuses", vec!["paid", "sent"])?
            .set_default("week_starts_on_monday", false)?
            .set_default("currency", "USD")?;

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("crm-rollups").required(false)),
        };

        builder
            .add_source(
                Environment::with_prefix("CRM_ROLLUPS")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("earning_statuses"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn first_weekday(&self) -> Weekday {
        if self.week_starts_on_monday {
            Weekday::Mon
        } else {
            Weekday::Sun
        }
    }

    pub fn earning_statuses(&self) -> Vec<&str> {
        self.earning_statuses.iter().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.toml");
        std::fs::write(
            &path,
            "window_days = 14\nearning_statuses = [\"paid\"]\nweek_starts_on_monday = true\n",
        )
        .unwrap();

        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.window_days, 14);
        assert_eq!(settings.upcoming_limit, 5);
        assert_eq!(settings.earning_statuses(), vec!["paid"]);
        assert_eq!(settings.first_weekday(), Weekday::Mon);
        assert_eq!(settings.currency, "USD");
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Settings::load(Some(missing.as_path())).is_err());
    }
}
