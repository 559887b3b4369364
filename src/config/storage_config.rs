//! Persistence and export configuration parsing from environment variables.

use std::env;
use std::path::PathBuf;

/// Storage environment configuration
#[derive(Debug, Clone)]
pub struct StorageEnvConfig {
    pub database_url: String,
    pub export_enabled: bool,
    pub reports_dir: PathBuf,
    /// Reports older than this many days are removed by `finsynth cleanup`
    pub report_retention_days: u32,
}

impl Default for StorageEnvConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/finsynth.db".to_string(),
            export_enabled: true,
            reports_dir: PathBuf::from("storage/reports"),
            report_retention_days: 30,
        }
    }
}

impl StorageEnvConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            export_enabled: env::var("EXPORT_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse::<bool>()
                .unwrap_or(true),
            reports_dir: env::var("REPORTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.reports_dir),
            report_retention_days: env::var("REPORT_RETENTION_DAYS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(defaults.report_retention_days),
        }
    }
}
