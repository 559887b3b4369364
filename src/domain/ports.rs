use crate::domain::errors::ForecastError;
use crate::domain::forecast::{AssumptionOverrides, Assumptions, ForecastResult, ParsedIntent};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Turns a free-form query into a structured intent.
#[async_trait]
pub trait IntentParser: Send + Sync {
    async fn parse(&self, query: &str, context: &str) -> Result<ParsedIntent, ForecastError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Source of default segment parameters
pub trait AssumptionsProvider: Send + Sync {
    fn defaults(&self) -> Assumptions;

    /// Defaults with `overrides` applied; never mutates the defaults.
    fn merge(&self, overrides: &AssumptionOverrides) -> Assumptions {
        self.defaults().merge(overrides)
    }
}

/// Files produced by a report export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportArtifact {
    pub forecast_id: i64,
    pub directory: PathBuf,
    pub sheets: Vec<PathBuf>,
    pub generated_at: DateTime<Utc>,
}

#[async_trait]
pub trait ReportExporter: Send + Sync {
    async fn export(&self, forecast_id: i64, result: &ForecastResult) -> Result<ReportArtifact>;
}
