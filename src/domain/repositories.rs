//! Repository Pattern Abstractions
//!
//! `ForecastRepository` stores forecast requests, their computed results and
//! the exports rendered from them. Implementations must enforce the status
//! lifecycle (`ForecastStatus::can_transition_to`) and reject anything else.
//!
//! Two implementations exist: an in-memory one for tests and offline runs,
//! and a SQLite one backed by sqlx.

use crate::domain::forecast::{ForecastDetails, ForecastRecord, ForecastStatus, ParsedIntent, StoredResult};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ForecastRepository: Send + Sync {
    /// Create a `pending` record and return its id
    async fn create(&self, query_text: &str, parsed: Option<&ParsedIntent>) -> Result<i64>;

    /// Move a record to `status`, optionally with an error message
    async fn update_status(
        &self,
        id: i64,
        status: ForecastStatus,
        error_message: Option<&str>,
    ) -> Result<()>;

    /// Store a finished result and mark its record `completed` in one step
    async fn save_result(&self, stored: &StoredResult) -> Result<()>;

    /// Remember where a report was written
    async fn record_export(&self, forecast_id: i64, path: &str) -> Result<()>;

    /// Record plus result and latest export path
    async fn find(&self, id: i64) -> Result<Option<ForecastDetails>>;

    /// Most recent first
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<ForecastRecord>>;
}
