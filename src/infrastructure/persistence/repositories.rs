use crate::domain::errors::ForecastError;
use crate::domain::forecast::{
    ForecastDetails, ForecastIntent, ForecastRecord, ForecastStatus, ParsedIntent, RunMetadata,
    StoredResult,
};
use crate::domain::repositories::ForecastRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use tracing::{debug, info};

pub struct SqliteForecastRepository {
    pool: SqlitePool,
}

impl SqliteForecastRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Validate and apply a status change inside `tx`
    async fn transition(
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
        next: ForecastStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let row = sqlx::query("SELECT status FROM forecast_queries WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .context("Failed to load forecast status")?
            .ok_or(ForecastError::NotFound { id })?;

        let current = ForecastStatus::from_str(row.try_get("status")?)?;
        current.transition(id, next)?;

        sqlx::query(
            r#"
            UPDATE forecast_queries
            SET status = ?, error_message = COALESCE(?, error_message), updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(next.as_str())
        .bind(error_message)
        .bind(Utc::now().timestamp())
        .bind(id)
        .execute(&mut **tx)
        .await
        .context("Failed to update forecast status")?;

        debug!("Forecast {} status {} -> {}", id, current, next);
        Ok(())
    }

    fn map_record(row: &SqliteRow) -> Result<ForecastRecord> {
        let intent: Option<String> = row.try_get("intent")?;
        let timeframe: Option<i64> = row.try_get("timeframe_months")?;

        Ok(ForecastRecord {
            id: row.try_get("id")?,
            query_text: row.try_get("query_text")?,
            intent: intent
                .map(|s| ForecastIntent::from_str(&s))
                .transpose()?,
            timeframe_months: timeframe.map(|m| m as u32),
            status: ForecastStatus::from_str(row.try_get("status")?)?,
            error_message: row.try_get("error_message")?,
            created_at: from_unix(row.try_get("created_at")?),
            updated_at: from_unix(row.try_get("updated_at")?),
        })
    }
}

fn from_unix(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or_default()
}

#[async_trait]
impl ForecastRepository for SqliteForecastRepository {
    async fn create(&self, query_text: &str, parsed: Option<&ParsedIntent>) -> Result<i64> {
        let parsed_json = parsed
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to serialize parsed intent")?;
        let now = Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO forecast_queries
                (query_text, intent, timeframe_months, parsed_intent_json, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(query_text)
        .bind(parsed.map(|p| p.intent.as_str()))
        .bind(parsed.map(|p| p.timeframe.months() as i64))
        .bind(parsed_json)
        .bind(ForecastStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to insert forecast query")?;

        let id = result.last_insert_rowid();
        info!("Persisted forecast query {}", id);
        Ok(id)
    }

    async fn update_status(
        &self,
        id: i64,
        status: ForecastStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::transition(&mut tx, id, status, error_message).await?;
        tx.commit().await.context("Failed to commit status change")?;
        Ok(())
    }

    async fn save_result(&self, stored: &StoredResult) -> Result<()> {
        let result_json =
            serde_json::to_string(&stored.result).context("Failed to serialize forecast result")?;
        let assumptions_json = serde_json::to_string(&stored.result.assumptions)
            .context("Failed to serialize assumptions")?;
        let metadata_json =
            serde_json::to_string(&stored.metadata).context("Failed to serialize metadata")?;

        let mut tx = self.pool.begin().await?;
        Self::transition(&mut tx, stored.forecast_id, ForecastStatus::Completed, None).await?;

        sqlx::query(
            r#"
            INSERT INTO forecast_results
                (forecast_id, forecast_type, result_json, assumptions_json, metadata_json, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(stored.forecast_id)
        .bind(stored.result.forecast_type.to_string())
        .bind(result_json)
        .bind(assumptions_json)
        .bind(metadata_json)
        .bind(stored.created_at.timestamp())
        .execute(&mut *tx)
        .await
        .context("Failed to insert forecast result")?;

        tx.commit().await.context("Failed to commit forecast result")?;
        info!("Persisted result for forecast {}", stored.forecast_id);
        Ok(())
    }

    async fn record_export(&self, forecast_id: i64, path: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO report_exports (forecast_id, path, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(forecast_id)
        .bind(path)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .context("Failed to record report export")?;
        Ok(())
    }

    async fn find(&self, id: i64) -> Result<Option<ForecastDetails>> {
        let Some(row) = sqlx::query("SELECT * FROM forecast_queries WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        let record = Self::map_record(&row)?;

        let result = match sqlx::query(
            "SELECT result_json, metadata_json, created_at FROM forecast_results WHERE forecast_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        {
            Some(row) => {
                let result_json: String = row.try_get("result_json")?;
                let metadata_json: String = row.try_get("metadata_json")?;
                let metadata: RunMetadata = serde_json::from_str(&metadata_json)
                    .context("Failed to decode stored metadata")?;
                Some(StoredResult {
                    forecast_id: id,
                    result: serde_json::from_str(&result_json)
                        .context("Failed to decode stored result")?,
                    metadata,
                    created_at: from_unix(row.try_get("created_at")?),
                })
            }
            None => None,
        };

        let export_path: Option<String> = sqlx::query(
            "SELECT path FROM report_exports WHERE forecast_id = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| row.try_get("path"))
        .transpose()?;

        Ok(Some(ForecastDetails {
            record,
            result,
            export_path,
        }))
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<ForecastRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM forecast_queries ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_record).collect()
    }
}
