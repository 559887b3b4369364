//! In-Memory Repository Implementation
//!
//! Thread-safe, in-memory `ForecastRepository` using `Arc<RwLock>`.
//! Used by tests and by embedders that do not need durable storage.
//! Data is lost when the process exits.

use crate::domain::errors::ForecastError;
use crate::domain::forecast::{
    ForecastDetails, ForecastRecord, ForecastStatus, ParsedIntent, StoredResult,
};
use crate::domain::repositories::ForecastRepository;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Store {
    next_id: i64,
    records: BTreeMap<i64, ForecastRecord>,
    results: BTreeMap<i64, StoredResult>,
    exports: BTreeMap<i64, String>,
}

impl Store {
    fn transition(
        &mut self,
        id: i64,
        next: ForecastStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or(ForecastError::NotFound { id })?;
        record.status = record.status.transition(id, next)?;
        if let Some(message) = error_message {
            record.error_message = Some(message.to_string());
        }
        record.updated_at = Utc::now();
        Ok(())
    }
}

/// In-memory implementation of ForecastRepository
pub struct InMemoryForecastRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryForecastRepository {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(Store::default())),
        }
    }
}

impl Default for InMemoryForecastRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ForecastRepository for InMemoryForecastRepository {
    async fn create(&self, query_text: &str, parsed: Option<&ParsedIntent>) -> Result<i64> {
        let mut store = self.store.write().await;
        store.next_id += 1;
        let id = store.next_id;
        let now = Utc::now();

        store.records.insert(
            id,
            ForecastRecord {
                id,
                query_text: query_text.to_string(),
                intent: parsed.map(|p| p.intent),
                timeframe_months: parsed.map(|p| p.timeframe.months()),
                status: ForecastStatus::Pending,
                error_message: None,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn update_status(
        &self,
        id: i64,
        status: ForecastStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        self.store.write().await.transition(id, status, error_message)
    }

    async fn save_result(&self, stored: &StoredResult) -> Result<()> {
        let mut store = self.store.write().await;
        store.transition(stored.forecast_id, ForecastStatus::Completed, None)?;
        store.results.insert(stored.forecast_id, stored.clone());
        Ok(())
    }

    async fn record_export(&self, forecast_id: i64, path: &str) -> Result<()> {
        let mut store = self.store.write().await;
        if !store.records.contains_key(&forecast_id) {
            return Err(ForecastError::NotFound { id: forecast_id }.into());
        }
        store.exports.insert(forecast_id, path.to_string());
        Ok(())
    }

    async fn find(&self, id: i64) -> Result<Option<ForecastDetails>> {
        let store = self.store.read().await;
        Ok(store.records.get(&id).map(|record| ForecastDetails {
            record: record.clone(),
            result: store.results.get(&id).cloned(),
            export_path: store.exports.get(&id).cloned(),
        }))
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<ForecastRecord>> {
        let store = self.store.read().await;
        // Ids are assigned in creation order
        Ok(store
            .records
            .values()
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}
