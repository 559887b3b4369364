//! Forecast Service
//!
//! Drives a query end to end: parse, persist, compute, store, export.
//! A request that gets a record always leaves it `completed` or `failed`.

use crate::application::forecast::orchestrator::ForecastOrchestrator;
use crate::application::knowledge::KnowledgeBase;
use crate::domain::errors::ForecastError;
use crate::domain::forecast::{
    ForecastDetails, ForecastRecord, ForecastResult, ForecastStatus, ParsedIntent, RunMetadata,
    StoredResult,
};
use crate::domain::ports::{IntentParser, ReportArtifact, ReportExporter};
use crate::domain::repositories::ForecastRepository;
use crate::infrastructure::observability::Metrics;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const MAX_QUERY_CHARS: usize = 2000;
const CONTEXT_CHUNKS: usize = 3;
const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn is_client_error(&self) -> bool {
        match self {
            ServiceError::Forecast(e) => e.is_client_error(),
            ServiceError::Storage(_) => false,
        }
    }
}

/// What a successful submission returns
#[derive(Debug, Serialize)]
pub struct ForecastOutcome {
    pub forecast_id: i64,
    pub status: ForecastStatus,
    pub parsed: ParsedIntent,
    pub result: ForecastResult,
    /// Background export, if one was scheduled
    #[serde(skip)]
    pub export_task: Option<JoinHandle<()>>,
}

pub struct ForecastService {
    parser: Arc<dyn IntentParser>,
    repository: Arc<dyn ForecastRepository>,
    orchestrator: Arc<ForecastOrchestrator>,
    knowledge: Arc<KnowledgeBase>,
    exporter: Option<Arc<dyn ReportExporter>>,
    metrics: Option<Metrics>,
}

impl ForecastService {
    pub fn new(
        parser: Arc<dyn IntentParser>,
        repository: Arc<dyn ForecastRepository>,
        orchestrator: Arc<ForecastOrchestrator>,
        knowledge: Arc<KnowledgeBase>,
    ) -> Self {
        Self {
            parser,
            repository,
            orchestrator,
            knowledge,
            exporter: None,
            metrics: None,
        }
    }

    pub fn with_exporter(mut self, exporter: Arc<dyn ReportExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn submit(&self, query: &str) -> Result<ForecastOutcome, ServiceError> {
        self.submit_with_export(query, true).await
    }

    /// Run the full flow; `export` is ignored when no exporter is configured.
    pub async fn submit_with_export(
        &self,
        query: &str,
        export: bool,
    ) -> Result<ForecastOutcome, ServiceError> {
        let query = validate_query(query)?;

        let context = self.knowledge.relevant_context(query, CONTEXT_CHUNKS);
        let parsed = match self.parser.parse(query, &context).await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("{} parser rejected query: {}", self.parser.name(), e);
                let id = self.repository.create(query, None).await?;
                self.repository
                    .update_status(id, ForecastStatus::Failed, Some(&e.to_string()))
                    .await?;
                self.count_forecast("unparsed", ForecastStatus::Failed);
                return Err(e.into());
            }
        };

        let id = self.repository.create(query, Some(&parsed)).await?;
        info!(
            "Forecast {} created: intent={}, timeframe={}",
            id, parsed.intent, parsed.timeframe
        );
        self.repository
            .update_status(id, ForecastStatus::Processing, None)
            .await?;

        let started = Instant::now();
        let computed = self
            .orchestrator
            .compute(parsed.intent, parsed.timeframe, &parsed.overrides);
        let elapsed = started.elapsed();
        if let Some(metrics) = &self.metrics {
            metrics.observe_projection(parsed.intent.as_str(), elapsed.as_secs_f64());
        }

        let result = match computed {
            Ok(result) => result,
            Err(e) => {
                self.mark_failed(id, &parsed, &e.to_string()).await;
                return Err(e.into());
            }
        };

        let stored = StoredResult {
            forecast_id: id,
            result,
            metadata: RunMetadata {
                run_id: Uuid::new_v4().to_string(),
                engine_version: ENGINE_VERSION.to_string(),
                intent: parsed.intent,
                timeframe_months: parsed.timeframe.months(),
                rounding: self.orchestrator.rounding(),
                duration_ms: elapsed.as_millis() as u64,
            },
            created_at: Utc::now(),
        };

        if let Err(e) = self.repository.save_result(&stored).await {
            self.mark_failed(id, &parsed, &format!("{:#}", e)).await;
            return Err(e.into());
        }
        self.count_forecast(parsed.intent.as_str(), ForecastStatus::Completed);
        info!("Forecast {} completed ({} months)", id, stored.result.months());

        let export_task = if export {
            self.spawn_export(id, &stored.result)
        } else {
            None
        };

        Ok(ForecastOutcome {
            forecast_id: id,
            status: ForecastStatus::Completed,
            parsed,
            result: stored.result,
            export_task,
        })
    }

    pub async fn get(&self, id: i64) -> Result<ForecastDetails, ServiceError> {
        self.repository
            .find(id)
            .await?
            .ok_or(ServiceError::Forecast(ForecastError::NotFound { id }))
    }

    /// Most recent first
    pub async fn list(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ForecastRecord>, ServiceError> {
        Ok(self.repository.list(limit, offset).await?)
    }

    /// Render a stored result again, synchronously.
    pub async fn export(&self, id: i64) -> Result<ReportArtifact, ServiceError> {
        let exporter = self
            .exporter
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Report export is disabled"))?;

        let details = self.get(id).await?;
        let stored = details
            .result
            .ok_or(ServiceError::Forecast(ForecastError::NotFound { id }))?;

        let artifact = match exporter.export(id, &stored.result).await {
            Ok(artifact) => artifact,
            Err(e) => {
                self.count_export("failed");
                return Err(e.into());
            }
        };
        self.repository
            .record_export(id, &artifact.directory.to_string_lossy())
            .await?;
        self.count_export("success");
        Ok(artifact)
    }

    fn spawn_export(&self, id: i64, result: &ForecastResult) -> Option<JoinHandle<()>> {
        let exporter = Arc::clone(self.exporter.as_ref()?);
        let repository = Arc::clone(&self.repository);
        let metrics = self.metrics.clone();
        let result = result.clone();

        Some(tokio::spawn(async move {
            let status = match exporter.export(id, &result).await {
                Ok(artifact) => {
                    let path = artifact.directory.to_string_lossy().to_string();
                    match repository.record_export(id, &path).await {
                        Ok(()) => {
                            info!("Forecast {} exported to {}", id, path);
                            "success"
                        }
                        Err(e) => {
                            warn!("Forecast {} exported but not recorded: {:#}", id, e);
                            "failed"
                        }
                    }
                }
                Err(e) => {
                    warn!("Export of forecast {} failed: {:#}", id, e);
                    "failed"
                }
            };
            if let Some(metrics) = metrics {
                metrics.inc_exports(status);
            }
        }))
    }

    async fn mark_failed(&self, id: i64, parsed: &ParsedIntent, reason: &str) {
        error!("Forecast {} failed: {}", id, reason);
        if let Err(e) = self
            .repository
            .update_status(id, ForecastStatus::Failed, Some(reason))
            .await
        {
            error!("Could not mark forecast {} as failed: {:#}", id, e);
        }
        self.count_forecast(parsed.intent.as_str(), ForecastStatus::Failed);
    }

    fn count_forecast(&self, intent: &str, status: ForecastStatus) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_forecasts(intent, status.as_str());
        }
    }

    fn count_export(&self, status: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_exports(status);
        }
    }
}

/// Trim and bound-check a raw query.
pub fn validate_query(query: &str) -> Result<&str, ForecastError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ForecastError::InvalidQuery {
            reason: "query is empty".to_string(),
        });
    }
    let chars = trimmed.chars().count();
    if chars > MAX_QUERY_CHARS {
        return Err(ForecastError::InvalidQuery {
            reason: format!("query is {} characters, limit is {}", chars, MAX_QUERY_CHARS),
        });
    }
    Ok(trimmed)
}
