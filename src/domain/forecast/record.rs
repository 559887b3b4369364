use crate::domain::errors::ForecastError;
use crate::domain::forecast::intent::ForecastIntent;
use crate::domain::forecast::result::ForecastResult;
use crate::domain::forecast::rounding::RoundingPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a stored forecast request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ForecastStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastStatus::Pending => "pending",
            ForecastStatus::Processing => "processing",
            ForecastStatus::Completed => "completed",
            ForecastStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ForecastStatus::Completed | ForecastStatus::Failed)
    }

    pub fn can_transition_to(&self, next: ForecastStatus) -> bool {
        use ForecastStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Failed)
                | (Processing, Completed)
                | (Processing, Failed)
        )
    }

    /// Validate `self -> next` for record `id`
    pub fn transition(
        &self,
        id: i64,
        next: ForecastStatus,
    ) -> Result<ForecastStatus, ForecastError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ForecastError::InvalidTransition {
                id,
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for ForecastStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForecastStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ForecastStatus::Pending),
            "processing" => Ok(ForecastStatus::Processing),
            "completed" => Ok(ForecastStatus::Completed),
            "failed" => Ok(ForecastStatus::Failed),
            other => anyhow::bail!("Unknown forecast status: {}", other),
        }
    }
}

/// Stored request: the raw query plus whatever was extracted from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub id: i64,
    pub query_text: String,
    pub intent: Option<ForecastIntent>,
    pub timeframe_months: Option<u32>,
    pub status: ForecastStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What gets written next to a finished projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: String,
    pub engine_version: String,
    pub intent: ForecastIntent,
    pub timeframe_months: u32,
    pub rounding: RoundingPolicy,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    pub forecast_id: i64,
    pub result: ForecastResult,
    pub metadata: RunMetadata,
    pub created_at: DateTime<Utc>,
}

/// Record with its result and the latest export, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDetails {
    pub record: ForecastRecord,
    pub result: Option<StoredResult>,
    pub export_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ForecastStatus::*;

    #[test]
    fn test_allowed_transitions() {
        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Failed));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Processing.can_transition_to(Pending));

        let err = Completed.transition(7, Failed).unwrap_err();
        assert_eq!(
            err,
            ForecastError::InvalidTransition {
                id: 7,
                from: "completed".to_string(),
                to: "failed".to_string()
            }
        );
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [Pending, Processing, Completed, Failed] {
            assert_eq!(ForecastStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(ForecastStatus::from_str("done").is_err());
    }
}
