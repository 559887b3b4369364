use thiserror::Error;

/// Errors raised while turning a query into a forecast
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Unknown intent: {intent}")]
    UnknownIntent { intent: String },

    #[error("Invalid timeframe: {months} months. Must be between {min} and {max}")]
    InvalidTimeframe { months: i64, min: u32, max: u32 },

    #[error("Intent parser returned an unusable response: {reason}")]
    UpstreamParseFailure { reason: String },

    #[error("Projection fault in {segment} at month {month}: {reason}")]
    ComputationFault {
        segment: String,
        month: u32,
        reason: String,
    },

    #[error("Invalid query: {reason}")]
    InvalidQuery { reason: String },

    #[error("Invalid status transition for forecast {id}: {from} -> {to}")]
    InvalidTransition { id: i64, from: String, to: String },

    #[error("Forecast not found: {id}")]
    NotFound { id: i64 },
}

impl ForecastError {
    /// Client errors are caused by the request itself and are not worth retrying.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ForecastError::UnknownIntent { .. }
                | ForecastError::InvalidTimeframe { .. }
                | ForecastError::UpstreamParseFailure { .. }
                | ForecastError::InvalidQuery { .. }
                | ForecastError::NotFound { .. }
        )
    }

    pub fn upstream(reason: impl Into<String>) -> Self {
        ForecastError::UpstreamParseFailure {
            reason: reason.into(),
        }
    }
}
