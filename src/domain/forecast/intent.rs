use crate::domain::errors::ForecastError;
use crate::domain::forecast::overrides::AssumptionOverrides;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// What the user asked for, decoded from the intent parser's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastIntent {
    ForecastTotalRevenue,
    ForecastLargeRevenue,
    ForecastSmbRevenue,
    ExplainAssumptions,
}

impl ForecastIntent {
    pub const ALL: [ForecastIntent; 4] = [
        ForecastIntent::ForecastTotalRevenue,
        ForecastIntent::ForecastLargeRevenue,
        ForecastIntent::ForecastSmbRevenue,
        ForecastIntent::ExplainAssumptions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastIntent::ForecastTotalRevenue => "forecast_total_revenue",
            ForecastIntent::ForecastLargeRevenue => "forecast_large_revenue",
            ForecastIntent::ForecastSmbRevenue => "forecast_smb_revenue",
            ForecastIntent::ExplainAssumptions => "explain_assumptions",
        }
    }

    pub fn forecast_type(&self) -> ForecastType {
        match self {
            ForecastIntent::ForecastTotalRevenue => ForecastType::TotalRevenue,
            ForecastIntent::ForecastLargeRevenue => ForecastType::LargeCustomerRevenue,
            ForecastIntent::ForecastSmbRevenue => ForecastType::SmbCustomerRevenue,
            ForecastIntent::ExplainAssumptions => ForecastType::AssumptionsExplanation,
        }
    }
}

impl FromStr for ForecastIntent {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ForecastIntent::ALL
            .into_iter()
            .find(|intent| intent.as_str() == normalized)
            .ok_or_else(|| ForecastError::UnknownIntent {
                intent: s.to_string(),
            })
    }
}

impl fmt::Display for ForecastIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shape of the produced result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastType {
    TotalRevenue,
    LargeCustomerRevenue,
    SmbCustomerRevenue,
    AssumptionsExplanation,
}

impl fmt::Display for ForecastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ForecastType::TotalRevenue => "total_revenue",
            ForecastType::LargeCustomerRevenue => "large_customer_revenue",
            ForecastType::SmbCustomerRevenue => "smb_customer_revenue",
            ForecastType::AssumptionsExplanation => "assumptions_explanation",
        };
        write!(f, "{}", s)
    }
}

/// Forecast horizon in months, always within `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Timeframe(u32);

impl Timeframe {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 36;
    pub const DEFAULT: u32 = 12;

    pub fn new(months: i64) -> Result<Self, ForecastError> {
        if months < Self::MIN as i64 || months > Self::MAX as i64 {
            return Err(ForecastError::InvalidTimeframe {
                months,
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(Self(months as u32))
    }

    pub fn months(&self) -> u32 {
        self.0
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<i64> for Timeframe {
    type Error = ForecastError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Timeframe::new(value)
    }
}

impl From<Timeframe> for u32 {
    fn from(value: Timeframe) -> Self {
        value.0
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} months", self.0)
    }
}

/// Structured intent as returned by an intent parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedIntent {
    pub intent: ForecastIntent,
    #[serde(rename = "timeframe_months")]
    pub timeframe: Timeframe,
    #[serde(rename = "assumption_overrides", default)]
    pub overrides: AssumptionOverrides,
}

impl ParsedIntent {
    pub fn new(intent: ForecastIntent, timeframe: Timeframe) -> Self {
        Self {
            intent,
            timeframe,
            overrides: AssumptionOverrides::default(),
        }
    }

    /// Decode a parser response, reporting which part of the contract was violated.
    ///
    /// Markdown code fences around the payload are tolerated.
    pub fn from_json(raw: &str) -> Result<Self, ForecastError> {
        let payload = strip_code_fence(raw);
        if payload.is_empty() {
            return Err(ForecastError::upstream("empty response"));
        }

        let value: Value = serde_json::from_str(payload)
            .map_err(|e| ForecastError::upstream(format!("invalid JSON: {}", e)))?;
        let object = value
            .as_object()
            .ok_or_else(|| ForecastError::upstream("response is not a JSON object"))?;

        let intent = match object.get("intent") {
            Some(Value::String(s)) => ForecastIntent::from_str(s)?,
            Some(other) => {
                return Err(ForecastError::UnknownIntent {
                    intent: other.to_string(),
                });
            }
            None => return Err(ForecastError::upstream("missing required field: intent")),
        };

        let timeframe = match object.get("timeframe_months") {
            Some(v) => match v.as_i64() {
                Some(months) => Timeframe::new(months)?,
                None => {
                    return Err(ForecastError::upstream(format!(
                        "timeframe_months must be an integer, got {}",
                        v
                    )));
                }
            },
            None => {
                return Err(ForecastError::upstream(
                    "missing required field: timeframe_months",
                ));
            }
        };

        let overrides = match object.get("assumption_overrides") {
            Some(Value::Null) => AssumptionOverrides::default(),
            Some(v) => serde_json::from_value(v.clone()).map_err(|e| {
                ForecastError::upstream(format!("invalid assumption_overrides: {}", e))
            })?,
            None => {
                return Err(ForecastError::upstream(
                    "missing required field: assumption_overrides",
                ));
            }
        };

        Ok(Self {
            intent,
            timeframe,
            overrides,
        })
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}
