use crate::domain::forecast::intent::ForecastType;
use crate::domain::forecast::profile::Assumptions;
use crate::domain::forecast::snapshot::MonthSnapshot;
use serde::{Deserialize, Serialize};

/// Display-only sales figures attached to combined months.
///
/// None of these feed the projection; they are fixed tables and echoes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationFigures {
    pub sales_people: f64,
    pub large_accounts_per_sales_person: f64,
    pub sales_enquiries: f64,
    pub avg_cac: f64,
    pub conversion_rate: f64,
    pub avg_revenue_per_large_customer: f64,
    pub avg_revenue_per_smb_customer: f64,
}

/// One month of a total-revenue forecast, both segments side by side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedMonth {
    pub month: u32,
    pub large_customer_revenue: f64,
    pub smb_customer_revenue: f64,
    pub total_revenue: f64,
    /// Total revenue in millions, 2 decimal places
    pub total_revenue_mn: f64,
    pub large_new_customers: f64,
    pub large_churned_customers: f64,
    pub cumulative_large_customers: f64,
    pub smb_new_customers: f64,
    pub smb_churned_customers: f64,
    pub cumulative_smb_customers: f64,
    pub smb_marketing_spend: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation: Option<PresentationFigures>,
}

impl CombinedMonth {
    /// First non-finite figure in this month, if any.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        let fields = [
            ("large_customer_revenue", self.large_customer_revenue),
            ("smb_customer_revenue", self.smb_customer_revenue),
            ("total_revenue", self.total_revenue),
            ("total_revenue_mn", self.total_revenue_mn),
            ("large_new_customers", self.large_new_customers),
            ("large_churned_customers", self.large_churned_customers),
            ("cumulative_large_customers", self.cumulative_large_customers),
            ("smb_new_customers", self.smb_new_customers),
            ("smb_churned_customers", self.smb_churned_customers),
            ("cumulative_smb_customers", self.cumulative_smb_customers),
            ("smb_marketing_spend", self.smb_marketing_spend),
        ];
        fields
            .into_iter()
            .find(|(_, value)| !value.is_finite())
            .map(|(name, _)| name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MonthlyData {
    Combined(Vec<CombinedMonth>),
    Segment(Vec<MonthSnapshot>),
}

impl MonthlyData {
    pub fn len(&self) -> usize {
        match self {
            MonthlyData::Combined(months) => months.len(),
            MonthlyData::Segment(months) => months.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Aggregate totals over the horizon
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub total_revenue: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_customer_revenue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smb_customer_revenue: Option<f64>,
    /// Customer stock at the end of the horizon, all segments
    pub total_customers: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_large_customers: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_smb_customers: Option<f64>,
}

impl ForecastSummary {
    /// First non-finite total, if any. Sums can overflow even when every month is finite.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        let fields = [
            ("total_revenue", Some(self.total_revenue)),
            ("large_customer_revenue", self.large_customer_revenue),
            ("smb_customer_revenue", self.smb_customer_revenue),
            ("total_customers", Some(self.total_customers)),
            ("final_large_customers", self.final_large_customers),
            ("final_smb_customers", self.final_smb_customers),
        ];
        fields
            .into_iter()
            .find(|(_, value)| value.is_some_and(|v| !v.is_finite()))
            .map(|(name, _)| name)
    }
}

/// The artifact returned to callers and handed to persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub forecast_type: ForecastType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe_months: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_data: Option<MonthlyData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<ForecastSummary>,
    /// Effective parameters (defaults merged with overrides)
    pub assumptions: Assumptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ForecastResult {
    pub fn months(&self) -> usize {
        self.monthly_data.as_ref().map_or(0, MonthlyData::len)
    }
}
