//! Three-sheet forecast workbook written as CSV files.
//!
//! ```text
//! {reports_dir}/forecast_{id}_{YYYYmmdd_HHMMSS}/
//!     summary.csv       metric,value
//!     monthly.csv       metric,unit,M1..Mn
//!     assumptions.csv   segment,parameter,value
//! ```

use crate::domain::forecast::{
    Assumptions, CombinedMonth, ForecastResult, MonthlyData, PresentationFigures,
};
use crate::domain::ports::{ReportArtifact, ReportExporter};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SUMMARY_SHEET: &str = "summary.csv";
pub const MONTHLY_SHEET: &str = "monthly.csv";
pub const ASSUMPTIONS_SHEET: &str = "assumptions.csv";

const REPORT_PREFIX: &str = "forecast_";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

type Sheet = Vec<Vec<String>>;

#[derive(Debug, Clone)]
pub struct CsvWorkbookExporter {
    reports_dir: PathBuf,
}

impl CsvWorkbookExporter {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    /// Write all three sheets synchronously
    pub fn render(
        &self,
        forecast_id: i64,
        result: &ForecastResult,
        generated_at: DateTime<Utc>,
    ) -> Result<ReportArtifact> {
        let directory = self.reports_dir.join(format!(
            "{}{}_{}",
            REPORT_PREFIX,
            forecast_id,
            generated_at.format(TIMESTAMP_FORMAT)
        ));
        std::fs::create_dir_all(&directory).with_context(|| {
            format!("Failed to create report directory {}", directory.display())
        })?;

        let sheets = vec![
            write_sheet(&directory.join(SUMMARY_SHEET), &summary_sheet(result))?,
            write_sheet(&directory.join(MONTHLY_SHEET), &monthly_sheet(result))?,
            write_sheet(
                &directory.join(ASSUMPTIONS_SHEET),
                &assumptions_sheet(&result.assumptions),
            )?,
        ];

        info!(
            "Report for forecast {} written to {}",
            forecast_id,
            directory.display()
        );
        Ok(ReportArtifact {
            forecast_id,
            directory,
            sheets,
            generated_at,
        })
    }

    /// Delete report directories generated before `cutoff`.
    ///
    /// Age comes from the timestamp in the directory name; entries that do not
    /// look like reports are left alone. Returns how many were removed.
    pub fn cleanup_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        if !self.reports_dir.exists() {
            return Ok(0);
        }

        let entries = std::fs::read_dir(&self.reports_dir).with_context(|| {
            format!("Failed to read reports directory {}", self.reports_dir.display())
        })?;

        let mut removed = 0;
        for entry in entries {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let Some(generated_at) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(report_timestamp)
            else {
                debug!("Skipping {} during cleanup", path.display());
                continue;
            };
            if generated_at < cutoff {
                std::fs::remove_dir_all(&path)
                    .with_context(|| format!("Failed to remove report {}", path.display()))?;
                removed += 1;
            }
        }

        info!("Removed {} report(s) older than {}", removed, cutoff);
        Ok(removed)
    }

    /// Delete reports older than `max_age`, off the async runtime.
    pub async fn cleanup_older_than(&self, max_age: Duration) -> Result<usize> {
        let exporter = self.clone();
        let cutoff = Utc::now() - max_age;
        tokio::task::spawn_blocking(move || exporter.cleanup_before(cutoff))
            .await
            .context("Report cleanup task panicked")?
    }
}

/// Generation time encoded in a `forecast_{id}_{YYYYmmdd_HHMMSS}` name
fn report_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let rest = name.strip_prefix(REPORT_PREFIX)?;
    let (id, stamp) = rest.split_once('_')?;
    id.parse::<i64>().ok()?;
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[async_trait]
impl ReportExporter for CsvWorkbookExporter {
    async fn export(&self, forecast_id: i64, result: &ForecastResult) -> Result<ReportArtifact> {
        let exporter = self.clone();
        let result = result.clone();
        tokio::task::spawn_blocking(move || exporter.render(forecast_id, &result, Utc::now()))
            .await
            .context("Report export task panicked")?
    }
}

fn write_sheet(path: &Path, rows: &Sheet) -> Result<PathBuf> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(false)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    for row in rows {
        wtr.write_record(row)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    wtr.flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(path.to_path_buf())
}

fn pair(metric: &str, value: impl ToString) -> Vec<String> {
    vec![metric.to_string(), value.to_string()]
}

pub fn summary_sheet(result: &ForecastResult) -> Sheet {
    let mut rows = vec![pair("metric", "value")];
    rows.push(pair("forecast_type", result.forecast_type));
    if let Some(months) = result.timeframe_months {
        rows.push(pair("timeframe_months", months));
    }
    if let Some(summary) = &result.summary {
        rows.push(pair("total_revenue", summary.total_revenue));
        if let Some(v) = summary.large_customer_revenue {
            rows.push(pair("large_customer_revenue", v));
        }
        if let Some(v) = summary.smb_customer_revenue {
            rows.push(pair("smb_customer_revenue", v));
        }
        rows.push(pair("total_customers", summary.total_customers));
        if let Some(v) = summary.final_large_customers {
            rows.push(pair("final_large_customers", v));
        }
        if let Some(v) = summary.final_smb_customers {
            rows.push(pair("final_smb_customers", v));
        }
    }
    if let Some(message) = &result.message {
        rows.push(pair("message", message));
    }
    rows
}

fn metric_row(metric: &str, unit: &str, values: impl IntoIterator<Item = f64>) -> Vec<String> {
    let mut row = vec![metric.to_string(), unit.to_string()];
    row.extend(values.into_iter().map(|v| v.to_string()));
    row
}

/// One row per metric, one column per month
pub fn monthly_sheet(result: &ForecastResult) -> Sheet {
    let months = result.months();
    let mut header = vec!["metric".to_string(), "unit".to_string()];
    header.extend((1..=months).map(|m| format!("M{}", m)));
    let mut rows = vec![header];

    match &result.monthly_data {
        Some(MonthlyData::Combined(data)) => {
            let combined_rows: [(&str, &str, fn(&CombinedMonth) -> f64); 11] = [
                ("cumulative_large_customers", "customers", |m| m.cumulative_large_customers),
                ("large_new_customers", "customers", |m| m.large_new_customers),
                ("large_churned_customers", "customers", |m| m.large_churned_customers),
                ("large_customer_revenue", "USD", |m| m.large_customer_revenue),
                ("smb_marketing_spend", "USD", |m| m.smb_marketing_spend),
                ("cumulative_smb_customers", "customers", |m| m.cumulative_smb_customers),
                ("smb_new_customers", "customers", |m| m.smb_new_customers),
                ("smb_churned_customers", "customers", |m| m.smb_churned_customers),
                ("smb_customer_revenue", "USD", |m| m.smb_customer_revenue),
                ("total_revenue", "USD", |m| m.total_revenue),
                ("total_revenue_mn", "USD mn", |m| m.total_revenue_mn),
            ];
            for (metric, unit, value) in combined_rows {
                rows.push(metric_row(metric, unit, data.iter().map(value)));
            }

            let figures: Vec<_> = data.iter().filter_map(|m| m.presentation.as_ref()).collect();
            if !figures.is_empty() && figures.len() == data.len() {
                let fig = |f: fn(&PresentationFigures) -> f64| {
                    figures.iter().map(|p| f(p)).collect::<Vec<_>>()
                };
                rows.push(metric_row("sales_people", "people", fig(|p| p.sales_people)));
                rows.push(metric_row(
                    "large_accounts_per_sales_person",
                    "customers",
                    fig(|p| p.large_accounts_per_sales_person),
                ));
                rows.push(metric_row("sales_enquiries", "leads", fig(|p| p.sales_enquiries)));
                rows.push(metric_row("avg_cac", "USD", fig(|p| p.avg_cac)));
                rows.push(metric_row("conversion_rate", "ratio", fig(|p| p.conversion_rate)));
                rows.push(metric_row(
                    "avg_revenue_per_large_customer",
                    "USD",
                    fig(|p| p.avg_revenue_per_large_customer),
                ));
                rows.push(metric_row(
                    "avg_revenue_per_smb_customer",
                    "USD",
                    fig(|p| p.avg_revenue_per_smb_customer),
                ));
            }
        }
        Some(MonthlyData::Segment(data)) => {
            let is_funnel = data.iter().any(|m| m.marketing_spend.is_some());
            if is_funnel {
                rows.push(metric_row(
                    "marketing_spend",
                    "USD",
                    data.iter().map(|m| m.marketing_spend.unwrap_or_default()),
                ));
                rows.push(metric_row(
                    "leads",
                    "leads",
                    data.iter().map(|m| m.leads.unwrap_or_default()),
                ));
            }
            rows.push(metric_row(
                "new_customers",
                "customers",
                data.iter().map(|m| m.new_customers),
            ));
            rows.push(metric_row(
                "churned_customers",
                "customers",
                data.iter().map(|m| m.churned_customers),
            ));
            rows.push(metric_row(
                "cumulative_customers",
                "customers",
                data.iter().map(|m| m.cumulative_customers),
            ));
            rows.push(metric_row("arpu", "USD", data.iter().map(|m| m.arpu)));
            rows.push(metric_row("revenue", "USD", data.iter().map(|m| m.revenue)));
        }
        None => {}
    }

    rows
}

/// Flattened `segment,parameter,value` listing
pub fn assumptions_sheet(assumptions: &Assumptions) -> Sheet {
    let large = &assumptions.large;
    let smb = &assumptions.smb;
    let row = |segment: &str, parameter: &str, value: String| {
        vec![segment.to_string(), parameter.to_string(), value]
    };
    let ramp = large
        .onboarding_ramp
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(";");

    vec![
        row("segment", "parameter", "value".to_string()),
        row("large_customer", "arpu", large.arpu.to_string()),
        row("large_customer", "growth_rate", large.growth_rate.to_string()),
        row("large_customer", "churn_rate", large.churn_rate.to_string()),
        row("large_customer", "onboarding_ramp", ramp),
        row("large_customer", "initial_customers", large.initial_customers.to_string()),
        row("smb_customer", "arpu", smb.arpu.to_string()),
        row("smb_customer", "marketing_spend", smb.marketing_spend.to_string()),
        row("smb_customer", "cac", smb.cac.to_string()),
        row("smb_customer", "conversion_rate", smb.conversion_rate.to_string()),
        row("smb_customer", "growth_rate", smb.growth_rate.to_string()),
        row("smb_customer", "churn_rate", smb.churn_rate.to_string()),
        row("smb_customer", "initial_customers", smb.initial_customers.to_string()),
    ]
}
