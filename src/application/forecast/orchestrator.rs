//! Forecast Orchestrator
//!
//! Selects which projectors run for an intent and merges their output into a
//! single [`ForecastResult`]. Synchronous and free of I/O: the same inputs
//! always yield the same result.

use crate::application::forecast::enrichment::SalesEnrichment;
use crate::domain::errors::ForecastError;
use crate::domain::forecast::aggregation::{combine_segments, summarize_segment};
use crate::domain::forecast::projector::{EnterpriseProjector, Projector, SmbProjector};
use crate::domain::forecast::{
    AssumptionOverrides, Assumptions, CombinedMonth, ForecastIntent, ForecastResult,
    ForecastSummary, MonthSnapshot, MonthlyData, RoundingPolicy, Segment, Timeframe,
};
use crate::domain::ports::AssumptionsProvider;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Segment label used for faults in merged totals
const TOTAL_SEGMENT: &str = "total";

pub struct ForecastOrchestrator {
    provider: Arc<dyn AssumptionsProvider>,
    rounding: RoundingPolicy,
    enrichment: SalesEnrichment,
    projector_runs: AtomicUsize,
}

impl ForecastOrchestrator {
    pub fn new(provider: Arc<dyn AssumptionsProvider>, rounding: RoundingPolicy) -> Self {
        Self {
            provider,
            rounding,
            enrichment: SalesEnrichment::disabled(),
            projector_runs: AtomicUsize::new(0),
        }
    }

    pub fn with_enrichment(mut self, enrichment: SalesEnrichment) -> Self {
        self.enrichment = enrichment;
        self
    }

    pub fn rounding(&self) -> RoundingPolicy {
        self.rounding
    }

    /// Number of projector runs since this orchestrator was built
    pub fn projector_runs(&self) -> usize {
        self.projector_runs.load(Ordering::Relaxed)
    }

    /// Defaults with `overrides` applied, as a projection would see them
    pub fn effective_assumptions(&self, overrides: &AssumptionOverrides) -> Assumptions {
        self.provider.merge(overrides)
    }

    /// Like [`compute`](Self::compute), decoding the intent and horizon first.
    pub fn compute_raw(
        &self,
        intent: &str,
        timeframe_months: i64,
        overrides: &AssumptionOverrides,
    ) -> Result<ForecastResult, ForecastError> {
        let intent = ForecastIntent::from_str(intent)?;
        let timeframe = Timeframe::new(timeframe_months)?;
        self.compute(intent, timeframe, overrides)
    }

    pub fn compute(
        &self,
        intent: ForecastIntent,
        timeframe: Timeframe,
        overrides: &AssumptionOverrides,
    ) -> Result<ForecastResult, ForecastError> {
        // Parameters are frozen here for the rest of the run
        let assumptions = self.effective_assumptions(overrides);
        let months = timeframe.months();
        debug!(
            "Computing {} over {} (rounding={}, overrides={})",
            intent,
            timeframe,
            self.rounding,
            !overrides.is_empty()
        );

        match intent {
            ForecastIntent::ExplainAssumptions => Ok(ForecastResult {
                forecast_type: intent.forecast_type(),
                timeframe_months: None,
                monthly_data: None,
                summary: None,
                assumptions,
                message: Some(
                    "Current assumptions for large and SMB customer revenue models".to_string(),
                ),
            }),
            ForecastIntent::ForecastLargeRevenue => {
                let projector = EnterpriseProjector::new(&assumptions.large, self.rounding);
                let snapshots = self.run_checked(&projector, months)?;
                segment_result(intent, projector.segment(), months, snapshots, assumptions)
            }
            ForecastIntent::ForecastSmbRevenue => {
                let projector = SmbProjector::new(&assumptions.smb, self.rounding);
                let snapshots = self.run_checked(&projector, months)?;
                segment_result(intent, projector.segment(), months, snapshots, assumptions)
            }
            ForecastIntent::ForecastTotalRevenue => {
                let large = self.run_checked(
                    &EnterpriseProjector::new(&assumptions.large, self.rounding),
                    months,
                )?;
                let smb =
                    self.run_checked(&SmbProjector::new(&assumptions.smb, self.rounding), months)?;

                let (mut combined, summary) = combine_segments(&large, &smb);
                check_combined(&combined)?;
                check_summary(TOTAL_SEGMENT, months, &summary)?;
                self.enrichment.apply(&mut combined, &assumptions);

                Ok(ForecastResult {
                    forecast_type: intent.forecast_type(),
                    timeframe_months: Some(months),
                    monthly_data: Some(MonthlyData::Combined(combined)),
                    summary: Some(summary),
                    assumptions,
                    message: Some(format!("Total revenue forecast for {} months", months)),
                })
            }
        }
    }

    /// Run a projector and reject output containing NaN or infinity.
    fn run_checked(
        &self,
        projector: &dyn Projector,
        months: u32,
    ) -> Result<Vec<MonthSnapshot>, ForecastError> {
        self.projector_runs.fetch_add(1, Ordering::Relaxed);
        let snapshots = projector.project(months);
        for snapshot in &snapshots {
            if let Some(field) = snapshot.non_finite_field() {
                return Err(ForecastError::ComputationFault {
                    segment: projector.segment().to_string(),
                    month: snapshot.month,
                    reason: format!("non-finite {}", field),
                });
            }
        }
        Ok(snapshots)
    }
}

fn segment_result(
    intent: ForecastIntent,
    segment: Segment,
    months: u32,
    snapshots: Vec<MonthSnapshot>,
    assumptions: Assumptions,
) -> Result<ForecastResult, ForecastError> {
    let summary = summarize_segment(segment, &snapshots);
    check_summary(&segment.to_string(), months, &summary)?;
    Ok(ForecastResult {
        forecast_type: intent.forecast_type(),
        timeframe_months: Some(months),
        monthly_data: Some(MonthlyData::Segment(snapshots)),
        summary: Some(summary),
        assumptions,
        message: Some(format!("{} forecast for {} months", segment, months)),
    })
}

/// Merged months can overflow even when each segment is finite.
fn check_combined(combined: &[CombinedMonth]) -> Result<(), ForecastError> {
    for month in combined {
        if let Some(field) = month.non_finite_field() {
            return Err(ForecastError::ComputationFault {
                segment: TOTAL_SEGMENT.to_string(),
                month: month.month,
                reason: format!("non-finite {}", field),
            });
        }
    }
    Ok(())
}

/// Summary totals are attributed to the last month of the horizon.
fn check_summary(
    segment: &str,
    months: u32,
    summary: &ForecastSummary,
) -> Result<(), ForecastError> {
    match summary.non_finite_field() {
        Some(field) => Err(ForecastError::ComputationFault {
            segment: segment.to_string(),
            month: months,
            reason: format!("non-finite summary {}", field),
        }),
        None => Ok(()),
    }
}
