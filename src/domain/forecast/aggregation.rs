//! Merging segment projections and computing summary totals.

use crate::domain::forecast::result::{CombinedMonth, ForecastSummary};
use crate::domain::forecast::rounding::round_cents;
use crate::domain::forecast::snapshot::{MonthSnapshot, Segment};

/// Totals for a single-segment forecast
pub fn summarize_segment(segment: Segment, months: &[MonthSnapshot]) -> ForecastSummary {
    let total_revenue: f64 = months.iter().map(|m| m.revenue).sum();
    let final_customers = months.last().map_or(0.0, |m| m.cumulative_customers);

    let (final_large_customers, final_smb_customers) = match segment {
        Segment::Enterprise => (Some(final_customers), None),
        Segment::Smb => (None, Some(final_customers)),
    };

    ForecastSummary {
        total_revenue,
        large_customer_revenue: None,
        smb_customer_revenue: None,
        total_customers: final_customers,
        final_large_customers,
        final_smb_customers,
    }
}

/// Zip both segments month by month.
///
/// Both slices come from projections over the same horizon; if they ever
/// differ, the shorter one bounds the output.
pub fn combine_segments(
    large: &[MonthSnapshot],
    smb: &[MonthSnapshot],
) -> (Vec<CombinedMonth>, ForecastSummary) {
    let mut summary = ForecastSummary {
        large_customer_revenue: Some(0.0),
        smb_customer_revenue: Some(0.0),
        ..ForecastSummary::default()
    };
    let mut combined = Vec::with_capacity(large.len().min(smb.len()));
    let mut large_total = 0.0;
    let mut smb_total = 0.0;

    for (l, s) in large.iter().zip(smb.iter()) {
        let total = l.revenue + s.revenue;
        large_total += l.revenue;
        smb_total += s.revenue;

        combined.push(CombinedMonth {
            month: l.month,
            large_customer_revenue: l.revenue,
            smb_customer_revenue: s.revenue,
            total_revenue: total,
            total_revenue_mn: round_cents(total / 1_000_000.0),
            large_new_customers: l.new_customers,
            large_churned_customers: l.churned_customers,
            cumulative_large_customers: l.cumulative_customers,
            smb_new_customers: s.new_customers,
            smb_churned_customers: s.churned_customers,
            cumulative_smb_customers: s.cumulative_customers,
            smb_marketing_spend: s.marketing_spend.unwrap_or_default(),
            presentation: None,
        });
    }

    if let Some(last) = combined.last() {
        summary.total_customers = last.cumulative_large_customers + last.cumulative_smb_customers;
        summary.final_large_customers = Some(last.cumulative_large_customers);
        summary.final_smb_customers = Some(last.cumulative_smb_customers);
    }
    summary.total_revenue = large_total + smb_total;
    summary.large_customer_revenue = Some(large_total);
    summary.smb_customer_revenue = Some(smb_total);

    (combined, summary)
}
