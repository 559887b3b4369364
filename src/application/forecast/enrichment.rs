//! Presentation-only sales figures for total-revenue forecasts.
//!
//! These are display tables and parameter echoes. Nothing here feeds back
//! into the projection.

use crate::domain::forecast::{Assumptions, CombinedMonth, PresentationFigures};

/// Sales headcount per month; the last value holds once the table ends.
pub const DEFAULT_SALES_HEADCOUNT_RAMP: [f64; 11] =
    [1.0, 2.0, 2.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];

#[derive(Debug, Clone, PartialEq)]
pub struct SalesEnrichment {
    pub enabled: bool,
    pub sales_headcount_ramp: Vec<f64>,
    pub large_accounts_per_sales_person: f64,
    pub sales_enquiries: f64,
}

impl Default for SalesEnrichment {
    fn default() -> Self {
        Self {
            enabled: true,
            sales_headcount_ramp: DEFAULT_SALES_HEADCOUNT_RAMP.to_vec(),
            large_accounts_per_sales_person: 1.0,
            sales_enquiries: 160.0,
        }
    }
}

impl SalesEnrichment {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn sales_people(&self, month: u32) -> f64 {
        let idx = (month as usize).saturating_sub(1);
        self.sales_headcount_ramp
            .get(idx)
            .or(self.sales_headcount_ramp.last())
            .copied()
            .unwrap_or(0.0)
    }

    /// Attach figures to every month. No-op when disabled.
    pub fn apply(&self, months: &mut [CombinedMonth], assumptions: &Assumptions) {
        if !self.enabled {
            return;
        }

        for month in months.iter_mut() {
            month.presentation = Some(PresentationFigures {
                sales_people: self.sales_people(month.month),
                large_accounts_per_sales_person: self.large_accounts_per_sales_person,
                sales_enquiries: self.sales_enquiries,
                avg_cac: assumptions.smb.cac,
                conversion_rate: assumptions.smb.conversion_rate,
                avg_revenue_per_large_customer: assumptions.large.arpu,
                avg_revenue_per_smb_customer: assumptions.smb.arpu,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_month(month: u32) -> CombinedMonth {
        CombinedMonth {
            month,
            large_customer_revenue: 0.0,
            smb_customer_revenue: 0.0,
            total_revenue: 0.0,
            total_revenue_mn: 0.0,
            large_new_customers: 0.0,
            large_churned_customers: 0.0,
            cumulative_large_customers: 0.0,
            smb_new_customers: 0.0,
            smb_churned_customers: 0.0,
            cumulative_smb_customers: 0.0,
            smb_marketing_spend: 0.0,
            presentation: None,
        }
    }

    #[test]
    fn test_headcount_holds_last_value() {
        let enrichment = SalesEnrichment::default();
        assert_eq!(enrichment.sales_people(1), 1.0);
        assert_eq!(enrichment.sales_people(2), 2.0);
        assert_eq!(enrichment.sales_people(11), 9.0);
        assert_eq!(enrichment.sales_people(30), 9.0);
    }

    #[test]
    fn test_apply_echoes_assumptions() {
        let mut months: Vec<_> = (1..=3).map(blank_month).collect();
        let assumptions = Assumptions::default();
        SalesEnrichment::default().apply(&mut months, &assumptions);

        let figures = months[2].presentation.as_ref().unwrap();
        assert_eq!(figures.sales_people, 2.0);
        assert_eq!(figures.sales_enquiries, 160.0);
        assert_eq!(figures.avg_cac, 1250.0);
        assert_eq!(figures.avg_revenue_per_large_customer, 16667.0);
    }

    #[test]
    fn test_disabled_leaves_months_untouched() {
        let mut months: Vec<_> = (1..=3).map(blank_month).collect();
        SalesEnrichment::disabled().apply(&mut months, &Assumptions::default());
        assert!(months.iter().all(|m| m.presentation.is_none()));
    }
}
