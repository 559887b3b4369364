//! Revenue Projectors
//!
//! Both segments share one recurrence over the customer stock:
//!
//! ```text
//! churned(m)    = cumulative(m-1) * churn_rate
//! cumulative(m) = max(0, cumulative(m-1) + new(m) - churned(m))
//! revenue(m)    = cumulative(m) * arpu
//! ```
//!
//! Churn is taken from the opening stock, before the month's acquisitions
//! land. Segments differ only in how `new(m)` is produced.

use crate::domain::forecast::profile::{EnterpriseProfile, SmbProfile};
use crate::domain::forecast::rounding::RoundingPolicy;
use crate::domain::forecast::snapshot::{MonthSnapshot, Segment};

/// A segment projector. Pure: identical inputs give identical output.
pub trait Projector {
    fn segment(&self) -> Segment;

    /// Produce exactly `months` snapshots, month 1 first.
    fn project(&self, months: u32) -> Vec<MonthSnapshot>;
}

/// Result of advancing the stock by one month
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StockMovement {
    pub churned: f64,
    pub cumulative: f64,
}

/// Running customer stock, never negative
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CustomerStock {
    cumulative: f64,
}

impl CustomerStock {
    pub fn new(initial: f64) -> Self {
        Self {
            cumulative: initial.max(0.0),
        }
    }

    pub fn cumulative(&self) -> f64 {
        self.cumulative
    }

    pub fn advance(&mut self, new_customers: f64, churn_rate: f64) -> StockMovement {
        let churned = self.cumulative * churn_rate;
        self.cumulative = (self.cumulative + new_customers - churned).max(0.0);
        StockMovement {
            churned,
            cumulative: self.cumulative,
        }
    }
}

/// Large-customer projector: fixed onboarding ramp, then compounding acquisition.
pub struct EnterpriseProjector<'a> {
    profile: &'a EnterpriseProfile,
    rounding: RoundingPolicy,
}

impl<'a> EnterpriseProjector<'a> {
    pub fn new(profile: &'a EnterpriseProfile, rounding: RoundingPolicy) -> Self {
        Self { profile, rounding }
    }

    /// Unrounded acquisition driver for `month`, given the previous month's driver.
    fn acquisition_driver(&self, month: u32, previous: f64) -> f64 {
        match self.profile.onboarding_ramp.get(month as usize - 1) {
            Some(&ramp_value) => ramp_value,
            None => previous * (1.0 + self.profile.growth_rate),
        }
    }
}

impl Projector for EnterpriseProjector<'_> {
    fn segment(&self) -> Segment {
        Segment::Enterprise
    }

    fn project(&self, months: u32) -> Vec<MonthSnapshot> {
        let p = self.profile;
        let mut stock = CustomerStock::new(p.initial_customers);
        let mut driver = 0.0;
        let mut snapshots = Vec::with_capacity(months as usize);

        for month in 1..=months {
            driver = self.acquisition_driver(month, driver);
            let new_customers = self.rounding.apply(driver);
            let movement = stock.advance(new_customers, p.churn_rate);

            snapshots.push(MonthSnapshot {
                month,
                marketing_spend: None,
                leads: None,
                new_customers,
                churned_customers: movement.churned,
                cumulative_customers: movement.cumulative,
                revenue: movement.cumulative * p.arpu,
                arpu: p.arpu,
                growth_rate: p.growth_rate,
                churn_rate: p.churn_rate,
                cac: None,
                conversion_rate: None,
            });
        }

        snapshots
    }
}

/// SMB projector: marketing spend -> leads -> conversions, spend compounding monthly.
pub struct SmbProjector<'a> {
    profile: &'a SmbProfile,
    rounding: RoundingPolicy,
}

impl<'a> SmbProjector<'a> {
    pub fn new(profile: &'a SmbProfile, rounding: RoundingPolicy) -> Self {
        Self { profile, rounding }
    }
}

impl Projector for SmbProjector<'_> {
    fn segment(&self) -> Segment {
        Segment::Smb
    }

    fn project(&self, months: u32) -> Vec<MonthSnapshot> {
        let p = self.profile;
        let mut stock = CustomerStock::new(p.initial_customers);
        let mut spend = p.marketing_spend;
        let mut snapshots = Vec::with_capacity(months as usize);

        for month in 1..=months {
            // Spend grows first; this month's funnel runs on the grown budget
            if month > 1 && p.growth_rate > 0.0 {
                spend *= 1.0 + p.growth_rate;
            }
            let leads = spend / p.cac;
            let new_customers = self.rounding.apply(leads * p.conversion_rate);
            let movement = stock.advance(new_customers, p.churn_rate);

            snapshots.push(MonthSnapshot {
                month,
                marketing_spend: Some(spend),
                leads: Some(leads),
                new_customers,
                churned_customers: movement.churned,
                cumulative_customers: movement.cumulative,
                revenue: movement.cumulative * p.arpu,
                arpu: p.arpu,
                growth_rate: p.growth_rate,
                churn_rate: p.churn_rate,
                cac: Some(p.cac),
                conversion_rate: Some(p.conversion_rate),
            });
        }

        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPS * expected.abs().max(1.0),
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_stock_churns_before_acquisition() {
        let mut stock = CustomerStock::new(100.0);
        let movement = stock.advance(10.0, 0.1);
        // Churn is 10% of the opening 100, not of 110
        assert_close(movement.churned, 10.0);
        assert_close(movement.cumulative, 100.0);
    }

    #[test]
    fn test_stock_never_negative() {
        let mut stock = CustomerStock::new(10.0);
        let movement = stock.advance(0.0, 1.5);
        assert_eq!(movement.cumulative, 0.0);
        assert_eq!(CustomerStock::new(-4.0).cumulative(), 0.0);
    }

    #[test]
    fn test_enterprise_month_one() {
        let profile = EnterpriseProfile::default();
        let months = EnterpriseProjector::new(&profile, RoundingPolicy::Unrounded).project(12);

        assert_eq!(months.len(), 12);
        assert_eq!(months[0].new_customers, 1.0);
        assert_eq!(months[0].churned_customers, 0.0);
        assert_eq!(months[0].cumulative_customers, 1.0);
        assert_eq!(months[0].revenue, 16667.0);
    }

    #[test]
    fn test_enterprise_ramp_ignores_growth_rate() {
        let profile = EnterpriseProfile {
            growth_rate: 0.9,
            ..EnterpriseProfile::default()
        };
        let months = EnterpriseProjector::new(&profile, RoundingPolicy::Unrounded).project(11);

        for (snapshot, ramp) in months.iter().zip(profile.onboarding_ramp.iter()) {
            assert_eq!(snapshot.new_customers, *ramp);
        }
    }

    #[test]
    fn test_enterprise_growth_after_ramp() {
        let profile = EnterpriseProfile::default();
        let months = EnterpriseProjector::new(&profile, RoundingPolicy::Unrounded).project(14);

        assert_close(months[11].new_customers, 9.0 * 1.05);
        assert_close(months[12].new_customers, months[11].new_customers * 1.05);
        assert_close(months[13].new_customers, months[12].new_customers * 1.05);
    }

    #[test]
    fn test_enterprise_floor_does_not_stall_growth() {
        let profile = EnterpriseProfile::default();
        let months = EnterpriseProjector::new(&profile, RoundingPolicy::Floor).project(16);

        // Driver is 9 * 1.05^k; floor(9.45)=9 but compounding continues underneath
        assert_eq!(months[11].new_customers, 9.0);
        assert_eq!(months[13].new_customers, 10.0);
        assert!(months.iter().all(|m| m.new_customers.fract() == 0.0));
    }

    #[test]
    fn test_enterprise_initial_stock_churns_in_month_one() {
        let profile = EnterpriseProfile {
            initial_customers: 50.0,
            ..EnterpriseProfile::default()
        };
        let months = EnterpriseProjector::new(&profile, RoundingPolicy::Unrounded).project(1);

        assert_close(months[0].churned_customers, 1.0);
        assert_close(months[0].cumulative_customers, 50.0);
    }

    #[test]
    fn test_smb_month_one_and_two() {
        let profile = SmbProfile::default();
        let months = SmbProjector::new(&profile, RoundingPolicy::Unrounded).project(6);

        assert_eq!(months.len(), 6);
        assert_close(months[0].leads.unwrap(), 160.0);
        assert_close(months[0].new_customers, 72.0);
        assert_close(months[0].cumulative_customers, 72.0);
        assert_close(months[0].revenue, 360000.0);

        assert_close(months[1].marketing_spend.unwrap(), 206000.0);
        assert_close(months[1].new_customers, 206000.0 / 1250.0 * 0.45);
        assert_close(months[1].churned_customers, 72.0 * 0.05);
    }

    #[test]
    fn test_smb_no_growth_keeps_spend_flat() {
        let profile = SmbProfile {
            growth_rate: 0.0,
            ..SmbProfile::default()
        };
        let months = SmbProjector::new(&profile, RoundingPolicy::Unrounded).project(4);

        assert!(months.iter().all(|m| m.marketing_spend == Some(200000.0)));
        assert!(months.iter().all(|m| (m.new_customers - 72.0).abs() < EPS));
    }

    #[test]
    fn test_projection_is_deterministic() {
        let large = EnterpriseProfile::default();
        let smb = SmbProfile::default();

        let a = EnterpriseProjector::new(&large, RoundingPolicy::Cents).project(36);
        let b = EnterpriseProjector::new(&large, RoundingPolicy::Cents).project(36);
        assert_eq!(a, b);

        let c = SmbProjector::new(&smb, RoundingPolicy::Unrounded).project(36);
        let d = SmbProjector::new(&smb, RoundingPolicy::Unrounded).project(36);
        assert_eq!(c, d);
    }

    #[test]
    fn test_revenue_is_stock_times_arpu_under_every_policy() {
        let large = EnterpriseProfile::default();
        let smb = SmbProfile::default();
        for policy in [
            RoundingPolicy::Unrounded,
            RoundingPolicy::Cents,
            RoundingPolicy::Floor,
            RoundingPolicy::Ceil,
        ] {
            let all = EnterpriseProjector::new(&large, policy)
                .project(36)
                .into_iter()
                .chain(SmbProjector::new(&smb, policy).project(36));
            for m in all {
                assert_close(m.revenue, m.cumulative_customers * m.arpu);
            }
        }
    }

    #[test]
    fn test_heavy_churn_clamps_at_zero() {
        let profile = SmbProfile {
            churn_rate: 3.0,
            ..SmbProfile::default()
        };
        let months = SmbProjector::new(&profile, RoundingPolicy::Unrounded).project(12);
        assert!(months.iter().all(|m| m.cumulative_customers >= 0.0));
    }
}
