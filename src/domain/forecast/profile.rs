//! Segment Profiles
//!
//! Economic parameters for each customer segment. A profile is built once per
//! request (defaults merged with overrides) and is never mutated while a
//! projection runs.

use serde::{Deserialize, Serialize};

/// Default enterprise onboarding ramp: new customers for months 1..=11.
pub const DEFAULT_ONBOARDING_RAMP: [f64; 11] =
    [1.0, 1.0, 2.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];

/// Large-customer (enterprise) segment parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnterpriseProfile {
    /// Revenue per customer per month
    pub arpu: f64,
    /// Month-over-month growth of new-customer acquisition once the ramp ends
    pub growth_rate: f64,
    /// Fraction of the existing stock lost each month
    pub churn_rate: f64,
    /// Fixed new-customer counts for the first months
    pub onboarding_ramp: Vec<f64>,
    /// Customer stock before month 1
    #[serde(default)]
    pub initial_customers: f64,
}

impl Default for EnterpriseProfile {
    fn default() -> Self {
        Self {
            arpu: 16667.0,
            growth_rate: 0.05,
            churn_rate: 0.02,
            onboarding_ramp: DEFAULT_ONBOARDING_RAMP.to_vec(),
            initial_customers: 0.0,
        }
    }
}

/// Small/medium business segment parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmbProfile {
    pub arpu: f64,
    /// Monthly marketing budget in month 1
    pub marketing_spend: f64,
    /// Spend required to generate one lead
    pub cac: f64,
    /// Fraction of leads that become paying customers
    pub conversion_rate: f64,
    /// Month-over-month growth of marketing spend
    pub growth_rate: f64,
    pub churn_rate: f64,
    #[serde(default)]
    pub initial_customers: f64,
}

impl Default for SmbProfile {
    fn default() -> Self {
        Self {
            arpu: 5000.0,
            marketing_spend: 200000.0,
            cac: 1250.0,
            conversion_rate: 0.45,
            growth_rate: 0.03,
            churn_rate: 0.05,
            initial_customers: 0.0,
        }
    }
}

/// Effective parameter set for both segments
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Assumptions {
    #[serde(rename = "large_customer")]
    pub large: EnterpriseProfile,
    #[serde(rename = "smb_customer")]
    pub smb: SmbProfile,
}
