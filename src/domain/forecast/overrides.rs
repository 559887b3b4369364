use crate::domain::forecast::profile::{Assumptions, EnterpriseProfile, SmbProfile};
use serde::{Deserialize, Serialize};

/// Recognized enterprise overrides. `None` keeps the default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LargeOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arpu: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub churn_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_ramp: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_customers: Option<f64>,
}

/// Recognized SMB overrides. `None` keeps the default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmbOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arpu: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketing_spend: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cac: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub churn_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_customers: Option<f64>,
}

/// Per-segment overrides as emitted by the intent parser
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssumptionOverrides {
    pub large: LargeOverrides,
    pub smb: SmbOverrides,
}

impl AssumptionOverrides {
    pub fn is_empty(&self) -> bool {
        *self == AssumptionOverrides::default()
    }
}

impl LargeOverrides {
    pub fn apply(&self, base: &EnterpriseProfile) -> EnterpriseProfile {
        EnterpriseProfile {
            arpu: self.arpu.unwrap_or(base.arpu),
            growth_rate: self.growth_rate.unwrap_or(base.growth_rate),
            churn_rate: self.churn_rate.unwrap_or(base.churn_rate),
            onboarding_ramp: self
                .onboarding_ramp
                .clone()
                .unwrap_or_else(|| base.onboarding_ramp.clone()),
            initial_customers: self.initial_customers.unwrap_or(base.initial_customers),
        }
    }
}

impl SmbOverrides {
    pub fn apply(&self, base: &SmbProfile) -> SmbProfile {
        SmbProfile {
            arpu: self.arpu.unwrap_or(base.arpu),
            marketing_spend: self.marketing_spend.unwrap_or(base.marketing_spend),
            cac: self.cac.unwrap_or(base.cac),
            conversion_rate: self.conversion_rate.unwrap_or(base.conversion_rate),
            growth_rate: self.growth_rate.unwrap_or(base.growth_rate),
            churn_rate: self.churn_rate.unwrap_or(base.churn_rate),
            initial_customers: self.initial_customers.unwrap_or(base.initial_customers),
        }
    }
}

impl Assumptions {
    /// Build a fresh parameter set; `self` is left untouched.
    pub fn merge(&self, overrides: &AssumptionOverrides) -> Assumptions {
        Assumptions {
            large: overrides.large.apply(&self.large),
            smb: overrides.smb.apply(&self.smb),
        }
    }
}
