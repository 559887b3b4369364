use serde::{Deserialize, Serialize};
use std::fmt;

/// Customer segment a snapshot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    #[serde(rename = "large_customer")]
    Enterprise,
    #[serde(rename = "smb_customer")]
    Smb,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Enterprise => write!(f, "large_customer"),
            Segment::Smb => write!(f, "smb_customer"),
        }
    }
}

/// One projected month. Parameters in effect are echoed alongside the figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSnapshot {
    pub month: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketing_spend: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leads: Option<f64>,
    pub new_customers: f64,
    pub churned_customers: f64,
    pub cumulative_customers: f64,
    pub revenue: f64,
    pub arpu: f64,
    pub growth_rate: f64,
    pub churn_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cac: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_rate: Option<f64>,
}

impl MonthSnapshot {
    /// First non-finite figure in this snapshot, if any.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        let fields = [
            ("new_customers", Some(self.new_customers)),
            ("churned_customers", Some(self.churned_customers)),
            ("cumulative_customers", Some(self.cumulative_customers)),
            ("revenue", Some(self.revenue)),
            ("marketing_spend", self.marketing_spend),
            ("leads", self.leads),
        ];
        fields
            .into_iter()
            .find(|(_, value)| value.is_some_and(|v| !v.is_finite()))
            .map(|(name, _)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> MonthSnapshot {
        MonthSnapshot {
            month: 1,
            marketing_spend: None,
            leads: None,
            new_customers: 1.0,
            churned_customers: 0.0,
            cumulative_customers: 1.0,
            revenue: 16667.0,
            arpu: 16667.0,
            growth_rate: 0.05,
            churn_rate: 0.02,
            cac: None,
            conversion_rate: None,
        }
    }

    #[test]
    fn test_enterprise_snapshot_omits_funnel_fields() {
        let json = serde_json::to_value(snapshot()).unwrap();
        assert!(json.get("marketing_spend").is_none());
        assert!(json.get("cac").is_none());
        assert_eq!(json["revenue"], 16667.0);
    }

    #[test]
    fn test_non_finite_detection() {
        let mut s = snapshot();
        assert_eq!(s.non_finite_field(), None);
        s.leads = Some(f64::INFINITY);
        assert_eq!(s.non_finite_field(), Some("leads"));
    }
}
