//! Forecast configuration parsing from environment variables.
//!
//! Default assumptions are layered: built-in profiles, then the optional
//! `ASSUMPTIONS_FILE` (TOML), then individual environment variables.

use crate::domain::forecast::{
    Assumptions, AssumptionOverrides, LargeOverrides, RoundingPolicy, SmbOverrides, Timeframe,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::str::FromStr;

/// Partial assumption set as written in an assumptions file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct AssumptionsFile {
    large_customer: LargeOverrides,
    smb_customer: SmbOverrides,
}

/// Forecast environment configuration
#[derive(Debug, Clone)]
pub struct ForecastEnvConfig {
    pub default_timeframe: Timeframe,
    pub rounding: RoundingPolicy,
    pub sales_enrichment_enabled: bool,
    pub assumptions: Assumptions,
}

impl ForecastEnvConfig {
    pub fn from_env() -> Result<Self> {
        let months = Self::parse_i64("DEFAULT_TIMEFRAME_MONTHS", Timeframe::DEFAULT as i64)?;
        let default_timeframe =
            Timeframe::new(months).context("DEFAULT_TIMEFRAME_MONTHS out of range")?;

        let rounding = match env::var("ROUNDING_POLICY") {
            Ok(value) => RoundingPolicy::from_str(&value)?,
            Err(_) => RoundingPolicy::default(),
        };

        let mut assumptions = Assumptions::default();
        if let Ok(path) = env::var("ASSUMPTIONS_FILE") {
            assumptions = assumptions.merge(&load_assumptions_file(Path::new(&path))?);
        }
        assumptions = assumptions.merge(&Self::env_overrides()?);

        Ok(Self {
            default_timeframe,
            rounding,
            sales_enrichment_enabled: env::var("SALES_ENRICHMENT_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse::<bool>()
                .unwrap_or(true),
            assumptions,
        })
    }

    fn env_overrides() -> Result<AssumptionOverrides> {
        Ok(AssumptionOverrides {
            large: LargeOverrides {
                arpu: Self::parse_optional_f64("LARGE_CUSTOMER_ARPU")?,
                ..LargeOverrides::default()
            },
            smb: SmbOverrides {
                arpu: Self::parse_optional_f64("SMB_CUSTOMER_ARPU")?,
                marketing_spend: Self::parse_optional_f64("SMB_MARKETING_SPEND")?,
                cac: Self::parse_optional_f64("SMB_CAC")?,
                conversion_rate: Self::parse_optional_f64("SMB_CONVERSION_RATE")?,
                ..SmbOverrides::default()
            },
        })
    }

    fn parse_optional_f64(key: &str) -> Result<Option<f64>> {
        match env::var(key) {
            Ok(value) => value
                .parse::<f64>()
                .map(Some)
                .context(format!("Failed to parse {}", key)),
            Err(_) => Ok(None),
        }
    }

    fn parse_i64(key: &str, default: i64) -> Result<i64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<i64>()
            .context(format!("Failed to parse {}", key))
    }
}

/// Read a TOML assumptions file into overrides.
pub fn load_assumptions_file(path: &Path) -> Result<AssumptionOverrides> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read assumptions file {}", path.display()))?;
    parse_assumptions_toml(&content)
        .with_context(|| format!("Invalid assumptions file {}", path.display()))
}

pub fn parse_assumptions_toml(content: &str) -> Result<AssumptionOverrides> {
    let file: AssumptionsFile = toml::from_str(content)?;
    Ok(AssumptionOverrides {
        large: file.large_customer,
        smb: file.smb_customer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_assumptions_file() {
        let overrides = parse_assumptions_toml(
            r#"
            [large_customer]
            arpu = 20000.0
            onboarding_ramp = [2.0, 2.0, 4.0]

            [smb_customer]
            cac = 1000.0
            "#,
        )
        .unwrap();

        let merged = Assumptions::default().merge(&overrides);
        assert_eq!(merged.large.arpu, 20000.0);
        assert_eq!(merged.large.onboarding_ramp, vec![2.0, 2.0, 4.0]);
        assert_eq!(merged.large.churn_rate, 0.02);
        assert_eq!(merged.smb.cac, 1000.0);
        assert_eq!(merged.smb.marketing_spend, 200000.0);
    }

    #[test]
    fn test_assumptions_file_rejects_unknown_keys() {
        assert!(parse_assumptions_toml("[smb_customer]\nbudget = 5.0\n").is_err());
        assert!(parse_assumptions_toml("[medium_customer]\narpu = 5.0\n").is_err());
    }

    #[test]
    fn test_empty_assumptions_file_keeps_defaults() {
        let overrides = parse_assumptions_toml("").unwrap();
        assert!(overrides.is_empty());
    }
}
