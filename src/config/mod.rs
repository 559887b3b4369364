//! Configuration module for Finsynth.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Parser, Forecast, Storage, and Observability.

mod forecast_config;
mod observability_config;
mod parser_config;
mod storage_config;

pub use forecast_config::{ForecastEnvConfig, load_assumptions_file, parse_assumptions_toml};
pub use observability_config::ObservabilityEnvConfig;
pub use parser_config::{ParserEnvConfig, ParserMode};
pub use storage_config::StorageEnvConfig;

use crate::application::forecast::SalesEnrichment;
use anyhow::{Context, Result};

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub parser: ParserEnvConfig,
    pub forecast: ForecastEnvConfig,
    pub storage: StorageEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            parser: ParserEnvConfig::from_env().context("Failed to load parser config")?,
            forecast: ForecastEnvConfig::from_env().context("Failed to load forecast config")?,
            storage: StorageEnvConfig::from_env(),
            observability: ObservabilityEnvConfig::from_env(),
        })
    }

    /// Sales enrichment settings derived from this Config
    pub fn sales_enrichment(&self) -> SalesEnrichment {
        SalesEnrichment {
            enabled: self.forecast.sales_enrichment_enabled,
            ..SalesEnrichment::default()
        }
    }
}
