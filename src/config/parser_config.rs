//! Intent parser configuration parsing from environment variables.
//!
//! Selects between the OpenAI-backed parser and the offline keyword parser.

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Which intent parser handles incoming queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserMode {
    OpenAi,
    Keyword,
}

impl FromStr for ParserMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ParserMode::OpenAi),
            "keyword" => Ok(ParserMode::Keyword),
            _ => anyhow::bail!("Invalid PARSER_MODE: {}. Must be 'openai' or 'keyword'", s),
        }
    }
}

/// Intent parser environment configuration
#[derive(Debug, Clone)]
pub struct ParserEnvConfig {
    pub mode: ParserMode,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub timeout_secs: u64,
}

impl ParserEnvConfig {
    pub fn from_env() -> Result<Self> {
        let openai_api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let mode = match env::var("PARSER_MODE") {
            Ok(value) => ParserMode::from_str(&value)?,
            Err(_) if openai_api_key.is_some() => ParserMode::OpenAi,
            Err(_) => ParserMode::Keyword,
        };

        if mode == ParserMode::OpenAi && openai_api_key.is_none() {
            anyhow::bail!("PARSER_MODE=openai requires OPENAI_API_KEY to be set");
        }

        Ok(Self {
            mode,
            openai_api_key,
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4-turbo-preview".to_string()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            timeout_secs: env::var("OPENAI_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u64>()
                .context("Failed to parse OPENAI_TIMEOUT_SECS")?,
        })
    }
}
