//! Offline keyword intent parser
//!
//! Deterministic stand-in for the LLM parser. It recognizes:
//! - segment words (`large`/`enterprise`, `smb`/`small business`)
//! - `assumption` / `explain`
//! - horizons such as `6 months`, `2 years`, `3 quarters`
//! - marketing spend changes, either relative (`increase marketing spend by 20%`)
//!   or absolute (`marketing spend of $250k`)
//!
//! Timeframes outside the supported range are rejected, not clamped.

use crate::domain::errors::ForecastError;
use crate::domain::forecast::{
    AssumptionOverrides, Assumptions, ForecastIntent, ParsedIntent, SmbOverrides, Timeframe,
};
use crate::domain::ports::IntentParser;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

static HORIZON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+)\s*-?\s*(months?|mos?|years?|yrs?|quarters?)\b").expect("valid regex")
});

static RELATIVE_SPEND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(increase|raise|boost|grow|decrease|cut|reduce|lower)\w*\s+(?:the\s+)?(?:smb\s+)?marketing\s+spend\w*\s+by\s+(\d+(?:\.\d+)?)\s*%",
    )
    .expect("valid regex")
});

static ABSOLUTE_SPEND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)marketing\s+spend\w*\s+(?:of|to|at|=)\s*\$?\s*(\d[\d,]*(?:\.\d+)?)\s*([km])?\b",
    )
    .expect("valid regex")
});

static LARGE_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(large|enterprise)\b").expect("valid regex")
});

static SMB_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(smb|small)\b").expect("valid regex")
});

static EXPLAIN_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(assumptions?|explain)\b").expect("valid regex")
});

pub struct KeywordIntentParser {
    defaults: Assumptions,
    default_timeframe: Timeframe,
}

impl KeywordIntentParser {
    pub fn new(defaults: Assumptions, default_timeframe: Timeframe) -> Self {
        Self {
            defaults,
            default_timeframe,
        }
    }

    pub fn parse_query(&self, query: &str) -> Result<ParsedIntent, ForecastError> {
        let intent = detect_intent(query);
        let timeframe = match detect_horizon(query)? {
            Some(months) => Timeframe::new(months)?,
            None => self.default_timeframe,
        };

        let mut parsed = ParsedIntent::new(intent, timeframe);
        parsed.overrides = self.detect_overrides(query)?;
        Ok(parsed)
    }

    fn detect_overrides(&self, query: &str) -> Result<AssumptionOverrides, ForecastError> {
        let base_spend = self.defaults.smb.marketing_spend;

        let marketing_spend = if let Some(caps) = RELATIVE_SPEND.captures(query) {
            let pct = parse_number(&caps[2])?;
            let direction = caps[1].to_lowercase();
            let factor = if ["decrease", "cut", "reduce", "lower"]
                .iter()
                .any(|verb| direction.starts_with(verb))
            {
                1.0 - pct / 100.0
            } else {
                1.0 + pct / 100.0
            };
            Some(base_spend * factor)
        } else if let Some(caps) = ABSOLUTE_SPEND.captures(query) {
            let amount = parse_number(&caps[1])?;
            let scale = match caps.get(2).map(|m| m.as_str().to_lowercase()) {
                Some(suffix) if suffix == "k" => 1_000.0,
                Some(suffix) if suffix == "m" => 1_000_000.0,
                _ => 1.0,
            };
            Some(amount * scale)
        } else {
            None
        };

        Ok(AssumptionOverrides {
            smb: SmbOverrides {
                marketing_spend,
                ..SmbOverrides::default()
            },
            ..AssumptionOverrides::default()
        })
    }
}

#[async_trait]
impl IntentParser for KeywordIntentParser {
    async fn parse(&self, query: &str, _context: &str) -> Result<ParsedIntent, ForecastError> {
        self.parse_query(query)
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

fn detect_intent(query: &str) -> ForecastIntent {
    if EXPLAIN_WORDS.is_match(query) {
        return ForecastIntent::ExplainAssumptions;
    }
    match (LARGE_WORDS.is_match(query), SMB_WORDS.is_match(query)) {
        (true, false) => ForecastIntent::ForecastLargeRevenue,
        (false, true) => ForecastIntent::ForecastSmbRevenue,
        _ => ForecastIntent::ForecastTotalRevenue,
    }
}

/// Horizon in months, if the query names one
fn detect_horizon(query: &str) -> Result<Option<i64>, ForecastError> {
    let Some(caps) = HORIZON.captures(query) else {
        return Ok(None);
    };
    let count: i64 = caps[1]
        .parse()
        .map_err(|_| ForecastError::upstream(format!("unreadable horizon: {}", &caps[0])))?;
    let unit = caps[2].to_lowercase();
    let months = if unit.starts_with('y') {
        count.saturating_mul(12)
    } else if unit.starts_with('q') {
        count.saturating_mul(3)
    } else {
        count
    };
    Ok(Some(months))
}

fn parse_number(raw: &str) -> Result<f64, ForecastError> {
    raw.replace(',', "")
        .parse::<f64>()
        .map_err(|_| ForecastError::upstream(format!("unreadable amount: {}", raw)))
}
