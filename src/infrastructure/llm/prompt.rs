//! Prompt contract for LLM-backed intent parsing.
//!
//! The model must answer with a single JSON object matching
//! [`ParsedIntent`](crate::domain::forecast::ParsedIntent).

use crate::domain::forecast::{ForecastIntent, Timeframe};

const OUTPUT_SCHEMA: &str = r#"{
  "intent": "<one of the supported intents>",
  "timeframe_months": <integer>,
  "assumption_overrides": {
    "large": {"arpu": null, "growth_rate": null, "churn_rate": null},
    "smb": {"marketing_spend": null, "cac": null, "conversion_rate": null, "arpu": null, "growth_rate": null, "churn_rate": null}
  }
}"#;

const EXAMPLES: &str = r#"Query: "Show me revenue for the next 6 months"
{"intent": "forecast_total_revenue", "timeframe_months": 6, "assumption_overrides": {}}

Query: "What happens if we increase marketing spend by 20% for 12 months?"
{"intent": "forecast_total_revenue", "timeframe_months": 12, "assumption_overrides": {"smb": {"marketing_spend": 240000}}}

Query: "Forecast large customer revenue for 18 months"
{"intent": "forecast_large_revenue", "timeframe_months": 18, "assumption_overrides": {}}"#;

/// System prompt carrying the knowledge context and the output contract.
pub fn system_prompt(context: &str) -> String {
    let intents = ForecastIntent::ALL
        .iter()
        .map(|i| i.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a financial forecasting assistant for a SaaS company with two business units \
         (large customers and SMB customers).\n\n\
         Relevant knowledge:\n{context}\n\n\
         Extract the user's intent from their query. Supported intents: {intents}.\n\
         timeframe_months must be an integer between {min} and {max}; use {default} if the \
         query does not name a horizon.\n\
         Only include overrides the user explicitly asks for, as absolute values. \
         Use null or omit a key to keep the default.\n\n\
         Respond with exactly one JSON object of this shape:\n{schema}\n\n\
         Examples:\n{examples}",
        context = context,
        intents = intents,
        min = Timeframe::MIN,
        max = Timeframe::MAX,
        default = Timeframe::DEFAULT,
        schema = OUTPUT_SCHEMA,
        examples = EXAMPLES,
    )
}

pub fn user_prompt(query: &str) -> String {
    format!("Parse this financial query: \"{}\"", query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecast::ParsedIntent;

    #[test]
    fn test_system_prompt_lists_every_intent() {
        let prompt = system_prompt("SMB customer revenue model: ...");
        for intent in ForecastIntent::ALL {
            assert!(prompt.contains(intent.as_str()));
        }
        assert!(prompt.contains("between 1 and 36"));
        assert!(prompt.starts_with("You are a financial forecasting assistant"));
        assert!(prompt.contains("SMB customer revenue model"));
    }

    #[test]
    fn test_prompt_examples_decode() {
        for line in EXAMPLES.lines().filter(|l| l.starts_with('{')) {
            assert!(ParsedIntent::from_json(line).is_ok(), "bad example: {}", line);
        }
    }
}
