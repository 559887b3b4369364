//! Knowledge context handed to intent parsers, and the default
//! assumptions provider.

use crate::domain::forecast::rounding::round_cents;
use crate::domain::forecast::{Assumptions, EnterpriseProfile, SmbProfile, Timeframe};
use crate::domain::ports::AssumptionsProvider;
use std::collections::HashSet;

const STOPWORDS: [&str; 12] = [
    "the", "and", "for", "what", "show", "with", "our", "next", "will", "how", "are", "me",
];

/// A single piece of background knowledge about the revenue model
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeChunk {
    pub id: &'static str,
    pub content: String,
    /// Extra terms that should route a query to this chunk
    pub keywords: &'static [&'static str],
}

/// Fixed set of knowledge chunks, ranked by keyword overlap.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    chunks: Vec<KnowledgeChunk>,
}

impl KnowledgeBase {
    /// Build the chunks so they describe the assumptions actually in effect.
    pub fn from_assumptions(assumptions: &Assumptions) -> Self {
        Self {
            chunks: vec![
                KnowledgeChunk {
                    id: "revenue_model_large",
                    content: describe_large(&assumptions.large),
                    keywords: &["large", "enterprise", "onboarding", "ramp"],
                },
                KnowledgeChunk {
                    id: "revenue_model_smb",
                    content: describe_smb(&assumptions.smb),
                    keywords: &["smb", "small", "marketing", "cac", "conversion", "spend"],
                },
                KnowledgeChunk {
                    id: "forecast_types",
                    content: "Supported forecast types: forecast_total_revenue (combined large + SMB), \
                              forecast_large_revenue (enterprise only), forecast_smb_revenue (SMB only), \
                              explain_assumptions (return current assumptions)."
                        .to_string(),
                    keywords: &["revenue", "forecast", "total", "explain", "assumptions"],
                },
                KnowledgeChunk {
                    id: "assumption_overrides",
                    content: "Users can override assumptions by specifying new values in queries. \
                              Common overrides: marketing spend increases/decreases, ARPU changes, \
                              CAC adjustments, conversion rate modifications."
                        .to_string(),
                    keywords: &["increase", "decrease", "change", "override", "arpu", "churn", "growth"],
                },
                KnowledgeChunk {
                    id: "timeframes",
                    content: format!(
                        "Default forecast period is {} months. Supported ranges: {}-{} months. \
                         All forecasts use monthly granularity.",
                        Timeframe::DEFAULT,
                        Timeframe::MIN,
                        Timeframe::MAX
                    ),
                    keywords: &["month", "months", "year", "years", "quarter", "period"],
                },
            ],
        }
    }

    pub fn chunks(&self) -> &[KnowledgeChunk] {
        &self.chunks
    }

    /// Full knowledge text, one chunk per line
    pub fn full_text(&self) -> String {
        self.chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Up to `limit` chunks sharing terms with `query`, best first.
    ///
    /// Falls back to the full knowledge text when nothing matches.
    pub fn relevant_context(&self, query: &str, limit: usize) -> String {
        let terms = tokenize(query);

        let mut scored: Vec<(usize, usize)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(idx, chunk)| {
                let mut vocabulary = tokenize(&chunk.content);
                vocabulary.extend(chunk.keywords.iter().map(|k| k.to_string()));
                (idx, terms.intersection(&vocabulary).count())
            })
            .filter(|(_, score)| *score > 0)
            .collect();

        if scored.is_empty() || limit == 0 {
            return self.full_text();
        }

        // Stable sort keeps declaration order among ties
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored
            .into_iter()
            .take(limit)
            .map(|(idx, _)| self.chunks[idx].content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::from_assumptions(&Assumptions::default())
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() >= 3 && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

fn pct(rate: f64) -> f64 {
    round_cents(rate * 100.0)
}

fn format_rates(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{}", v))
        .collect::<Vec<_>>()
        .join(",")
}

fn describe_large(profile: &EnterpriseProfile) -> String {
    format!(
        "Large customer revenue model: Default ARPU ${} per month, onboarding ramp [{}] customers per month, \
         {}% monthly growth after onboarding, {}% monthly churn rate.",
        profile.arpu,
        format_rates(&profile.onboarding_ramp),
        pct(profile.growth_rate),
        pct(profile.churn_rate)
    )
}

fn describe_smb(profile: &SmbProfile) -> String {
    format!(
        "SMB customer revenue model: Default ARPU ${} per month, ${} monthly marketing spend, ${} CAC, \
         {}% conversion rate, {}% monthly growth, {}% monthly churn rate.",
        profile.arpu,
        profile.marketing_spend,
        profile.cac,
        pct(profile.conversion_rate),
        pct(profile.growth_rate),
        pct(profile.churn_rate)
    )
}

/// Serves a fixed set of defaults loaded at startup
#[derive(Debug, Clone, Default)]
pub struct StaticAssumptionsProvider {
    defaults: Assumptions,
}

impl StaticAssumptionsProvider {
    pub fn new(defaults: Assumptions) -> Self {
        Self { defaults }
    }
}

impl AssumptionsProvider for StaticAssumptionsProvider {
    fn defaults(&self) -> Assumptions {
        self.defaults.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecast::{AssumptionOverrides, SmbOverrides};

    #[test]
    fn test_relevant_context_prefers_matching_segment() {
        let kb = KnowledgeBase::default();
        let context = kb.relevant_context("What if we raise SMB marketing spend?", 1);

        assert!(context.starts_with("SMB customer revenue model"));
        assert!(!context.contains('\n'));
    }

    #[test]
    fn test_relevant_context_falls_back_to_everything() {
        let kb = KnowledgeBase::default();
        let context = kb.relevant_context("hello", 3);

        assert_eq!(context, kb.full_text());
        assert_eq!(context.lines().count(), kb.chunks().len());
    }

    #[test]
    fn test_large_chunk_reflects_configured_defaults() {
        let mut assumptions = Assumptions::default();
        assumptions.large.arpu = 20000.0;
        let kb = KnowledgeBase::from_assumptions(&assumptions);

        assert!(kb.chunks()[0].content.contains("$20000"));
        assert!(kb.chunks()[0].content.contains("[1,1,2,2,3,4,5,6,7,8,9]"));
    }

    #[test]
    fn test_provider_merge_leaves_defaults_untouched() {
        let provider = StaticAssumptionsProvider::default();
        let overrides = AssumptionOverrides {
            smb: SmbOverrides {
                marketing_spend: Some(240000.0),
                ..SmbOverrides::default()
            },
            ..AssumptionOverrides::default()
        };

        let merged = provider.merge(&overrides);
        assert_eq!(merged.smb.marketing_spend, 240000.0);
        assert_eq!(provider.defaults().smb.marketing_spend, 200000.0);
    }
}
