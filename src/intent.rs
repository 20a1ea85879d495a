//! Query intent detection: the financial-advice guard, the ordered topic
//! classifier, and the expansion heuristic deciding whether a query can be
//! answered crisply from structured facts.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Topic category of a user query.
///
/// Derived per request by [`detect_intent`], never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    MarketData,
    Roadmap,
    Tokenomics,
    Supply,
    Fundraising,
    Usecases,
    Overview,
    General,
}

impl Intent {
    /// Wire tag, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::MarketData => "market-data",
            Intent::Roadmap => "roadmap",
            Intent::Tokenomics => "tokenomics",
            Intent::Supply => "supply",
            Intent::Fundraising => "fundraising",
            Intent::Usecases => "usecases",
            Intent::Overview => "overview",
            Intent::General => "general",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the pure classification entry point.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Classification {
    /// First-matching topic category.
    pub intent: Intent,
    /// Whether the financial-advice guard would block the query.
    pub is_financial_advice_request: bool,
}

/// Trigger phrases for the financial-advice guard.
///
/// Matched case-insensitively as substrings against the raw query.
const FINANCIAL_KEYWORDS: &[&str] = &[
    "buy",
    "sell",
    "invest",
    "investment",
    "price prediction",
    "predict",
    "moon",
    "pump",
    "dump",
    "trading",
    "margin",
    "leverage",
    "short",
    "long",
    "hodl",
    "should i invest",
    "should i buy",
    "make money",
    "get rich",
    "profit",
    "roi",
    "return on investment",
    "financial advice",
    "investment strategy",
    "portfolio",
    "entry point",
    "exit",
    "target price",
    "price target",
];

/// Phrases that escalate even a simple topic to full generation.
const EXPANSION_KEYWORDS: &[&str] = &[
    "explain",
    "why",
    "how does",
    "how can",
    "elaborate",
    "expand",
    "deep dive",
    "tell me more",
    "more details",
    "understand",
    "benefits",
    "advantages",
    "impact",
    "compared",
    "vs",
    "comparison",
    "difference",
    "pros and cons",
    "pros cons",
    "technical",
    "mechanism",
    "works",
    "process",
];

/// Ordered intent patterns. First match wins; the ordering is a deliberate
/// tie-break for queries matching several patterns and must not be
/// reordered (a query mentioning both "price" and "roadmap" classifies as
/// market-data).
static INTENT_PATTERNS: Lazy<Vec<(Intent, Regex)>> = Lazy::new(|| {
    // Patterns run against the lowercased query.
    let table: &[(Intent, &str)] = &[
        (
            Intent::MarketData,
            r"price|market cap|volume|24h volume|24 hour|trading|value|worth|expensive|cost",
        ),
        (
            Intent::Roadmap,
            r"roadmap|plans|future|upcoming|next phase|milestones|timeline",
        ),
        (
            Intent::Tokenomics,
            r"tokenomics|token distribution|allocation|vesting|unlock|emission",
        ),
        (
            Intent::Supply,
            r"supply|max supply|total|circulating supply|how many|quantity",
        ),
        (
            Intent::Fundraising,
            r"fundrais|funding|seed|series|round|capital|invest|raised",
        ),
        (
            Intent::Usecases,
            r"use case|application|what can|how to use|utilize|purpose|benefit|solve",
        ),
        (
            Intent::Overview,
            r"what is|overview|about|explain|describe|tell me|introduce|crypgpt",
        ),
    ];

    table
        .iter()
        .map(|(intent, pattern)| {
            let re = Regex::new(pattern).expect("intent pattern must compile");
            (*intent, re)
        })
        .collect()
});

/// Detect whether the query asks for financial advice, price predictions,
/// or investment strategy. A `true` result must short-circuit the router
/// before any other tier runs.
pub fn is_financial_advice(query: &str) -> bool {
    let lower = query.to_lowercase();
    FINANCIAL_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword))
}

/// Classify a query into a topic category via the ordered pattern table,
/// defaulting to [`Intent::General`] when nothing matches.
pub fn detect_intent(query: &str) -> Intent {
    let lower = query.to_lowercase();
    for (intent, pattern) in INTENT_PATTERNS.iter() {
        if pattern.is_match(&lower) {
            return *intent;
        }
    }
    Intent::General
}

/// Classify a query and report the financial-advice verdict together.
pub fn classify(query: &str) -> Classification {
    Classification {
        intent: detect_intent(query),
        is_financial_advice_request: is_financial_advice(query),
    }
}

/// Decide whether a query needs generative elaboration or the knowledge
/// base can answer crisply.
///
/// Simple topics (identity, market-data, tokenomics, supply) are crisp by
/// default; everything else needs generation, and an explicit elaboration
/// phrase escalates even a simple topic. This is the single gate between
/// the deterministic tier and the generation tiers.
pub fn needs_expansion(query: &str, intent: Intent) -> bool {
    let lower = query.to_lowercase();
    let has_expansion_request = EXPANSION_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword));

    // identity belongs to the simple set as well, but the classifier never
    // produces it as an intent; only the topic-keyed KB carries it.
    let is_simple_topic = matches!(
        intent,
        Intent::MarketData | Intent::Tokenomics | Intent::Supply
    );

    !is_simple_topic || has_expansion_request
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_financial_triggers_block() {
        assert!(is_financial_advice("Should I buy now?"));
        assert!(is_financial_advice("price PREDICTION for next year"));
        assert!(is_financial_advice("what roi can I expect"));
        assert!(is_financial_advice("is it going to moon"));
        assert!(is_financial_advice("thoughts on leverage trading"));
        assert!(!is_financial_advice("What is the roadmap?"));
        assert!(!is_financial_advice("How does the AI assistant work?"));
    }

    #[test]
    fn test_intent_ordering_tie_break() {
        // Both "price" and "roadmap" match; the earliest-declared topic wins.
        assert_eq!(
            detect_intent("How does the price relate to the roadmap?"),
            Intent::MarketData
        );
        // "milestones" and "allocation" — roadmap is declared first.
        assert_eq!(
            detect_intent("milestones for the allocation release"),
            Intent::Roadmap
        );
    }

    #[test]
    fn test_supply_queries_classify_as_supply() {
        assert_eq!(detect_intent("What is the total supply?"), Intent::Supply);
        assert_eq!(detect_intent("how many tokens exist"), Intent::Supply);
    }

    #[test]
    fn test_topic_patterns() {
        assert_eq!(detect_intent("Show me the roadmap"), Intent::Roadmap);
        assert_eq!(
            detect_intent("what are the vesting terms"),
            Intent::Tokenomics
        );
        assert_eq!(detect_intent("tell me about the seed round"), Intent::Fundraising);
        assert_eq!(
            detect_intent("which applications does it solve"),
            Intent::Usecases
        );
        assert_eq!(detect_intent("What is CrypGPT?"), Intent::Overview);
    }

    #[test]
    fn test_default_intent_is_general() {
        assert_eq!(detect_intent("hello there"), Intent::General);
        assert_eq!(detect_intent(""), Intent::General);
    }

    #[test]
    fn test_needs_expansion_for_non_simple_topics() {
        // Non-simple intents always need generation, regardless of wording.
        assert!(needs_expansion("roadmap", Intent::Roadmap));
        assert!(needs_expansion("rounds", Intent::Fundraising));
        assert!(needs_expansion("hi", Intent::Overview));
        assert!(needs_expansion("hi", Intent::General));
        assert!(needs_expansion("anything", Intent::Usecases));
    }

    #[test]
    fn test_simple_topics_stay_crisp_without_expansion_phrase() {
        assert!(!needs_expansion("current price?", Intent::MarketData));
        assert!(!needs_expansion("token split", Intent::Tokenomics));
        assert!(!needs_expansion("total supply", Intent::Supply));
    }

    #[test]
    fn test_expansion_phrase_escalates_simple_topic() {
        assert!(needs_expansion(
            "explain the tokenomics",
            Intent::Tokenomics
        ));
        assert!(needs_expansion(
            "why is the supply capped",
            Intent::Supply
        ));
        assert!(needs_expansion(
            "how does the price mechanism work",
            Intent::MarketData
        ));
    }

    #[test]
    fn test_classify_reports_both_signals() {
        let c = classify("should i buy before the roadmap update?");
        assert!(c.is_financial_advice_request);
        assert_eq!(c.intent, Intent::Roadmap);
    }

    #[test]
    fn test_intent_wire_tags() {
        assert_eq!(Intent::MarketData.as_str(), "market-data");
        assert_eq!(
            serde_json::to_value(Intent::MarketData).unwrap(),
            serde_json::json!("market-data")
        );
        assert_eq!(
            serde_json::to_value(Intent::Usecases).unwrap(),
            serde_json::json!("usecases")
        );
    }
}
