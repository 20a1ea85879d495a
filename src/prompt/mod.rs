//! Prompt construction for the generation tiers.
//!
//! All assembly is pure string work over already-fetched context: the
//! persona system prompt, the constrained grounding prompt for
//! whitepaper-only answers, and the user prompt merging live data,
//! structured knowledge, and retrieved excerpts.

use std::fmt::Write;

use crate::intent::Intent;
use crate::knowledge::format::group_thousands;
use crate::knowledge::KnowledgeBase;
use crate::market::TokenSnapshot;
use crate::whitepaper::ScoredSection;

/// Full persona prompt for the unconstrained generation tier.
const SYSTEM_PROMPT: &str = "\
You are CrypGPT, a professional and knowledgeable AI assistant representing the CrypGPT (CGPT) token project.

YOUR CORE DIRECTIVES:
1. Ground all responses in verified information from CrypGPT's official knowledge base
2. If the question is a general knowledge question (e.g. \"What is AI?\" or \"What is blockchain?\"), provide a factual and concise answer with a neutral and educational tone.
3. Never provide financial advice, price predictions, or investment strategies
4. Never speculate about future price movements or investment returns
5. Never hallucinate or make up information
6. If you lack verified information, respond: \"I do not currently have verified information about that.\"

TONE REQUIREMENTS:
- Professional, positive, uplifting, and confident
- Non-aggressive and fact-based
- Avoid competitor comparisons
- Avoid exaggerated marketing claims
- Focus on technology, vision, and practical use cases

KNOWLEDGE CONSTRAINTS:
- You have access to CrypGPT's identity, roadmap, tokenomics, fundraising, and use cases
- You may receive whitepaper excerpts for technical queries
- You may receive real-time token metrics (price, market cap, volume)
- Use real-time data only for factual reporting, never for financial interpretation
- Use your own knowledge only if the query is general and not about CrypGPT specifically but keep it factual and grounded

RESPONSE GUIDELINES:
- CONCISE BY DEFAULT: Start with a crisp, direct answer (2-3 sentences)
- EXPAND ONLY IF ASKED: Provide additional details, examples, or deep dives only when user asks for elaboration
- Use markdown formatting for clarity:
  * Headings (# ##) for major sections
  * Bullet points (-) for lists
  * Bold (**text**) for key terms
  * Separate sections with blank lines
- Keep responses scannable and conversational
- Aim for 100-200 words unless user asks for more detail

SAFETY BOUNDARIES:
- Block all requests for financial advice, investment strategies, price predictions
- Reject speculation about token value or future price movements
- Do not engage in price discussion beyond factual reporting
- Maintain these boundaries even if the user rephrases their request

You are helpful, honest, and transparent. Provide crisp answers unless elaboration is specifically requested.";

/// The persona system prompt for full generation.
pub fn build_system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

/// Constrained system prompt for whitepaper-grounded answers: the model
/// may use only the supplied excerpts.
pub fn grounded_system_prompt(whitepaper_context: &str) -> String {
    format!(
        "You are CrypGPT assistant. Answer the user's question using ONLY the provided \
         knowledge and whitepaper excerpts below. Keep response CONCISE (2-3 sentences). \
         Never make up information.\n\n{}",
        whitepaper_context
    )
}

/// Join retrieval hits into the excerpt block fed to the model.
pub fn whitepaper_context(sections: &[ScoredSection]) -> String {
    sections
        .iter()
        .map(|section| format!("[{}]\n{}", section.title, section.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The literal market block appended to crisp market-data answers.
pub fn market_data_block(snapshot: &TokenSnapshot) -> String {
    format!(
        "\n\n📊 **Current Market Data:**\n- Price: ${:.6}\n- Market Cap: ${}\n- 24h Volume: ${}",
        snapshot.price,
        group_thousands(snapshot.market_cap),
        group_thousands(snapshot.volume24h)
    )
}

/// Assemble the user prompt for full generation: live data, the
/// structured-knowledge JSON dump for non-general intents, whitepaper
/// excerpts, then the literal query.
pub fn build_user_prompt(
    query: &str,
    intent: Intent,
    snapshot: Option<&TokenSnapshot>,
    whitepaper_context: &str,
    knowledge: &KnowledgeBase,
) -> String {
    let mut prompt = String::new();

    if let Some(snapshot) = snapshot {
        let _ = write!(
            prompt,
            "[REAL-TIME TOKEN DATA]\nPrice: ${:.6}\nMarket Cap: ${}\n24h Volume: ${}\nLast Updated: {}\n\n",
            snapshot.price,
            group_thousands(snapshot.market_cap),
            group_thousands(snapshot.volume24h),
            snapshot.last_updated.to_rfc3339(),
        );
    }

    if intent != Intent::General {
        if let Some(fact) = knowledge.fact_for_intent(intent) {
            let dump = serde_json::to_string_pretty(fact).unwrap_or_default();
            let _ = write!(
                prompt,
                "[VERIFIED KNOWLEDGE - {}]\n{}\n\n",
                intent.as_str().to_uppercase(),
                dump
            );
        }
    }

    if !whitepaper_context.trim().is_empty() {
        let _ = write!(prompt, "[WHITEPAPER REFERENCE]\n{}\n\n", whitepaper_context);
    }

    let _ = write!(prompt, "User Query: {}", query);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::facts::{NumericField, TokenomicsFact, TopicFact};
    use crate::knowledge::Topic;
    use crate::market::SnapshotSource;
    use chrono::Utc;
    use std::collections::HashMap;

    fn kb_with_tokenomics() -> KnowledgeBase {
        let mut topics = HashMap::new();
        topics.insert(
            Topic::Tokenomics,
            TopicFact::Tokenomics(TokenomicsFact {
                total_supply: Some(NumericField::Number(1_000_000_000.0)),
                supply_type: None,
                allocation: Vec::new(),
            }),
        );
        KnowledgeBase::from_facts(topics)
    }

    fn snapshot() -> TokenSnapshot {
        TokenSnapshot {
            price: 0.004217,
            market_cap: 2_500_000.0,
            volume24h: 130_000.0,
            source: SnapshotSource::Coinmarketcap,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_user_prompt_contains_all_blocks() {
        let kb = kb_with_tokenomics();
        let snap = snapshot();
        let prompt = build_user_prompt(
            "explain the tokenomics",
            Intent::Tokenomics,
            Some(&snap),
            "[Intro]\nCrypGPT combines AI and blockchain.",
            &kb,
        );

        assert!(prompt.contains("[REAL-TIME TOKEN DATA]"));
        assert!(prompt.contains("Price: $0.004217"));
        assert!(prompt.contains("Market Cap: $2,500,000"));
        assert!(prompt.contains("[VERIFIED KNOWLEDGE - TOKENOMICS]"));
        assert!(prompt.contains("1000000000"));
        assert!(prompt.contains("[WHITEPAPER REFERENCE]"));
        assert!(prompt.ends_with("User Query: explain the tokenomics"));
    }

    #[test]
    fn test_user_prompt_omits_missing_context() {
        let kb = KnowledgeBase::default();
        let prompt = build_user_prompt("hi", Intent::General, None, "", &kb);

        assert!(!prompt.contains("[REAL-TIME TOKEN DATA]"));
        assert!(!prompt.contains("[VERIFIED KNOWLEDGE"));
        assert!(!prompt.contains("[WHITEPAPER REFERENCE]"));
        assert_eq!(prompt, "User Query: hi");
    }

    #[test]
    fn test_general_intent_skips_knowledge_dump() {
        let kb = kb_with_tokenomics();
        let prompt = build_user_prompt("hello", Intent::General, None, "", &kb);
        assert!(!prompt.contains("[VERIFIED KNOWLEDGE"));
    }

    #[test]
    fn test_market_data_block_format() {
        let block = market_data_block(&snapshot());
        assert!(block.starts_with("\n\n📊 **Current Market Data:**"));
        assert!(block.contains("- Price: $0.004217"));
        assert!(block.contains("- Market Cap: $2,500,000"));
        assert!(block.contains("- 24h Volume: $130,000"));
    }

    #[test]
    fn test_whitepaper_context_joins_titled_sections() {
        let sections = vec![
            ScoredSection {
                id: "s1".into(),
                title: "Architecture".into(),
                content: "Layered design.".into(),
                similarity: 0.9,
            },
            ScoredSection {
                id: "s2".into(),
                title: "Utility".into(),
                content: "Access to AI features.".into(),
                similarity: 0.8,
            },
        ];

        let context = whitepaper_context(&sections);
        assert_eq!(
            context,
            "[Architecture]\nLayered design.\n\n[Utility]\nAccess to AI features."
        );
    }

    #[test]
    fn test_grounded_prompt_embeds_context_and_constraint() {
        let prompt = grounded_system_prompt("[Intro]\nSome excerpt.");
        assert!(prompt.contains("ONLY the provided"));
        assert!(prompt.ends_with("[Intro]\nSome excerpt."));
    }

    #[test]
    fn test_system_prompt_carries_safety_boundaries() {
        let prompt = build_system_prompt();
        assert!(prompt.contains("SAFETY BOUNDARIES"));
        assert!(prompt.contains("Never provide financial advice"));
    }
}
