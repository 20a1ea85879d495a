//! Tiered response router — the decision pipeline turning a raw query
//! into exactly one of four terminal outcomes:
//!
//! 1. **Blocked** — the financial-advice guard fires; fixed refusal.
//! 2. **KB-Direct** — a crisp answer formatted straight from the
//!    knowledge base.
//! 3. **KB+Whitepaper** — a tightly constrained generation over retrieved
//!    whitepaper excerpts.
//! 4. **Full-Generation** — the persona prompt with every piece of
//!    context the pipeline gathered.
//!
//! The evaluation order is fixed and the guard always wins. Every
//! response carries exactly one provenance tag.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AssistantError;
use crate::intent::{self, Classification, Intent};
use crate::knowledge::format::format_fact;
use crate::knowledge::facts::TopicFact;
use crate::knowledge::{KnowledgeBase, Topic};
use crate::llm::{GenerationOptions, TextGenerator};
use crate::market::{MarketDataService, SnapshotView, TokenSnapshot};
use crate::prompt;
use crate::whitepaper::EmbeddingStore;

/// Maximum accepted query length in characters.
const MAX_QUERY_CHARS: usize = 2000;

/// Fixed refusal returned whenever the financial-advice guard fires.
const REFUSAL_TEXT: &str = "I cannot provide financial advice, investment strategies, or \
     price predictions. However, I'm happy to explain CrypGPT's technology, tokenomics, \
     roadmap, and use cases. What would you like to know?";

/// Generation settings for the whitepaper-constrained tier.
const GROUNDED_OPTIONS: GenerationOptions = GenerationOptions {
    temperature: 0.3,
    max_tokens: 300,
};

/// Token budget for full generation when elaboration was requested.
const EXPANDED_MAX_TOKENS: u32 = 1000;
/// Token budget for full generation without an elaboration request.
const CRISP_MAX_TOKENS: u32 = 400;

/// Caller-supplied routing options.
///
/// `max_tokens` and `context` are accepted for wire compatibility; tier
/// budgets are fixed by the router and `context` is unused by prompt
/// assembly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOptions {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub context: Option<String>,
}

/// Provenance tag: which tier produced the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    SafetyFilter,
    KnowledgeBase,
    KnowledgeBaseWhitepaper,
    LlmGenerated,
}

/// Intent tag echoed on every response. Blocked responses carry a
/// dedicated label instead of a topic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentTag {
    FinancialAdviceBlocked,
    Query(Intent),
}

impl IntentTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentTag::FinancialAdviceBlocked => "financial_advice_blocked",
            IntentTag::Query(intent) => intent.as_str(),
        }
    }
}

impl Serialize for IntentTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The answer to one routed query, with provenance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub response: String,
    pub intent: IntentTag,
    pub response_source: ResponseSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_time_data: Option<SnapshotView>,
    pub timestamp: DateTime<Utc>,
}

impl ResponseEnvelope {
    fn new(
        response: String,
        intent: IntentTag,
        response_source: ResponseSource,
        snapshot: Option<&TokenSnapshot>,
    ) -> Self {
        Self {
            response,
            intent,
            response_source,
            real_time_data: snapshot.map(SnapshotView::from),
            timestamp: Utc::now(),
        }
    }
}

/// The assistant context: immutable, load-once collaborators injected at
/// startup. Concurrent requests share it behind an `Arc` without locking.
pub struct Assistant {
    knowledge: KnowledgeBase,
    whitepaper: EmbeddingStore,
    market: MarketDataService,
    generator: Arc<dyn TextGenerator>,
    retrieval_top_k: usize,
}

impl Assistant {
    pub fn new(
        knowledge: KnowledgeBase,
        whitepaper: EmbeddingStore,
        market: MarketDataService,
        generator: Arc<dyn TextGenerator>,
        retrieval_top_k: usize,
    ) -> Self {
        Self {
            knowledge,
            whitepaper,
            market,
            generator,
            retrieval_top_k,
        }
    }

    /// Provider tag of the configured generator.
    pub fn generator_provider(&self) -> &str {
        self.generator.provider()
    }

    /// Pure introspection: classify a query without routing it.
    pub fn classify(&self, query: &str) -> Classification {
        intent::classify(query)
    }

    /// Direct fact lookup by topic name.
    pub fn lookup_fact(&self, topic: &str) -> Result<&TopicFact, AssistantError> {
        let parsed = Topic::parse(topic).ok_or_else(|| AssistantError::NotFound {
            topic: topic.to_string(),
        })?;
        self.knowledge
            .fact(parsed)
            .ok_or_else(|| AssistantError::NotFound {
                topic: topic.to_string(),
            })
    }

    /// Best-effort snapshot for the token-data endpoint.
    pub async fn token_snapshot(&self) -> Result<TokenSnapshot, AssistantError> {
        self.market.fetch_token_snapshot().await
    }

    /// Route a query through the tier pipeline.
    pub async fn route(
        &self,
        query: &str,
        options: &RouteOptions,
    ) -> Result<ResponseEnvelope, AssistantError> {
        if query.trim().is_empty() {
            return Err(AssistantError::invalid_input(
                "Query must be a non-empty string",
            ));
        }
        if query.chars().count() > MAX_QUERY_CHARS {
            return Err(AssistantError::invalid_input(
                "Query must be less than 2000 characters",
            ));
        }

        // The guard always wins. Classification still runs for the log
        // line but cannot influence the outcome.
        if intent::is_financial_advice(query) {
            tracing::info!(
                intent = intent::detect_intent(query).as_str(),
                "query blocked by financial-advice guard"
            );
            return Ok(ResponseEnvelope::new(
                REFUSAL_TEXT.to_string(),
                IntentTag::FinancialAdviceBlocked,
                ResponseSource::SafetyFilter,
                None,
            ));
        }

        let intent = intent::detect_intent(query);
        let intent_tag = IntentTag::Query(intent);

        // Best-effort live data, market-data queries only. Failure is
        // swallowed and the tiers proceed without a snapshot.
        let snapshot = if intent == Intent::MarketData {
            match self.market.fetch_token_snapshot().await {
                Ok(snapshot) => Some(snapshot),
                Err(err) => {
                    tracing::error!(%err, "error fetching real-time data");
                    None
                }
            }
        } else {
            None
        };

        let needs_expansion = intent::needs_expansion(query, intent);

        // Tier: KB-Direct.
        if !needs_expansion {
            if let Some(crisp) = self
                .knowledge
                .fact_for_intent(intent)
                .and_then(format_fact)
            {
                let mut response = crisp;
                if intent == Intent::MarketData {
                    if let Some(snapshot) = &snapshot {
                        response.push_str(&prompt::market_data_block(snapshot));
                    }
                }
                return Ok(ResponseEnvelope::new(
                    response,
                    intent_tag,
                    ResponseSource::KnowledgeBase,
                    snapshot.as_ref(),
                ));
            }
        }

        // One retrieval pass shared by the remaining tiers.
        let sections = self
            .whitepaper
            .find_relevant(query, self.retrieval_top_k)
            .await;
        let whitepaper_context = prompt::whitepaper_context(&sections);

        // Tier: KB+Whitepaper — crisp query with retrieved grounding.
        if !whitepaper_context.is_empty() && !needs_expansion {
            let system_prompt = prompt::grounded_system_prompt(&whitepaper_context);
            let response = self
                .generator
                .generate(&system_prompt, query, &GROUNDED_OPTIONS)
                .await?;

            return Ok(ResponseEnvelope::new(
                response,
                intent_tag,
                ResponseSource::KnowledgeBaseWhitepaper,
                snapshot.as_ref(),
            ));
        }

        // Tier: Full-Generation — the catch-all.
        let system_prompt = prompt::build_system_prompt();
        let user_prompt = prompt::build_user_prompt(
            query,
            intent,
            snapshot.as_ref(),
            &whitepaper_context,
            &self.knowledge,
        );

        let generation_options = GenerationOptions {
            temperature: options.temperature.unwrap_or(0.7),
            max_tokens: if needs_expansion {
                EXPANDED_MAX_TOKENS
            } else {
                CRISP_MAX_TOKENS
            },
        };

        let response = self
            .generator
            .generate(system_prompt, &user_prompt, &generation_options)
            .await?;

        Ok(ResponseEnvelope::new(
            response,
            intent_tag,
            ResponseSource::LlmGenerated,
            snapshot.as_ref(),
        ))
    }
}
