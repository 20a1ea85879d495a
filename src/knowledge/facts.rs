//! Typed records for the static, per-topic knowledge base.
//!
//! Each topic file under `data/` deserializes into one of these structs.
//! The shapes vary per topic: identity is descriptive, tokenomics carries
//! a supply figure and an allocation table, roadmap nests goals inside
//! milestones, fundraising nests vesting terms inside rounds.

use serde::{Deserialize, Serialize};

/// A numeric field that source documents sometimes carry preformatted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
    Number(f64),
    Text(String),
}

impl NumericField {
    /// Render with comma grouping when numeric, verbatim otherwise.
    pub fn display_grouped(&self) -> String {
        match self {
            NumericField::Number(n) => super::format::group_thousands(*n),
            NumericField::Text(s) => s.clone(),
        }
    }
}

/// Identity: what the token is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityFact {
    pub token_name: String,
    pub symbol: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mission: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_statement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
}

/// Tokenomics: supply and allocation breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenomicsFact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_supply: Option<NumericField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supply_type: Option<String>,
    #[serde(default)]
    pub allocation: Vec<AllocationEntry>,
}

/// One row of the allocation table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub category: String,
    pub percentage: f64,
    pub tokens: NumericField,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vesting: Option<String>,
}

/// Free-text overview block shared by several topics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicOverview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategic_goal: Option<String>,
}

/// Roadmap: quarterly milestones with nested goals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapFact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<TopicOverview>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub title: String,
    #[serde(default)]
    pub goals: Vec<MilestoneGoal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneGoal {
    pub name: String,
}

/// Fundraising: rounds with vesting sub-records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundraisingFact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<TopicOverview>,
    #[serde(default)]
    pub rounds: Vec<FundingRound>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingRound {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_allocated: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_raise_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vesting: Option<VestingTerms>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VestingTerms {
    pub tge_unlock_percentage: f64,
    pub monthly_unlock_percentage: f64,
}

/// Use cases: what the token is for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UseCasesFact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<TopicOverview>,
    #[serde(default)]
    pub use_cases: Vec<UseCase>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UseCase {
    pub name: String,
    pub category: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_benefit: Option<String>,
}

/// One statically loaded, topic-keyed record.
///
/// A tagged variant per topic keeps the formatter dispatch exhaustive at
/// compile time while preserving the fall-through contract for callers
/// (a topic with data but no deterministic template yields `None` from
/// the formatter and routing continues to the generation tiers).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TopicFact {
    Identity(IdentityFact),
    Tokenomics(TokenomicsFact),
    Roadmap(RoadmapFact),
    Fundraising(FundraisingFact),
    Usecases(UseCasesFact),
}
