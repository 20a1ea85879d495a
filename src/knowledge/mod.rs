//! Static, structured knowledge about the token project.
//!
//! Five topic JSON documents are loaded once at startup and treated as
//! read-only for the process lifetime. A missing or malformed file logs an
//! error and leaves that topic absent, which routing treats as a tier
//! fall-through rather than a fatal condition.

pub mod facts;
pub mod format;

use std::collections::HashMap;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::intent::Intent;
use facts::{
    FundraisingFact, IdentityFact, RoadmapFact, TokenomicsFact, TopicFact, UseCasesFact,
};

/// Knowledge-base topic key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Identity,
    Tokenomics,
    Roadmap,
    Fundraising,
    Usecases,
}

impl Topic {
    pub const ALL: [Topic; 5] = [
        Topic::Identity,
        Topic::Tokenomics,
        Topic::Roadmap,
        Topic::Fundraising,
        Topic::Usecases,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Identity => "identity",
            Topic::Tokenomics => "tokenomics",
            Topic::Roadmap => "roadmap",
            Topic::Fundraising => "fundraising",
            Topic::Usecases => "usecases",
        }
    }

    /// Parse a topic from its wire name.
    pub fn parse(value: &str) -> Option<Topic> {
        match value {
            "identity" => Some(Topic::Identity),
            "tokenomics" => Some(Topic::Tokenomics),
            "roadmap" => Some(Topic::Roadmap),
            "fundraising" => Some(Topic::Fundraising),
            "usecases" => Some(Topic::Usecases),
            _ => None,
        }
    }

    /// The topic backing a classified intent, when one exists.
    ///
    /// market-data, supply, overview, and general have no structured
    /// record; queries with those intents fall through to the retrieval
    /// and generation tiers.
    pub fn for_intent(intent: Intent) -> Option<Topic> {
        match intent {
            Intent::Tokenomics => Some(Topic::Tokenomics),
            Intent::Roadmap => Some(Topic::Roadmap),
            Intent::Fundraising => Some(Topic::Fundraising),
            Intent::Usecases => Some(Topic::Usecases),
            Intent::MarketData | Intent::Supply | Intent::Overview | Intent::General => None,
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The load-once, read-only knowledge base.
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    topics: HashMap<Topic, TopicFact>,
}

impl KnowledgeBase {
    /// Build from already-parsed facts. The server uses
    /// [`KnowledgeBase::load`]; this constructor exists for tests and
    /// embedding the library with preloaded data.
    pub fn from_facts(topics: HashMap<Topic, TopicFact>) -> Self {
        Self { topics }
    }

    /// Load all topic files from the data directory.
    pub fn load(data_dir: &Path) -> Self {
        let mut topics = HashMap::new();

        if let Some(fact) = load_topic::<IdentityFact>(data_dir, "identity.json") {
            topics.insert(Topic::Identity, TopicFact::Identity(fact));
        }
        if let Some(fact) = load_topic::<TokenomicsFact>(data_dir, "tokenomics.json") {
            topics.insert(Topic::Tokenomics, TopicFact::Tokenomics(fact));
        }
        if let Some(fact) = load_topic::<RoadmapFact>(data_dir, "roadmap.json") {
            topics.insert(Topic::Roadmap, TopicFact::Roadmap(fact));
        }
        if let Some(fact) = load_topic::<FundraisingFact>(data_dir, "fundraising.json") {
            topics.insert(Topic::Fundraising, TopicFact::Fundraising(fact));
        }
        if let Some(fact) = load_topic::<UseCasesFact>(data_dir, "usecases.json") {
            topics.insert(Topic::Usecases, TopicFact::Usecases(fact));
        }

        tracing::info!(loaded = topics.len(), "knowledge base loaded");
        Self { topics }
    }

    /// Pure lookup of a topic record.
    pub fn fact(&self, topic: Topic) -> Option<&TopicFact> {
        self.topics.get(&topic)
    }

    /// Lookup keyed by a classified intent.
    pub fn fact_for_intent(&self, intent: Intent) -> Option<&TopicFact> {
        Topic::for_intent(intent).and_then(|topic| self.fact(topic))
    }
}

fn load_topic<T: DeserializeOwned>(data_dir: &Path, filename: &str) -> Option<T> {
    let path = data_dir.join(filename);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) => {
            tracing::error!(file = filename, %err, "error loading knowledge file");
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::error!(file = filename, %err, "error parsing knowledge file");
            None
        }
    }
}
