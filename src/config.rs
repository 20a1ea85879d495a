//! Environment-driven configuration for the assistant service.

use std::time::Duration;

/// Configuration for the assistant backend.
///
/// All values come from environment variables with sensible defaults so
/// the server starts in a degraded-but-working mode without any keys set
/// (no whitepaper retrieval, demo market data, generation calls failing
/// with a logged upstream error).
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// OpenRouter API key for generation calls.
    pub openrouter_api_key: Option<String>,
    /// OpenRouter model identifier.
    pub openrouter_model: String,
    /// OpenRouter chat-completions endpoint.
    pub openrouter_url: String,
    /// Gemini API key for query/corpus embeddings.
    pub gemini_api_key: Option<String>,
    /// CoinMarketCap API base URL.
    pub cmc_base_url: Option<String>,
    /// CoinMarketCap API key.
    pub cmc_api_key: Option<String>,
    /// Directory holding the knowledge JSON files and embeddings.
    pub data_dir: String,
    /// Bound applied to every outbound HTTP call.
    pub request_timeout: Duration,
    /// Number of whitepaper sections retrieved for prompt context.
    pub retrieval_top_k: usize,
}

impl AssistantConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        let timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(15);

        Self {
            openrouter_api_key: std::env::var("OPENR_API_KEY").ok(),
            openrouter_model: std::env::var("OPENR_MODEL")
                .unwrap_or_else(|_| "amazon/nova-2-lite-v1:free".into()),
            openrouter_url: std::env::var("OPENR_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1/chat/completions".into()),
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
            cmc_base_url: std::env::var("COINMARKETCAP_API").ok(),
            cmc_api_key: std::env::var("CMC_API_KEY").ok(),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "data".into()),
            request_timeout: Duration::from_secs(timeout_secs),
            retrieval_top_k: 2,
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            openrouter_api_key: None,
            openrouter_model: "amazon/nova-2-lite-v1:free".into(),
            openrouter_url: "https://openrouter.ai/api/v1/chat/completions".into(),
            gemini_api_key: None,
            cmc_base_url: None,
            cmc_api_key: None,
            data_dir: "data".into(),
            request_timeout: Duration::from_secs(15),
            retrieval_top_k: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AssistantConfig::default();
        assert_eq!(config.openrouter_model, "amazon/nova-2-lite-v1:free");
        assert_eq!(config.retrieval_top_k, 2);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert!(config.openrouter_api_key.is_none());
    }
}
