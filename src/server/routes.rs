//! Axum route handlers for the assistant HTTP server.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Path as UrlPath, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AssistantConfig;
use crate::error::AssistantError;
use crate::knowledge::KnowledgeBase;
use crate::llm::OpenRouterCompletion;
use crate::market::MarketDataService;
use crate::router::{Assistant, RouteOptions};
use crate::whitepaper::embedder::GeminiEmbedder;
use crate::whitepaper::EmbeddingStore;

/// Shared application state: the immutable assistant context.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
}

impl AppState {
    pub fn new(assistant: Arc<Assistant>) -> Self {
        Self { assistant }
    }

    /// Wire the full assistant from configuration: knowledge base and
    /// embedding store from the data directory, the market provider
    /// chain, and the OpenRouter generation client.
    pub fn from_config(config: &AssistantConfig) -> Self {
        let data_dir = Path::new(&config.data_dir);

        let knowledge = KnowledgeBase::load(data_dir);
        let embedder = Arc::new(GeminiEmbedder::new(
            config.gemini_api_key.clone(),
            config.request_timeout,
        ));
        let whitepaper = EmbeddingStore::load(&data_dir.join("embeddings.json"), embedder);
        let market = MarketDataService::from_config(config);
        let generator = Arc::new(OpenRouterCompletion::from_config(config));

        Self::new(Arc::new(Assistant::new(
            knowledge,
            whitepaper,
            market,
            generator,
            config.retrieval_top_k,
        )))
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/facts/:topic", get(facts_handler))
        .route("/api/detect-intent", post(detect_intent_handler))
        .route("/api/token-data", get(token_data_handler))
        .fallback(not_found_handler)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body for `POST /api/chat`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub query: Option<String>,
    pub context: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// Body for `POST /api/detect-intent`.
#[derive(Debug, Deserialize)]
pub struct DetectIntentRequest {
    pub query: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /health — liveness probe.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "llmProvider": state.assistant.generator_provider(),
    }))
}

/// POST /api/chat — route a query through the tier pipeline.
async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let query = request.query.unwrap_or_default();
    let options = RouteOptions {
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        context: request.context,
    };

    match state.assistant.route(&query, &options).await {
        Ok(envelope) => Ok(Json(
            serde_json::to_value(&envelope).unwrap_or_default(),
        )),
        Err(AssistantError::InvalidInput { message }) => {
            let error = if message.contains("2000") {
                "Query too long"
            } else {
                "Invalid input"
            };
            Err((
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": error, "message": message })),
            ))
        }
        Err(err) => {
            tracing::error!(%err, "error processing chat request");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Processing error",
                    "message": "An error occurred while processing your request. Please try again.",
                })),
            ))
        }
    }
}

/// GET /api/facts/:topic — deterministic fact lookup.
async fn facts_handler(
    State(state): State<AppState>,
    UrlPath(topic): UrlPath<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.assistant.lookup_fact(&topic) {
        Ok(fact) => Ok(Json(serde_json::json!({
            "topic": topic,
            "data": fact,
            "timestamp": Utc::now(),
        }))),
        Err(AssistantError::NotFound { topic }) => Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "Not found",
                "message": format!("Topic '{}' not found", topic),
            })),
        )),
        Err(err) => {
            tracing::error!(%err, "error fetching fact");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Error",
                    "message": "An error occurred while fetching the requested information.",
                })),
            ))
        }
    }
}

/// POST /api/detect-intent — classification introspection.
async fn detect_intent_handler(
    State(state): State<AppState>,
    Json(request): Json<DetectIntentRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let query = request.query.filter(|q| !q.trim().is_empty()).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Invalid input",
                "message": "Query must be a non-empty string",
            })),
        )
    })?;

    let classification = state.assistant.classify(&query);

    Ok(Json(serde_json::json!({
        "query": query,
        "detectedIntent": classification.intent,
        "isFinancialAdviceRequest": classification.is_financial_advice_request,
        "timestamp": Utc::now(),
    })))
}

/// GET /api/token-data — live market snapshot with the provider chain.
async fn token_data_handler(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.assistant.token_snapshot().await {
        Ok(snapshot) => Ok(Json(serde_json::json!({
            "data": snapshot,
            "timestamp": Utc::now(),
        }))),
        Err(err) => {
            tracing::error!(%err, "error fetching token data");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Error",
                    "message": "Unable to fetch real-time token data",
                })),
            ))
        }
    }
}

/// Fallback 404 listing the available endpoints.
async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "Not found",
            "message": "Endpoint not found",
            "availableEndpoints": [
                "GET /health",
                "POST /api/chat",
                "GET /api/facts/:topic",
                "POST /api/detect-intent",
                "GET /api/token-data",
            ],
        })),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssistantError;
    use crate::knowledge::facts::{IdentityFact, TopicFact};
    use crate::knowledge::Topic;
    use crate::llm::{GenerationOptions, TextGenerator};
    use crate::whitepaper::embedder::QueryEmbedder;
    use crate::whitepaper::EmbeddingCollection;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::collections::HashMap;
    use tower::ServiceExt;

    struct FixedGenerator(Result<&'static str, ()>);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<String, AssistantError> {
            match self.0 {
                Ok(reply) => Ok(reply.to_string()),
                Err(()) => Err(AssistantError::generation("upstream down")),
            }
        }
    }

    struct NullEmbedder;

    #[async_trait]
    impl QueryEmbedder for NullEmbedder {
        async fn embed_query(&self, _text: &str) -> Option<Vec<f32>> {
            None
        }
    }

    fn test_state(generator: FixedGenerator) -> AppState {
        let mut topics = HashMap::new();
        topics.insert(
            Topic::Identity,
            TopicFact::Identity(IdentityFact {
                token_name: "CrypGPT".into(),
                symbol: "CGPT".into(),
                category: "AI-powered crypto intelligence token".into(),
                mission: None,
                problem_statement: None,
                chain: None,
            }),
        );

        let assistant = Assistant::new(
            KnowledgeBase::from_facts(topics),
            EmbeddingStore::new(EmbeddingCollection::default(), Arc::new(NullEmbedder)),
            MarketDataService::new(Vec::new()),
            Arc::new(generator),
            2,
        );

        AppState::new(Arc::new(assistant))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = app_router(test_state(FixedGenerator(Ok("hi"))));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["llmProvider"], "openrouter");
    }

    #[tokio::test]
    async fn test_chat_rejects_missing_and_oversized_query() {
        let app = app_router(test_state(FixedGenerator(Ok("hi"))));

        let response = app
            .clone()
            .oneshot(post_json("/api/chat", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid input");
        assert_eq!(json["message"], "Query must be a non-empty string");

        let oversized = "x".repeat(2001);
        let response = app
            .oneshot(post_json("/api/chat", serde_json::json!({ "query": oversized })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Query too long");
    }

    #[tokio::test]
    async fn test_chat_blocks_financial_advice() {
        // Generator errors on every call; the guard must answer before
        // generation is ever attempted.
        let app = app_router(test_state(FixedGenerator(Err(()))));

        let response = app
            .oneshot(post_json(
                "/api/chat",
                serde_json::json!({ "query": "Should I buy now?" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["responseSource"], "safety_filter");
        assert_eq!(json["intent"], "financial_advice_blocked");
        assert!(json["response"]
            .as_str()
            .unwrap()
            .contains("cannot provide financial advice"));
    }

    #[tokio::test]
    async fn test_chat_generation_failure_maps_to_processing_error() {
        let app = app_router(test_state(FixedGenerator(Err(()))));

        let response = app
            .oneshot(post_json(
                "/api/chat",
                serde_json::json!({ "query": "What is CrypGPT?" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Processing error");
        // The upstream message stays server-side.
        assert!(!json["message"].as_str().unwrap().contains("upstream down"));
    }

    #[tokio::test]
    async fn test_facts_endpoint_found_and_not_found() {
        let app = app_router(test_state(FixedGenerator(Ok("hi"))));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/facts/identity")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["topic"], "identity");
        assert_eq!(json["data"]["symbol"], "CGPT");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/facts/governance")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Topic 'governance' not found");
    }

    #[tokio::test]
    async fn test_detect_intent_endpoint() {
        let app = app_router(test_state(FixedGenerator(Ok("hi"))));

        let response = app
            .oneshot(post_json(
                "/api/detect-intent",
                serde_json::json!({ "query": "show me the roadmap and the price" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["detectedIntent"], "market-data");
        assert_eq!(json["isFinancialAdviceRequest"], false);
    }

    #[tokio::test]
    async fn test_token_data_endpoint_reports_chain_exhaustion() {
        // The test state has no providers configured.
        let app = app_router(test_state(FixedGenerator(Ok("hi"))));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/token-data")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Unable to fetch real-time token data");
    }

    #[tokio::test]
    async fn test_unknown_endpoint_lists_available_routes() {
        let app = app_router(test_state(FixedGenerator(Ok("hi"))));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/unknown")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Not found");
        assert!(json["availableEndpoints"].as_array().unwrap().len() >= 5);
    }
}
