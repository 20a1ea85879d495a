//! Assistant HTTP server binary.
//!
//! # Environment Variables
//!
//! - `PORT` — HTTP port (default: 3001)
//! - `DATA_DIR` — Knowledge/embeddings directory (default: "data")
//! - `OPENR_API_KEY` / `OPENR_MODEL` / `OPENR_URL` — OpenRouter generation
//! - `GEMINI_API_KEY` — query embeddings (optional; retrieval degrades)
//! - `COINMARKETCAP_API` / `CMC_API_KEY` — market data (optional)
//! - `RUST_LOG` — Tracing filter (default: "info")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin server
//! ```

use crypgpt_assistant::config::AssistantConfig;
use crypgpt_assistant::server::{app_router, AppState};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,crypgpt_assistant=debug".into()),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let bind_addr = format!("0.0.0.0:{}", port);

    let config = AssistantConfig::from_env();
    let state = AppState::from_config(&config);

    let app = app_router(state);

    tracing::info!("CrypGPT assistant backend starting on {}", bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health            — liveness probe");
    tracing::info!("  POST /api/chat          — tiered chat pipeline");
    tracing::info!("  GET  /api/facts/:topic  — deterministic fact lookup");
    tracing::info!("  POST /api/detect-intent — classification introspection");
    tracing::info!("  GET  /api/token-data    — live market snapshot");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server failed");
}
