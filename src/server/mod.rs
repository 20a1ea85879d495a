//! HTTP transport for the assistant.
//!
//! A thin axum layer over the routing core. All decision logic lives in
//! [`crate::router`]; handlers validate, delegate, and map errors to
//! status codes.
//!
//! # Endpoints
//!
//! - `GET  /health`            — Liveness probe
//! - `POST /api/chat`          — Route a query through the tier pipeline
//! - `GET  /api/facts/:topic`  — Deterministic fact lookup
//! - `POST /api/detect-intent` — Classification introspection
//! - `GET  /api/token-data`    — Live market snapshot

pub mod routes;

pub use routes::{app_router, AppState};
