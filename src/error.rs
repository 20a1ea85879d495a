//! Error types for the assistant core.

use thiserror::Error;

/// Errors produced while routing a query or serving a lookup.
///
/// The HTTP layer maps each variant to a distinct client-facing outcome:
/// `InvalidInput` surfaces its message with a 400, `NotFound` a 404,
/// and everything else collapses into a generic processing error so a
/// single bad request never destabilizes the server process.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Client-correctable input problem (empty or oversized query).
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Direct fact lookup for a topic the knowledge base does not carry.
    #[error("topic '{topic}' not found")]
    NotFound { topic: String },

    /// A market-data or embedding collaborator failed. Recovered locally:
    /// the response degrades (context omitted) instead of erroring.
    #[error("upstream unavailable: {message}")]
    Upstream { message: String },

    /// The generative collaborator errored or returned empty content.
    /// Surfaced to the client as a generic processing error; the upstream
    /// message is logged server-side.
    #[error("LLM generation failed: {message}")]
    Generation { message: String },
}

impl AssistantError {
    /// Shorthand for an `InvalidInput` error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Shorthand for an `Upstream` error.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// Shorthand for a `Generation` error.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }
}
