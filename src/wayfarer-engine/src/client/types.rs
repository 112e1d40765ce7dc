//! Wire types for the travel assistant backend.

use serde::{Deserialize, Serialize};

/// Request body for both chat endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub query: String,
}

impl ChatRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

/// Response body of the non-streaming chat endpoint. The backend also
/// returns its retrieval context (`matches`, `graph_facts`); only the
/// answer is consumed here.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub answer: String,
}
