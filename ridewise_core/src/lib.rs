#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Shared contracts for the ridewise dialogue engine.
//!
//! Library crates depend on this one for the provider traits (embedding and
//! phrasing are the two external network collaborators) and the structured
//! turn-response types the transport layer serializes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// A single exemplar hit from nearest-neighbor intent lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentMatch {
    /// Intent label the exemplar belongs to
    pub intent: String,
    /// Exemplar question text
    pub text: String,
    /// Cosine similarity against the live query
    pub similarity: f64,
}

/// A fully resolved (station, field) pair with its recorded value.
///
/// `context` carries the station's other recorded fields so the phrasing
/// service can ground its sentence in more than the single looked-up value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedFact {
    pub station: String,
    pub field: String,
    pub value: String,
    pub context: Vec<(String, String)>,
}

/// The kind of reply a single router invocation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    /// Both slots resolved and a recorded value was found
    Answer,
    /// Station slot could not be filled; user is asked which station
    AskStation,
    /// Field slot could not be filled; user is asked what they want to know
    AskField,
    /// Query failed the domain-relevance gate
    OutOfDomain,
    /// Slots resolved but the dataset has no value recorded
    NoData,
    /// Request-scoped failure (upstream outage, malformed corpus)
    Error,
}

/// Structured outcome of one turn, serialized as-is by the transport layer.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    pub session_id: String,
    pub in_domain: bool,
    /// Top-k intent candidates, informational only
    pub intents: Vec<IntentMatch>,
    pub station: Option<String>,
    pub field: Option<String>,
    pub kind: ReplyKind,
    pub reply: String,
}

/// Maps text to a fixed-length embedding vector via an external model.
///
/// All corpus vectors and live query vectors must come from the same model;
/// dimensionality is validated downstream, not here.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Converts a structured fact plus the original query into a fluent sentence.
#[async_trait]
pub trait PhrasingProvider: Send + Sync {
    async fn phrase(&self, query: &str, fact: &ResolvedFact) -> anyhow::Result<String>;
}
