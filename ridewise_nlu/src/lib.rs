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
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]

//! Natural-language understanding for transit queries.
//!
//! This crate holds the algorithmic core of the assistant:
//! - Cosine similarity over fixed-length embedding vectors
//! - Nearest-neighbor intent lookup over pre-embedded exemplar questions
//! - Alias-normalizing, edit-distance fuzzy station matching
//! - Attribute matching via vector similarity with literal keyword fallback
//! - Loading and validation of the startup corpora
//!
//! Everything here is synchronous and CPU-bound over small fixed-size data;
//! embedding text happens upstream, behind the `EmbeddingProvider` trait.

pub mod corpus;
pub mod entity;
mod error;
pub mod field;
pub mod intent;
pub mod scoring;

pub use corpus::{CorpusBundle, StationFacts, StationRecord};
pub use entity::{StationMatcher, default_aliases};
pub use error::NluError;
pub use field::{FieldDescriptor, FieldMatcher, FieldMatcherConfig, normalize_key};
pub use intent::{Exemplar, ExemplarIndex};
pub use scoring::cosine_similarity;
