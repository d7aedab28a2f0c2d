//! Attribute matching over a closed field-descriptor catalog.
//!
//! Several catalog keys are variant phrasings of one underlying attribute
//! (`parking_cost`, `parking_cost_alt1`, ...); variant suffixes are stripped
//! before a key is used against the dataset. Semantic similarity decides
//! first; a literal keyword table catches queries the embedding model places
//! nowhere near the catalog.

use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corpus::StationRecord;
use crate::error::NluError;
use crate::scoring;

/// One attribute descriptor: a lookup key, the human phrasing that was
/// embedded, and its vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub key: String,
    pub description: String,
    pub vector: Vec<f32>,
}

/// Tunable thresholds for field matching.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FieldMatcherConfig {
    /// Minimum similarity to accept the best descriptor outright.
    #[serde(default = "default_single_threshold")]
    pub single_threshold: f64,

    /// At or below this similarity the literal keyword fallback applies.
    #[serde(default = "default_fallback_threshold")]
    pub fallback_threshold: f64,
}

const fn default_single_threshold() -> f64 {
    0.7
}

const fn default_fallback_threshold() -> f64 {
    0.1
}

impl Default for FieldMatcherConfig {
    fn default() -> Self {
        Self {
            single_threshold: default_single_threshold(),
            fallback_threshold: default_fallback_threshold(),
        }
    }
}

/// Literal keyword → field fallback table, checked by substring containment
/// against the lowercased query.
const DEFAULT_KEYWORDS: &[(&[&str], &str)] = &[
    (&["cost", "price", "fee", "how much"], "parking_cost"),
    (&["availability", "available", "spots", "spaces"], "available_spots"),
];

#[allow(clippy::unwrap_used)]
static VARIANT_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"_alt\d+$").unwrap());

/// Strip a variant suffix so all phrasings of an attribute share one lookup
/// key: `parking_cost_alt1` → `parking_cost`.
#[must_use]
pub fn normalize_key(key: &str) -> String {
    VARIANT_SUFFIX.replace(key, "").into_owned()
}

/// Maps free text to an attribute key from the closed descriptor catalog.
#[derive(Debug, Clone)]
pub struct FieldMatcher {
    descriptors: Vec<FieldDescriptor>,
    keywords: Vec<(Vec<String>, String)>,
    config: FieldMatcherConfig,
}

impl FieldMatcher {
    #[must_use]
    pub fn new(descriptors: Vec<FieldDescriptor>, config: FieldMatcherConfig) -> Self {
        let keywords = DEFAULT_KEYWORDS
            .iter()
            .map(|(terms, key)| {
                (
                    terms.iter().map(|t| (*t).to_string()).collect(),
                    (*key).to_string(),
                )
            })
            .collect();
        Self {
            descriptors,
            keywords,
            config,
        }
    }

    /// Replace the keyword fallback table.
    #[must_use]
    pub fn with_keywords(mut self, keywords: Vec<(Vec<String>, String)>) -> Self {
        self.keywords = keywords;
        self
    }

    #[must_use]
    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    /// Single-field mode: resolve the one attribute the query asks about.
    ///
    /// The best descriptor is accepted outright above `single_threshold`.
    /// At or below `fallback_threshold` the keyword table gets a chance.
    /// The mid-confidence band deliberately resolves to `NoFieldMatch` so
    /// the caller prompts instead of guessing.
    ///
    /// # Errors
    /// `NluError::NoFieldMatch` when nothing is confident enough;
    /// `NluError::DimensionMismatch` on a foreign query vector.
    pub fn match_field(&self, query: &str, query_vector: &[f32]) -> Result<String, NluError> {
        let mut best: Option<(&FieldDescriptor, f64)> = None;
        for descriptor in &self.descriptors {
            let similarity = scoring::cosine_similarity(query_vector, &descriptor.vector)?;
            if best.is_none_or(|(_, s)| similarity > s) {
                best = Some((descriptor, similarity));
            }
        }

        let Some((descriptor, similarity)) = best else {
            return Err(NluError::NoFieldMatch);
        };

        if similarity > self.config.single_threshold {
            let key = normalize_key(&descriptor.key);
            debug!("field {key} matched semantically at {similarity:.3}");
            return Ok(key);
        }

        if similarity <= self.config.fallback_threshold {
            if let Some(key) = self.keyword_fallback(query) {
                debug!("field {key} matched via keyword fallback");
                return Ok(key);
            }
        }

        Err(NluError::NoFieldMatch)
    }

    /// Ranked mode: the top `limit` normalized keys, by similarity, that have
    /// a non-null value in the target record. Variants collapse to one entry.
    ///
    /// # Errors
    /// `NluError::DimensionMismatch` on a foreign query vector.
    pub fn rank_fields(
        &self,
        query_vector: &[f32],
        record: &StationRecord,
        limit: usize,
    ) -> Result<Vec<(String, String)>, NluError> {
        let mut scored = self
            .descriptors
            .iter()
            .map(|d| scoring::cosine_similarity(query_vector, &d.vector).map(|s| (d, s)))
            .collect::<Result<Vec<_>, _>>()?;

        scored.par_sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut ranked: Vec<(String, String)> = Vec::with_capacity(limit);
        for (descriptor, _) in scored {
            if ranked.len() == limit {
                break;
            }
            let key = normalize_key(&descriptor.key);
            if ranked.iter().any(|(k, _)| *k == key) {
                continue;
            }
            if let Some(value) = record.value(&key) {
                ranked.push((key, value.to_string()));
            }
        }

        Ok(ranked)
    }

    fn keyword_fallback(&self, query: &str) -> Option<String> {
        let lower = query.to_lowercase();
        for (terms, key) in &self.keywords {
            if terms.iter().any(|t| lower.contains(t.as_str())) {
                return Some(key.clone());
            }
        }
        None
    }
}
