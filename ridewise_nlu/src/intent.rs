//! Nearest-neighbor intent lookup over pre-embedded exemplar questions.

use ridewise_core::IntentMatch;
use tracing::debug;

use crate::error::NluError;
use crate::scoring;

/// One exemplar question, pre-labeled with an intent and pre-embedded.
#[derive(Debug, Clone)]
pub struct Exemplar {
    pub intent: String,
    pub text: String,
    pub vector: Vec<f32>,
}

/// Immutable intent→exemplar corpus with nearest-neighbor lookup.
///
/// Built once at startup; shared read-only for the process lifetime.
#[derive(Debug, Default)]
pub struct ExemplarIndex {
    entries: Vec<Exemplar>,
}

impl ExemplarIndex {
    #[must_use]
    pub const fn new(entries: Vec<Exemplar>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rank all exemplars against the query vector and keep the top `k`.
    ///
    /// Results are sorted by similarity descending; ties keep corpus
    /// insertion order (the sort is stable). An empty corpus yields an
    /// empty vector, never an error.
    ///
    /// # Errors
    /// `NluError::DimensionMismatch` if the query vector's length differs
    /// from the exemplar vectors'.
    pub fn top_intents(&self, query: &[f32], k: usize) -> Result<Vec<IntentMatch>, NluError> {
        let mut scored = Vec::with_capacity(self.entries.len());
        for exemplar in &self.entries {
            let similarity = scoring::cosine_similarity(query, &exemplar.vector)?;
            scored.push(IntentMatch {
                intent: exemplar.intent.clone(),
                text: exemplar.text.clone(),
                similarity,
            });
        }

        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(k);

        debug!("top {} intents ranked over {} exemplars", scored.len(), self.len());
        Ok(scored)
    }
}
