//! Startup loading and validation of the pre-embedded corpora.
//!
//! Four read-only datasets back the engine: the domain reference vector, the
//! intent exemplar corpus, the field-descriptor catalog, and the station
//! facts. All are loaded once, validated for uniform dimensionality and a
//! closed key set, then shared without locking for the process lifetime.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, ensure};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::field::{FieldDescriptor, normalize_key};
use crate::intent::{Exemplar, ExemplarIndex};

pub const DOMAIN_FILE: &str = "domain_embedding.json";
pub const INTENTS_FILE: &str = "intent_embeddings.json";
pub const FIELDS_FILE: &str = "field_embeddings.json";
pub const FACTS_FILE: &str = "station_facts.json";

#[derive(Debug, Clone, Deserialize)]
struct RawExemplar {
    question: String,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawDescriptor {
    description: String,
    embedding: Vec<f32>,
}

/// Attribute values recorded for one station.
///
/// A `None` value is retained on purpose: the key is known to the schema but
/// the dataset has nothing recorded for this station.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationRecord {
    pub fields: BTreeMap<String, Option<String>>,
}

impl StationRecord {
    /// The recorded value for a normalized field key, if any.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Option::as_deref)
    }
}

/// The read-only station → attribute → value dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationFacts {
    stations: BTreeMap<String, StationRecord>,
}

impl StationFacts {
    #[must_use]
    pub const fn new(stations: BTreeMap<String, StationRecord>) -> Self {
        Self { stations }
    }

    #[must_use]
    pub fn get(&self, station: &str) -> Option<&StationRecord> {
        self.stations.get(station)
    }

    /// Canonical station names in deterministic order.
    #[must_use]
    pub fn station_names(&self) -> Vec<String> {
        self.stations.keys().cloned().collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

/// Everything the router needs, loaded once at startup.
#[derive(Debug)]
pub struct CorpusBundle {
    pub domain: Vec<f32>,
    pub index: ExemplarIndex,
    pub descriptors: Vec<FieldDescriptor>,
    pub facts: StationFacts,
    pub dimension: usize,
}

impl CorpusBundle {
    /// Assemble and validate a bundle from already-parsed parts.
    ///
    /// # Errors
    /// Any dimensionality disagreement, an empty station set, or a fact key
    /// outside the normalized descriptor catalog is a startup-fatal error.
    pub fn new(
        domain: Vec<f32>,
        exemplars: Vec<Exemplar>,
        descriptors: Vec<FieldDescriptor>,
        facts: StationFacts,
    ) -> anyhow::Result<Self> {
        ensure!(!domain.is_empty(), "domain reference vector is empty");
        let dimension = domain.len();

        for exemplar in &exemplars {
            ensure!(
                exemplar.vector.len() == dimension,
                "exemplar \"{}\" has dimension {}, corpus dimension is {dimension}",
                exemplar.text,
                exemplar.vector.len()
            );
        }

        for descriptor in &descriptors {
            ensure!(
                descriptor.vector.len() == dimension,
                "field descriptor \"{}\" has dimension {}, corpus dimension is {dimension}",
                descriptor.key,
                descriptor.vector.len()
            );
        }

        ensure!(!facts.is_empty(), "station facts dataset is empty");

        let known_keys: BTreeSet<String> = descriptors
            .iter()
            .map(|d| normalize_key(&d.key))
            .collect();
        for (station, record) in &facts.stations {
            for key in record.fields.keys() {
                ensure!(
                    known_keys.contains(key),
                    "station \"{station}\" records unknown field \"{key}\""
                );
            }
        }

        info!(
            "corpus loaded: dimension={dimension}, exemplars={}, fields={}, stations={}",
            exemplars.len(),
            descriptors.len(),
            facts.stations.len()
        );

        Ok(Self {
            domain,
            index: ExemplarIndex::new(exemplars),
            descriptors,
            facts,
            dimension,
        })
    }

    /// Load and validate all four corpus files from `dir`.
    ///
    /// # Errors
    /// Missing or malformed files, or any validation failure from [`Self::new`].
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let domain: Vec<f32> = read_json(dir, DOMAIN_FILE)?;

        let raw_intents: BTreeMap<String, Vec<RawExemplar>> = read_json(dir, INTENTS_FILE)?;
        let exemplars = raw_intents
            .into_iter()
            .flat_map(|(intent, questions)| {
                questions.into_iter().map(move |q| Exemplar {
                    intent: intent.clone(),
                    text: q.question,
                    vector: q.embedding,
                })
            })
            .collect();

        let raw_fields: BTreeMap<String, RawDescriptor> = read_json(dir, FIELDS_FILE)?;
        let descriptors = raw_fields
            .into_iter()
            .map(|(key, raw)| FieldDescriptor {
                key,
                description: raw.description,
                vector: raw.embedding,
            })
            .collect();

        let facts: StationFacts = read_json(dir, FACTS_FILE)?;

        Self::new(domain, exemplars, descriptors, facts)
    }
}

fn read_json<T: DeserializeOwned>(dir: &Path, file: &str) -> anyhow::Result<T> {
    let path = dir.join(file);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("reading corpus file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("parsing corpus file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exemplar(vector: Vec<f32>) -> Exemplar {
        Exemplar {
            intent: "parking".to_string(),
            text: "What is the parking cost?".to_string(),
            vector,
        }
    }

    fn descriptor(key: &str, vector: Vec<f32>) -> FieldDescriptor {
        FieldDescriptor {
            key: key.to_string(),
            description: String::new(),
            vector,
        }
    }

    fn facts(entries: &[(&str, &[(&str, Option<&str>)])]) -> StationFacts {
        StationFacts {
            stations: entries
                .iter()
                .map(|(station, fields)| {
                    (
                        (*station).to_string(),
                        StationRecord {
                            fields: fields
                                .iter()
                                .map(|(k, v)| ((*k).to_string(), v.map(str::to_string)))
                                .collect(),
                        },
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn valid_bundle_assembles() {
        let bundle = CorpusBundle::new(
            vec![1.0, 0.0],
            vec![exemplar(vec![0.0, 1.0])],
            vec![descriptor("parking_cost", vec![0.5, 0.5])],
            facts(&[("MacArthur", &[("parking_cost", Some("$5"))])]),
        )
        .unwrap();

        assert_eq!(bundle.dimension, 2);
        assert_eq!(bundle.index.len(), 1);
        assert_eq!(bundle.facts.station_names(), vec!["MacArthur".to_string()]);
    }

    #[test]
    fn exemplar_dimension_mismatch_fails() {
        let result = CorpusBundle::new(
            vec![1.0, 0.0],
            vec![exemplar(vec![0.0, 1.0, 0.0])],
            vec![],
            facts(&[("MacArthur", &[])]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn descriptor_dimension_mismatch_fails() {
        let result = CorpusBundle::new(
            vec![1.0, 0.0],
            vec![],
            vec![descriptor("parking_cost", vec![1.0])],
            facts(&[("MacArthur", &[])]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_fact_key_fails() {
        let result = CorpusBundle::new(
            vec![1.0, 0.0],
            vec![],
            vec![descriptor("parking_cost", vec![1.0, 0.0])],
            facts(&[("MacArthur", &[("helipad_count", Some("2"))])]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn variant_descriptor_covers_normalized_fact_key() {
        // the catalog only carries the variant; facts use the normalized key
        let result = CorpusBundle::new(
            vec![1.0, 0.0],
            vec![],
            vec![descriptor("parking_cost_alt1", vec![1.0, 0.0])],
            facts(&[("MacArthur", &[("parking_cost", Some("$5"))])]),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn empty_station_set_fails() {
        let result = CorpusBundle::new(vec![1.0, 0.0], vec![], vec![], facts(&[]));
        assert!(result.is_err());
    }

    #[test]
    fn null_values_survive_parsing() {
        let parsed: StationFacts = serde_json::from_str(
            r#"{"MacArthur": {"parking_cost": "$5", "available_spots": null}}"#,
        )
        .unwrap();

        let record = parsed.get("MacArthur").unwrap();
        assert_eq!(record.value("parking_cost"), Some("$5"));
        assert_eq!(record.value("available_spots"), None);
        assert!(record.fields.contains_key("available_spots"));
    }
}
