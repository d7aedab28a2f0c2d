//! End-to-end router tests over an in-code corpus and stubbed providers.
//!
//! The vector space is 4-dimensional with hand-picked axes: component 0 is
//! "transit domain", 1 is "cost", 2 is "availability", 3 is everything else.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ridewise_core::{EmbeddingProvider, PhrasingProvider, ReplyKind, ResolvedFact};
use ridewise_dialogue::{InMemorySessionStore, IntentRouter, RouterConfig, SessionStore};
use ridewise_nlu::{CorpusBundle, Exemplar, FieldDescriptor};

struct StaticEmbedder {
    map: HashMap<String, Vec<f32>>,
}

impl StaticEmbedder {
    fn new(entries: &[(&str, [f32; 4])]) -> Self {
        Self {
            map: entries
                .iter()
                .map(|(text, vector)| ((*text).to_string(), vector.to_vec()))
                .collect(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for StaticEmbedder {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.map
            .get(text)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no embedding stubbed for \"{text}\""))
    }
}

struct SlowEmbedder;

#[async_trait]
impl EmbeddingProvider for SlowEmbedder {
    async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok(vec![1.0, 0.0, 0.0, 0.0])
    }
}

struct EchoPhraser;

#[async_trait]
impl PhrasingProvider for EchoPhraser {
    async fn phrase(&self, _query: &str, fact: &ResolvedFact) -> anyhow::Result<String> {
        let context_keys: Vec<&str> = fact.context.iter().map(|(k, _)| k.as_str()).collect();
        Ok(format!(
            "{} for {} is {} [ctx: {}]",
            fact.field,
            fact.station,
            fact.value,
            context_keys.join(", ")
        ))
    }
}

struct FailingPhraser;

#[async_trait]
impl PhrasingProvider for FailingPhraser {
    async fn phrase(&self, _query: &str, _fact: &ResolvedFact) -> anyhow::Result<String> {
        anyhow::bail!("phrasing service is down")
    }
}

fn corpus() -> Arc<CorpusBundle> {
    let domain = vec![1.0, 0.0, 0.0, 0.0];

    let exemplars = vec![
        Exemplar {
            intent: "general_parking_information".to_string(),
            text: "What is the parking cost?".to_string(),
            vector: vec![0.3, 0.9, 0.0, 0.0],
        },
        Exemplar {
            intent: "general_parking_information".to_string(),
            text: "How many parking spots are available?".to_string(),
            vector: vec![0.3, 0.0, 0.9, 0.0],
        },
        Exemplar {
            intent: "station_schedule".to_string(),
            text: "When does the first train leave?".to_string(),
            vector: vec![0.9, 0.0, 0.0, 0.3],
        },
    ];

    let descriptor = |key: &str, vector: [f32; 4]| FieldDescriptor {
        key: key.to_string(),
        description: key.replace('_', " "),
        vector: vector.to_vec(),
    };
    let descriptors = vec![
        descriptor("parking_cost", [0.0, 1.0, 0.0, 0.0]),
        descriptor("parking_cost_alt1", [0.05, 0.95, 0.0, 0.0]),
        descriptor("available_spots", [0.0, 0.0, 1.0, 0.0]),
        descriptor("has_parking", [0.0, 0.0, 0.0, 1.0]),
    ];

    let facts = serde_json::from_str(
        r#"{
            "MacArthur": {
                "parking_cost": "$5 per day",
                "available_spots": "120",
                "has_parking": "yes"
            },
            "Fruitvale": {
                "parking_cost": "$3 per day",
                "available_spots": null,
                "has_parking": "yes"
            },
            "Oakland": {
                "parking_cost": null,
                "available_spots": "80",
                "has_parking": "yes"
            }
        }"#,
    )
    .unwrap();

    Arc::new(CorpusBundle::new(domain, exemplars, descriptors, facts).unwrap())
}

fn embedder() -> StaticEmbedder {
    StaticEmbedder::new(&[
        ("What's the EV parking cost at Fruitvale?", [0.5, 0.8, 0.05, 0.0]),
        ("macarthur parking cost", [0.4, 0.85, 0.1, 0.0]),
        ("tell me about oakland", [0.6, 0.05, 0.05, 0.1]),
        ("tell me about fruitvale", [0.6, 0.05, 0.05, 0.1]),
        ("how much does it cost", [0.2, 0.0, 0.0, 0.02]),
        ("what is the parking cost", [0.3, 0.9, 0.0, 0.0]),
        ("Fruitvale", [0.4, 0.1, 0.1, 0.0]),
        ("parking cost please", [0.2, 0.9, 0.0, 0.0]),
        ("how many spots are left", [0.2, 0.0, 0.9, 0.0]),
        ("what's a good pizza recipe", [0.02, 0.0, 0.0, 0.9]),
    ])
}

fn router_with_store(
    store: Arc<InMemorySessionStore>,
) -> IntentRouter<StaticEmbedder, EchoPhraser> {
    IntentRouter::new(
        embedder(),
        EchoPhraser,
        corpus(),
        store,
        RouterConfig::default(),
    )
}

fn router() -> IntentRouter<StaticEmbedder, EchoPhraser> {
    router_with_store(Arc::new(InMemorySessionStore::new()))
}

#[tokio::test]
async fn single_utterance_resolves_in_one_turn() {
    let r = router();

    let response = r
        .handle_query(Some("s1"), "What's the EV parking cost at Fruitvale?")
        .await;

    assert_eq!(response.kind, ReplyKind::Answer);
    assert!(response.in_domain);
    assert_eq!(response.station.as_deref(), Some("Fruitvale"));
    assert_eq!(response.field.as_deref(), Some("parking_cost"));
    assert!(response.reply.contains("$3 per day"));
    assert_eq!(response.intents[0].intent, "general_parking_information");
}

#[tokio::test]
async fn ranked_context_excludes_null_fields() {
    let r = router();

    let response = r
        .handle_query(Some("s1"), "What's the EV parking cost at Fruitvale?")
        .await;

    // Fruitvale records available_spots as null, so it must not be context
    assert!(response.reply.contains("parking_cost"));
    assert!(!response.reply.contains("available_spots"));
}

#[tokio::test]
async fn station_only_turn_asks_for_field_then_answers() {
    let r = router();

    let first = r.handle_query(Some("s2"), "tell me about fruitvale").await;
    assert_eq!(first.kind, ReplyKind::AskField);
    assert_eq!(first.station.as_deref(), Some("Fruitvale"));
    assert!(first.reply.contains("Fruitvale"));

    let second = r.handle_query(Some("s2"), "parking cost please").await;
    assert_eq!(second.kind, ReplyKind::Answer);
    assert_eq!(second.station.as_deref(), Some("Fruitvale"));
    assert!(second.reply.contains("$3 per day"));
}

#[tokio::test]
async fn field_only_turn_asks_for_station_first() {
    let r = router();

    // The field would be resolvable, but the station slot comes first and
    // stays empty, so the turn ends in a station prompt.
    let response = r.handle_query(Some("s3"), "what is the parking cost").await;
    assert_eq!(response.kind, ReplyKind::AskStation);
    assert!(response.station.is_none());
    assert!(response.field.is_none());
}

#[tokio::test]
async fn full_progression_and_clearing() {
    let r = router();

    let first = r.handle_query(Some("s4"), "what is the parking cost").await;
    assert_eq!(first.kind, ReplyKind::AskStation);

    let second = r.handle_query(Some("s4"), "Fruitvale").await;
    assert_eq!(second.kind, ReplyKind::AskField);
    assert_eq!(second.station.as_deref(), Some("Fruitvale"));

    let third = r.handle_query(Some("s4"), "parking cost please").await;
    assert_eq!(third.kind, ReplyKind::Answer);

    // Terminal turn cleared the session: a stationless follow-up starts over.
    let fourth = r.handle_query(Some("s4"), "how much does it cost").await;
    assert_eq!(fourth.kind, ReplyKind::AskStation);
    assert!(fourth.station.is_none());
}

#[tokio::test]
async fn keyword_fallback_and_no_data_clear_session() {
    let r = router();

    let first = r.handle_query(Some("s5"), "tell me about oakland").await;
    assert_eq!(first.kind, ReplyKind::AskField);

    // Semantically nowhere near the catalog, but the text says "cost";
    // Oakland has no recorded parking cost.
    let second = r.handle_query(Some("s5"), "how much does it cost").await;
    assert_eq!(second.kind, ReplyKind::NoData);
    assert_eq!(second.station.as_deref(), Some("Oakland"));
    assert_eq!(second.field.as_deref(), Some("parking_cost"));

    // The miss was terminal: no Oakland stickiness remains.
    let third = r.handle_query(Some("s5"), "how much does it cost").await;
    assert_eq!(third.kind, ReplyKind::AskStation);
}

#[tokio::test]
async fn out_of_domain_never_touches_resolution() {
    let store = Arc::new(InMemorySessionStore::new());
    let r = router_with_store(Arc::clone(&store));

    let response = r
        .handle_query(Some("s6"), "what's a good pizza recipe")
        .await;

    assert_eq!(response.kind, ReplyKind::OutOfDomain);
    assert!(!response.in_domain);
    assert!(response.intents.is_empty());
    assert!(response.station.is_none());
    assert!(response.field.is_none());

    let slots = store.get_or_create("s6").await;
    assert!(slots.lock().await.station.is_none());
}

#[tokio::test]
async fn similarity_at_threshold_is_out_of_domain() {
    let store = Arc::new(InMemorySessionStore::new());
    let config = RouterConfig {
        relevance_threshold: 1.0,
        ..RouterConfig::default()
    };
    let e = StaticEmbedder::new(&[("macarthur parking cost", [1.0, 0.0, 0.0, 0.0])]);
    let r = IntentRouter::new(e, EchoPhraser, corpus(), store, config);

    // Identical to the domain reference: similarity is exactly 1.0, which is
    // at (not above) the threshold.
    let response = r.handle_query(Some("s7"), "macarthur parking cost").await;
    assert_eq!(response.kind, ReplyKind::OutOfDomain);
}

#[tokio::test]
async fn concurrent_sessions_never_leak_slots() {
    let r = router();

    let (a1, b1) = tokio::join!(
        r.handle_query(Some("alice"), "tell me about oakland"),
        r.handle_query(Some("bob"), "tell me about fruitvale"),
    );
    assert_eq!(a1.station.as_deref(), Some("Oakland"));
    assert_eq!(b1.station.as_deref(), Some("Fruitvale"));

    let (a2, b2) = tokio::join!(
        r.handle_query(Some("alice"), "how many spots are left"),
        r.handle_query(Some("bob"), "how many spots are left"),
    );

    assert_eq!(a2.kind, ReplyKind::Answer);
    assert_eq!(a2.station.as_deref(), Some("Oakland"));
    assert!(a2.reply.contains("80"));

    // Fruitvale's spot count is null: bob gets a no-data reply, not alice's
    assert_eq!(b2.kind, ReplyKind::NoData);
    assert_eq!(b2.station.as_deref(), Some("Fruitvale"));
}

#[tokio::test]
async fn embedding_failure_is_request_scoped() {
    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let e = StaticEmbedder::new(&[]);
    let r = IntentRouter::new(
        e,
        EchoPhraser,
        corpus(),
        Arc::clone(&store),
        RouterConfig::default(),
    );

    let response = r.handle_query(Some("s8"), "macarthur parking cost").await;
    assert_eq!(response.kind, ReplyKind::Error);
    assert_eq!(response.reply, "Sorry, something went wrong!");

    let slots = store.get_or_create("s8").await;
    assert!(slots.lock().await.station.is_none());
}

#[tokio::test(start_paused = true)]
async fn stalled_embedding_call_times_out() {
    let config = RouterConfig {
        request_timeout: Duration::from_secs(5),
        ..RouterConfig::default()
    };
    let r = IntentRouter::new(
        SlowEmbedder,
        EchoPhraser,
        corpus(),
        Arc::new(InMemorySessionStore::new()),
        config,
    );

    let response = r.handle_query(Some("s9"), "macarthur parking cost").await;
    assert_eq!(response.kind, ReplyKind::Error);
}

#[tokio::test]
async fn phrasing_failure_falls_back_to_template() {
    let r = IntentRouter::new(
        embedder(),
        FailingPhraser,
        corpus(),
        Arc::new(InMemorySessionStore::new()),
        RouterConfig::default(),
    );

    let response = r.handle_query(Some("s10"), "macarthur parking cost").await;
    assert_eq!(response.kind, ReplyKind::Answer);
    assert_eq!(response.reply, "Parking cost at MacArthur: $5 per day");
}

#[tokio::test]
async fn configured_default_station_restores_silent_fallback() {
    let config = RouterConfig {
        default_station: Some("MacArthur".to_string()),
        ..RouterConfig::default()
    };
    let r = IntentRouter::new(
        embedder(),
        EchoPhraser,
        corpus(),
        Arc::new(InMemorySessionStore::new()),
        config,
    );

    let response = r.handle_query(Some("s11"), "what is the parking cost").await;
    assert_eq!(response.kind, ReplyKind::Answer);
    assert_eq!(response.station.as_deref(), Some("MacArthur"));
    assert!(response.reply.contains("$5 per day"));
}

#[tokio::test]
async fn missing_session_id_uses_shared_default() {
    let store = Arc::new(InMemorySessionStore::new());
    let r = router_with_store(Arc::clone(&store));

    let response = r.handle_query(None, "tell me about oakland").await;
    assert_eq!(response.session_id, "cli:default");
    assert_eq!(response.kind, ReplyKind::AskField);

    let slots = store.get_or_create("cli:default").await;
    assert_eq!(slots.lock().await.station.as_deref(), Some("Oakland"));
}
