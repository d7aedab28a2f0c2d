//! Orchestrates one resolution step per query.
//!
//! Turn order: embed, domain gate (only while the session is empty), intent
//! lookup (informational), station slot, field slot, then the terminal
//! lookup-and-phrase step. Matcher misses become clarification prompts;
//! upstream failures become a generic error reply; the session mutex is held
//! from after the embed call until the turn's state work is done.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use ridewise_core::{
    EmbeddingProvider, IntentMatch, PhrasingProvider, ReplyKind, ResolvedFact, TurnResponse,
};
use ridewise_nlu::{
    CorpusBundle, FieldMatcher, FieldMatcherConfig, NluError, StationMatcher, cosine_similarity,
};

use crate::error::DialogueError;
use crate::session::{SessionSlots, SlotState};
use crate::store::SessionStore;

/// Router tunables, injected from configuration.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Domain gate: queries must exceed this similarity to the domain
    /// reference vector.
    pub relevance_threshold: f64,
    /// How many intent candidates to rank per turn.
    pub top_intents: usize,
    /// How many context fields to hand the phrasing service.
    pub ranked_fields: usize,
    /// Fuzzy station matching acceptance ceiling.
    pub fuzzy_max_distance: f64,
    /// Field matcher thresholds.
    pub field: FieldMatcherConfig,
    /// Session id used when the caller supplies none.
    pub default_session: String,
    /// Station to assume when none can be resolved. Off by default; set it
    /// to restore silent defaulting instead of prompting.
    pub default_station: Option<String>,
    /// Hard ceiling on each upstream call.
    pub request_timeout: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: 0.1,
            top_intents: 5,
            ranked_fields: 5,
            fuzzy_max_distance: 0.5,
            field: FieldMatcherConfig::default(),
            default_session: "cli:default".to_string(),
            default_station: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The dialogue engine's single entry point: one call per user query.
pub struct IntentRouter<E, P> {
    embedder: E,
    phraser: P,
    corpus: Arc<CorpusBundle>,
    stations: StationMatcher,
    fields: FieldMatcher,
    store: Arc<dyn SessionStore>,
    config: RouterConfig,
}

impl<E, P> IntentRouter<E, P>
where
    E: EmbeddingProvider,
    P: PhrasingProvider,
{
    #[must_use]
    pub fn new(
        embedder: E,
        phraser: P,
        corpus: Arc<CorpusBundle>,
        store: Arc<dyn SessionStore>,
        config: RouterConfig,
    ) -> Self {
        let stations = StationMatcher::new(corpus.facts.station_names())
            .with_max_distance(config.fuzzy_max_distance);
        let fields = FieldMatcher::new(corpus.descriptors.clone(), config.field);
        Self {
            embedder,
            phraser,
            corpus,
            stations,
            fields,
            store,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Run one resolution step for a query.
    ///
    /// Never fails: every failure mode degrades to a structured reply, and
    /// the session is left in a defined state.
    pub async fn handle_query(&self, session_id: Option<&str>, query: &str) -> TurnResponse {
        let sid = session_id.unwrap_or(&self.config.default_session).to_string();
        info!("session {sid}: handling query \"{query}\"");

        match self.try_turn(&sid, query).await {
            Ok(response) => response,
            Err(err) => {
                error!("session {sid}: request failed: {err}");
                TurnResponse {
                    session_id: sid,
                    in_domain: false,
                    intents: Vec::new(),
                    station: None,
                    field: None,
                    kind: ReplyKind::Error,
                    reply: "Sorry, something went wrong!".to_string(),
                }
            }
        }
    }

    async fn try_turn(&self, sid: &str, query: &str) -> Result<TurnResponse, DialogueError> {
        let query_vector = self.embed(query).await?;

        let entry = self.store.get_or_create(sid).await;
        let mut slots = entry.lock().await;

        // The gate runs only before any slot is filled; a clarification
        // answer ("Fruitvale") need not resemble the domain reference.
        if slots.state() == SlotState::Empty {
            let relevance = cosine_similarity(&query_vector, &self.corpus.domain)?;
            debug!("session {sid}: domain relevance {relevance:.4}");
            if relevance <= self.config.relevance_threshold {
                info!("session {sid}: out of domain");
                return Ok(Self::response(
                    sid,
                    &slots,
                    false,
                    Vec::new(),
                    ReplyKind::OutOfDomain,
                    "I can only help with questions about the transit network: stations, \
                     parking, schedules and alerts."
                        .to_string(),
                ));
            }
        }

        let intents = self
            .corpus
            .index
            .top_intents(&query_vector, self.config.top_intents)?;
        for candidate in &intents {
            debug!(
                "session {sid}: intent {} ({:.4}) via \"{}\"",
                candidate.intent, candidate.similarity, candidate.text
            );
        }

        // Station slot: sticky once filled, never re-resolved this session.
        let station = if let Some(station) = slots.station.clone() {
            station
        } else {
            match self.stations.match_station(query) {
                Ok(station) => {
                    info!("session {sid}: station resolved to {station}");
                    slots.station = Some(station.clone());
                    station
                }
                Err(NluError::NoConfidentMatch) => {
                    if let Some(default) = self.config.default_station.clone() {
                        warn!("session {sid}: no confident station, assuming default {default}");
                        slots.station = Some(default.clone());
                        default
                    } else {
                        return Ok(Self::response(
                            sid,
                            &slots,
                            true,
                            intents,
                            ReplyKind::AskStation,
                            "Which station are you asking about?".to_string(),
                        ));
                    }
                }
                Err(err) => return Err(err.into()),
            }
        };

        // Field slot.
        let field = if let Some(field) = slots.field.clone() {
            field
        } else {
            match self.fields.match_field(query, &query_vector) {
                Ok(field) => {
                    info!("session {sid}: field resolved to {field}");
                    slots.field = Some(field.clone());
                    field
                }
                Err(NluError::NoFieldMatch) => {
                    return Ok(Self::response(
                        sid,
                        &slots,
                        true,
                        intents,
                        ReplyKind::AskField,
                        format!("What would you like to know about {station}?"),
                    ));
                }
                Err(err) => return Err(err.into()),
            }
        };

        // Both slots filled: this turn is terminal whatever happens next.
        let record = self.corpus.facts.get(&station);
        let value = record.and_then(|r| r.value(&field).map(str::to_string));

        let Some(value) = value else {
            info!("session {sid}: no data for {station}/{field}");
            slots.clear();
            return Ok(TurnResponse {
                session_id: sid.to_string(),
                in_domain: true,
                intents,
                station: Some(station.clone()),
                field: Some(field.clone()),
                kind: ReplyKind::NoData,
                reply: format!(
                    "I don't have {} information for {station}.",
                    field.replace('_', " ")
                ),
            });
        };

        // Terminal from here on: clear before anything else can fail.
        slots.clear();
        drop(slots);

        let context = match record {
            Some(record) => self
                .fields
                .rank_fields(&query_vector, record, self.config.ranked_fields)?,
            None => Vec::new(),
        };

        let fact = ResolvedFact {
            station,
            field,
            value,
            context,
        };

        let reply = match self.phrase(query, &fact).await {
            Ok(sentence) => sentence,
            Err(err) => {
                warn!("session {sid}: phrasing unavailable, using template: {err}");
                template_reply(&fact)
            }
        };

        Ok(TurnResponse {
            session_id: sid.to_string(),
            in_domain: true,
            intents,
            station: Some(fact.station),
            field: Some(fact.field),
            kind: ReplyKind::Answer,
            reply,
        })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, DialogueError> {
        match tokio::time::timeout(self.config.request_timeout, self.embedder.embed(text)).await {
            Ok(Ok(vector)) => Ok(vector),
            Ok(Err(err)) => Err(DialogueError::Upstream(err)),
            Err(_) => Err(DialogueError::Timeout(self.config.request_timeout)),
        }
    }

    async fn phrase(&self, query: &str, fact: &ResolvedFact) -> Result<String, DialogueError> {
        match tokio::time::timeout(self.config.request_timeout, self.phraser.phrase(query, fact))
            .await
        {
            Ok(Ok(sentence)) => Ok(sentence),
            Ok(Err(err)) => Err(DialogueError::Upstream(err)),
            Err(_) => Err(DialogueError::Timeout(self.config.request_timeout)),
        }
    }

    fn response(
        sid: &str,
        slots: &SessionSlots,
        in_domain: bool,
        intents: Vec<IntentMatch>,
        kind: ReplyKind,
        reply: String,
    ) -> TurnResponse {
        TurnResponse {
            session_id: sid.to_string(),
            in_domain,
            intents,
            station: slots.station.clone(),
            field: slots.field.clone(),
            kind,
            reply,
        }
    }
}

/// Plain fallback sentence when the phrasing service is unavailable.
fn template_reply(fact: &ResolvedFact) -> String {
    format!(
        "{} at {}: {}",
        capitalize(&fact.field.replace('_', " ")),
        fact.station,
        fact.value
    )
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}
