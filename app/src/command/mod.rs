//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy with its own input type, dispatched
//! statically from `main`. Shared wiring (config, provider, corpus, router)
//! lives here so every strategy builds the same stack.

use std::sync::Arc;
use std::time::Duration;

use ridewise_config::Config;
use ridewise_dialogue::{InMemorySessionStore, IntentRouter, RouterConfig, SessionStore};
use ridewise_nlu::CorpusBundle;
use ridewise_providers::HfProvider;
use tracing::info;

mod chat;
mod corpus;
mod init;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use corpus::CorpusStrategy;
pub use init::InitStrategy;
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
///
/// Each strategy defines its own input type via the associated type; all
/// calls are monomorphized at compile time.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Load config, corpora, and providers, and wire up the router.
pub fn init_router() -> anyhow::Result<IntentRouter<HfProvider, HfProvider>> {
    let config = Config::load()?;
    info!("Loaded config from ~/ridewise/config.json");

    let provider = build_provider(&config);

    let corpus = CorpusBundle::load(&config.data.dir)?;
    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());

    Ok(IntentRouter::new(
        provider.clone(),
        provider,
        Arc::new(corpus),
        store,
        build_router_config(&config),
    ))
}

pub fn build_provider(config: &Config) -> HfProvider {
    let hf = &config.providers.huggingface;
    let mut provider = HfProvider::new(hf.api_key.clone());
    if let Some(model) = &hf.embedding_model {
        provider = provider.with_embedding_model(model.clone());
    }
    if let Some(model) = &hf.phrasing_model {
        provider = provider.with_phrasing_model(model.clone());
    }
    provider
}

fn build_router_config(config: &Config) -> RouterConfig {
    RouterConfig {
        relevance_threshold: config.matching.relevance_threshold,
        top_intents: config.matching.top_intents,
        ranked_fields: config.matching.ranked_fields,
        fuzzy_max_distance: config.matching.fuzzy_max_distance,
        field: config.matching.field,
        default_session: config.dialogue.default_session.clone(),
        default_station: config.dialogue.default_station.clone(),
        request_timeout: Duration::from_secs(config.dialogue.request_timeout_secs),
    }
}
