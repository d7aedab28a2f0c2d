use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// Threshold types live in ridewise_nlu to avoid duplication
use ridewise_nlu::FieldMatcherConfig;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub dialogue: DialogueConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub huggingface: ProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phrasing_model: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DataConfig {
    /// Directory holding the corpus files and the station facts dataset.
    #[serde(default = "DataConfig::default_dir")]
    pub dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
        }
    }
}

impl DataConfig {
    fn default_dir() -> PathBuf {
        dirs::home_dir().map_or_else(|| PathBuf::from("data"), |home| home.join("ridewise/data"))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MatchingConfig {
    /// Domain gate: queries must exceed this similarity to the domain
    /// reference vector to count as in-domain.
    #[serde(default = "MatchingConfig::default_relevance_threshold")]
    pub relevance_threshold: f64,
    #[serde(default)]
    pub field: FieldMatcherConfig,
    /// Fuzzy station matching acceptance ceiling (normalized distance).
    #[serde(default = "MatchingConfig::default_fuzzy_max_distance")]
    pub fuzzy_max_distance: f64,
    #[serde(default = "MatchingConfig::default_top_intents")]
    pub top_intents: usize,
    #[serde(default = "MatchingConfig::default_ranked_fields")]
    pub ranked_fields: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: Self::default_relevance_threshold(),
            field: FieldMatcherConfig::default(),
            fuzzy_max_distance: Self::default_fuzzy_max_distance(),
            top_intents: Self::default_top_intents(),
            ranked_fields: Self::default_ranked_fields(),
        }
    }
}

impl MatchingConfig {
    const fn default_relevance_threshold() -> f64 {
        0.1
    }

    const fn default_fuzzy_max_distance() -> f64 {
        0.5
    }

    const fn default_top_intents() -> usize {
        5
    }

    const fn default_ranked_fields() -> usize {
        5
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DialogueConfig {
    /// Session id used when the caller supplies none.
    #[serde(default = "DialogueConfig::default_session")]
    pub default_session: String,
    /// Station assumed when none can be resolved. Unset means prompt instead.
    #[serde(default)]
    pub default_station: Option<String>,
    #[serde(default = "DialogueConfig::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            default_session: Self::default_session(),
            default_station: None,
            request_timeout_secs: Self::default_request_timeout_secs(),
        }
    }
}

impl DialogueConfig {
    fn default_session() -> String {
        "cli:default".to_string()
    }

    const fn default_request_timeout_secs() -> u64 {
        30
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_dir()?.join("config.json");

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'ridewise init' to create config.",
                config_path.display()
            );
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = serde_json::from_str(&content)?;

        Ok(config)
    }

    fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("ridewise"))
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        let config_template = r#"{
  "providers": {
    "huggingface": {
      "api_key": "your-huggingface-api-key-here",
      "embedding_model": "sentence-transformers/all-MiniLM-L6-v2",
      "phrasing_model": "meta-llama/Llama-3.1-8B-Instruct"
    }
  },
  "matching": {
    "relevance_threshold": 0.1,
    "field": {
      "single_threshold": 0.7,
      "fallback_threshold": 0.1
    },
    "fuzzy_max_distance": 0.5,
    "top_intents": 5,
    "ranked_fields": 5
  },
  "dialogue": {
    "default_session": "cli:default",
    "default_station": null,
    "request_timeout_secs": 30
  }
}"#;

        std::fs::write(&config_path, config_template)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Edit the config file and add your Hugging Face API key");
        println!("   2. Run 'ridewise corpus' to generate the embedding corpora");
        println!("   3. Run 'ridewise chat' to start a conversation");
        println!();
        println!("🔧 Configuration options:");
        println!("   - matching.relevance_threshold: domain gate similarity cutoff");
        println!("   - matching.field: thresholds for attribute matching");
        println!("   - dialogue.default_station: set to skip the station prompt");
        println!();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"providers": {"huggingface": {"api_key": "k"}}}"#).unwrap();

        assert!((config.matching.relevance_threshold - 0.1).abs() < f64::EPSILON);
        assert!((config.matching.field.single_threshold - 0.7).abs() < f64::EPSILON);
        assert!((config.matching.fuzzy_max_distance - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.matching.top_intents, 5);
        assert_eq!(config.dialogue.default_session, "cli:default");
        assert!(config.dialogue.default_station.is_none());
        assert_eq!(config.dialogue.request_timeout_secs, 30);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config: Config = serde_json::from_str(
            r#"{
                "providers": {"huggingface": {"api_key": "k"}},
                "matching": {"relevance_threshold": 0.25},
                "dialogue": {"default_station": "MacArthur"}
            }"#,
        )
        .unwrap();

        assert!((config.matching.relevance_threshold - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.dialogue.default_station.as_deref(), Some("MacArthur"));
        // untouched siblings still default
        assert_eq!(config.dialogue.default_session, "cli:default");
    }
}
