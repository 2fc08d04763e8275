use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the knowledge-base server.
#[derive(Debug)]
pub struct Config {
    /// Base URL of the OpenAI-compatible provider serving embeddings and completions.
    pub openai_base_url: String,
    /// Optional bearer token for the provider; omitted for keyless local runtimes.
    pub openai_api_key: Option<String>,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Chat model identifier used by the query planner.
    pub generation_model: String,
    /// Path of the JSON corpus file loaded on `buildIndex`.
    pub knowledge_base_path: String,
    /// Maximum chunk length in characters.
    pub chunk_max_chars: usize,
    /// Characters of the previous chunk prepended to each following chunk.
    pub chunk_overlap_chars: usize,
    /// Number of chunk texts sent per embedding request.
    pub embed_batch_size: usize,
    /// Result count used when a search request omits `topK`.
    pub search_default_top_k: usize,
    /// Upper bound applied to requested `topK` values.
    pub search_max_top_k: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            openai_base_url: load_env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_api_key: load_env_optional("OPENAI_API_KEY"),
            embedding_model: load_env_or("EMBEDDING_MODEL", "text-embedding-3-small"),
            generation_model: load_env_or("GENERATION_MODEL", "gpt-4o-mini"),
            knowledge_base_path: load_env_or("KNOWLEDGE_BASE_PATH", "data/knowledge_base.json"),
            chunk_max_chars: parse_env_or("CHUNK_MAX_CHARS", 800)?,
            chunk_overlap_chars: parse_env_or("CHUNK_OVERLAP_CHARS", 120)?,
            embed_batch_size: parse_env_or("EMBED_BATCH_SIZE", 40)?,
            search_default_top_k: parse_env_or("SEARCH_DEFAULT_TOP_K", 5)?,
            search_max_top_k: parse_env_or("SEARCH_MAX_TOP_K", 20)?,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        };
        if config.chunk_max_chars == 0 {
            return Err(ConfigError::InvalidValue("CHUNK_MAX_CHARS".into()));
        }
        if config.embed_batch_size == 0 {
            return Err(ConfigError::InvalidValue("EMBED_BATCH_SIZE".into()));
        }
        Ok(config)
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_or(key: &str, default: &str) -> String {
    load_env_optional(key).unwrap_or_else(|| default.to_string())
}

fn parse_env_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        base_url = %config.openai_base_url,
        embedding_model = %config.embedding_model,
        generation_model = %config.generation_model,
        knowledge_base = %config.knowledge_base_path,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
