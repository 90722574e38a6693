//! Model query client module.

mod client;

pub use client::{
    clean_generated_text, ConfigError, ModelClient, ModelConfig, QueryError, QueryOptions,
    DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_MAX_TOKENS, DEFAULT_RETRY_DELAY_MS,
    DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS, DEFAULT_TOP_P,
};
