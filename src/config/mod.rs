//! Configuration module for FarminAi.

mod models;
mod prompts;

pub use models::{resolve_model, DEFAULT_MODEL, KNOWN_MODELS, MODEL_ALIASES};
pub use prompts::{
    build_prompt, ASSISTANT_MARKER, FALLBACK_REPLY, SYSTEM_PREAMBLE, TURN_MARKERS, USER_MARKER,
};
