//! Short model aliases accepted by the shell, mapped to inference model IDs.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Model used when nothing else is configured.
pub const DEFAULT_MODEL: &str = "HuggingFaceH4/zephyr-7b-beta";

/// Models offered for selection, in display order.
pub const KNOWN_MODELS: [&str; 4] = [
    "HuggingFaceH4/zephyr-7b-beta",
    "mistralai/Mistral-7B-Instruct-v0.2",
    "google/gemma-7b-it",
    "tiiuae/falcon-7b-instruct",
];

/// Mapping from short aliases to full model IDs.
pub static MODEL_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("zephyr", "HuggingFaceH4/zephyr-7b-beta");
    m.insert("mistral", "mistralai/Mistral-7B-Instruct-v0.2");
    m.insert("gemma", "google/gemma-7b-it");
    m.insert("falcon", "tiiuae/falcon-7b-instruct");

    m
});

/// Resolve a user-supplied model name.
///
/// Aliases are matched case-insensitively; anything else is taken as a full
/// model ID so custom models keep working.
pub fn resolve_model(name: &str) -> String {
    let name = name.trim();
    MODEL_ALIASES
        .get(name.to_lowercase().as_str())
        .map(|id| id.to_string())
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model() {
        assert_eq!(resolve_model("Mistral"), "mistralai/Mistral-7B-Instruct-v0.2");
        assert_eq!(resolve_model(" zephyr "), DEFAULT_MODEL);
        assert_eq!(resolve_model("org/custom-model"), "org/custom-model");
    }

    #[test]
    fn test_aliases_point_at_known_models() {
        for id in MODEL_ALIASES.values() {
            assert!(KNOWN_MODELS.contains(id), "{id} missing from KNOWN_MODELS");
        }
    }
}
