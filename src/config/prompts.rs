//! System preamble and turn markers for the farming assistant.

/// Marker that opens a user turn.
pub const USER_MARKER: &str = "Farmer:";

/// Marker that opens an assistant turn.
pub const ASSISTANT_MARKER: &str = "FarminAi:";

/// Both turn markers, in the order they are sent as stop sequences.
pub const TURN_MARKERS: [&str; 2] = [USER_MARKER, ASSISTANT_MARKER];

/// Reply used when the model produces nothing usable.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't understand your question.";

/// Fixed preamble placed before every question.
pub const SYSTEM_PREAMBLE: &str = r#"You are FarminAi, a friendly and knowledgeable farming assistant.
You help farmers with practical, clear and concise advice about:
- Crop rotation and planting schedules
- Soil health and fertilization
- Irrigation and water management
- Livestock care
- Pest and disease control
- Market tips and selling produce

Answer only the farmer's current question. Keep answers short and actionable.
If a question is not about agriculture, politely say that you can only help with farming topics."#;

/// Build the combined instruction sent to the model for a single question.
///
/// The prompt ends with the assistant marker so the model continues as
/// FarminAi; the markers are also used as stop sequences and to truncate
/// the generated text.
pub fn build_prompt(question: &str) -> String {
    format!(
        "{}\n\n{} {}\n{}",
        SYSTEM_PREAMBLE,
        USER_MARKER,
        question.trim(),
        ASSISTANT_MARKER
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_ends_with_assistant_marker() {
        let prompt = build_prompt("  How often should I water tomatoes?\n");
        assert!(prompt.starts_with(SYSTEM_PREAMBLE));
        assert!(prompt.contains("Farmer: How often should I water tomatoes?\nFarminAi:"));
        assert!(prompt.ends_with(ASSISTANT_MARKER));
    }
}
