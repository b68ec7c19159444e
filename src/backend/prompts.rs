//! Persona directives sent to the model as system instructions

/// Persona used when nothing else is chosen
pub const DEFAULT_PERSONA: &str = "Motivator";

/// Personas the prompt has a style guide for
pub const KNOWN_PERSONAS: &[&str] = &["Motivator", "Philosopher", "Sarcastic Self"];

/// Maximum answer length the model is asked to respect
pub const MAX_ANSWER_WORDS: usize = 30;

/// Build the system instruction for a persona.
///
/// Unknown personas still get a directive; the model is told who to be
/// and the style guide is kept for reference.
pub fn persona_prompt(persona: &str) -> String {
    let persona = persona.trim();
    let persona = if persona.is_empty() {
        DEFAULT_PERSONA
    } else {
        persona
    };

    format!(
        r#"You are "{persona}". Your task is to analyze the user's thought and provide a short, accurate answer in your style.
- Motivator: Motivate and support.
- Philosopher: Encourage deep thought.
- Sarcastic Self: Use irony and sharp humor.
Maximum answer length: {MAX_ANSWER_WORDS} words. Answer in English."#
    )
}

/// Check whether a persona has a dedicated style line
pub fn is_known_persona(persona: &str) -> bool {
    KNOWN_PERSONAS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(persona.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_persona() {
        let prompt = persona_prompt("Philosopher");
        assert!(prompt.starts_with(r#"You are "Philosopher"."#));
        assert!(prompt.contains("30 words"));
    }

    #[test]
    fn test_blank_persona_uses_default() {
        assert!(persona_prompt("  ").contains(r#""Motivator""#));
    }

    #[test]
    fn test_known_personas() {
        assert!(is_known_persona("sarcastic self"));
        assert!(is_known_persona("Motivator"));
        assert!(!is_known_persona("Pirate"));
    }
}
