//! Context assembly for backend calls
//!
//! The whole replay log is forwarded on every call. Length limits are the
//! backend's business; this module only fixes ordering and shape.

use super::state::Session;
use super::types::Turn;

/// Ordered turns to send alongside the next request.
///
/// Pure function of the session's replay log.
pub fn build_context(session: &Session) -> Vec<Turn> {
    session.turns().to_vec()
}

/// Rough token count of a context, for logging context growth.
pub fn estimate_context_tokens(context: &[Turn]) -> usize {
    context.iter().map(|turn| estimate_tokens(&turn.text)).sum()
}

/// Estimate token count for a string
///
/// ~4 characters per token for English text, or one per word, whichever is
/// larger.
fn estimate_tokens(text: &str) -> usize {
    let char_estimate = (text.len() + 3) / 4;
    let word_estimate = text.split_whitespace().count();
    char_estimate.max(word_estimate).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::{Role, UtteranceSource};

    fn session_with(exchanges: &[(&str, &str)]) -> Session {
        let mut session = Session::new("Motivator");
        for (query, reply) in exchanges {
            session.begin_request("").unwrap();
            session
                .complete_request(
                    Turn::user(*query, "Motivator", UtteranceSource::Manual),
                    Turn::assistant(*reply, "Motivator"),
                )
                .unwrap();
            session.finish_presenting();
        }
        session
    }

    #[test]
    fn test_empty_session() {
        let session = Session::new("Motivator");
        assert!(build_context(&session).is_empty());
    }

    #[test]
    fn test_chronological_order() {
        let session = session_with(&[("one", "uno"), ("two", "dos")]);
        let context = build_context(&session);

        let texts: Vec<&str> = context.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "uno", "two", "dos"]);
        assert_eq!(context[0].role, Role::User);
        assert_eq!(context[1].role, Role::Assistant);
    }

    #[test]
    fn test_idempotent() {
        let session = session_with(&[("one", "uno")]);
        assert_eq!(build_context(&session), build_context(&session));
    }

    #[test]
    fn test_no_truncation() {
        let pairs: Vec<(String, String)> = (0..50)
            .map(|i| (format!("q{}", i), format!("a{}", i)))
            .collect();
        let refs: Vec<(&str, &str)> = pairs
            .iter()
            .map(|(q, a)| (q.as_str(), a.as_str()))
            .collect();
        let session = session_with(&refs);
        assert_eq!(build_context(&session).len(), 100);
    }

    #[test]
    fn test_token_estimation() {
        assert!(estimate_tokens("") >= 1);
        assert!(estimate_tokens("This is a longer sentence with more words.") > 5);

        let session = session_with(&[("hello there", "hi")]);
        assert!(estimate_context_tokens(&build_context(&session)) >= 2);
    }
}
