//! Query resolution against the knowledge base.
//!
//! Resolution order:
//! 1. Exact match of the normalized query.
//! 2. First pattern, in definition order, contained in the normalized query.
//! 3. [`FALLBACK_ANSWER`].
//!
//! Among substring matches the earliest-defined pattern wins, regardless of
//! where it occurs in the query.

use chrono::{Local, NaiveTime};

use crate::base::{KnowledgeBase, TIME_PLACEHOLDER};

/// Answer given when no pattern matches.
pub const FALLBACK_ANSWER: &str =
    "I'm sorry, I don't have an answer for that question. Please try asking something else.";

/// Lowercase and trim surrounding whitespace. Punctuation is kept.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// =============================================================================
// Clock
// =============================================================================

/// Source of the time of day used to render `{time}` answers.
pub trait Clock: Send + Sync {
    fn time_of_day(&self) -> NaiveTime;
}

/// Local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn time_of_day(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// A clock stuck at one instant. Makes time answers reproducible.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveTime);

impl Clock for FixedClock {
    fn time_of_day(&self) -> NaiveTime {
        self.0
    }
}

// =============================================================================
// Matcher
// =============================================================================

/// Why a particular answer was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKind {
    /// The normalized query equals this pattern.
    Exact(String),
    /// This pattern is the first-defined one contained in the query.
    Substring(String),
    /// Nothing matched.
    Fallback,
}

/// A resolved answer plus the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub answer: String,
    pub matched: MatchKind,
}

/// Resolves raw utterances to answers. Never fails.
pub struct QueryMatcher {
    knowledge: KnowledgeBase,
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for QueryMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryMatcher")
            .field("knowledge", &self.knowledge)
            .finish_non_exhaustive()
    }
}

impl Default for QueryMatcher {
    fn default() -> Self {
        Self::new(KnowledgeBase::builtin())
    }
}

impl QueryMatcher {
    /// Matcher over `knowledge` rendering times from the local clock.
    pub fn new(knowledge: KnowledgeBase) -> Self {
        Self::with_clock(knowledge, SystemClock)
    }

    pub fn with_clock(knowledge: KnowledgeBase, clock: impl Clock + 'static) -> Self {
        Self {
            knowledge,
            clock: Box::new(clock),
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Resolve a raw utterance to its answer text.
    pub fn resolve(&self, raw_query: &str) -> String {
        self.resolve_match(raw_query).answer
    }

    /// Resolve a raw utterance, reporting which rule matched.
    pub fn resolve_match(&self, raw_query: &str) -> Resolution {
        let query = normalize(raw_query);

        let resolution = if let Some(response) = self.knowledge.lookup(&query) {
            Resolution {
                answer: self.render(response),
                matched: MatchKind::Exact(query.clone()),
            }
        } else if let Some(entry) = self
            .knowledge
            .entries()
            .iter()
            .find(|entry| query.contains(entry.pattern.as_str()))
        {
            Resolution {
                answer: self.render(&entry.response),
                matched: MatchKind::Substring(entry.pattern.clone()),
            }
        } else {
            Resolution {
                answer: FALLBACK_ANSWER.to_string(),
                matched: MatchKind::Fallback,
            }
        };

        tracing::debug!(query = %query, matched = ?resolution.matched, "Query resolved");
        resolution
    }

    fn render(&self, response: &str) -> String {
        if response.contains(TIME_PLACEHOLDER) {
            let time = self.clock.time_of_day().format("%-I:%M:%S %p").to_string();
            response.replace(TIME_PLACEHOLDER, &time)
        } else {
            response.to_string()
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const JOKE: &str = "Why don't scientists trust atoms? Because they make up everything!";
    const NAME: &str = "My name is Rashmika. How can I help you today?";
    const HOW_ARE_YOU: &str = "I'm functioning well, thank you for asking. How are you today?";

    fn matcher() -> QueryMatcher {
        let noon_ish = NaiveTime::from_hms_opt(15, 4, 5).unwrap();
        QueryMatcher::with_clock(KnowledgeBase::builtin(), FixedClock(noon_ish))
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  What Is Your Name \n"), "what is your name");
        assert_eq!(normalize("What's up?"), "what's up?");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_exact_match_scenario() {
        let m = matcher();
        let r = m.resolve_match("What is your name");
        assert_eq!(r.answer, NAME);
        assert_eq!(r.matched, MatchKind::Exact("what is your name".to_string()));
    }

    #[test]
    fn test_substring_match_scenario() {
        let m = matcher();
        let r = m.resolve_match("  tell me a joke please");
        assert_eq!(r.answer, JOKE);
        assert_eq!(r.matched, MatchKind::Substring("tell me a joke".to_string()));
    }

    #[test]
    fn test_apostrophe_breaks_match() {
        let m = matcher();
        let r = m.resolve_match("what's the weather like");
        assert_eq!(r.answer, FALLBACK_ANSWER);
        assert_eq!(r.matched, MatchKind::Fallback);
    }

    #[test]
    fn test_no_match_returns_fallback() {
        let m = matcher();
        assert_eq!(m.resolve("banana"), FALLBACK_ANSWER);
        assert_eq!(m.resolve(""), FALLBACK_ANSWER);
        assert_eq!(m.resolve("   "), FALLBACK_ANSWER);
    }

    #[test]
    fn test_every_pattern_resolves_to_its_own_response() {
        let m = matcher();
        for entry in m.knowledge().entries() {
            let expected = m.render(&entry.response);
            assert_eq!(m.resolve(&entry.pattern.to_uppercase()), expected);
        }
    }

    #[test]
    fn test_first_defined_substring_wins_over_position() {
        let m = matcher();
        // "how are you" is defined before "tell me a joke"
        assert_eq!(m.resolve("tell me a joke and how are you"), HOW_ARE_YOU);
        assert_eq!(m.resolve("how are you, tell me a joke"), HOW_ARE_YOU);
    }

    #[test]
    fn test_exact_match_beats_earlier_substring() {
        let kb = KnowledgeBase::from_entries(vec![
            ("joke", "short"),
            ("tell me a joke", "long"),
        ])
        .unwrap();
        let m = QueryMatcher::new(kb);

        assert_eq!(m.resolve("Tell me a joke"), "long");
        assert_eq!(m.resolve("tell me a joke now"), "short");
    }

    #[test]
    fn test_time_answer_uses_clock() {
        let m = matcher();
        assert_eq!(m.resolve("What time is it?"), "The current time is 3:04:05 PM.");
    }

    #[test]
    fn test_resolve_is_deterministic_and_leaves_table_untouched() {
        let m = matcher();
        let before = m.knowledge().entries().to_vec();
        let first = m.resolve("who created you anyway");
        for _ in 0..10 {
            assert_eq!(m.resolve("who created you anyway"), first);
        }
        assert_eq!(m.knowledge().entries(), before.as_slice());
    }

    #[test]
    fn test_system_clock_renders_time() {
        let m = QueryMatcher::default();
        let answer = m.resolve("what time is it");
        assert!(answer.starts_with("The current time is "));
        assert!(!answer.contains(TIME_PLACEHOLDER));
        assert!(answer.ends_with("M."));
    }
}
