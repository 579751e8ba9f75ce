//! The static question/answer table.

use std::collections::HashMap;

use parley_core::config::KnowledgeEntryConfig;
use parley_core::error::{ParleyError, Result};

use crate::matcher::normalize;

/// Placeholder replaced with the current local time when an answer is rendered.
pub const TIME_PLACEHOLDER: &str = "{time}";

/// Built-in entries, in matching order.
const BUILTIN_ENTRIES: &[(&str, &str)] = &[
    (
        "what is your name",
        "My name is Rashmika. How can I help you today?",
    ),
    ("what time is it", "The current time is {time}."),
    (
        "what is the weather",
        "I'm sorry, I don't have access to real-time weather data. You would need to integrate a weather API for that functionality.",
    ),
    (
        "how are you",
        "I'm functioning well, thank you for asking. How are you today?",
    ),
    (
        "tell me a joke",
        "Why don't scientists trust atoms? Because they make up everything!",
    ),
    (
        "who created you",
        "I was created as a demonstration of a voice-based AI agent using React and web APIs.",
    ),
    (
        "what can you do",
        "I can answer simple questions, provide information from my knowledge base, and respond to voice commands. My capabilities can be expanded with additional programming.",
    ),
];

/// A single pattern and the response it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeEntry {
    /// Normalized (lowercase, trimmed) question text.
    pub pattern: String,
    /// Answer template; may contain [`TIME_PLACEHOLDER`].
    pub response: String,
}

/// Immutable phrase table with stable iteration order.
///
/// Patterns are unique under normalization. There is no way to change the
/// table once it is built.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
    index: HashMap<String, usize>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KnowledgeBase {
    /// The built-in table.
    pub fn builtin() -> Self {
        let mut kb = Self {
            entries: Vec::with_capacity(BUILTIN_ENTRIES.len()),
            index: HashMap::with_capacity(BUILTIN_ENTRIES.len()),
        };
        for (pattern, response) in BUILTIN_ENTRIES {
            // Built-in patterns are already normalized and distinct.
            kb.index.insert((*pattern).to_string(), kb.entries.len());
            kb.entries.push(KnowledgeEntry {
                pattern: (*pattern).to_string(),
                response: (*response).to_string(),
            });
        }
        kb
    }

    /// Build a table from `(pattern, response)` pairs, preserving order.
    ///
    /// Patterns are normalized first. An empty pattern, or two patterns that
    /// normalize to the same text, is a configuration error.
    pub fn from_entries<I, P, R>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, R)>,
        P: AsRef<str>,
        R: Into<String>,
    {
        let mut kb = Self {
            entries: Vec::new(),
            index: HashMap::new(),
        };
        for (pattern, response) in entries {
            kb.push(pattern.as_ref(), response.into())?;
        }
        Ok(kb)
    }

    /// The built-in table followed by the configured entries.
    pub fn with_extra(extra: &[KnowledgeEntryConfig]) -> Result<Self> {
        let mut kb = Self::builtin();
        for entry in extra {
            kb.push(&entry.pattern, entry.response.clone())?;
        }
        if !extra.is_empty() {
            tracing::info!(
                extra = extra.len(),
                total = kb.len(),
                "Knowledge base extended from configuration"
            );
        }
        Ok(kb)
    }

    fn push(&mut self, pattern: &str, response: String) -> Result<()> {
        let pattern = normalize(pattern);
        if pattern.is_empty() {
            return Err(ParleyError::Config(
                "Knowledge pattern cannot be empty".to_string(),
            ));
        }
        if self.index.contains_key(&pattern) {
            return Err(ParleyError::Config(format!(
                "Duplicate knowledge pattern: {:?}",
                pattern
            )));
        }
        self.index.insert(pattern.clone(), self.entries.len());
        self.entries.push(KnowledgeEntry { pattern, response });
        Ok(())
    }

    /// Exact lookup of an already-normalized query.
    pub fn lookup(&self, normalized_query: &str) -> Option<&str> {
        self.index
            .get(normalized_query)
            .map(|&i| self.entries[i].response.as_str())
    }

    /// Entries in definition order.
    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
