//! Parley knowledge crate - the static phrase table and the query matcher.
//!
//! The knowledge base maps normalized question patterns to answers, in a
//! fixed definition order. The matcher resolves any raw utterance to exactly
//! one answer: exact match first, then the first pattern contained in the
//! query, then a fixed fallback.

pub mod base;
pub mod matcher;

pub use base::{KnowledgeBase, KnowledgeEntry, TIME_PLACEHOLDER};
pub use matcher::{
    normalize, Clock, FixedClock, MatchKind, QueryMatcher, Resolution, SystemClock,
    FALLBACK_ANSWER,
};
