use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Identifiers
// =============================================================================

/// Identifies one listening session of the speech input adapter.
///
/// Minted by the session controller when listening starts. Every transcript
/// and end-of-utterance event carries the id it belongs to, so events from a
/// session that was already aborted can be told apart from live ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecognitionId(pub Uuid);

impl RecognitionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecognitionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecognitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one synthesis request handed to the speech output adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtteranceId(pub Uuid);

impl UtteranceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UtteranceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Dialogue
// =============================================================================

/// One recorded question/answer pair.
///
/// `question` holds the transcript exactly as recognized (not normalized).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
    pub asked_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            asked_at: Utc::now(),
        }
    }
}
