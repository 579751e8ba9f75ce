//! Append-only record of dialogue turns.

use parley_core::error::Result;
use parley_core::types::Turn;

/// Chronological, append-only list of turns.
///
/// There is no eviction and no way to edit or remove a turn.
#[derive(Debug, Clone, Default)]
pub struct DialogueHistory {
    turns: Vec<Turn>,
}

impl DialogueHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn.
    ///
    /// A blank question is refused (returns `false`) so that every recorded
    /// turn has something the user actually said.
    pub fn record(&mut self, question: impl Into<String>, answer: impl Into<String>) -> bool {
        let question = question.into();
        if question.trim().is_empty() {
            tracing::debug!("Refusing to record a turn with an empty question");
            return false;
        }
        let turn = Turn::new(question, answer);
        tracing::info!(
            turn = self.turns.len() + 1,
            question_len = turn.question.len(),
            "Dialogue turn recorded"
        );
        self.turns.push(turn);
        true
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Pretty-printed JSON array of the turns.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.turns)?)
    }
}
