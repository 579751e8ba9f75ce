use serde::{Deserialize, Serialize};

use crate::types::{RecognitionId, UtteranceId};

/// Intent forwarded by the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserCommand {
    /// Start listening when idle, or ask the recognizer to stop when listening.
    ToggleListening,
    /// Cancel speech when speaking, otherwise replay the current answer.
    SpeakOrStop,
}

/// Everything the session controller reacts to.
///
/// Speech adapters and the presentation layer never touch session state
/// directly; they post one of these onto the controller's queue and the
/// controller applies them in arrival order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SessionEvent {
    // =========================================================================
    // Presentation
    // =========================================================================
    /// A user command from the presentation layer.
    Command(UserCommand),

    // =========================================================================
    // Speech input
    // =========================================================================
    /// A partial or final transcript replaced the previous one.
    TranscriptUpdated { recognition: RecognitionId, text: String },

    /// The recognizer finished the utterance (end-of-session signal).
    RecognitionEnded { recognition: RecognitionId },

    /// The recognizer reported an internal error.
    RecognitionFailed {
        recognition: RecognitionId,
        reason: String,
    },

    // =========================================================================
    // Speech output
    // =========================================================================
    /// The synthesizer began speaking an utterance.
    SpeechStarted { utterance: UtteranceId },

    /// The synthesizer finished speaking an utterance.
    SpeechEnded { utterance: UtteranceId },

    /// The synthesizer reported an internal error.
    SpeechFailed {
        utterance: UtteranceId,
        reason: String,
    },

    // =========================================================================
    // Lifecycle
    // =========================================================================
    /// Stop the controller's event loop.
    Shutdown,
}

impl SessionEvent {
    /// Returns a short event name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            SessionEvent::Command(UserCommand::ToggleListening) => "toggle_listening",
            SessionEvent::Command(UserCommand::SpeakOrStop) => "speak_or_stop",
            SessionEvent::TranscriptUpdated { .. } => "transcript_updated",
            SessionEvent::RecognitionEnded { .. } => "recognition_ended",
            SessionEvent::RecognitionFailed { .. } => "recognition_failed",
            SessionEvent::SpeechStarted { .. } => "speech_started",
            SessionEvent::SpeechEnded { .. } => "speech_ended",
            SessionEvent::SpeechFailed { .. } => "speech_failed",
            SessionEvent::Shutdown => "shutdown",
        }
    }
}
