//! Parley speech crate - speech input/output adapter seams.
//!
//! The recognizer and synthesizer are external collaborators. This crate
//! defines the traits the session controller drives them through, the
//! settings handed to the recognizer, a startup-time capability switch, and
//! mock adapters for testing without any audio stack.
//!
//! Adapters never report results through return values. Transcripts,
//! end-of-utterance, and start/end-of-speech signals are posted as
//! [`SessionEvent`]s on an [`EventSender`].

pub mod mock;

use parley_core::error::Result;
use parley_core::events::SessionEvent;
use parley_core::types::{RecognitionId, UtteranceId};
use tokio::sync::mpsc;

pub use mock::{CallLog, InputCall, MockSpeechInput, MockSpeechOutput, OutputCall};

/// Channel adapters use to report back to the session controller.
pub type EventSender = mpsc::UnboundedSender<SessionEvent>;

// =============================================================================
// Settings
// =============================================================================

/// Recognizer settings.
///
/// Parley always uses the default: one `en-US` utterance per session, with
/// interim results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionSettings {
    pub continuous: bool,
    pub interim_results: bool,
    pub language: String,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            continuous: false,
            interim_results: true,
            language: "en-US".to_string(),
        }
    }
}

// =============================================================================
// Traits
// =============================================================================

/// Speech-to-text capability.
///
/// All methods only issue requests. Results arrive later as
/// `TranscriptUpdated`, `RecognitionEnded`, or `RecognitionFailed` events
/// tagged with the id passed to [`SpeechInput::start`].
pub trait SpeechInput: Send {
    /// Begin a listening session.
    fn start(&mut self, recognition: RecognitionId) -> Result<()>;

    /// Ask the recognizer to finish. It still delivers `RecognitionEnded`.
    fn stop(&mut self);

    /// Drop the current session without waiting for an end event.
    fn abort(&mut self);
}

/// Text-to-speech capability.
///
/// `speak` queues an utterance; `SpeechStarted` and `SpeechEnded` events
/// follow, tagged with the given id.
pub trait SpeechOutput: Send {
    fn speak(&mut self, utterance: UtteranceId, text: &str) -> Result<()>;

    /// Silence whatever is being spoken, immediately.
    fn cancel(&mut self);
}

// =============================================================================
// Capability
// =============================================================================

/// Whether a platform capability exists, decided once at startup.
///
/// Code downstream matches on this instead of probing the platform again.
/// An `Unavailable` capability makes its path permanently inert.
#[derive(Debug)]
pub enum Capability<T> {
    Available(T),
    Unavailable,
}

impl<T> Capability<T> {
    /// Select a variant from the result of a platform probe.
    pub fn detect(name: &str, probe: Option<T>) -> Self {
        match probe {
            Some(adapter) => {
                tracing::info!(capability = name, "Speech capability available");
                Capability::Available(adapter)
            }
            None => {
                tracing::warn!(capability = name, "Speech capability unavailable, disabling it");
                Capability::Unavailable
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }

    pub fn as_mut(&mut self) -> Option<&mut T> {
        match self {
            Capability::Available(adapter) => Some(adapter),
            Capability::Unavailable => None,
        }
    }
}

/// Boxed speech input as held by the session controller.
pub type SpeechInputCapability = Capability<Box<dyn SpeechInput>>;

/// Boxed speech output as held by the session controller.
pub type SpeechOutputCapability = Capability<Box<dyn SpeechOutput>>;

// =============================================================================
// Tests
// =============================================================================
