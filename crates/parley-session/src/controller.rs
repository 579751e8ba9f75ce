//! Session controller: turns adapter and user events into dialogue turns.
//!
//! The controller is the single owner of the transcript, the current answer,
//! the history, and the state machine. Adapters and the presentation layer
//! talk to it only through [`SessionEvent`]s, which it applies one at a time
//! in arrival order. After each event a fresh [`SessionView`] is published
//! for rendering.
//!
//! Every listening session and every utterance gets a fresh id. Events whose
//! id is not the current one belong to something already aborted or
//! cancelled and are dropped.

use parley_core::events::{SessionEvent, UserCommand};
use parley_core::types::{RecognitionId, Turn, UtteranceId};
use parley_knowledge::QueryMatcher;
use parley_speech::{SpeechInputCapability, SpeechOutputCapability};
use serde::Serialize;
use tokio::sync::{mpsc, watch};

use crate::history::DialogueHistory;
use crate::state::{SessionState, StateMachine};

/// Everything the presentation layer needs to render the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub state: SessionState,
    pub listening: bool,
    pub speaking: bool,
    pub transcript: String,
    pub answer: Option<String>,
    pub history: Vec<Turn>,
    pub voice_input_available: bool,
}

/// Drives one dialogue session.
pub struct SessionController {
    matcher: QueryMatcher,
    input: SpeechInputCapability,
    output: SpeechOutputCapability,
    state: StateMachine,
    transcript: String,
    answer: Option<String>,
    history: DialogueHistory,
    /// Listening session whose events are accepted.
    recognition: Option<RecognitionId>,
    /// Utterance whose events are accepted.
    utterance: Option<UtteranceId>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .field("transcript", &self.transcript)
            .field("answer", &self.answer)
            .field("turns", &self.history.len())
            .field("voice_input_available", &self.input.is_available())
            .field("voice_output_available", &self.output.is_available())
            .finish()
    }
}

impl SessionController {
    pub fn new(
        matcher: QueryMatcher,
        input: SpeechInputCapability,
        output: SpeechOutputCapability,
    ) -> Self {
        Self {
            matcher,
            input,
            output,
            state: StateMachine::new(),
            transcript: String::new(),
            answer: None,
            history: DialogueHistory::new(),
            recognition: None,
            utterance: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.current()
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn history(&self) -> &DialogueHistory {
        &self.history
    }

    /// Snapshot for the presentation layer.
    pub fn view(&self) -> SessionView {
        let state = self.state.current();
        SessionView {
            state,
            listening: state == SessionState::Listening,
            speaking: state == SessionState::Speaking,
            transcript: self.transcript.clone(),
            answer: self.answer.clone(),
            history: self.history.turns().to_vec(),
            voice_input_available: self.input.is_available(),
        }
    }

    /// Apply one event.
    pub fn handle(&mut self, event: SessionEvent) {
        tracing::trace!(event = event.event_name(), state = %self.state.current(), "Session event");
        match event {
            SessionEvent::Command(UserCommand::ToggleListening) => self.toggle_listening(),
            SessionEvent::Command(UserCommand::SpeakOrStop) => self.speak_or_stop(),
            SessionEvent::TranscriptUpdated { recognition, text } => {
                self.on_transcript(recognition, text)
            }
            SessionEvent::RecognitionEnded { recognition } => self.on_recognition_ended(recognition),
            SessionEvent::RecognitionFailed {
                recognition,
                reason,
            } => self.on_recognition_failed(recognition, &reason),
            SessionEvent::SpeechStarted { utterance } => self.on_speech_started(utterance),
            SessionEvent::SpeechEnded { utterance } => self.on_speech_ended(utterance),
            SessionEvent::SpeechFailed { utterance, reason } => {
                self.on_speech_failed(utterance, &reason)
            }
            SessionEvent::Shutdown => self.shutdown(),
            other => tracing::debug!(event = other.event_name(), "Ignoring unhandled event"),
        }
    }

    /// Process events until `Shutdown` arrives or every sender is dropped.
    ///
    /// A new [`SessionView`] is published on `views` after every event.
    /// Returns the controller so the caller can inspect the final history.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
        views: watch::Sender<SessionView>,
    ) -> Self {
        tracing::info!(
            voice_input = self.input.is_available(),
            voice_output = self.output.is_available(),
            "Session controller running"
        );
        views.send_replace(self.view());

        while let Some(event) = events.recv().await {
            let stop = matches!(event, SessionEvent::Shutdown);
            self.handle(event);
            views.send_replace(self.view());
            if stop {
                break;
            }
        }

        self.shutdown();
        views.send_replace(self.view());
        tracing::info!(turns = self.history.len(), "Session controller stopped");
        self
    }

    // =========================================================================
    // User commands
    // =========================================================================

    fn toggle_listening(&mut self) {
        match self.state.current() {
            SessionState::Listening => {
                // Processing waits for the recognizer's end event.
                if let Some(input) = self.input.as_mut() {
                    tracing::debug!("Stop listening requested");
                    input.stop();
                }
            }
            SessionState::Idle | SessionState::Speaking => self.start_listening(),
        }
    }

    fn start_listening(&mut self) {
        if !self.input.is_available() {
            tracing::debug!("Voice input unavailable, ignoring listen request");
            return;
        }

        // Never listen over our own voice.
        self.cancel_speech();

        let recognition = RecognitionId::new();
        let started = match self.input.as_mut() {
            Some(input) => input.start(recognition),
            None => return,
        };

        match started {
            Ok(()) => {
                self.transcript.clear();
                self.recognition = Some(recognition);
                self.enter(SessionState::Listening);
                tracing::info!(%recognition, "Listening started");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to start speech recognition");
                self.enter(SessionState::Idle);
            }
        }
    }

    fn speak_or_stop(&mut self) {
        if self.state.current() == SessionState::Speaking {
            tracing::info!("Speech stopped by user");
            self.cancel_speech();
            self.enter(SessionState::Idle);
            return;
        }

        match self.answer.clone() {
            Some(answer) => self.speak(&answer),
            None => tracing::debug!("No answer to speak yet"),
        }
    }

    // =========================================================================
    // Speech input events
    // =========================================================================

    fn on_transcript(&mut self, recognition: RecognitionId, text: String) {
        if self.recognition != Some(recognition) {
            tracing::debug!(%recognition, "Dropping transcript from stale recognition");
            return;
        }
        self.transcript = text;
    }

    fn on_recognition_ended(&mut self, recognition: RecognitionId) {
        if self.recognition != Some(recognition) {
            tracing::debug!(%recognition, "Dropping end of stale recognition");
            return;
        }
        self.recognition = None;
        self.enter(SessionState::Idle);

        // The latest transcript is the utterance, not one captured at start.
        let question = self.transcript.clone();
        if question.trim().is_empty() {
            tracing::info!("Recognition ended without speech");
            return;
        }

        let resolution = self.matcher.resolve_match(&question);
        tracing::info!(matched = ?resolution.matched, "Question answered");

        self.history.record(question, resolution.answer.clone());
        self.answer = Some(resolution.answer.clone());
        self.speak(&resolution.answer);
    }

    fn on_recognition_failed(&mut self, recognition: RecognitionId, reason: &str) {
        if self.recognition != Some(recognition) {
            tracing::debug!(%recognition, "Dropping failure of stale recognition");
            return;
        }
        tracing::warn!(%recognition, reason, "Speech recognition failed");
        self.recognition = None;
        self.enter(SessionState::Idle);
    }

    // =========================================================================
    // Speech output events
    // =========================================================================

    fn on_speech_started(&mut self, utterance: UtteranceId) {
        if self.utterance != Some(utterance) {
            tracing::debug!(%utterance, "Dropping start of stale utterance");
            return;
        }
        match self.state.current() {
            SessionState::Speaking => return,
            SessionState::Listening => {
                tracing::info!("Speech started while listening, abandoning the utterance");
                if let Some(input) = self.input.as_mut() {
                    input.abort();
                }
                self.recognition = None;
                self.transcript.clear();
            }
            SessionState::Idle => {}
        }
        self.enter(SessionState::Speaking);
    }

    fn on_speech_ended(&mut self, utterance: UtteranceId) {
        if self.utterance != Some(utterance) {
            tracing::debug!(%utterance, "Dropping end of stale utterance");
            return;
        }
        self.utterance = None;
        if self.state.current() == SessionState::Speaking {
            self.enter(SessionState::Idle);
        }
    }

    fn on_speech_failed(&mut self, utterance: UtteranceId, reason: &str) {
        if self.utterance != Some(utterance) {
            tracing::debug!(%utterance, "Dropping failure of stale utterance");
            return;
        }
        tracing::warn!(%utterance, reason, "Speech synthesis failed");
        self.utterance = None;
        if self.state.current() == SessionState::Speaking {
            self.enter(SessionState::Idle);
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Cancel whatever is queued or playing, then queue `text`.
    fn speak(&mut self, text: &str) {
        let Some(output) = self.output.as_mut() else {
            tracing::debug!("Voice output unavailable, answer not spoken");
            return;
        };

        output.cancel();
        let utterance = UtteranceId::new();
        match output.speak(utterance, text) {
            Ok(()) => {
                tracing::debug!(%utterance, text_len = text.len(), "Speech requested");
                self.utterance = Some(utterance);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to start speech synthesis");
                self.utterance = None;
            }
        }
    }

    fn cancel_speech(&mut self) {
        if self.utterance.take().is_some() {
            if let Some(output) = self.output.as_mut() {
                output.cancel();
            }
        }
    }

    fn enter(&mut self, target: SessionState) {
        if self.state.current() == target {
            return;
        }
        if let Err(e) = self.state.transition(target) {
            tracing::warn!(error = %e, "Recovering from unexpected session state");
            self.state.reset();
        }
    }

    fn shutdown(&mut self) {
        if self.recognition.take().is_some() {
            if let Some(input) = self.input.as_mut() {
                input.abort();
            }
        }
        self.cancel_speech();
        self.state.reset();
    }
}

// =============================================================================
// Tests
// =============================================================================
