//! Mock speech adapters.
//!
//! They emit no events; they only record which requests the controller
//! issued. Tests feed the matching events to the controller by hand.

use std::sync::{Arc, Mutex};

use parley_core::error::{ParleyError, Result};
use parley_core::types::{RecognitionId, UtteranceId};

use crate::{SpeechInput, SpeechOutput};

/// A request received by [`MockSpeechInput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCall {
    Start(RecognitionId),
    Stop,
    Abort,
}

/// A request received by [`MockSpeechOutput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputCall {
    Speak(UtteranceId, String),
    Cancel,
}

/// Shared, cloneable record of adapter calls.
#[derive(Debug)]
pub struct CallLog<T> {
    calls: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for CallLog<T> {
    fn clone(&self) -> Self {
        Self {
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<T> Default for CallLog<T> {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone> CallLog<T> {
    fn push(&self, call: T) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    /// Calls recorded so far, without clearing them.
    pub fn snapshot(&self) -> Vec<T> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Drain the recorded calls.
    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.calls.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

/// Speech input that records requests and can be told to fail on start.
#[derive(Debug, Default)]
pub struct MockSpeechInput {
    calls: CallLog<InputCall>,
    fail_start: bool,
}

impl MockSpeechInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// An input whose `start` always fails, like a recognizer that lost its microphone.
    pub fn failing() -> Self {
        Self {
            calls: CallLog::default(),
            fail_start: true,
        }
    }

    pub fn calls(&self) -> CallLog<InputCall> {
        self.calls.clone()
    }
}

impl SpeechInput for MockSpeechInput {
    fn start(&mut self, recognition: RecognitionId) -> Result<()> {
        self.calls.push(InputCall::Start(recognition));
        if self.fail_start {
            return Err(ParleyError::Recognition(
                "Mock recognizer refused to start".to_string(),
            ));
        }
        tracing::debug!(%recognition, "Mock recognition started");
        Ok(())
    }

    fn stop(&mut self) {
        self.calls.push(InputCall::Stop);
    }

    fn abort(&mut self) {
        self.calls.push(InputCall::Abort);
    }
}

/// Speech output that records requests and can be told to fail on speak.
#[derive(Debug, Default)]
pub struct MockSpeechOutput {
    calls: CallLog<OutputCall>,
    fail_speak: bool,
}

impl MockSpeechOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            calls: CallLog::default(),
            fail_speak: true,
        }
    }

    pub fn calls(&self) -> CallLog<OutputCall> {
        self.calls.clone()
    }
}

impl SpeechOutput for MockSpeechOutput {
    fn speak(&mut self, utterance: UtteranceId, text: &str) -> Result<()> {
        self.calls.push(OutputCall::Speak(utterance, text.to_string()));
        if self.fail_speak {
            return Err(ParleyError::Synthesis(
                "Mock synthesizer has no voice".to_string(),
            ));
        }
        tracing::debug!(%utterance, text_len = text.len(), "Mock speech queued");
        Ok(())
    }

    fn cancel(&mut self) {
        self.calls.push(OutputCall::Cancel);
    }
}
