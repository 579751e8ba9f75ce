//! Console presentation layer and console speech adapters.
//!
//! Typed lines stand in for the microphone and a timer stands in for the
//! speaker. The adapters still behave like asynchronous platform
//! services: results come back later as [`SessionEvent`]s posted from
//! spawned tasks, never as return values.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use parley_core::error::{ParleyError, Result};
use parley_core::events::{SessionEvent, UserCommand};
use parley_core::types::{RecognitionId, UtteranceId};
use parley_session::SessionView;
use parley_speech::{EventSender, RecognitionSettings, SpeechInput, SpeechOutput};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Pause between interim transcripts, roughly one spoken word.
const INTERIM_WORD_DELAY: Duration = Duration::from_millis(120);

// =============================================================================
// Microphone
// =============================================================================

/// Lines typed at the prompt, waiting to be heard by the recognizer.
#[derive(Debug, Clone, Default)]
pub struct ConsoleMicrophone {
    heard: Arc<Mutex<VecDeque<String>>>,
}

impl ConsoleMicrophone {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a line for the next listening session.
    pub fn say(&self, line: impl Into<String>) {
        self.heard
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(line.into());
    }

    fn next(&self) -> Option<String> {
        self.heard
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }

    /// Drop every line nobody listened to.
    pub fn clear(&self) -> usize {
        let mut heard = self.heard.lock().unwrap_or_else(|e| e.into_inner());
        let dropped = heard.len();
        heard.clear();
        dropped
    }
}

/// Extra wait on top of the recognizer's own pacing before giving up on a
/// question.
const ASK_GRACE: Duration = Duration::from_secs(2);

/// Say `question` into the microphone, start listening, and wait until the
/// session has recorded its turn.
///
/// One question is in flight at a time. Otherwise a second line arriving
/// before the session reports `listening` would turn the second
/// `ToggleListening` into a stop request, leaving that line queued for the
/// next question. Returns `false` if no turn was recorded in time; the
/// microphone is then cleared so later questions are not answered late.
pub async fn ask_aloud(
    question: &str,
    microphone: &ConsoleMicrophone,
    events: &EventSender,
    views: &mut watch::Receiver<SessionView>,
) -> bool {
    let before = views.borrow().history.len();
    microphone.say(question);
    if events
        .send(SessionEvent::Command(UserCommand::ToggleListening))
        .is_err()
    {
        microphone.clear();
        return false;
    }

    let words = question.split_whitespace().count() as u32;
    let limit = INTERIM_WORD_DELAY * (words + 1) + ASK_GRACE;
    let recorded = tokio::time::timeout(limit, async {
        views
            .wait_for(|v| v.history.len() > before)
            .await
            .map(|_| ())
    })
    .await;

    match recorded {
        Ok(Ok(())) => true,
        Ok(Err(_)) => {
            tracing::debug!("Session ended before the question was answered");
            microphone.clear();
            false
        }
        Err(_) => {
            let dropped = microphone.clear();
            tracing::warn!(dropped, "Question was not heard in time");
            false
        }
    }
}

// =============================================================================
// Recognizer
// =============================================================================

struct ActiveRecognition {
    recognition: RecognitionId,
    text: String,
    task: JoinHandle<()>,
}

/// Speech input that "hears" one queued console line per listening session.
///
/// With interim results enabled the line is revealed word by word before the
/// final transcript, like a live recognizer would.
pub struct ConsoleRecognizer {
    events: EventSender,
    settings: RecognitionSettings,
    microphone: ConsoleMicrophone,
    active: Option<ActiveRecognition>,
}

impl ConsoleRecognizer {
    pub fn new(
        events: EventSender,
        settings: RecognitionSettings,
        microphone: ConsoleMicrophone,
    ) -> Self {
        Self {
            events,
            settings,
            microphone,
            active: None,
        }
    }
}

fn finish_recognition(events: &EventSender, recognition: RecognitionId, text: &str) {
    if !text.is_empty() {
        let _ = events.send(SessionEvent::TranscriptUpdated {
            recognition,
            text: text.to_string(),
        });
    }
    let _ = events.send(SessionEvent::RecognitionEnded { recognition });
}

impl SpeechInput for ConsoleRecognizer {
    fn start(&mut self, recognition: RecognitionId) -> Result<()> {
        let runtime = Handle::try_current()
            .map_err(|e| ParleyError::Recognition(format!("No async runtime: {}", e)))?;
        self.abort();

        let text = self.microphone.next().unwrap_or_default();
        tracing::debug!(
            %recognition,
            language = %self.settings.language,
            continuous = self.settings.continuous,
            text_len = text.len(),
            "Console recognition started"
        );

        let events = self.events.clone();
        let interim = self.settings.interim_results;
        let heard = text.clone();
        let task = runtime.spawn(async move {
            if interim {
                let words: Vec<&str> = heard.split_whitespace().collect();
                for n in 1..words.len() {
                    tokio::time::sleep(INTERIM_WORD_DELAY).await;
                    let _ = events.send(SessionEvent::TranscriptUpdated {
                        recognition,
                        text: words[..n].join(" "),
                    });
                }
            }
            tokio::time::sleep(INTERIM_WORD_DELAY).await;
            finish_recognition(&events, recognition, &heard);
        });

        self.active = Some(ActiveRecognition {
            recognition,
            text,
            task,
        });
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            if !active.task.is_finished() {
                active.task.abort();
                finish_recognition(&self.events, active.recognition, &active.text);
            }
        }
    }

    fn abort(&mut self) {
        if let Some(active) = self.active.take() {
            active.task.abort();
        }
    }
}

// =============================================================================
// Synthesizer
// =============================================================================

/// How long speaking `text` takes at `words_per_minute`.
pub fn speaking_time(text: &str, words_per_minute: u32) -> Duration {
    let words = text.split_whitespace().count().max(1) as u64;
    Duration::from_millis(words * 60_000 / u64::from(words_per_minute.max(1)))
}

/// Speech output that "speaks" for a duration proportional to the word
/// count. The text itself is shown by [`ConsoleRenderer`].
pub struct ConsoleSynthesizer {
    events: EventSender,
    words_per_minute: u32,
    current: Option<JoinHandle<()>>,
}

impl ConsoleSynthesizer {
    pub fn new(events: EventSender, words_per_minute: u32) -> Self {
        Self {
            events,
            words_per_minute,
            current: None,
        }
    }
}

impl SpeechOutput for ConsoleSynthesizer {
    fn speak(&mut self, utterance: UtteranceId, text: &str) -> Result<()> {
        let runtime = Handle::try_current()
            .map_err(|e| ParleyError::Synthesis(format!("No async runtime: {}", e)))?;
        self.cancel();

        let duration = speaking_time(text, self.words_per_minute);
        tracing::debug!(
            %utterance,
            words = text.split_whitespace().count(),
            duration_ms = duration.as_millis() as u64,
            "Console speech started"
        );

        let events = self.events.clone();
        self.current = Some(runtime.spawn(async move {
            let _ = events.send(SessionEvent::SpeechStarted { utterance });
            tokio::time::sleep(duration).await;
            let _ = events.send(SessionEvent::SpeechEnded { utterance });
        }));
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(task) = self.current.take() {
            task.abort();
        }
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Prints what changed between consecutive [`SessionView`]s.
pub struct ConsoleRenderer {
    assistant: String,
    last: SessionView,
}

impl ConsoleRenderer {
    pub fn new(assistant: impl Into<String>) -> Self {
        Self {
            assistant: assistant.into(),
            last: SessionView::default(),
        }
    }

    /// Lines describing the change from the previous view to `next`.
    pub fn update(&mut self, next: &SessionView) -> Vec<String> {
        let mut lines = Vec::new();

        if next.listening && !self.last.listening {
            lines.push("(listening)".to_string());
        }
        if next.listening && !next.transcript.is_empty() && next.transcript != self.last.transcript
        {
            lines.push(format!("  ... {}", next.transcript));
        }

        let seen = self.last.history.len().min(next.history.len());
        for turn in &next.history[seen..] {
            lines.push(format!("You: {}", turn.question));
            lines.push(format!("{}: {}", self.assistant, turn.answer));
        }

        if next.speaking && !self.last.speaking {
            lines.push("(speaking)".to_string());
        }

        let ended_empty = self.last.listening
            && !next.listening
            && !next.speaking
            && next.history.len() == self.last.history.len();
        if ended_empty {
            lines.push("(no question heard)".to_string());
        }

        self.last = next.clone();
        lines
    }

    /// Print view changes until the controller goes away.
    pub async fn run(mut self, mut views: watch::Receiver<SessionView>) {
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            for line in self.update(&view) {
                println!("{}", line);
            }
        }
        tracing::debug!("Console renderer stopped");
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::types::Turn;
    use parley_knowledge::{KnowledgeBase, QueryMatcher};
    use parley_session::{SessionController, SessionState};
    use parley_speech::Capability;
    use tokio::sync::mpsc;

    async fn collect_until_end(
        rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    ) -> (Vec<String>, RecognitionId) {
        let mut transcripts = Vec::new();
        loop {
            match rx.recv().await.unwrap() {
                SessionEvent::TranscriptUpdated { text, .. } => transcripts.push(text),
                SessionEvent::RecognitionEnded { recognition } => {
                    return (transcripts, recognition)
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
    }

    fn recognizer(interim: bool) -> (
        ConsoleRecognizer,
        ConsoleMicrophone,
        mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let microphone = ConsoleMicrophone::new();
        let settings = RecognitionSettings {
            interim_results: interim,
            ..RecognitionSettings::default()
        };
        (
            ConsoleRecognizer::new(tx, settings, microphone.clone()),
            microphone,
            rx,
        )
    }

    fn console_session(
        input_available: bool,
    ) -> (
        ConsoleMicrophone,
        EventSender,
        watch::Receiver<SessionView>,
        tokio::task::JoinHandle<SessionController>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(SessionView::default());
        let microphone = ConsoleMicrophone::new();

        let input = if input_available {
            let recognizer: Box<dyn SpeechInput> = Box::new(ConsoleRecognizer::new(
                tx.clone(),
                RecognitionSettings::default(),
                microphone.clone(),
            ));
            Capability::Available(recognizer)
        } else {
            Capability::Unavailable
        };
        let controller = SessionController::new(
            QueryMatcher::new(KnowledgeBase::builtin()),
            input,
            Capability::Unavailable,
        );
        let session = tokio::spawn(controller.run(rx, view_tx));
        (microphone, tx, view_rx, session)
    }

    #[tokio::test]
    async fn test_back_to_back_questions_are_answered_in_order() {
        let (microphone, tx, mut views, session) = console_session(true);

        // Asked without pausing, the way pasted or piped input arrives.
        for question in ["what is your name", "tell me a joke", "how are you"] {
            assert!(ask_aloud(question, &microphone, &tx, &mut views).await);
        }
        tx.send(SessionEvent::Shutdown).unwrap();
        let controller = session.await.unwrap();

        let questions: Vec<&str> = controller
            .history()
            .turns()
            .iter()
            .map(|turn| turn.question.as_str())
            .collect();
        assert_eq!(
            questions,
            vec!["what is your name", "tell me a joke", "how are you"]
        );
        assert_eq!(microphone.clear(), 0);
    }

    #[tokio::test]
    async fn test_unheard_question_is_not_left_queued() {
        let (microphone, tx, mut views, session) = console_session(false);

        assert!(!ask_aloud("hello", &microphone, &tx, &mut views).await);
        assert_eq!(microphone.clear(), 0);

        tx.send(SessionEvent::Shutdown).unwrap();
        assert!(session.await.unwrap().history().is_empty());
    }

    #[test]
    fn test_speaking_time() {
        assert_eq!(speaking_time("tell me a", 180), Duration::from_millis(1000));
        // Empty text still takes one word's time.
        assert_eq!(speaking_time("", 60), Duration::from_millis(1000));
        // A zero rate is treated as one word per minute instead of dividing by zero.
        assert_eq!(speaking_time("hi", 0), Duration::from_millis(120_000));
    }

    #[tokio::test]
    async fn test_recognizer_interim_then_final() {
        let (mut input, microphone, mut rx) = recognizer(true);
        microphone.say("tell me a joke");

        let id = RecognitionId::new();
        input.start(id).unwrap();
        let (transcripts, ended) = collect_until_end(&mut rx).await;

        assert_eq!(
            transcripts,
            vec!["tell", "tell me", "tell me a", "tell me a joke"]
        );
        assert_eq!(ended, id);
    }

    #[tokio::test]
    async fn test_recognizer_final_only() {
        let (mut input, microphone, mut rx) = recognizer(false);
        microphone.say("how are you");

        input.start(RecognitionId::new()).unwrap();
        let (transcripts, _) = collect_until_end(&mut rx).await;
        assert_eq!(transcripts, vec!["how are you"]);
    }

    #[tokio::test]
    async fn test_recognizer_with_nothing_heard_just_ends() {
        let (mut input, _microphone, mut rx) = recognizer(true);
        input.start(RecognitionId::new()).unwrap();
        let (transcripts, _) = collect_until_end(&mut rx).await;
        assert!(transcripts.is_empty());
    }

    #[tokio::test]
    async fn test_recognizer_stop_flushes_final_transcript() {
        let (mut input, microphone, mut rx) = recognizer(true);
        microphone.say("what is your name");

        let id = RecognitionId::new();
        input.start(id).unwrap();
        input.stop();

        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::TranscriptUpdated {
                recognition: id,
                text: "what is your name".to_string(),
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::RecognitionEnded { recognition: id }
        );
    }

    #[tokio::test]
    async fn test_recognizer_abort_is_silent() {
        let (mut input, microphone, mut rx) = recognizer(true);
        microphone.say("who created you");

        input.start(RecognitionId::new()).unwrap();
        input.abort();
        tokio::time::sleep(INTERIM_WORD_DELAY * 5).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_synthesizer_start_then_end() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut output = ConsoleSynthesizer::new(tx, 6000);
        let id = UtteranceId::new();

        output.speak(id, "hello there").unwrap();
        assert_eq!(
            rx.recv().await.unwrap(),
            SessionEvent::SpeechStarted { utterance: id }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            SessionEvent::SpeechEnded { utterance: id }
        );
    }

    #[tokio::test]
    async fn test_synthesizer_cancel_before_start_is_silent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut output = ConsoleSynthesizer::new(tx, 6000);

        output.speak(UtteranceId::new(), "hello").unwrap();
        output.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_adapters_need_a_runtime() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut output = ConsoleSynthesizer::new(tx.clone(), 180);
        assert!(matches!(
            output.speak(UtteranceId::new(), "hi"),
            Err(ParleyError::Synthesis(_))
        ));

        let mut input =
            ConsoleRecognizer::new(tx, RecognitionSettings::default(), ConsoleMicrophone::new());
        assert!(matches!(
            input.start(RecognitionId::new()),
            Err(ParleyError::Recognition(_))
        ));
    }

    fn listening(transcript: &str) -> SessionView {
        SessionView {
            state: SessionState::Listening,
            listening: true,
            transcript: transcript.to_string(),
            voice_input_available: true,
            ..SessionView::default()
        }
    }

    #[test]
    fn test_renderer_shows_listening_and_interim_text() {
        let mut renderer = ConsoleRenderer::new("Rashmika");
        assert_eq!(renderer.update(&listening("")), vec!["(listening)"]);
        assert_eq!(renderer.update(&listening("how")), vec!["  ... how"]);
        assert!(renderer.update(&listening("how")).is_empty());
    }

    #[test]
    fn test_renderer_prints_new_turns() {
        let mut renderer = ConsoleRenderer::new("Rashmika");
        renderer.update(&listening("how are you"));

        let done = SessionView {
            transcript: "how are you".to_string(),
            answer: Some("Fine.".to_string()),
            history: vec![Turn::new("how are you", "Fine.")],
            voice_input_available: true,
            ..SessionView::default()
        };
        assert_eq!(
            renderer.update(&done),
            vec!["You: how are you", "Rashmika: Fine."]
        );
        // Nothing new the second time.
        assert!(renderer.update(&done).is_empty());
    }

    #[test]
    fn test_renderer_marks_speech() {
        let mut renderer = ConsoleRenderer::new("Rashmika");
        let speaking = SessionView {
            state: SessionState::Speaking,
            speaking: true,
            ..SessionView::default()
        };
        assert_eq!(renderer.update(&speaking), vec!["(speaking)"]);
        assert!(renderer.update(&SessionView::default()).is_empty());
    }

    #[test]
    fn test_renderer_reports_empty_utterance() {
        let mut renderer = ConsoleRenderer::new("Rashmika");
        renderer.update(&listening(""));
        let idle = SessionView {
            voice_input_available: true,
            ..SessionView::default()
        };
        assert_eq!(renderer.update(&idle), vec!["(no question heard)"]);
    }
}
