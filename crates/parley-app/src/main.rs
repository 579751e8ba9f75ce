//! Parley application binary - composition root.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Initialize tracing
//! 3. Build the knowledge base (built-ins + configured entries)
//! 4. Either answer a single `--ask` question, or
//! 5. Run an interactive console session: the controller task owns the
//!    session, console adapters stand in for microphone and speaker, and a
//!    renderer prints view changes.

mod cli;
mod console;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

use parley_core::config::ParleyConfig;
use parley_core::events::{SessionEvent, UserCommand};
use parley_knowledge::{KnowledgeBase, QueryMatcher};
use parley_session::{DialogueHistory, SessionController, SessionView};
use parley_speech::{
    Capability, EventSender, RecognitionSettings, SpeechInput, SpeechInputCapability,
    SpeechOutput, SpeechOutputCapability,
};

use cli::CliArgs;
use console::{ConsoleMicrophone, ConsoleRecognizer, ConsoleRenderer, ConsoleSynthesizer};

const HELP: &str = "Type a question and press Enter to ask it.
  /stop, /replay  stop speaking, or repeat the last answer
  /history        show the dialogue so far
  /quit           leave";

/// A line typed at the console prompt.
#[derive(Debug, PartialEq, Eq)]
enum ConsoleCommand {
    Ask(String),
    SpeakOrStop,
    History,
    Help,
    Quit,
    Unknown(String),
}

impl ConsoleCommand {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let command = match line {
            "/stop" | "/replay" => ConsoleCommand::SpeakOrStop,
            "/history" => ConsoleCommand::History,
            "/help" => ConsoleCommand::Help,
            "/quit" | "/exit" => ConsoleCommand::Quit,
            other if other.starts_with('/') => ConsoleCommand::Unknown(other.to_string()),
            question => ConsoleCommand::Ask(question.to_string()),
        };
        Some(command)
    }
}

fn speech_input(
    enabled: bool,
    events: &EventSender,
    microphone: &ConsoleMicrophone,
) -> SpeechInputCapability {
    let probe = enabled.then(|| {
        Box::new(ConsoleRecognizer::new(
            events.clone(),
            RecognitionSettings::default(),
            microphone.clone(),
        )) as Box<dyn SpeechInput>
    });
    Capability::detect("speech_input", probe)
}

fn speech_output(
    enabled: bool,
    events: &EventSender,
    config: &ParleyConfig,
) -> SpeechOutputCapability {
    let probe = enabled.then(|| {
        Box::new(ConsoleSynthesizer::new(
            events.clone(),
            config.speech.words_per_minute,
        )) as Box<dyn SpeechOutput>
    });
    Capability::detect("speech_output", probe)
}

/// Answer one question without starting a session.
fn answer_once(
    matcher: &QueryMatcher,
    question: &str,
    dump_history: bool,
) -> parley_core::Result<()> {
    let resolution = matcher.resolve_match(question);
    tracing::info!(matched = ?resolution.matched, "Question answered");
    println!("{}", resolution.answer);

    if dump_history {
        let mut history = DialogueHistory::new();
        history.record(question, resolution.answer);
        println!("{}", history.to_json()?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = ParleyConfig::load_or_default(&config_file);

    // Tracing. Logs go to stderr so stdout stays for the conversation.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Knowledge.
    let knowledge = KnowledgeBase::with_extra(&config.knowledge.entries)?;
    tracing::info!(entries = knowledge.len(), "Knowledge base ready");
    let matcher = QueryMatcher::new(knowledge);

    if let Some(ref question) = args.ask {
        answer_once(&matcher, question, args.dump_history)?;
        return Ok(());
    }

    // === Session ===

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (view_tx, mut view_rx) = watch::channel(SessionView::default());
    let microphone = ConsoleMicrophone::new();

    let voice_input = args.voice_input_enabled(config.speech.input_enabled);
    let input = speech_input(voice_input, &events_tx, &microphone);
    let output = speech_output(
        args.voice_output_enabled(config.speech.output_enabled),
        &events_tx,
        &config,
    );

    let controller = SessionController::new(matcher, input, output);
    let session = tokio::spawn(controller.run(events_rx, view_tx));

    let renderer = ConsoleRenderer::new(config.general.assistant_name.clone());
    let rendering = tokio::spawn(renderer.run(view_rx.clone()));

    println!("{}", HELP);

    // === Console loop ===

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match ConsoleCommand::parse(&line) {
            None => continue,
            Some(ConsoleCommand::Quit) => break,
            Some(ConsoleCommand::Help) => println!("{}", HELP),
            Some(ConsoleCommand::Unknown(command)) => {
                println!("Unknown command {}. Try /help.", command)
            }
            Some(ConsoleCommand::SpeakOrStop) => {
                let _ = events_tx.send(SessionEvent::Command(UserCommand::SpeakOrStop));
            }
            Some(ConsoleCommand::History) => {
                let history = view_rx.borrow().history.clone();
                println!("{}", serde_json::to_string_pretty(&history)?);
            }
            Some(ConsoleCommand::Ask(question)) => {
                if !voice_input {
                    println!("Voice input is disabled. Use --ask to ask a single question.");
                    continue;
                }
                if !console::ask_aloud(&question, &microphone, &events_tx, &mut view_rx).await {
                    println!("(question not heard, please ask again)");
                }
            }
        }
    }

    // === Shutdown ===

    let _ = events_tx.send(SessionEvent::Shutdown);
    let controller = session.await?;
    let _ = rendering.await;

    if args.dump_history {
        println!("{}", controller.history().to_json()?);
    }

    tracing::info!(turns = controller.history().len(), "Parley stopped");
    Ok(())
}
