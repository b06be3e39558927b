use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use listener_core::actors::{SessionArgs, SessionMsg, SessionParams, spawn_session};
use listener_core::{
    EngineEvent, EngineEventSink, ListenerConfig, ListenerRuntime, ListenerState,
    RecognitionEngine, SessionErrorEvent, SessionLifecycleEvent, SessionTranscriptEvent,
};

/// Replay recorded recognition runs through a reading session and print the score.
#[derive(Parser)]
struct Args {
    /// JSON file with a `reference` text and `runs` of engine events
    fixture: PathBuf,

    /// Pause between replayed events
    #[arg(long, default_value_t = 40)]
    event_delay_ms: u64,
}

#[derive(serde::Deserialize)]
struct Fixture {
    reference: String,
    runs: Vec<Vec<EngineEvent>>,
}

struct ReplayEngine {
    runs: Arc<Mutex<VecDeque<Vec<EngineEvent>>>>,
    pending: Arc<AtomicUsize>,
    event_delay: Duration,
}

impl RecognitionEngine for ReplayEngine {
    fn start(&mut self, language: &str, sink: EngineEventSink) -> Result<(), listener_core::Error> {
        let run = self
            .runs
            .lock()
            .map_err(|_| listener_core::Error::EngineStart("replay state poisoned".into()))?
            .pop_front()
            .ok_or_else(|| listener_core::Error::EngineStart("recording exhausted".into()))?;

        eprintln!("[engine] start language={language} events={}", run.len());

        let pending = self.pending.clone();
        let delay = self.event_delay;
        tokio::spawn(async move {
            for event in run {
                tokio::time::sleep(delay).await;
                let delivered = sink.send(event);
                pending.fetch_sub(1, Ordering::SeqCst);
                if !delivered {
                    break;
                }
            }
        });
        Ok(())
    }

    fn stop(&mut self) {
        eprintln!("[engine] stop");
    }
}

struct CliRuntime;

impl ListenerRuntime for CliRuntime {
    fn emit_lifecycle(&self, event: SessionLifecycleEvent) {
        match &event {
            SessionLifecycleEvent::Active { session_id } => {
                eprintln!("[lifecycle] active session={session_id}");
            }
            SessionLifecycleEvent::Restarting {
                attempt, delay_ms, ..
            } => {
                eprintln!("[lifecycle] restarting attempt={attempt} delay={delay_ms}ms");
            }
            SessionLifecycleEvent::Inactive { session_id, error } => {
                eprintln!("[lifecycle] inactive session={session_id} error={error:?}");
            }
        }
    }

    fn emit_transcript(&self, event: SessionTranscriptEvent) {
        println!("{}", serde_json::to_string(&event).unwrap_or_default());
    }

    fn emit_error(&self, event: SessionErrorEvent) {
        match &event {
            SessionErrorEvent::Fatal { error, message, .. } => {
                eprintln!("[error] fatal: {error} {message:?}");
            }
            SessionErrorEvent::Transient { error, .. } => {
                eprintln!("[error] transient: {error}");
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = ListenerConfig::from_env().expect("invalid READING_* configuration");

    let raw = std::fs::read_to_string(&args.fixture).expect("failed to read fixture");
    let fixture: Fixture = serde_json::from_str(&raw).expect("failed to parse fixture");

    let pending = Arc::new(AtomicUsize::new(fixture.runs.iter().map(Vec::len).sum()));
    let engine = ReplayEngine {
        runs: Arc::new(Mutex::new(fixture.runs.into())),
        pending: pending.clone(),
        event_delay: Duration::from_millis(args.event_delay_ms),
    };

    let (session, _handle) = spawn_session(SessionArgs {
        runtime: Arc::new(CliRuntime),
        engine: Box::new(engine),
        params: SessionParams {
            session_id: uuid::Uuid::new_v4().to_string(),
            reference_text: fixture.reference,
            config,
        },
    })
    .await
    .expect("failed to spawn session actor");

    let started = ractor::call!(session, SessionMsg::Start).expect("failed to send start message");
    if !started {
        eprintln!("Failed to start session");
        std::process::exit(1);
    }

    loop {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let snapshot =
            ractor::call!(session, SessionMsg::GetSnapshot).expect("session actor went away");
        let drained = pending.load(Ordering::SeqCst) == 0;
        if !snapshot.listening || (drained && snapshot.state != ListenerState::Restarting) {
            break;
        }
    }

    let scored = ractor::call!(session, SessionMsg::Stop).expect("failed to send stop message");
    match scored {
        Some(scored) => println!(
            "{}",
            serde_json::to_string_pretty(&scored).unwrap_or_default()
        ),
        None => eprintln!("Session was never started"),
    }
}
