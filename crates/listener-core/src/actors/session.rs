use std::sync::Arc;

use chrono::{DateTime, Utc};
use lectura_reading_score::{ScoredSession, SessionTiming, score_session};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};

use crate::actors::session_span;
use crate::{
    Command, EngineEvent, EngineEventSink, ListenerConfig, ListenerRuntime, ListenerSnapshot,
    RecognitionEngine, SessionController, SessionErrorEvent, SessionLifecycleEvent,
    SessionTranscriptEvent, Transition,
};

pub enum SessionMsg {
    Start(RpcReplyPort<bool>),
    /// Stops listening and scores whatever was read since the last start.
    Stop(RpcReplyPort<Option<ScoredSession>>),
    Reset(RpcReplyPort<Result<(), crate::Error>>),
    GetSnapshot(RpcReplyPort<ListenerSnapshot>),
    Engine(EngineEvent),
    RestartDue(u64),
}

#[derive(Debug, Clone)]
pub struct SessionParams {
    pub session_id: String,
    pub reference_text: String,
    pub config: ListenerConfig,
}

pub struct SessionArgs {
    pub runtime: Arc<dyn ListenerRuntime>,
    pub engine: Box<dyn RecognitionEngine>,
    pub params: SessionParams,
}

pub struct SessionState {
    runtime: Arc<dyn ListenerRuntime>,
    engine: Box<dyn RecognitionEngine>,
    params: SessionParams,
    controller: SessionController,
    restart_timer: Option<tokio::task::JoinHandle<()>>,
    started_at: Option<DateTime<Utc>>,
}

pub struct SessionActor;

pub async fn spawn_session(
    args: SessionArgs,
) -> Result<(ActorRef<SessionMsg>, tokio::task::JoinHandle<()>), crate::Error> {
    let (session_ref, handle) = Actor::spawn(None, SessionActor, args).await?;
    Ok((session_ref, handle))
}

#[ractor::async_trait]
impl Actor for SessionActor {
    type Msg = SessionMsg;
    type State = SessionState;
    type Arguments = SessionArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let controller = SessionController::new(&args.params.config);

        Ok(SessionState {
            runtime: args.runtime,
            engine: args.engine,
            params: args.params,
            controller,
            restart_timer: None,
            started_at: None,
        })
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.cancel_restart_timer();
        if state.controller.is_listening() {
            state.engine.stop();
        }
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let span = session_span(&state.params.session_id);
        let _guard = span.enter();

        match message {
            SessionMsg::Start(reply) => {
                // Every attempt is scored on its own speech only.
                if state.controller.reset().is_ok() {
                    state.started_at = None;
                }

                let started = match state.controller.start() {
                    Ok(transition) => {
                        state.started_at = Some(Utc::now());
                        tracing::info!("session_started");
                        state.runtime.emit_lifecycle(SessionLifecycleEvent::Active {
                            session_id: state.params.session_id.clone(),
                        });
                        state.apply(&myself, transition);
                        true
                    }
                    Err(error) => {
                        tracing::warn!(%error, "session_already_running");
                        false
                    }
                };
                let _ = reply.send(started);
            }
            SessionMsg::Stop(reply) => {
                let was_listening = state.controller.is_listening();
                let transition = state.controller.stop();
                state.apply(&myself, transition);
                if was_listening {
                    state.emit_inactive();
                }
                let _ = reply.send(state.score());
            }
            SessionMsg::Reset(reply) => {
                let result = state.controller.reset();
                if result.is_ok() {
                    state.started_at = None;
                    tracing::info!("session_reset");
                }
                let _ = reply.send(result);
            }
            SessionMsg::GetSnapshot(reply) => {
                let _ = reply.send(state.controller.snapshot());
            }
            SessionMsg::Engine(event) => {
                state.handle_engine_event(&myself, event);
            }
            SessionMsg::RestartDue(generation) => {
                state.restart_timer = None;
                let transition = state.controller.restart_due(generation);
                if transition.commands.is_empty() {
                    tracing::debug!(generation, "stale_restart_ignored");
                }
                state.apply(&myself, transition);
            }
        }

        Ok(())
    }
}

impl SessionState {
    fn handle_engine_event(&mut self, myself: &ActorRef<SessionMsg>, event: EngineEvent) {
        let was_listening = self.controller.is_listening();

        if let EngineEvent::Error { error, message } = &event {
            let session_id = self.params.session_id.clone();
            let message = message.clone();
            if error.is_fatal() {
                tracing::error!(kind = %error, "engine_error_fatal");
                self.runtime.emit_error(SessionErrorEvent::Fatal {
                    session_id,
                    error: error.to_string(),
                    message,
                });
            } else {
                tracing::warn!(kind = %error, "engine_error_transient");
                self.runtime.emit_error(SessionErrorEvent::Transient {
                    session_id,
                    error: error.to_string(),
                    message,
                });
            }
        }

        if matches!(event, EngineEvent::End) {
            tracing::debug!("engine_ended");
        }

        let transition = self.controller.handle_event(event);
        self.apply(myself, transition);

        if was_listening && !self.controller.is_listening() {
            self.emit_inactive();
        }
    }

    fn apply(&mut self, myself: &ActorRef<SessionMsg>, transition: Transition) {
        for command in transition.commands {
            match command {
                Command::StartEngine => {
                    let sink = EngineEventSink::new(myself.clone());
                    match self.engine.start(&self.params.config.language, sink) {
                        Ok(()) => tracing::info!("engine_started"),
                        // Stays listening; the engine's next end or error retries.
                        Err(error) => tracing::warn!(%error, "engine_start_failed"),
                    }
                }
                Command::StopEngine => {
                    self.engine.stop();
                    tracing::info!("engine_stopped");
                }
                Command::ScheduleRestart {
                    delay,
                    attempt,
                    generation,
                } => {
                    self.cancel_restart_timer();

                    let delay_ms = delay.as_millis() as u64;
                    tracing::info!(attempt, delay_ms, "restart_scheduled");
                    self.runtime
                        .emit_lifecycle(SessionLifecycleEvent::Restarting {
                            session_id: self.params.session_id.clone(),
                            attempt,
                            delay_ms,
                        });

                    let session = myself.clone();
                    self.restart_timer = Some(tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = session.cast(SessionMsg::RestartDue(generation));
                    }));
                }
                Command::CancelRestart => {
                    self.cancel_restart_timer();
                    tracing::debug!("restart_cancelled");
                }
            }
        }

        if let Some(update) = transition.update {
            self.runtime
                .emit_transcript(SessionTranscriptEvent::Updated {
                    session_id: self.params.session_id.clone(),
                    final_text: update.state.final_text,
                    interim_text: update.state.interim_text,
                    combined_text: update.state.combined_text,
                });
        }
    }

    fn cancel_restart_timer(&mut self) {
        if let Some(timer) = self.restart_timer.take() {
            timer.abort();
        }
    }

    fn emit_inactive(&self) {
        tracing::info!("session_inactive");
        self.runtime
            .emit_lifecycle(SessionLifecycleEvent::Inactive {
                session_id: self.params.session_id.clone(),
                error: self.controller.error().map(ToString::to_string),
            });
    }

    fn score(&mut self) -> Option<ScoredSession> {
        let started_at = self.started_at.take()?;
        let timing = SessionTiming::new(started_at, Utc::now());
        let transcript = self.controller.snapshot().combined_text;
        let scored = score_session(&self.params.reference_text, &transcript, &timing);

        tracing::info!(
            wpm = scored.result.wpm,
            accuracy_percent = scored.result.accuracy_percent,
            duration_seconds = scored.result.duration_seconds,
            invalid_short = scored.result.invalid_short,
            "session_scored"
        );
        Some(scored)
    }
}
