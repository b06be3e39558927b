use std::time::Duration;

use lectura_transcript::{SpeechDebugEvent, TranscriptAccumulator, TranscriptUpdate};

use crate::config::ListenerConfig;
use crate::engine::{EngineErrorKind, EngineEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "lowercase")]
pub enum ListenerState {
    Idle,
    Listening,
    Restarting,
}

/// Linear restart backoff: `min(max, base * (attempt + 1))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(150),
            max: Duration::from_millis(1600),
        }
    }
}

impl Backoff {
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base
            .saturating_mul(attempt.saturating_add(1))
            .min(self.max)
    }
}

/// Side effects the owner of a [`SessionController`] must carry out, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartEngine,
    StopEngine,
    /// Deliver `restart_due(generation)` after `delay`.
    ScheduleRestart {
        delay: Duration,
        attempt: u32,
        generation: u64,
    },
    CancelRestart,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub commands: Vec<Command>,
    pub update: Option<TranscriptUpdate>,
}

impl Transition {
    fn commands(commands: Vec<Command>) -> Self {
        Self {
            commands,
            update: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
pub struct ListenerSnapshot {
    pub state: ListenerState,
    pub listening: bool,
    pub final_text: String,
    pub interim_text: String,
    pub combined_text: String,
    pub error: Option<String>,
}

/// Listening lifecycle of one reading session.
///
/// Pure: the controller never touches the engine or a clock. Every input
/// returns the [`Command`]s its owner must execute. Restart timers are
/// identified by a generation number so a timer that fires after being
/// cancelled is recognised as stale and ignored.
pub struct SessionController {
    state: ListenerState,
    keep_listening: bool,
    attempt: u32,
    generation: u64,
    restart_pending: bool,
    error: Option<EngineErrorKind>,
    backoff: Backoff,
    transcript: TranscriptAccumulator,
}

impl SessionController {
    pub fn new(config: &ListenerConfig) -> Self {
        Self {
            state: ListenerState::Idle,
            keep_listening: false,
            attempt: 0,
            generation: 0,
            restart_pending: false,
            error: None,
            backoff: config.backoff(),
            transcript: TranscriptAccumulator::with_config(config.collapse())
                .with_debug(config.debug),
        }
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state != ListenerState::Idle
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn error(&self) -> Option<&EngineErrorKind> {
        self.error.as_ref()
    }

    pub fn debug_events(&self) -> impl Iterator<Item = &SpeechDebugEvent> {
        self.transcript.debug_events()
    }

    /// `Idle -> Listening`. The transcript is kept; the session actor calls
    /// [`Self::reset`] first so each attempt starts empty.
    pub fn start(&mut self) -> Result<Transition, crate::Error> {
        if self.state != ListenerState::Idle {
            return Err(crate::Error::SessionActive);
        }

        self.keep_listening = true;
        self.attempt = 0;
        self.error = None;
        self.state = ListenerState::Listening;

        let mut commands = self.cancel_restart();
        commands.push(Command::StartEngine);
        Ok(Transition::commands(commands))
    }

    pub fn handle_event(&mut self, event: EngineEvent) -> Transition {
        match event {
            EngineEvent::Result(result) => {
                if self.state == ListenerState::Idle {
                    return Transition::default();
                }
                self.attempt = 0;
                Transition {
                    commands: Vec::new(),
                    update: Some(self.transcript.process_result(&result)),
                }
            }
            EngineEvent::Error { error, .. } => {
                let fatal = error.is_fatal();
                self.error = Some(error);
                if !fatal {
                    return Transition::default();
                }

                self.keep_listening = false;
                self.state = ListenerState::Idle;
                Transition::commands(self.cancel_restart())
            }
            EngineEvent::End => {
                if !self.keep_listening {
                    self.state = ListenerState::Idle;
                    return Transition::default();
                }

                let mut commands = self.cancel_restart();
                let delay = self.backoff.delay(self.attempt);
                self.attempt = self.attempt.saturating_add(1);
                self.generation += 1;
                self.restart_pending = true;
                self.state = ListenerState::Restarting;

                commands.push(Command::ScheduleRestart {
                    delay,
                    attempt: self.attempt,
                    generation: self.generation,
                });
                Transition::commands(commands)
            }
        }
    }

    /// A restart timer fired. Stale generations and timers that outlived an
    /// explicit stop are ignored.
    pub fn restart_due(&mut self, generation: u64) -> Transition {
        if !self.restart_pending || generation != self.generation {
            return Transition::default();
        }
        self.restart_pending = false;

        if !self.keep_listening || self.state != ListenerState::Restarting {
            return Transition::default();
        }

        self.state = ListenerState::Listening;
        Transition::commands(vec![Command::StartEngine])
    }

    /// Safe from any state.
    pub fn stop(&mut self) -> Transition {
        self.keep_listening = false;
        self.attempt = 0;
        self.state = ListenerState::Idle;

        let mut commands = self.cancel_restart();
        commands.push(Command::StopEngine);
        Transition::commands(commands)
    }

    pub fn reset(&mut self) -> Result<(), crate::Error> {
        if self.state != ListenerState::Idle {
            return Err(crate::Error::SessionActive);
        }

        self.keep_listening = false;
        self.attempt = 0;
        self.error = None;
        self.transcript.reset();
        Ok(())
    }

    pub fn snapshot(&self) -> ListenerSnapshot {
        let text = self.transcript.state();
        ListenerSnapshot {
            state: self.state,
            listening: self.is_listening(),
            final_text: text.final_text.clone(),
            interim_text: text.interim_text.clone(),
            combined_text: text.combined_text.clone(),
            error: self.error.as_ref().map(ToString::to_string),
        }
    }

    fn cancel_restart(&mut self) -> Vec<Command> {
        if !self.restart_pending {
            return Vec::new();
        }
        self.restart_pending = false;
        self.generation += 1;
        vec![Command::CancelRestart]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectura_transcript::{RecognitionEntry, RecognitionResult};

    fn controller() -> SessionController {
        SessionController::new(&ListenerConfig::default())
    }

    fn result(entries: Vec<RecognitionEntry>) -> EngineEvent {
        EngineEvent::Result(RecognitionResult {
            result_index: 0,
            results: entries,
        })
    }

    fn error(kind: &str) -> EngineEvent {
        EngineEvent::Error {
            error: kind.into(),
            message: None,
        }
    }

    fn scheduled(transition: &Transition) -> Option<(Duration, u32, u64)> {
        transition.commands.iter().find_map(|c| match c {
            Command::ScheduleRestart {
                delay,
                attempt,
                generation,
            } => Some((*delay, *attempt, *generation)),
            _ => None,
        })
    }

    #[test]
    fn backoff_grows_linearly_up_to_the_ceiling() {
        let backoff = Backoff::default();
        let delays: Vec<u64> = (0..13).map(|a| backoff.delay(a).as_millis() as u64).collect();
        assert_eq!(
            delays,
            [150, 300, 450, 600, 750, 900, 1050, 1200, 1350, 1500, 1600, 1600, 1600]
        );
        assert_eq!(backoff.delay(u32::MAX), Duration::from_millis(1600));
    }

    #[test]
    fn start_from_idle_starts_the_engine() {
        let mut c = controller();
        let t = c.start().unwrap();

        assert_eq!(t.commands, [Command::StartEngine]);
        assert_eq!(c.state(), ListenerState::Listening);
        assert!(c.snapshot().listening);
        assert!(matches!(c.start(), Err(crate::Error::SessionActive)));
    }

    #[test]
    fn end_while_listening_schedules_increasing_restarts() {
        let mut c = controller();
        c.start().unwrap();

        let (delay, attempt, generation) = scheduled(&c.handle_event(EngineEvent::End)).unwrap();
        assert_eq!((delay, attempt), (Duration::from_millis(150), 1));
        assert_eq!(c.state(), ListenerState::Restarting);
        assert!(c.is_listening());

        assert_eq!(c.restart_due(generation).commands, [Command::StartEngine]);
        assert_eq!(c.state(), ListenerState::Listening);

        let (delay, attempt, _) = scheduled(&c.handle_event(EngineEvent::End)).unwrap();
        assert_eq!((delay, attempt), (Duration::from_millis(300), 2));
    }

    #[test]
    fn result_resets_the_attempt_counter() {
        let mut c = controller();
        c.start().unwrap();
        let (_, _, generation) = scheduled(&c.handle_event(EngineEvent::End)).unwrap();
        c.restart_due(generation);
        assert_eq!(c.attempt(), 1);

        let t = c.handle_event(result(vec![RecognitionEntry::settled("hola")]));
        assert_eq!(c.attempt(), 0);
        assert_eq!(t.update.unwrap().state.final_text, "hola");

        let (delay, _, _) = scheduled(&c.handle_event(EngineEvent::End)).unwrap();
        assert_eq!(delay, Duration::from_millis(150));
    }

    #[test]
    fn stop_cancels_a_pending_restart() {
        let mut c = controller();
        c.start().unwrap();
        let (_, _, generation) = scheduled(&c.handle_event(EngineEvent::End)).unwrap();

        let t = c.stop();
        assert_eq!(t.commands, [Command::CancelRestart, Command::StopEngine]);
        assert_eq!(c.state(), ListenerState::Idle);

        // The timer fired anyway.
        assert!(c.restart_due(generation).commands.is_empty());
        assert_eq!(c.state(), ListenerState::Idle);
    }

    #[test]
    fn stop_is_safe_in_every_state() {
        let mut c = controller();
        assert_eq!(c.stop().commands, [Command::StopEngine]);
        assert_eq!(c.stop().commands, [Command::StopEngine]);
        assert_eq!(c.state(), ListenerState::Idle);
    }

    #[test]
    fn stale_restart_generation_is_ignored() {
        let mut c = controller();
        c.start().unwrap();
        let (_, _, first) = scheduled(&c.handle_event(EngineEvent::End)).unwrap();

        // A second end before the timer fires replaces the pending restart.
        let t = c.handle_event(EngineEvent::End);
        assert_eq!(t.commands[0], Command::CancelRestart);
        let (_, _, second) = scheduled(&t).unwrap();
        assert_ne!(first, second);

        assert!(c.restart_due(first).commands.is_empty());
        assert_eq!(c.restart_due(second).commands, [Command::StartEngine]);
    }

    #[test]
    fn fatal_error_stops_listening_without_restart() {
        let mut c = controller();
        c.start().unwrap();
        scheduled(&c.handle_event(EngineEvent::End)).unwrap();

        let t = c.handle_event(error("not-allowed"));
        assert_eq!(t.commands, [Command::CancelRestart]);
        assert_eq!(c.state(), ListenerState::Idle);
        assert_eq!(c.snapshot().error.as_deref(), Some("not-allowed"));

        // The engine's trailing end-of-stream must not revive the session.
        assert!(c.handle_event(EngineEvent::End).commands.is_empty());
        assert_eq!(c.state(), ListenerState::Idle);
    }

    #[test]
    fn transient_error_is_recorded_but_keeps_listening() {
        let mut c = controller();
        c.start().unwrap();

        assert!(c.handle_event(error("network")).commands.is_empty());
        assert_eq!(c.state(), ListenerState::Listening);
        assert_eq!(c.error(), Some(&EngineErrorKind::Transient("network".into())));

        assert!(scheduled(&c.handle_event(EngineEvent::End)).is_some());
    }

    #[test]
    fn end_without_intent_goes_idle() {
        let mut c = controller();
        c.start().unwrap();
        c.stop();
        assert!(c.handle_event(EngineEvent::End).commands.is_empty());
        assert_eq!(c.state(), ListenerState::Idle);
    }

    #[test]
    fn late_results_while_idle_are_ignored() {
        let mut c = controller();
        c.start().unwrap();
        c.handle_event(result(vec![RecognitionEntry::settled("uno dos")]));
        c.stop();

        let t = c.handle_event(result(vec![RecognitionEntry::settled("tres")]));
        assert!(t.update.is_none());
        assert_eq!(c.snapshot().final_text, "uno dos");
    }

    #[test]
    fn results_update_final_and_interim_text() {
        let mut c = controller();
        c.start().unwrap();

        c.handle_event(result(vec![
            RecognitionEntry::settled("el perro"),
            RecognitionEntry::interim("corre"),
        ]));
        let snapshot = c.snapshot();
        assert_eq!(snapshot.final_text, "el perro");
        assert_eq!(snapshot.interim_text, "corre");
        assert_eq!(snapshot.combined_text, "el perro corre");

        c.handle_event(result(vec![RecognitionEntry::settled("corre rapido")]));
        let snapshot = c.snapshot();
        assert_eq!(snapshot.final_text, "el perro corre rapido");
        assert_eq!(snapshot.interim_text, "");
    }

    #[test]
    fn reset_is_only_valid_when_idle() {
        let mut c = controller();
        c.start().unwrap();
        c.handle_event(result(vec![RecognitionEntry::settled("hola")]));
        c.handle_event(error("network"));

        assert!(matches!(c.reset(), Err(crate::Error::SessionActive)));

        c.stop();
        c.reset().unwrap();
        let snapshot = c.snapshot();
        assert_eq!(snapshot.combined_text, "");
        assert_eq!(snapshot.error, None);
    }

    #[test]
    fn debug_log_follows_config() {
        let config = ListenerConfig {
            debug: true,
            ..Default::default()
        };
        let mut c = SessionController::new(&config);
        c.start().unwrap();
        c.handle_event(result(vec![RecognitionEntry::interim("hola")]));
        assert_eq!(c.debug_events().count(), 1);

        c.stop();
        c.reset().unwrap();
        assert_eq!(c.debug_events().count(), 0);

        assert_eq!(controller().debug_events().count(), 0);
    }
}
