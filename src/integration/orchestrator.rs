//! Turn-taking orchestrator
//!
//! Connects the dialogue engine to the speech ports:
//! Listen -> Engine -> Speak, repeated on a session worker thread until the
//! session's cancellation token fires.
//!
//! Locking: the session lock is always taken before the engine lock, and
//! neither is held across a blocking speech call.

use super::config::AppConfig;
use super::events::{ControlCommand, ControlEvent};
use crate::dialogue::{ConversationSummary, DialogueEngine, DialoguePhase};
use crate::messages::{export::default_export_name, export_to_file, TranscriptEntry};
use crate::speech::{self, ListenError, PitchFrame, SpeechInput, SpeechOutput};
use crate::utils::{event_channel, CancellationToken, EventSink, EventStream};
use crate::{CallbotError, Result};
use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Timing and limits used by the turn loop
#[derive(Clone, Debug)]
struct TurnSettings {
    listen_timeout: Duration,
    phrase_limit: Duration,
    calibration: Duration,
    loop_interval: Duration,
    max_input_chars: usize,
    export_dir: PathBuf,
}

impl TurnSettings {
    fn from_config(config: &AppConfig) -> Self {
        Self {
            listen_timeout: config.speech.listen_timeout(),
            phrase_limit: config.speech.phrase_limit(),
            calibration: config.speech.calibration_duration(),
            loop_interval: config.orchestrator.loop_interval(),
            max_input_chars: config.orchestrator.max_input_chars,
            export_dir: config.export_dir.clone(),
        }
    }
}

struct Session {
    token: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

struct Inner {
    settings: TurnSettings,
    engine: Mutex<DialogueEngine>,
    output: Arc<dyn SpeechOutput>,
    input: Arc<dyn SpeechInput>,
    /// Held for the duration of one `speak` so lines never overlap
    voice: Mutex<()>,
    session: Mutex<Option<Session>>,
    /// Workers of stopped sessions, joined on shutdown
    lingering: Mutex<Vec<JoinHandle<()>>>,
    /// Result of the one-time output initialization
    output_ready: Mutex<Option<Result<()>>>,
    events: EventSink,
}

/// Owner of the conversation. Cheap to clone; clones share one session.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    /// Create an orchestrator around the given speech ports
    pub fn new(
        config: &AppConfig,
        output: Arc<dyn SpeechOutput>,
        input: Arc<dyn SpeechInput>,
    ) -> Result<(Self, EventStream)> {
        config.speech.validate()?;
        let (events, stream) = event_channel();

        let mut engine = DialogueEngine::new(&config.dialogue)?;
        let sink = events.clone();
        engine.set_history_callback(move |entry| {
            sink.emit(ControlEvent::HistoryEntry(entry.clone()));
        });
        let sink = events.clone();
        engine.set_status_callback(move |message| {
            info!("{}", message);
            sink.emit(ControlEvent::status(message));
        });

        output.set_volume(config.speech.volume);
        info!(
            "Orchestrator using '{}' output and '{}' input",
            output.name(),
            input.name()
        );

        let orchestrator = Self {
            inner: Arc::new(Inner {
                settings: TurnSettings::from_config(config),
                engine: Mutex::new(engine),
                output,
                input,
                voice: Mutex::new(()),
                session: Mutex::new(None),
                lingering: Mutex::new(Vec::new()),
                output_ready: Mutex::new(None),
                events,
            }),
        };

        Ok((orchestrator, stream))
    }

    /// Create an orchestrator with the speech adapters this build supports
    pub fn from_config(config: &AppConfig) -> Result<(Self, EventStream)> {
        let output = speech::build_output(&config.speech);
        let input = speech::build_input(&config.speech);
        Self::new(config, output, input)
    }

    /// Begin a conversation and spawn its worker.
    ///
    /// Returns `Ok(false)` if a conversation is already running.
    pub fn start(&self) -> Result<bool> {
        if self.inner.session.lock().is_some() {
            debug!("Start ignored, conversation already active");
            return Ok(false);
        }

        if let Err(e) = self.inner.ensure_output() {
            self.inner
                .emit(ControlEvent::status(format!("Failed to start conversation: {}", e)));
            self.inner.emit(ControlEvent::Error(e.user_message()));
            return Err(e);
        }

        let mut session = self.inner.session.lock();
        if session.is_some() {
            return Ok(false);
        }

        let opening = self.inner.engine.lock().start();
        self.inner.emit(ControlEvent::ConversationStateChanged(true));

        let token = CancellationToken::new();
        let worker_token = token.clone();
        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name("callbot-session".into())
            .spawn(move || inner.run_session(worker_token, opening));

        match spawned {
            Ok(worker) => {
                *session = Some(Session {
                    token,
                    worker: Some(worker),
                });
                info!("Conversation session started");
                Ok(true)
            }
            Err(e) => {
                self.inner.engine.lock().stop();
                self.inner.emit(ControlEvent::ConversationStateChanged(false));
                Err(CallbotError::Worker(format!("Failed to spawn session: {}", e)))
            }
        }
    }

    /// End the conversation. Returns `false` if none was running.
    ///
    /// The worker is signalled, not joined; it exits after its current
    /// blocking call returns.
    pub fn stop(&self) -> bool {
        let Some(mut session) = self.inner.session.lock().take() else {
            debug!("Stop ignored, no active conversation");
            return false;
        };

        session.token.cancel();
        self.inner.output.stop();
        self.inner.engine.lock().stop();
        self.inner.emit(ControlEvent::ConversationStateChanged(false));

        if let Some(worker) = session.worker.take() {
            self.inner.lingering.lock().push(worker);
        }
        self.inner.reap_finished();
        true
    }

    /// Cancel in-flight speech and listening without taking the engine lock
    pub fn interrupt(&self) {
        if let Some(session) = self.inner.session.lock().as_ref() {
            session.token.cancel();
        }
        self.inner.output.stop();
    }

    /// Typed user reply. Speaks and returns the bot's answer, if any.
    pub fn send_text(&self, text: &str) -> Result<Option<String>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let limit = self.inner.settings.max_input_chars;
        if text.chars().count() > limit {
            self.inner.emit(ControlEvent::status(format!(
                "Message too long (max {} characters)",
                limit
            )));
            return Ok(None);
        }

        let reply = self.inner.engine.lock().process_user_utterance(text);
        let Some(reply) = reply else {
            self.inner
                .emit(ControlEvent::status("Start the conversation before sending messages"));
            return Ok(None);
        };

        let token = self
            .inner
            .session
            .lock()
            .as_ref()
            .map(|s| s.token.clone())
            .unwrap_or_default();

        let spoken = panic::catch_unwind(AssertUnwindSafe(|| self.inner.say(&reply, &token)))
            .unwrap_or_else(|payload| Err(CallbotError::Worker(panic_message(payload))));

        if let Err(e) = spoken {
            error!("Speaking typed reply failed: {}", e);
            self.inner.emit(ControlEvent::status(format!("Conversation error: {}", e)));
            self.inner.emit(ControlEvent::Error(e.user_message()));
            self.stop();
            return Err(e);
        }

        Ok(Some(reply))
    }

    /// Empty the transcript; the conversation keeps going
    pub fn clear_log(&self) {
        self.inner.engine.lock().clear_history();
        self.inner.emit(ControlEvent::HistoryCleared);
    }

    /// Stop and wipe all progress
    pub fn reset(&self) {
        self.stop();
        self.inner.engine.lock().reset();
        self.inner.emit(ControlEvent::HistoryCleared);
    }

    pub fn set_volume(&self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        debug!("Volume set to {:.2}", volume);
        self.inner.output.set_volume(volume);
    }

    /// Write the transcript to `path`, or to a timestamped file in the
    /// configured export directory
    pub fn export(&self, path: Option<PathBuf>) -> Result<PathBuf> {
        let entries = self.inner.engine.lock().history();
        let path = path.unwrap_or_else(|| self.inner.settings.export_dir.join(default_export_name()));

        match export_to_file(&entries, &path) {
            Ok(path) => {
                self.inner.emit(ControlEvent::status(format!(
                    "Exported conversation to {}",
                    path.display()
                )));
                Ok(path)
            }
            Err(e) => {
                self.inner.emit(ControlEvent::status(format!("Export error: {}", e)));
                Err(e)
            }
        }
    }

    /// Stop the conversation and wait for every worker to exit
    pub fn shutdown(&self) {
        self.stop();
        let workers: Vec<_> = self.inner.lingering.lock().drain(..).collect();
        for worker in workers {
            if worker.join().is_err() {
                warn!("Session worker panicked during shutdown");
            }
        }
        info!("Orchestrator shut down");
    }

    pub fn is_active(&self) -> bool {
        self.inner.engine.lock().is_active()
    }

    pub fn phase(&self) -> DialoguePhase {
        self.inner.engine.lock().phase()
    }

    pub fn summary(&self) -> ConversationSummary {
        self.inner.engine.lock().summary()
    }

    pub fn history(&self) -> Vec<TranscriptEntry> {
        self.inner.engine.lock().history()
    }

    /// Whether a session worker is currently registered
    pub fn has_session(&self) -> bool {
        self.inner.session.lock().is_some()
    }

    pub fn set_waker<F>(&self, waker: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.events.set_waker(waker);
    }

    /// Apply one control command. Returns `false` once shut down.
    pub fn handle_command(&self, command: ControlCommand) -> bool {
        debug!("Handling {:?}", command);
        match command {
            ControlCommand::Start => {
                if let Err(e) = self.start() {
                    warn!("Start failed: {}", e);
                }
            }
            ControlCommand::Stop => {
                self.stop();
            }
            ControlCommand::SendText(text) => {
                if let Err(e) = self.send_text(&text) {
                    warn!("Send failed: {}", e);
                }
            }
            ControlCommand::ClearLog => self.clear_log(),
            ControlCommand::Reset => self.reset(),
            ControlCommand::SetVolume(volume) => self.set_volume(volume),
            ControlCommand::Export(path) => {
                if let Err(e) = self.export(Some(path)) {
                    warn!("Export failed: {}", e);
                }
            }
            ControlCommand::Shutdown => {
                self.shutdown();
                return false;
            }
        }
        true
    }

    /// Run commands on a dedicated control thread so callers never block
    pub fn spawn_control_loop(&self) -> Result<(OrchestratorHandle, JoinHandle<()>)> {
        let (command_tx, command_rx) = bounded::<ControlCommand>(100);
        let orchestrator = self.clone();

        let thread = thread::Builder::new()
            .name("callbot-control".into())
            .spawn(move || {
                info!("Control loop started");
                loop {
                    match command_rx.recv() {
                        Ok(command) => {
                            let handled = panic::catch_unwind(AssertUnwindSafe(|| {
                                orchestrator.handle_command(command)
                            }));
                            match handled {
                                Ok(true) => {}
                                Ok(false) => break,
                                Err(payload) => {
                                    error!("Control command panicked: {}", panic_message(payload));
                                }
                            }
                        }
                        Err(_) => {
                            debug!("Command channel closed");
                            orchestrator.shutdown();
                            break;
                        }
                    }
                }
                info!("Control loop stopped");
            })
            .map_err(|e| CallbotError::Worker(format!("Failed to spawn control loop: {}", e)))?;

        let handle = OrchestratorHandle {
            command_tx,
            orchestrator: self.clone(),
        };
        Ok((handle, thread))
    }
}

impl Inner {
    fn emit(&self, event: ControlEvent) {
        if let ControlEvent::Status(message) = &event {
            debug!("status: {}", message);
        }
        self.events.emit(event);
    }

    fn ensure_output(&self) -> Result<()> {
        let mut ready = self.output_ready.lock();
        ready
            .get_or_insert_with(|| {
                let result = self.output.initialize();
                if let Err(e) = &result {
                    error!("Speech output failed to initialize: {}", e);
                }
                result
            })
            .clone()
    }

    fn reap_finished(&self) {
        self.lingering.lock().retain(|worker| !worker.is_finished());
    }

    fn run_session(self: Arc<Self>, token: CancellationToken, opening: Option<String>) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.session_loop(&token, opening)));

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(payload) => Some(CallbotError::Worker(panic_message(payload))),
        };

        self.finish_session(&token, failure);
    }

    fn session_loop(&self, token: &CancellationToken, opening: Option<String>) -> Result<()> {
        if let Some(line) = opening {
            self.say(&line, token)?;
        }
        if token.is_cancelled() {
            return Ok(());
        }

        if let Err(e) = self.input.calibrate(self.settings.calibration) {
            warn!("Microphone calibration failed: {}", e);
            self.emit(ControlEvent::status(format!("Microphone calibration failed: {}", e)));
        }

        while !token.is_cancelled() && self.engine.lock().is_active() {
            match self.input.listen(
                self.settings.listen_timeout,
                self.settings.phrase_limit,
                token,
            ) {
                Ok(text) => {
                    if token.is_cancelled() {
                        break;
                    }
                    debug!("Heard: {}", text);
                    self.respond(&text, token)?;
                }
                Err(ListenError::Cancelled) => break,
                Err(e) => {
                    if self.input.is_live() {
                        self.emit(ControlEvent::status(e.status_message()));
                    } else {
                        debug!("Listen returned {}", e);
                    }
                }
            }

            if token.wait(self.settings.loop_interval) {
                break;
            }
        }

        Ok(())
    }

    fn respond(&self, text: &str, token: &CancellationToken) -> Result<()> {
        let reply = self.engine.lock().process_user_utterance(text);
        match reply {
            Some(reply) if !token.is_cancelled() => self.say(&reply, token),
            _ => Ok(()),
        }
    }

    fn say(&self, line: &str, token: &CancellationToken) -> Result<()> {
        self.emit(ControlEvent::Visualize(PitchFrame::random()));
        let _voice = self.voice.lock();
        if token.is_cancelled() {
            return Ok(());
        }
        self.output.speak(line, token)
    }

    /// Called by the worker on exit. Only a session that ended on its own
    /// (not through `stop`) still owns the state and must clean it up.
    fn finish_session(&self, token: &CancellationToken, failure: Option<CallbotError>) {
        if let Some(e) = failure.filter(|_| !token.is_cancelled()) {
            error!("Conversation worker failed: {}", e);
            self.emit(ControlEvent::status(format!("Conversation error: {}", e)));
            self.emit(ControlEvent::Error(e.user_message()));
        }

        let mut session = self.session.lock();
        let owns = session
            .as_ref()
            .map_or(false, |s| s.token.same_as(token));

        if owns && !token.is_cancelled() {
            session.take();
            self.engine.lock().stop();
            self.emit(ControlEvent::ConversationStateChanged(false));
        }
        debug!("Session worker exiting");
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Non-blocking access to the orchestrator for the UI thread
#[derive(Clone)]
pub struct OrchestratorHandle {
    command_tx: Sender<ControlCommand>,
    orchestrator: Orchestrator,
}

impl OrchestratorHandle {
    /// Send a command to the control loop
    pub fn send_command(&self, command: ControlCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|e| CallbotError::Channel(format!("Failed to send command: {}", e)))
    }

    pub fn start(&self) -> Result<()> {
        self.send_command(ControlCommand::Start)
    }

    /// Interrupts immediately, then queues the full stop
    pub fn stop(&self) -> Result<()> {
        self.orchestrator.interrupt();
        self.send_command(ControlCommand::Stop)
    }

    pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.send_command(ControlCommand::SendText(text.into()))
    }

    pub fn clear_log(&self) -> Result<()> {
        self.send_command(ControlCommand::ClearLog)
    }

    pub fn reset(&self) -> Result<()> {
        self.orchestrator.interrupt();
        self.send_command(ControlCommand::Reset)
    }

    /// Applied directly; volume changes never wait behind speech
    pub fn set_volume(&self, volume: f32) {
        self.orchestrator.set_volume(volume);
    }

    pub fn export(&self, path: PathBuf) -> Result<()> {
        self.send_command(ControlCommand::Export(path))
    }

    pub fn shutdown(&self) -> Result<()> {
        self.orchestrator.interrupt();
        self.send_command(ControlCommand::Shutdown)
    }

    pub fn set_waker<F>(&self, waker: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.orchestrator.set_waker(waker);
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }
}
