//! Orchestrator tests with scripted speech ports
//!
//! The fake listener is fed through a crossbeam channel so each test decides
//! exactly what the "customer" says and when.

use callbot::integration::{AppConfig, ControlEvent, Orchestrator};
use callbot::messages::Speaker;
use callbot::speech::{ListenError, SpeechInput, SpeechOutput};
use callbot::utils::{CancellationToken, EventStream};
use callbot::{CallbotError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const OPENING: &str = "Hello, I'm calling about rice.";
const PRICE_LINE: &str = "Price is 588 yen/kg.";
const WAIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct RecordingSpeaker {
    spoken: Mutex<Vec<String>>,
    volume: Mutex<f32>,
    stops: AtomicUsize,
    /// Block each speak until cancelled
    hold: bool,
}

impl RecordingSpeaker {
    fn holding() -> Self {
        Self {
            hold: true,
            ..Default::default()
        }
    }

    fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }
}

impl SpeechOutput for RecordingSpeaker {
    fn speak(&self, text: &str, cancel: &CancellationToken) -> Result<()> {
        self.spoken.lock().push(text.to_string());
        if self.hold {
            cancel.wait(Duration::from_secs(30));
        }
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn set_volume(&self, volume: f32) {
        *self.volume.lock() = volume;
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Speaker whose adapter panics mid-line
struct PanickingSpeaker;

impl SpeechOutput for PanickingSpeaker {
    fn speak(&self, _text: &str, _cancel: &CancellationToken) -> Result<()> {
        panic!("voice driver crashed");
    }

    fn stop(&self) {}

    fn set_volume(&self, _volume: f32) {}

    fn name(&self) -> &str {
        "panicking"
    }
}

struct FailingSpeaker {
    fail_init: bool,
}

impl SpeechOutput for FailingSpeaker {
    fn initialize(&self) -> Result<()> {
        if self.fail_init {
            Err(CallbotError::EngineUnavailable("no voice model".into()))
        } else {
            Ok(())
        }
    }

    fn speak(&self, _text: &str, _cancel: &CancellationToken) -> Result<()> {
        Err(CallbotError::Synthesis("device lost".into()))
    }

    fn stop(&self) {}

    fn set_volume(&self, _volume: f32) {}

    fn name(&self) -> &str {
        "failing"
    }
}

/// Listener that returns whatever the test pushes, or times out
struct ScriptedListener {
    replies: Receiver<std::result::Result<String, ListenError>>,
    listens: AtomicUsize,
}

impl ScriptedListener {
    fn new() -> (Self, Sender<std::result::Result<String, ListenError>>) {
        let (tx, rx) = unbounded();
        (
            Self {
                replies: rx,
                listens: AtomicUsize::new(0),
            },
            tx,
        )
    }
}

impl SpeechInput for ScriptedListener {
    fn listen(
        &self,
        timeout: Duration,
        _phrase_limit: Duration,
        cancel: &CancellationToken,
    ) -> std::result::Result<String, ListenError> {
        self.listens.fetch_add(1, Ordering::SeqCst);
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if cancel.is_cancelled() {
                return Err(ListenError::Cancelled);
            }
            if let Ok(reply) = self.replies.recv_timeout(Duration::from_millis(10)) {
                return reply;
            }
        }
        Err(ListenError::NoSpeechDetected)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn config() -> AppConfig {
    let mut config = AppConfig::default().with_script([OPENING, PRICE_LINE]);
    config.dialogue.keywords.price = vec!["how much".into()];
    config.dialogue.templates.price = vec!["It is 588 yen per kilogram.".into()];
    config.speech.listen_timeout_secs = 0.2;
    config.orchestrator.loop_interval_ms = 10;
    config.orchestrator.max_input_chars = 20;
    config
}

struct Rig {
    orchestrator: Orchestrator,
    events: EventStream,
    speaker: Arc<RecordingSpeaker>,
    listener: Arc<ScriptedListener>,
    say: Sender<std::result::Result<String, ListenError>>,
}

fn rig_with(speaker: RecordingSpeaker) -> Rig {
    let speaker = Arc::new(speaker);
    let (listener, say) = ScriptedListener::new();
    let listener = Arc::new(listener);
    let (orchestrator, events) =
        Orchestrator::new(&config(), speaker.clone(), listener.clone()).unwrap();
    Rig {
        orchestrator,
        events,
        speaker,
        listener,
        say,
    }
}

fn rig() -> Rig {
    rig_with(RecordingSpeaker::default())
}

/// Poll `condition` until it holds or `WAIT` elapses
fn eventually<F: FnMut() -> bool>(mut condition: F) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

fn collect_until<F>(events: &EventStream, mut done: F) -> Vec<ControlEvent>
where
    F: FnMut(&ControlEvent) -> bool,
{
    let mut seen = Vec::new();
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if let Some(event) = events.recv_timeout(Duration::from_millis(50)) {
            let stop = done(&event);
            seen.push(event);
            if stop {
                break;
            }
        }
    }
    seen
}

#[test]
fn test_voice_turns_follow_script_then_keywords() {
    let rig = rig();
    assert!(rig.orchestrator.start().unwrap());

    assert!(eventually(|| rig.speaker.spoken() == vec![OPENING]));
    rig.say.send(Ok("hello".into())).unwrap();
    assert!(eventually(|| rig.speaker.spoken().len() == 2));
    rig.say.send(Ok("how much is it".into())).unwrap();
    assert!(eventually(|| rig.speaker.spoken().len() == 3));

    assert_eq!(
        rig.speaker.spoken(),
        vec![OPENING, PRICE_LINE, "It is 588 yen per kilogram."]
    );

    let speakers: Vec<_> = rig.orchestrator.history().iter().map(|e| e.speaker).collect();
    assert_eq!(
        speakers,
        vec![Speaker::Bot, Speaker::User, Speaker::Bot, Speaker::User, Speaker::Bot]
    );

    rig.orchestrator.shutdown();
}

#[test]
fn test_double_start_runs_one_session() {
    let rig = rig();
    assert!(rig.orchestrator.start().unwrap());
    assert!(!rig.orchestrator.start().unwrap());

    assert!(eventually(|| !rig.speaker.spoken().is_empty()));
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(rig.speaker.spoken(), vec![OPENING]);
    assert_eq!(rig.orchestrator.history().len(), 1);

    rig.orchestrator.shutdown();
}

#[test]
fn test_stop_when_idle_is_noop() {
    let rig = rig();
    assert!(!rig.orchestrator.stop());
    assert!(rig.events.drain().is_empty());
    assert_eq!(rig.speaker.stops.load(Ordering::SeqCst), 0);
}

#[test]
fn test_stop_interrupts_speech_and_listening() {
    let rig = rig_with(RecordingSpeaker::holding());
    rig.orchestrator.start().unwrap();
    assert!(eventually(|| !rig.speaker.spoken().is_empty()));

    let stopped_at = Instant::now();
    assert!(rig.orchestrator.stop());
    assert!(!rig.orchestrator.is_active());
    assert!(!rig.orchestrator.has_session());

    rig.orchestrator.shutdown();
    assert!(stopped_at.elapsed() < Duration::from_secs(2));
    assert!(rig.speaker.stops.load(Ordering::SeqCst) >= 1);

    // Nothing heard after the stop is processed
    let _ = rig.say.send(Ok("hello".into()));
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(rig.orchestrator.history().len(), 1);
}

#[test]
fn test_stop_during_listen_exits_worker() {
    let rig = rig();
    rig.orchestrator.start().unwrap();
    assert!(eventually(|| rig.listener.listens.load(Ordering::SeqCst) > 0));

    rig.orchestrator.stop();
    rig.orchestrator.shutdown();

    let events = rig.events.drain();
    let changes: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ControlEvent::ConversationStateChanged(active) => Some(*active),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![true, false]);
}

#[test]
fn test_listen_timeout_reports_status_and_continues() {
    let rig = rig();
    rig.orchestrator.start().unwrap();

    let events = collect_until(&rig.events, |e| {
        matches!(e, ControlEvent::Status(s) if s == "Speech input timed out")
    });
    assert!(events
        .iter()
        .any(|e| matches!(e, ControlEvent::Status(s) if s == "Speech input timed out")));
    assert!(rig.orchestrator.is_active());

    rig.say.send(Ok("hello".into())).unwrap();
    assert!(eventually(|| rig.speaker.spoken().len() == 2));

    rig.orchestrator.shutdown();
}

#[test]
fn test_unintelligible_speech_keeps_going() {
    let rig = rig();
    rig.orchestrator.start().unwrap();
    rig.say.send(Err(ListenError::Unintelligible)).unwrap();
    rig.say.send(Ok("hello".into())).unwrap();

    assert!(eventually(|| rig.speaker.spoken().len() == 2));
    assert_eq!(rig.speaker.spoken()[1], PRICE_LINE);
    rig.orchestrator.shutdown();
}

#[test]
fn test_synthesis_failure_ends_conversation() {
    let (listener, _say) = ScriptedListener::new();
    let (orchestrator, events) = Orchestrator::new(
        &config(),
        Arc::new(FailingSpeaker { fail_init: false }),
        Arc::new(listener),
    )
    .unwrap();

    assert!(orchestrator.start().unwrap());
    let seen = collect_until(&events, |e| {
        matches!(e, ControlEvent::ConversationStateChanged(false))
    });

    assert!(seen.iter().any(|e| matches!(e, ControlEvent::Error(_))));
    assert!(eventually(|| !orchestrator.is_active() && !orchestrator.has_session()));

    // A later start is allowed again
    assert!(orchestrator.start().unwrap());
    orchestrator.shutdown();
}

#[test]
fn test_initialize_failure_blocks_start() {
    let (listener, _say) = ScriptedListener::new();
    let (orchestrator, events) = Orchestrator::new(
        &config(),
        Arc::new(FailingSpeaker { fail_init: true }),
        Arc::new(listener),
    )
    .unwrap();

    assert!(matches!(
        orchestrator.start(),
        Err(CallbotError::EngineUnavailable(_))
    ));
    assert!(!orchestrator.is_active());
    assert!(orchestrator.history().is_empty());
    assert!(events
        .drain()
        .iter()
        .any(|e| matches!(e, ControlEvent::Error(_))));

    // The failure is remembered, not retried
    assert!(orchestrator.start().is_err());
}

#[test]
fn test_send_text_drives_dialogue() {
    let rig = rig();
    rig.orchestrator.start().unwrap();

    let reply = rig.orchestrator.send_text("  hello  ").unwrap();
    assert_eq!(reply.as_deref(), Some(PRICE_LINE));
    assert!(eventually(|| rig.speaker.spoken().contains(&PRICE_LINE.to_string())));

    let history = rig.orchestrator.history();
    assert_eq!(history[1].speaker, Speaker::User);
    assert_eq!(history[1].text, "hello");

    rig.orchestrator.shutdown();
}

#[test]
fn test_send_text_rejects_blank_and_long_input() {
    let rig = rig();
    rig.orchestrator.start().unwrap();

    assert_eq!(rig.orchestrator.send_text("   ").unwrap(), None);
    assert_eq!(
        rig.orchestrator.send_text(&"x".repeat(21)).unwrap(),
        None
    );
    assert_eq!(rig.orchestrator.history().len(), 1);

    let events = rig.events.drain();
    assert!(events
        .iter()
        .any(|e| matches!(e, ControlEvent::Status(s) if s.contains("max 20"))));

    rig.orchestrator.shutdown();
}

#[test]
fn test_reset_twice_matches_reset_once() {
    let rig = rig();
    rig.orchestrator.start().unwrap();
    rig.orchestrator.send_text("hello").unwrap();

    rig.orchestrator.reset();
    let once = rig.orchestrator.summary();
    rig.orchestrator.reset();
    let twice = rig.orchestrator.summary();

    assert_eq!(once, twice);
    assert_eq!(twice.total_messages, 0);
    assert!(!twice.is_active);
    assert!(rig
        .events
        .drain()
        .iter()
        .any(|e| matches!(e, ControlEvent::HistoryCleared)));

    rig.orchestrator.shutdown();
}

#[test]
fn test_clear_log_keeps_conversation() {
    let rig = rig();
    rig.orchestrator.start().unwrap();
    rig.orchestrator.clear_log();

    assert!(rig.orchestrator.history().is_empty());
    assert!(rig.orchestrator.is_active());
    rig.orchestrator.shutdown();
}

#[test]
fn test_volume_is_clamped() {
    let rig = rig();
    rig.orchestrator.set_volume(1.7);
    assert_eq!(*rig.speaker.volume.lock(), 1.0);
    rig.orchestrator.set_volume(-0.2);
    assert_eq!(*rig.speaker.volume.lock(), 0.0);
}

#[test]
fn test_pitch_frame_before_each_bot_line() {
    let rig = rig();
    rig.orchestrator.start().unwrap();

    let events = collect_until(&rig.events, |e| matches!(e, ControlEvent::Visualize(_)));
    let ControlEvent::Visualize(frame) = events.last().unwrap() else {
        panic!("no pitch frame");
    };
    assert_eq!(frame.bars.len(), 10);
    rig.orchestrator.shutdown();
}

#[test]
fn test_export_writes_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let rig = rig();
    rig.orchestrator.start().unwrap();
    rig.orchestrator.send_text("hello").unwrap();
    rig.orchestrator.stop();

    let path = rig
        .orchestrator
        .export(Some(dir.path().join("call.txt")))
        .unwrap();
    let contents = std::fs::read_to_string(path).unwrap();
    assert!(contents.contains(&format!("Bot: {}", OPENING)));
    assert!(contents.contains("User: hello"));
    assert!(contents.contains(&format!("Bot: {}", PRICE_LINE)));

    rig.orchestrator.shutdown();
}

#[test]
fn test_control_loop_handle() {
    let rig = rig();
    let (handle, thread) = rig.orchestrator.spawn_control_loop().unwrap();

    handle.start().unwrap();
    assert!(eventually(|| rig.orchestrator.is_active()));
    handle.send_text("hello").unwrap();
    assert!(eventually(|| rig.orchestrator.history().len() == 3));

    handle.stop().unwrap();
    assert!(eventually(|| !rig.orchestrator.is_active()));

    handle.shutdown().unwrap();
    thread.join().unwrap();
    assert!(handle.start().is_err());
}

#[test]
fn test_worker_panic_forces_inactive() {
    let (listener, _say) = ScriptedListener::new();
    let (orchestrator, events) =
        Orchestrator::new(&config(), Arc::new(PanickingSpeaker), Arc::new(listener)).unwrap();

    assert!(orchestrator.start().unwrap());
    let seen = collect_until(&events, |e| {
        matches!(e, ControlEvent::ConversationStateChanged(false))
    });

    assert!(seen.iter().any(|e| matches!(e, ControlEvent::Error(_))));
    assert!(seen
        .iter()
        .any(|e| matches!(e, ControlEvent::ConversationStateChanged(false))));
    assert!(eventually(|| !orchestrator.is_active() && !orchestrator.has_session()));
    orchestrator.shutdown();
}

#[test]
fn test_typed_reply_panic_keeps_control_loop_alive() {
    let (listener, _say) = ScriptedListener::new();
    let config = config().with_script(Vec::<String>::new());
    let (orchestrator, events) =
        Orchestrator::new(&config, Arc::new(PanickingSpeaker), Arc::new(listener)).unwrap();
    let (handle, thread) = orchestrator.spawn_control_loop().unwrap();

    handle.start().unwrap();
    assert!(eventually(|| orchestrator.is_active()));
    handle.send_text("はい").unwrap();

    let seen = collect_until(&events, |e| {
        matches!(e, ControlEvent::ConversationStateChanged(false))
    });
    assert!(seen.iter().any(|e| matches!(e, ControlEvent::Error(_))));
    assert!(eventually(|| !orchestrator.is_active() && !orchestrator.has_session()));

    // The control thread survived and still takes commands
    assert!(!thread.is_finished());
    handle.stop().unwrap();
    handle.start().unwrap();
    assert!(eventually(|| orchestrator.is_active()));

    handle.shutdown().unwrap();
    thread.join().unwrap();
}

#[test]
fn test_typed_and_spoken_replies_serialize() {
    const ROUNDS: usize = 20;

    let rig = rig();
    rig.orchestrator.start().unwrap();
    assert!(eventually(|| rig.speaker.spoken() == vec![OPENING]));

    let typist = {
        let orchestrator = rig.orchestrator.clone();
        std::thread::spawn(move || {
            (0..ROUNDS)
                .filter(|i| {
                    orchestrator
                        .send_text(&format!("typed {}", i))
                        .unwrap()
                        .is_some()
                })
                .count()
        })
    };
    for i in 0..ROUNDS {
        rig.say.send(Ok(format!("spoken {}", i))).unwrap();
    }

    let typed = typist.join().unwrap();
    assert_eq!(typed, ROUNDS);
    assert!(eventually(|| rig.orchestrator.summary().user_messages == 2 * ROUNDS));

    let history = rig.orchestrator.history();
    assert_eq!(history.len(), 1 + 4 * ROUNDS);
    for (i, entry) in history.iter().enumerate() {
        let expected = if i % 2 == 0 { Speaker::Bot } else { Speaker::User };
        assert_eq!(entry.speaker, expected, "entry {} out of turn", i);
    }
    for line in [OPENING, PRICE_LINE] {
        assert_eq!(history.iter().filter(|e| e.text == line).count(), 1);
    }

    rig.orchestrator.shutdown();
}

#[test]
fn test_failed_export_through_control_loop() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();

    let rig = rig();
    let (handle, thread) = rig.orchestrator.spawn_control_loop().unwrap();
    handle.export(blocker.join("call.txt")).unwrap();

    let seen = collect_until(&rig.events, |e| {
        matches!(e, ControlEvent::Status(s) if s.starts_with("Export error"))
    });
    assert!(seen
        .iter()
        .any(|e| matches!(e, ControlEvent::Status(s) if s.starts_with("Export error"))));

    handle.start().unwrap();
    assert!(eventually(|| rig.orchestrator.is_active()));
    handle.shutdown().unwrap();
    thread.join().unwrap();
}
