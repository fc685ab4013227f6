//! Application state management
//!
//! The UI keeps its own copy of the transcript, rebuilt from orchestrator
//! events, and forwards button presses through an [`OrchestratorHandle`].

use crate::integration::{ControlEvent, OrchestratorHandle};
use crate::messages::export::default_export_name;
use crate::messages::{TranscriptEntry, TranscriptLog};
use crate::speech::PitchFrame;
use crate::utils::EventStream;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Central UI state
pub struct UiState {
    /// Transcript as last reported by the orchestrator
    pub transcript: TranscriptLog,

    /// Current text input
    pub input_text: String,

    /// Latest status line
    pub status: String,

    pub is_active: bool,

    /// Output volume, 0.0 to 1.0
    pub volume: f32,

    /// Bars for the pitch meter, replaced before each bot line
    pub pitch: Option<PitchFrame>,

    /// Fatal error shown in the banner until dismissed
    pub last_error: Option<String>,

    pub max_input_chars: usize,
    pub export_dir: PathBuf,

    handle: Option<OrchestratorHandle>,
    events: Option<EventStream>,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    /// State with no backend attached. Buttons only update local state.
    pub fn new() -> Self {
        Self {
            transcript: TranscriptLog::new(),
            input_text: String::new(),
            status: "Ready".to_string(),
            is_active: false,
            volume: 0.8,
            pitch: None,
            last_error: None,
            max_input_chars: 500,
            export_dir: PathBuf::from("."),
            handle: None,
            events: None,
        }
    }

    pub fn with_backend(mut self, handle: OrchestratorHandle, events: EventStream) -> Self {
        self.handle = Some(handle);
        self.events = Some(events);
        self
    }

    pub fn handle(&self) -> Option<&OrchestratorHandle> {
        self.handle.as_ref()
    }

    /// Drain pending orchestrator events. Returns how many were applied.
    pub fn poll_events(&mut self) -> usize {
        let events = match &self.events {
            Some(stream) => stream.drain(),
            None => return 0,
        };
        let count = events.len();
        for event in events {
            self.apply_event(event);
        }
        count
    }

    pub fn apply_event(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::HistoryEntry(entry) => self.transcript.push(entry),
            ControlEvent::HistoryCleared => self.transcript.clear(),
            ControlEvent::Status(message) => self.status = message,
            ControlEvent::Visualize(frame) => self.pitch = Some(frame),
            ControlEvent::ConversationStateChanged(active) => {
                self.is_active = active;
                if !active {
                    self.pitch = None;
                }
            }
            ControlEvent::Error(message) => self.last_error = Some(message),
        }
    }

    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.transcript.snapshot()
    }

    pub fn input_char_count(&self) -> usize {
        self.input_text.trim().chars().count()
    }

    pub fn input_too_long(&self) -> bool {
        self.input_char_count() > self.max_input_chars
    }

    pub fn can_send(&self) -> bool {
        !self.input_text.trim().is_empty() && !self.input_too_long()
    }

    pub fn start(&mut self) {
        self.last_error = None;
        self.dispatch("start", |h| h.start());
    }

    pub fn stop(&mut self) {
        self.dispatch("stop", |h| h.stop());
    }

    pub fn clear_log(&mut self) {
        self.dispatch("clear log", |h| h.clear_log());
    }

    pub fn reset(&mut self) {
        self.last_error = None;
        self.dispatch("reset", |h| h.reset());
    }

    /// Export to a timestamped file in the export directory
    pub fn export(&mut self) {
        let path = self.export_dir.join(default_export_name());
        self.dispatch("export", move |h| h.export(path));
    }

    /// Send the typed reply. The input is kept when it is rejected locally.
    pub fn send_message(&mut self) {
        let text = self.input_text.trim().to_string();
        if text.is_empty() {
            return;
        }
        if self.input_too_long() {
            self.status = format!("Message too long (max {} characters)", self.max_input_chars);
            return;
        }

        self.dispatch("send", move |h| h.send_text(text));
        self.input_text.clear();
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(handle) = &self.handle {
            handle.set_volume(self.volume);
        }
    }

    /// Volume as shown next to the slider
    pub fn volume_label(&self) -> String {
        format!("{}%", (self.volume * 100.0).round() as i32)
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    fn dispatch<F>(&mut self, action: &str, f: F)
    where
        F: FnOnce(&OrchestratorHandle) -> crate::Result<()>,
    {
        let Some(handle) = &self.handle else {
            debug!("No backend attached, ignoring {}", action);
            return;
        };
        if let Err(e) = f(handle) {
            warn!("Failed to {}: {}", action, e);
            self.last_error = Some(e.user_message());
        }
    }
}
