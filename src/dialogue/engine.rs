//! Conversation manager
//!
//! Owns the [`DialogueState`], walks the opening script one line per user
//! turn, then answers from the keyword templates. It performs no I/O;
//! transcript and status changes are reported through callbacks that run
//! synchronously inside the call that produced them.

use super::classifier::{ResponseCategory, ResponseClassifier};
use super::config::{CategoryTemplates, DialogueConfig};
use super::state::{ConversationSummary, DialoguePhase, DialogueState};
use crate::messages::{Speaker, TranscriptEntry};
use crate::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

pub type HistoryCallback = Box<dyn Fn(&TranscriptEntry) + Send>;
pub type StatusCallback = Box<dyn Fn(&str) + Send>;

pub struct DialogueEngine {
    script: Vec<String>,
    classifier: ResponseClassifier,
    templates: CategoryTemplates,
    state: DialogueState,
    rng: StdRng,
    on_history: Option<HistoryCallback>,
    on_status: Option<StatusCallback>,
}

impl DialogueEngine {
    /// Build an engine from validated dialogue data
    pub fn new(config: &DialogueConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            script: config.script.clone(),
            classifier: ResponseClassifier::new(&config.keywords),
            templates: config.templates.clone(),
            state: DialogueState::new(),
            rng: StdRng::from_entropy(),
            on_history: None,
            on_status: None,
        })
    }

    /// Use a fixed seed for template selection
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn set_history_callback<F>(&mut self, callback: F)
    where
        F: Fn(&TranscriptEntry) + Send + 'static,
    {
        self.on_history = Some(Box::new(callback));
    }

    pub fn set_status_callback<F>(&mut self, callback: F)
    where
        F: Fn(&str) + Send + 'static,
    {
        self.on_status = Some(Box::new(callback));
    }

    /// Begin the call: rewind the script and emit the first line.
    ///
    /// The transcript is kept; use [`reset`](Self::reset) for a clean slate.
    pub fn start(&mut self) -> Option<String> {
        self.state.active = true;
        self.state.script_cursor = 0;
        self.update_status("Conversation started");
        self.next_script_line().map(|line| {
            self.record(Speaker::Bot, &line);
            line
        })
    }

    /// Record a user turn and produce the bot's reply.
    ///
    /// Returns `None` when the conversation is inactive or the text is blank.
    pub fn process_user_utterance(&mut self, text: &str) -> Option<String> {
        if !self.state.active {
            debug!("Ignoring utterance while inactive");
            return None;
        }

        if text.trim().is_empty() {
            return None;
        }

        self.state.utterances.push(text.to_string());
        self.record(Speaker::User, text);

        let reply = match self.next_script_line() {
            Some(line) => line,
            None => {
                let category = self.classifier.classify(text);
                debug!("Classified utterance as {}", category.name());
                self.pick_template(category)?
            }
        };

        self.record(Speaker::Bot, &reply);
        Some(reply)
    }

    /// Advance past the next script line without a user turn
    pub fn next_script_line(&mut self) -> Option<String> {
        let line = self.script.get(self.state.script_cursor).cloned()?;
        self.state.script_cursor += 1;
        Some(line)
    }

    pub fn stop(&mut self) {
        self.state.active = false;
        self.update_status("Conversation stopped");
    }

    /// Wipe transcript, utterances and script progress, and go inactive
    pub fn reset(&mut self) {
        self.state.wipe();
        self.update_status("Conversation reset");
    }

    /// Empty the transcript and utterance log; progress and activity are kept
    pub fn clear_history(&mut self) {
        self.state.transcript.clear();
        self.state.utterances.clear();
        self.update_status("Log cleared");
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn phase(&self) -> DialoguePhase {
        self.state.phase(self.script.len())
    }

    pub fn summary(&self) -> ConversationSummary {
        self.state.summary()
    }

    pub fn history(&self) -> Vec<TranscriptEntry> {
        self.state.transcript.clone()
    }

    pub fn state(&self) -> &DialogueState {
        &self.state
    }

    pub fn script(&self) -> &[String] {
        &self.script
    }

    pub fn classify(&self, text: &str) -> ResponseCategory {
        self.classifier.classify(text)
    }

    fn pick_template(&mut self, category: ResponseCategory) -> Option<String> {
        let candidates = self.templates.for_category(category);
        let candidates = if candidates.is_empty() {
            self.templates.for_category(ResponseCategory::Default)
        } else {
            candidates
        };
        candidates.choose(&mut self.rng).cloned()
    }

    fn record(&mut self, speaker: Speaker, text: &str) {
        let entry = TranscriptEntry::new(speaker, text);
        self.state.transcript.push(entry.clone());
        if let Some(cb) = &self.on_history {
            cb(&entry);
        }
    }

    fn update_status(&self, message: &str) {
        if let Some(cb) = &self.on_status {
            cb(message);
        }
    }
}

impl std::fmt::Debug for DialogueEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueEngine")
            .field("script_len", &self.script.len())
            .field("state", &self.state)
            .finish()
    }
}
