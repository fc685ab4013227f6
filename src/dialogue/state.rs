use crate::messages::{Speaker, TranscriptEntry};
use serde::{Deserialize, Serialize};

/// Where the conversation is in its turn structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialoguePhase {
    Inactive,
    /// Replies are the next script line
    ScriptedTurn,
    /// Script exhausted, replies come from keyword classification
    ReactiveTurn,
}

/// Progress of one conversation. Only the dialogue engine mutates it.
#[derive(Debug, Clone, Default)]
pub struct DialogueState {
    pub(crate) script_cursor: usize,
    pub(crate) active: bool,
    pub(crate) transcript: Vec<TranscriptEntry>,
    pub(crate) utterances: Vec<String>,
}

impl DialogueState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_cursor(&self) -> usize {
        self.script_cursor
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn utterances(&self) -> &[String] {
        &self.utterances
    }

    pub fn phase(&self, script_len: usize) -> DialoguePhase {
        if !self.active {
            DialoguePhase::Inactive
        } else if self.script_cursor < script_len {
            DialoguePhase::ScriptedTurn
        } else {
            DialoguePhase::ReactiveTurn
        }
    }

    pub fn summary(&self) -> ConversationSummary {
        let user_messages = self
            .transcript
            .iter()
            .filter(|e| e.speaker == Speaker::User)
            .count();
        ConversationSummary {
            total_messages: self.transcript.len(),
            user_messages,
            bot_messages: self.transcript.len() - user_messages,
            script_cursor: self.script_cursor,
            is_active: self.active,
        }
    }

    pub(crate) fn wipe(&mut self) {
        self.transcript.clear();
        self.utterances.clear();
        self.script_cursor = 0;
        self.active = false;
    }
}

/// Message counts and progress for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub total_messages: usize,
    pub user_messages: usize,
    pub bot_messages: usize,
    pub script_cursor: usize,
    pub is_active: bool,
}
