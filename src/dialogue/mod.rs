//! Dialogue core: script progress, keyword classification and replies

pub mod classifier;
pub mod config;
pub mod engine;
pub mod state;

pub use classifier::{ResponseCategory, ResponseClassifier};
pub use config::{CategoryKeywords, CategoryTemplates, DialogueConfig};
pub use engine::{DialogueEngine, HistoryCallback, StatusCallback};
pub use state::{ConversationSummary, DialoguePhase, DialogueState};
