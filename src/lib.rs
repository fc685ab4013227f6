//! Turn-taking voice dialogue engine for scripted sales calls.
//!
//! The bot speaks a fixed opening script, then answers spoken or typed
//! replies with keyword-triggered templates. Speech synthesis and capture
//! sit behind the ports in [`speech`]; the [`integration::Orchestrator`]
//! drives them from a background worker while the [`ui`] renders the
//! transcript.

pub mod audio;
pub mod dialogue;
pub mod error;
pub mod integration;
pub mod messages;
pub mod speech;
pub mod ui;
pub mod utils;

pub use error::{CallbotError, Result};
