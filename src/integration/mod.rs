//! Wiring between the dialogue engine, the speech ports and the UI

pub mod config;
pub mod events;
pub mod orchestrator;

pub use config::{AppConfig, OrchestratorConfig, UiConfig};
pub use events::{ControlCommand, ControlEvent};
pub use orchestrator::{Orchestrator, OrchestratorHandle};
