//! UI components module
//!
//! Reusable widgets for the Callbot window.

pub mod control_bar;
pub mod input_bar;
pub mod pitch_meter;
pub mod status_bar;
pub mod transcript_view;

pub use control_bar::ControlBar;
pub use input_bar::InputBar;
pub use pitch_meter::PitchMeter;
pub use status_bar::{ErrorBanner, StatusBar};
pub use transcript_view::TranscriptView;
