//! egui/eframe user interface

mod app;
pub mod components;
mod state;
mod theme;

pub use app::CallbotApp;
pub use components::{ControlBar, ErrorBanner, InputBar, PitchMeter, StatusBar, TranscriptView};
pub use state::UiState;
pub use theme::{install_fonts, Theme};
