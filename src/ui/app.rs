//! Main application struct and eframe integration

use crate::integration::{AppConfig, OrchestratorHandle};
use crate::ui::components::{ControlBar, ErrorBanner, InputBar, PitchMeter, StatusBar, TranscriptView};
use crate::ui::state::UiState;
use crate::ui::theme::{install_fonts, Theme};
use crate::utils::EventStream;
use egui::{self, CentralPanel, RichText, TopBottomPanel};
use tracing::info;

/// Main Callbot application
pub struct CallbotApp {
    state: UiState,
    theme: Theme,
}

impl CallbotApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: &AppConfig,
        handle: OrchestratorHandle,
        events: EventStream,
    ) -> Self {
        let theme = Theme::from_mode(config.ui.dark_mode);
        install_fonts(&cc.egui_ctx, config.ui.font_path.as_deref());
        theme.apply(&cc.egui_ctx);

        // Repaint as soon as the orchestrator publishes anything
        let ctx = cc.egui_ctx.clone();
        handle.set_waker(move || ctx.request_repaint());

        let mut state = UiState::new().with_backend(handle, events);
        state.volume = config.speech.volume.clamp(0.0, 1.0);
        state.max_input_chars = config.orchestrator.max_input_chars;
        state.export_dir = config.export_dir.clone();

        Self { state, theme }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(self.theme.bg_secondary).inner_margin(12.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("Callbot")
                            .size(20.0)
                            .strong()
                            .color(self.theme.text_primary),
                    );
                    ui.label(
                        RichText::new("Rice sales call")
                            .size(14.0)
                            .color(self.theme.text_muted),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        PitchMeter::new(&self.state, &self.theme).height(36.0).show(ui);
                    });
                });
                ui.add_space(self.theme.spacing_sm);
                ControlBar::new(&mut self.state, &self.theme).show(ui);
            });
    }

    fn show_bottom(&mut self, ctx: &egui::Context) {
        TopBottomPanel::bottom("input_area")
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing_sm))
            .show(ctx, |ui| {
                ErrorBanner::new(&mut self.state, &self.theme).show(ui);
                InputBar::new(&mut self.state, &self.theme).show(ui);
                StatusBar::new(&self.state, &self.theme).show(ui);
            });
    }

    fn show_content(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing_sm))
            .show(ctx, |ui| {
                TranscriptView::new(&self.state, &self.theme).show(ui);
            });
    }
}

impl eframe::App for CallbotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll_events();

        self.show_header(ctx);
        self.show_bottom(ctx);
        self.show_content(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Window closed");
        if let Some(handle) = self.state.handle() {
            let _ = handle.shutdown();
        }
    }
}
