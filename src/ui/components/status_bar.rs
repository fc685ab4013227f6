//! Status line and error banner

use crate::ui::state::UiState;
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct StatusBar<'a> {
    state: &'a UiState,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(state: &'a UiState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let (dot, text, color) = if self.state.is_active {
                ("●", "On call", self.theme.success)
            } else {
                ("○", "Idle", self.theme.text_muted)
            };
            ui.label(RichText::new(format!("{} {}", dot, text)).size(12.0).color(color));
            ui.separator();

            let response = ui.label(
                RichText::new(&self.state.status)
                    .size(12.0)
                    .color(self.theme.text_secondary),
            );
            response.widget_info(|| {
                egui::WidgetInfo::labeled(
                    egui::WidgetType::Label,
                    true,
                    format!("Status: {}", self.state.status),
                )
            });
        });
    }
}

/// Dismissable banner for the last fatal error
pub struct ErrorBanner<'a> {
    state: &'a mut UiState,
    theme: &'a Theme,
}

impl<'a> ErrorBanner<'a> {
    pub fn new(state: &'a mut UiState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        let Some(message) = self.state.last_error.clone() else {
            return;
        };

        egui::Frame::none()
            .fill(self.theme.error.gamma_multiply(0.25))
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing_sm)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new("⚠").color(self.theme.error));
                    ui.label(RichText::new(&message).color(self.theme.text_primary));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Dismiss").clicked() {
                            self.state.dismiss_error();
                        }
                    });
                });
            });
    }
}
