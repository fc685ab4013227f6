//! Control bar component
//!
//! Conversation buttons and the volume slider.

use crate::ui::state::UiState;
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct ControlBar<'a> {
    state: &'a mut UiState,
    theme: &'a Theme,
}

impl<'a> ControlBar<'a> {
    pub fn new(state: &'a mut UiState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing_sm)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    self.show_buttons(ui);
                    ui.separator();
                    self.show_volume(ui);
                });
            });
    }

    fn show_buttons(&mut self, ui: &mut egui::Ui) {
        let active = self.state.is_active;
        let has_entries = !self.state.transcript.is_empty();

        let start = egui::Button::new(RichText::new("Start").color(self.theme.text_primary))
            .rounding(self.theme.button_rounding)
            .fill(if active {
                self.theme.bg_tertiary
            } else {
                self.theme.success.gamma_multiply(0.6)
            });
        if ui.add_enabled(!active, start).on_hover_text("Place the call").clicked() {
            self.state.start();
        }

        let stop = egui::Button::new(RichText::new("Stop").color(self.theme.text_primary))
            .rounding(self.theme.button_rounding)
            .fill(if active {
                self.theme.error.gamma_multiply(0.6)
            } else {
                self.theme.bg_tertiary
            });
        if ui.add_enabled(active, stop).on_hover_text("Hang up").clicked() {
            self.state.stop();
        }

        if ui
            .add_enabled(has_entries, egui::Button::new("Clear log"))
            .on_hover_text("Empty the transcript, keep the call going")
            .clicked()
        {
            self.state.clear_log();
        }

        if ui
            .button("Reset")
            .on_hover_text("Hang up and start over from the first line")
            .clicked()
        {
            self.state.reset();
        }

        if ui
            .add_enabled(has_entries, egui::Button::new("Export"))
            .on_hover_text("Save the transcript to a text file")
            .clicked()
        {
            self.state.export();
        }
    }

    fn show_volume(&mut self, ui: &mut egui::Ui) {
        ui.label(RichText::new("Volume").color(self.theme.text_secondary));

        let mut volume = self.state.volume;
        let response = ui.add(
            egui::Slider::new(&mut volume, 0.0..=1.0)
                .show_value(false)
                .step_by(0.01),
        );
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Slider, true, "Volume slider")
        });
        if response.changed() {
            self.state.set_volume(volume);
        }

        ui.label(
            RichText::new(self.state.volume_label())
                .family(egui::FontFamily::Monospace)
                .color(self.theme.text_muted),
        );
    }
}
