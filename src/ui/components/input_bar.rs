//! Input bar component
//!
//! Typed replies for when the microphone is unavailable or misheard.

use crate::ui::state::UiState;
use crate::ui::theme::Theme;
use egui::{self, Key, RichText, Vec2};

pub struct InputBar<'a> {
    state: &'a mut UiState,
    theme: &'a Theme,
}

impl<'a> InputBar<'a> {
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
                    self.show_text_input(ui);
                    self.show_counter(ui);
                    self.show_send_button(ui);
                });
            });
    }

    fn show_text_input(&mut self, ui: &mut egui::Ui) {
        // Leave room for the counter and the send button
        let width = (ui.available_width() - 140.0).max(120.0);

        let text_edit = egui::TextEdit::singleline(&mut self.state.input_text)
            .hint_text("Type the customer's reply...")
            .desired_width(width)
            .margin(egui::Margin::symmetric(12.0, 8.0))
            .id(egui::Id::new("reply_input"));

        let response = ui.add(text_edit);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, true, "Reply input")
        });

        if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
            self.state.send_message();
            response.request_focus();
        }
    }

    fn show_counter(&self, ui: &mut egui::Ui) {
        let count = self.state.input_char_count();
        let color = if self.state.input_too_long() {
            self.theme.error
        } else {
            self.theme.text_muted
        };
        ui.label(
            RichText::new(format!("{}/{}", count, self.state.max_input_chars))
                .size(11.0)
                .family(egui::FontFamily::Monospace)
                .color(color),
        );
    }

    fn show_send_button(&mut self, ui: &mut egui::Ui) {
        let can_send = self.state.can_send();

        let button = egui::Button::new(RichText::new("Send").color(egui::Color32::WHITE))
            .min_size(Vec2::new(64.0, 32.0))
            .rounding(self.theme.button_rounding)
            .fill(if can_send {
                self.theme.primary
            } else {
                self.theme.text_muted
            });

        let response = ui.add_enabled(can_send, button);
        if response.clicked() {
            self.state.send_message();
        }
        response.on_hover_text("Send reply (Enter)");
    }
}
