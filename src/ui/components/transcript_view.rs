//! Transcript component
//!
//! Timestamped list of everything said so far, newest at the bottom.

use crate::messages::{Speaker, TranscriptEntry};
use crate::ui::state::UiState;
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct TranscriptView<'a> {
    state: &'a UiState,
    theme: &'a Theme,
}

impl<'a> TranscriptView<'a> {
    pub fn new(state: &'a UiState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let entries = self.state.entries();

        egui::ScrollArea::vertical()
            .id_salt("transcript")
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.add_space(self.theme.spacing_sm);
                if entries.is_empty() {
                    self.show_empty_state(ui);
                } else {
                    for entry in &entries {
                        self.show_entry(ui, entry);
                        ui.add_space(self.theme.spacing_sm);
                    }
                }
            });
    }

    fn show_empty_state(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(80.0);
            ui.label(
                RichText::new("No conversation yet")
                    .size(20.0)
                    .color(self.theme.text_primary),
            );
            ui.add_space(self.theme.spacing_sm);
            ui.label(
                RichText::new("Press Start to place the call, then answer by voice or by typing.")
                    .color(self.theme.text_muted),
            );
        });
    }

    fn show_entry(&self, ui: &mut egui::Ui, entry: &TranscriptEntry) {
        let label_color = match entry.speaker {
            Speaker::Bot => self.theme.bot_label,
            Speaker::User => self.theme.user_label,
        };

        ui.horizontal_wrapped(|ui| {
            ui.label(
                RichText::new(format!("[{}]", entry.clock_time()))
                    .family(egui::FontFamily::Monospace)
                    .color(self.theme.text_muted),
            );
            ui.label(
                RichText::new(format!("{}:", entry.speaker.label()))
                    .strong()
                    .color(label_color),
            );

            let accessible = format!("{} line: {}", entry.speaker.label(), entry.text);
            let response = ui.label(RichText::new(&entry.text).color(self.theme.text_primary));
            response.widget_info(|| {
                egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &accessible)
            });
        });
    }
}
