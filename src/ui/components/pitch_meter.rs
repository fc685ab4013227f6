//! Voice pitch meter
//!
//! Paints the bars of the latest [`PitchFrame`]; flat grey bars while idle.

use crate::speech::PitchFrame;
use crate::ui::state::UiState;
use crate::ui::theme::Theme;
use egui::{self, Color32, Pos2, Rect, Vec2};

pub struct PitchMeter<'a> {
    state: &'a UiState,
    theme: &'a Theme,
    height: f32,
}

impl<'a> PitchMeter<'a> {
    pub fn new(state: &'a UiState, theme: &'a Theme) -> Self {
        Self {
            state,
            theme,
            height: 60.0,
        }
    }

    pub fn height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    pub fn show(self, ui: &mut egui::Ui) -> egui::Response {
        let desired_size = Vec2::new(ui.available_width().min(240.0), self.height);
        let (rect, response) = ui.allocate_exact_size(desired_size, egui::Sense::hover());

        let painter = ui.painter();
        painter.rect_filled(rect, self.theme.card_rounding, self.theme.bg_secondary);

        let bars = bar_rects(rect.shrink(6.0), self.state.pitch.as_ref());
        for (bar_rect, color) in bars {
            painter.rect_filled(bar_rect, 2.0, color.unwrap_or(self.theme.meter_idle));
        }

        response
    }
}

/// Lay the frame's bars out bottom-aligned across `area`. Bars scale so
/// that the tallest possible height fills the area.
fn bar_rects(area: Rect, frame: Option<&PitchFrame>) -> Vec<(Rect, Option<Color32>)> {
    let count = PitchFrame::BAR_COUNT as usize;
    let slot = area.width() / count as f32;
    let bar_width = (slot * 0.7).max(1.0);
    let scale = area.height() / PitchFrame::MAX_HEIGHT as f32;

    (0..count)
        .map(|i| {
            let (height, color) = match frame.and_then(|f| f.bars.get(i)) {
                Some(bar) => (
                    bar.height as f32 * scale,
                    Some(Color32::from_rgb(bar.color[0], bar.color[1], bar.color[2])),
                ),
                None => (PitchFrame::MIN_HEIGHT as f32 * scale * 0.5, None),
            };
            let left = area.left() + i as f32 * slot + (slot - bar_width) / 2.0;
            let min = Pos2::new(left, area.bottom() - height);
            let max = Pos2::new(left + bar_width, area.bottom());
            (Rect::from_min_max(min, max), color)
        })
        .collect()
}
