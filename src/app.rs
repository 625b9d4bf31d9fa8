use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct AutodashApp {
    pub state: AppState,
}

impl AutodashApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for AutodashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Filters, KPI cards and view tabs ----
        egui::TopBottomPanel::top("filter_panel").show(ctx, |ui| {
            ui.add_space(4.0);
            panels::filter_bar(ui, &mut self.state);
            ui.separator();
            panels::kpi_cards(ui, &self.state);
            ui.separator();
            panels::view_tabs(ui, &mut self.state);
            ui.add_space(4.0);
        });

        // ---- Central panel: active view ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::view_content(ui, &self.state);
        });
    }
}
