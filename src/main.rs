mod app;
mod color;
mod state;
mod ui;

use std::sync::Arc;

use app::AutodashApp;
use autodash::config;
use autodash::data::generate::generate_dataset;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let config = config::load();
    let dataset = Arc::new(generate_dataset(&config.data));
    let state = AppState::new(dataset, config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Autodash – Automotive Analytics",
        options,
        Box::new(move |_cc| Ok(Box::new(AutodashApp::new(state)))),
    )
}
