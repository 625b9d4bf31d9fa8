use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::DatePickerButton;

use autodash::data::filter::Choice;
use autodash::data::loader::load_file;
use autodash::data::model::{Dimension, Metric};
use autodash::pipeline::View;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Export CSV…").clicked() {
                save_csv_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Regenerate data").clicked() {
                state.regenerate();
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} sales loaded, {} shown",
            state.dataset.len(),
            state.update.summary.count
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Filter bar
// ---------------------------------------------------------------------------

/// Dropdowns for every dimension, the metric selector and the date range.
pub fn filter_bar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal_wrapped(|ui: &mut Ui| {
        for dim in [
            Dimension::Salesperson,
            Dimension::CarMake,
            Dimension::CarYear,
            Dimension::CarModel,
        ] {
            let options = state.options(dim);
            let current = state.selection.choice(dim).clone();
            if let Some(picked) = choice_combo(ui, dim.label(), &current, &options) {
                state.set_choice(dim, picked);
            }
        }

        ui.vertical(|ui: &mut Ui| {
            ui.label("Metric");
            let mut metric = state.metric;
            egui::ComboBox::from_id_salt("metric")
                .selected_text(metric.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for m in Metric::ALL {
                        ui.selectable_value(&mut metric, m, m.label());
                    }
                });
            state.set_metric(metric);
        });

        ui.vertical(|ui: &mut Ui| {
            let mut date_filter = state.date_filter;
            ui.checkbox(&mut date_filter.enabled, "Date range");
            ui.add_enabled_ui(date_filter.enabled, |ui: &mut Ui| {
                ui.horizontal(|ui: &mut Ui| {
                    ui.add(DatePickerButton::new(&mut date_filter.start).id_salt("date_start"));
                    ui.label("to");
                    ui.add(DatePickerButton::new(&mut date_filter.end).id_salt("date_end"));
                });
            });
            state.set_date_filter(date_filter);
        });
    });
}

/// A labelled dropdown with an "All" entry. Returns the new choice if the
/// user picked one.
fn choice_combo(
    ui: &mut Ui,
    label: &str,
    current: &Choice,
    options: &[String],
) -> Option<Choice> {
    let mut picked = None;
    ui.vertical(|ui: &mut Ui| {
        ui.label(label);
        egui::ComboBox::from_id_salt(label)
            .selected_text(current.label())
            .width(160.0)
            .show_ui(ui, |ui: &mut Ui| {
                if ui.selectable_label(current.is_all(), "All").clicked() {
                    picked = Some(Choice::All);
                }
                for opt in options {
                    let selected = current.as_value() == Some(opt.as_str());
                    if ui.selectable_label(selected, opt).clicked() {
                        picked = Some(Choice::Only(opt.clone()));
                    }
                }
            });
    });
    picked.filter(|p| p != current)
}

// ---------------------------------------------------------------------------
// KPI cards and view tabs
// ---------------------------------------------------------------------------

pub fn kpi_cards(ui: &mut Ui, state: &AppState) {
    ui.columns(4, |cols| {
        for (col, (title, value)) in cols.iter_mut().zip(state.update.kpis.entries()) {
            egui::Frame::group(col.style()).show(col, |ui: &mut Ui| {
                ui.vertical_centered(|ui: &mut Ui| {
                    ui.label(RichText::new(title).strong());
                    ui.heading(value);
                });
            });
        }
    });
}

pub fn view_tabs(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        let mut view = state.view;
        for v in View::ALL {
            ui.selectable_value(&mut view, v, v.label());
        }
        state.set_view(view);
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open sales data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match load_file(&path) {
            Ok(dataset) => {
                log::info!("Loaded {} sales from {}", dataset.len(), path.display());
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

pub fn save_csv_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export filtered rows")
        .set_file_name(state.config.export.filename.as_str())
        .add_filter("CSV", &["csv"])
        .save_file();

    let Some(path) = file else {
        return;
    };
    let result = state
        .export_filtered()
        .and_then(|bytes| std::fs::write(&path, bytes).map_err(anyhow::Error::from));
    match result {
        Ok(()) => {
            log::info!(
                "Exported {} rows to {}",
                state.update.summary.count,
                path.display()
            );
            state.status_message = None;
        }
        Err(e) => {
            log::error!("Export failed: {e:#}");
            state.status_message = Some(format!("Export failed: {e:#}"));
        }
    }
}
