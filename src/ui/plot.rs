use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints};

use autodash::data::model::Metric;
use autodash::pipeline::aggregate::{GroupStats, PivotTable, Ranked, TrendPoint};
use autodash::pipeline::summary::{format_count, format_currency};
use autodash::pipeline::{Aggregation, ViewContent};

use crate::color::{generate_palette, heat_color, text_color_on};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Central panel: the active view
// ---------------------------------------------------------------------------

/// Render whatever the last recomputation produced.
pub fn view_content(ui: &mut Ui, state: &AppState) {
    match &state.update.content {
        ViewContent::Failed(msg) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.label(RichText::new(msg).color(Color32::RED));
            });
        }
        ViewContent::Ready(Aggregation::NoData) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("No data available");
            });
        }
        ViewContent::Ready(Aggregation::Trend(points)) => trend_plot(ui, points),
        ViewContent::Ready(Aggregation::Pivot(table)) => heatmap(ui, table, state.update.metric),
        ViewContent::Ready(Aggregation::TopN { metric, rows }) => top_chart(ui, rows, *metric),
        ViewContent::Ready(Aggregation::MultiGroup(groups)) => model_table(ui, groups),
    }
}

/// Axis formatter that labels integer grid marks with category names.
fn category_axis(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let idx = mark.value.round();
        if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Trend
// ---------------------------------------------------------------------------

fn trend_plot(ui: &mut Ui, points: &[TrendPoint]) {
    let colors = generate_palette(2);
    let months: Vec<String> = points.iter().map(|p| p.month.clone()).collect();

    let sales = Line::new(trend_series(points, |p| p.sale_price))
        .name(Metric::SalePrice.label())
        .color(colors[0])
        .width(2.0);
    let commission = Line::new(trend_series(points, |p| p.commission))
        .name(Metric::Commission.label())
        .color(colors[1])
        .width(2.0);

    Plot::new("trend_plot")
        .legend(Legend::default())
        .x_axis_label("Month")
        .y_axis_label("Total")
        .x_axis_formatter(category_axis(months))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.line(sales);
            plot_ui.line(commission);
        });
}

fn trend_series(points: &[TrendPoint], value: impl Fn(&TrendPoint) -> f64) -> PlotPoints {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| [i as f64, value(p)])
        .collect()
}

// ---------------------------------------------------------------------------
// Top performers
// ---------------------------------------------------------------------------

fn top_chart(ui: &mut Ui, rows: &[Ranked], metric: Metric) {
    let color = generate_palette(1)[0];
    let names: Vec<String> = rows.iter().map(|r| r.key.clone()).collect();
    let bars: Vec<Bar> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| {
            Bar::new(i as f64, r.value)
                .name(format!("{}: {}", r.key, format_currency(r.value)))
                .width(0.7)
        })
        .collect();

    Plot::new("top_plot")
        .x_axis_label("Salesperson")
        .y_axis_label(metric.label())
        .x_axis_formatter(category_axis(names))
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(color).name(metric.label()));
        });
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

fn heatmap(ui: &mut Ui, table: &PivotTable, metric: Metric) {
    ui.label(format!(
        "{} by {} and {}",
        metric.label(),
        table.row_dim.label(),
        table.col_dim.label()
    ));
    let max = table.max();

    ScrollArea::both().show(ui, |ui: &mut Ui| {
        egui::Grid::new("heatmap")
            .spacing([2.0, 2.0])
            .min_col_width(90.0)
            .show(ui, |ui: &mut Ui| {
                ui.label("");
                for col in &table.columns {
                    ui.strong(col.as_str());
                }
                ui.end_row();

                for (row, cells) in table.rows.iter().zip(&table.cells) {
                    ui.strong(row.as_str());
                    for &value in cells {
                        let t = if max > 0.0 { value / max } else { 0.0 };
                        let bg = heat_color(t);
                        ui.label(
                            RichText::new(format_currency(value))
                                .background_color(bg)
                                .color(text_color_on(bg))
                                .monospace(),
                        );
                    }
                    ui.end_row();
                }
            });
    });
}

// ---------------------------------------------------------------------------
// Model comparison
// ---------------------------------------------------------------------------

fn model_table(ui: &mut Ui, groups: &[GroupStats]) {
    const HEADERS: [&str; 6] = [
        "Car Make",
        "Car Model",
        "Avg Sale Price",
        "Total Sales",
        "Transaction Count",
        "Avg Commission",
    ];

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .columns(Column::auto().at_least(90.0), HEADERS.len())
        .header(22.0, |mut header| {
            for h in HEADERS {
                header.col(|ui: &mut Ui| {
                    ui.strong(h);
                });
            }
        })
        .body(|mut body| {
            for g in groups {
                body.row(20.0, |mut row| {
                    let cells = [
                        g.car_make.clone(),
                        g.car_model.clone(),
                        format!("{:.2}", g.avg_sale_price),
                        format!("{:.2}", g.total_sales),
                        format_count(g.count),
                        format!("{:.2}", g.avg_commission),
                    ];
                    for text in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(text);
                        });
                    }
                });
            }
        });
}
