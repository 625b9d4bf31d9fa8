use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use autodash::config::DashConfig;
use autodash::data::export::export_csv;
use autodash::data::filter::{apply_filter, Choice, DateRange, FilterSelection};
use autodash::data::generate::generate_dataset;
use autodash::data::model::{Dataset, Dimension, Metric};
use autodash::pipeline::{handle_filter_change, DashboardUpdate, View};

// ---------------------------------------------------------------------------
// Date filter widget state
// ---------------------------------------------------------------------------

/// The date pickers always hold a date; `enabled` decides whether they
/// constrain anything.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateFilter {
    pub enabled: bool,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateFilter {
    fn for_dataset(dataset: &Dataset) -> Self {
        let today = chrono::Local::now().date_naive();
        let (start, end) = dataset.date_bounds().unwrap_or((today, today));
        DateFilter {
            enabled: false,
            start,
            end,
        }
    }

    fn range(&self) -> Option<DateRange> {
        self.enabled.then(|| DateRange::new(self.start, self.end))
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Current dataset. Replaced as a whole, never edited.
    pub dataset: Arc<Dataset>,

    pub config: DashConfig,

    pub selection: FilterSelection,

    pub date_filter: DateFilter,

    pub view: View,

    pub metric: Metric,

    /// Result of the last recomputation (cached until the selection changes).
    pub update: DashboardUpdate,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(dataset: Arc<Dataset>, config: DashConfig) -> Self {
        let selection = FilterSelection::all();
        let view = View::default();
        let metric = config.view.default_metric;
        let update = handle_filter_change(&dataset, &selection, view, metric, config.view.top_n);
        AppState {
            date_filter: DateFilter::for_dataset(&dataset),
            dataset,
            config,
            selection,
            view,
            metric,
            update,
            status_message: None,
        }
    }

    /// Swap in a new dataset and reset the filters.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.date_filter = DateFilter::for_dataset(&dataset);
        self.dataset = Arc::new(dataset);
        self.selection = FilterSelection::all();
        self.status_message = None;
        self.refresh();
    }

    /// Generate a fresh dataset with the next seed.
    pub fn regenerate(&mut self) {
        self.config.data.seed = self.config.data.seed.wrapping_add(1);
        let dataset = generate_dataset(&self.config.data);
        self.set_dataset(dataset);
    }

    /// Recompute KPIs and the active view from the current selection.
    pub fn refresh(&mut self) {
        self.selection.date_range = self.date_filter.range();
        self.update = handle_filter_change(
            &self.dataset,
            &self.selection,
            self.view,
            self.metric,
            self.config.view.top_n,
        );
    }

    pub fn set_choice(&mut self, dim: Dimension, choice: Choice) {
        if dim == Dimension::CarMake {
            self.selection.set_make(choice);
        } else {
            *self.selection.choice_mut(dim) = choice;
        }
        self.refresh();
    }

    pub fn set_view(&mut self, view: View) {
        if self.view != view {
            self.view = view;
            self.refresh();
        }
    }

    pub fn set_metric(&mut self, metric: Metric) {
        if self.metric != metric {
            self.metric = metric;
            self.refresh();
        }
    }

    pub fn set_date_filter(&mut self, date_filter: DateFilter) {
        if self.date_filter != date_filter {
            self.date_filter = date_filter;
            self.refresh();
        }
    }

    /// Dropdown options for a dimension. Car models depend on the make.
    pub fn options(&self, dim: Dimension) -> Vec<String> {
        match dim {
            Dimension::CarModel => self.dataset.models_for_make(self.selection.car_make.as_value()),
            other => self.dataset.unique_values(other),
        }
    }

    /// CSV bytes of the currently filtered rows.
    pub fn export_filtered(&self) -> Result<Vec<u8>> {
        let subset = apply_filter(&self.dataset, &self.selection);
        export_csv(&subset).context("exporting filtered rows")
    }
}
