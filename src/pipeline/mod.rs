//! Filter-aggregate pipeline: everything the dashboard shows is derived
//! here, recomputed from the immutable dataset on every selection change.
//!
//! ```text
//!   Dataset ──apply_filter──▶ Subset ──┬──▶ summarize ──▶ KPI cards
//!                                      └──▶ aggregate ──▶ view content
//! ```

pub mod aggregate;
pub mod summary;

use crate::data::filter::{apply_filter, FilterSelection};
use crate::data::model::{Dataset, Metric};

pub use aggregate::{aggregate, aggregate_with_limit, Aggregation, PipelineError, View};
pub use summary::{summarize, KpiCards, Summary};

/// What the view area should show.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewContent {
    Ready(Aggregation),
    /// The aggregation failed; the message is meant for the user.
    Failed(String),
}

/// Everything the UI needs after one selection change.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardUpdate {
    pub summary: Summary,
    pub kpis: KpiCards,
    pub view: View,
    pub metric: Metric,
    pub content: ViewContent,
}

/// Recompute the dashboard for a selection.
///
/// Aggregation failures are logged and returned as [`ViewContent::Failed`];
/// the KPI cards are always produced.
pub fn handle_filter_change(
    dataset: &Dataset,
    selection: &FilterSelection,
    view: View,
    metric: Metric,
    top_n: usize,
) -> DashboardUpdate {
    let subset = apply_filter(dataset, selection);
    let summary = summarize(&subset);
    log::debug!(
        "{} of {} records match; computing {view} by {metric}",
        subset.len(),
        dataset.len()
    );

    let content = match aggregate_with_limit(&subset, view, metric, top_n) {
        Ok(agg) => ViewContent::Ready(agg),
        Err(e) => {
            log::error!("Failed to compute {view}: {e}");
            ViewContent::Failed(format!("Could not compute {view}: {e}"))
        }
    };

    DashboardUpdate {
        kpis: summary.kpis(),
        summary,
        view,
        metric,
        content,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::filter::Choice;
    use crate::data::model::SaleRecord;

    #[test]
    fn failure_is_surfaced_not_fatal() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let ds = Dataset::from_records(vec![
            SaleRecord::new("Ann", "BMW", "X5", 2020, d, f64::NAN, 1.0),
            SaleRecord::new("Bob", "BMW", "X5", 2020, d, 10.0, 1.0),
        ]);
        let update = handle_filter_change(
            &ds,
            &FilterSelection::all(),
            View::Pivot,
            Metric::SalePrice,
            10,
        );
        assert_eq!(update.summary.count, 2);
        assert_eq!(update.kpis.count, "2");
        match update.content {
            ViewContent::Failed(msg) => assert!(msg.contains("Heatmap")),
            other => panic!("expected failure, got {other:?}"),
        }

        let sel = FilterSelection {
            salesperson: Choice::parse("Bob"),
            ..FilterSelection::default()
        };
        let update = handle_filter_change(&ds, &sel, View::Pivot, Metric::SalePrice, 10);
        assert!(matches!(update.content, ViewContent::Ready(Aggregation::Pivot(_))));
        assert_eq!(update.kpis.total_sales, "$10");
    }
}
