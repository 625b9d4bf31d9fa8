use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use chrono::Datelike;
use thiserror::Error;

use crate::data::filter::Subset;
use crate::data::model::{Dimension, Metric};

/// How many groups the top-N view keeps by default.
pub const TOP_N_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Which grouped aggregation to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    /// Monthly totals of both measures.
    #[default]
    Trend,
    /// Salesperson × car make, summed metric per cell.
    Pivot,
    /// Salespeople ranked by summed metric.
    TopN,
    /// Per (make, model) statistics.
    MultiGroup,
}

impl View {
    pub const ALL: [View; 4] = [View::Trend, View::Pivot, View::TopN, View::MultiGroup];

    /// Tab title.
    pub fn label(self) -> &'static str {
        match self {
            View::Trend => "KPI Trend",
            View::Pivot => "Heatmap",
            View::TopN => "Top Performers",
            View::MultiGroup => "Model Comparison",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub month: String,
    pub sale_price: f64,
    pub commission: f64,
}

/// Dense rows × columns table. Every combination has a cell; combinations
/// with no records hold 0.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub row_dim: Dimension,
    pub col_dim: Dimension,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// `cells[r][c]`
    pub cells: Vec<Vec<f64>>,
}

impl PivotTable {
    pub fn cell(&self, row: &str, col: &str) -> Option<f64> {
        let r = self.rows.iter().position(|k| k == row)?;
        let c = self.columns.iter().position(|k| k == col)?;
        Some(self.cells[r][c])
    }

    /// Largest cell value, 0 for an empty table.
    pub fn max(&self) -> f64 {
        self.cells
            .iter()
            .flatten()
            .copied()
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ranked {
    pub key: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub car_make: String,
    pub car_model: String,
    pub avg_sale_price: f64,
    pub total_sales: f64,
    pub count: usize,
    pub avg_commission: f64,
}

/// Output of [`aggregate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    /// The subset was empty.
    NoData,
    Trend(Vec<TrendPoint>),
    Pivot(PivotTable),
    TopN { metric: Metric, rows: Vec<Ranked> },
    MultiGroup(Vec<GroupStats>),
}

#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("{view}: {quantity} for '{group}' is not a finite number")]
    NonFinite {
        view: View,
        quantity: &'static str,
        group: String,
    },
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

pub fn aggregate(
    subset: &Subset<'_>,
    view: View,
    metric: Metric,
) -> Result<Aggregation, PipelineError> {
    aggregate_with_limit(subset, view, metric, TOP_N_LIMIT)
}

/// Like [`aggregate`] with a custom top-N size.
pub fn aggregate_with_limit(
    subset: &Subset<'_>,
    view: View,
    metric: Metric,
    limit: usize,
) -> Result<Aggregation, PipelineError> {
    if subset.is_empty() {
        return Ok(Aggregation::NoData);
    }
    let result = match view {
        View::Trend => Aggregation::Trend(trend(subset)),
        View::Pivot => Aggregation::Pivot(pivot(
            subset,
            Dimension::Salesperson,
            Dimension::CarMake,
            metric,
        )),
        View::TopN => Aggregation::TopN {
            metric,
            rows: top_n(subset, Dimension::Salesperson, metric, limit),
        },
        View::MultiGroup => Aggregation::MultiGroup(multi_group(subset)),
    };
    check_finite(&result)?;
    Ok(result)
}

// ---------------------------------------------------------------------------
// Individual views
// ---------------------------------------------------------------------------

/// Sum both measures per month, oldest month first.
///
/// Ordered by the numeric (year, month) of the date, not by the label, so
/// years outside 0000..=9999 still sort chronologically.
pub fn trend(subset: &Subset<'_>) -> Vec<TrendPoint> {
    let mut by_month: BTreeMap<(i32, u32), (&str, f64, f64)> = BTreeMap::new();
    for rec in subset.records() {
        let entry = by_month
            .entry((rec.date.year(), rec.date.month()))
            .or_insert((rec.month.as_str(), 0.0, 0.0));
        entry.1 += rec.sale_price;
        entry.2 += rec.commission;
    }
    by_month
        .into_values()
        .map(|(month, sale_price, commission)| TrendPoint {
            month: month.to_string(),
            sale_price,
            commission,
        })
        .collect()
}

/// Sum `metric` per (row key, column key). Keys come from the subset only.
pub fn pivot(
    subset: &Subset<'_>,
    row_dim: Dimension,
    col_dim: Dimension,
    metric: Metric,
) -> PivotTable {
    let mut sums: HashMap<(String, String), f64> = HashMap::new();
    let mut rows = BTreeSet::new();
    let mut columns = BTreeSet::new();
    for rec in subset.records() {
        let (r, c) = (row_dim.key(rec), col_dim.key(rec));
        rows.insert(r.clone());
        columns.insert(c.clone());
        *sums.entry((r, c)).or_default() += metric.value(rec);
    }

    let rows: Vec<String> = rows.into_iter().collect();
    let columns: Vec<String> = columns.into_iter().collect();
    let cells = rows
        .iter()
        .map(|r| {
            columns
                .iter()
                .map(|c| sums.get(&(r.clone(), c.clone())).copied().unwrap_or(0.0))
                .collect()
        })
        .collect();

    PivotTable {
        row_dim,
        col_dim,
        rows,
        columns,
        cells,
    }
}

/// Sum `metric` per group and keep the `limit` largest, descending.
/// Equal sums keep the order in which their groups first appear.
pub fn top_n(subset: &Subset<'_>, by: Dimension, metric: Metric, limit: usize) -> Vec<Ranked> {
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut ranked: Vec<Ranked> = Vec::new();
    for rec in subset.records() {
        let key = by.key(rec);
        let value = metric.value(rec);
        match position.get(&key) {
            Some(&i) => ranked[i].value += value,
            None => {
                position.insert(key.clone(), ranked.len());
                ranked.push(Ranked { key, value });
            }
        }
    }
    // Stable sort keeps first-encounter order among ties.
    ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
    ranked.truncate(limit);
    ranked
}

#[derive(Default)]
struct GroupAcc {
    sales: f64,
    commission: f64,
    count: usize,
}

/// Statistics per (make, model), sorted by make then model.
pub fn multi_group(subset: &Subset<'_>) -> Vec<GroupStats> {
    let mut groups: BTreeMap<(&str, &str), GroupAcc> = BTreeMap::new();
    for rec in subset.records() {
        let acc = groups
            .entry((rec.car_make.as_str(), rec.car_model.as_str()))
            .or_default();
        acc.sales += rec.sale_price;
        acc.commission += rec.commission;
        acc.count += 1;
    }
    groups
        .into_iter()
        .map(|((make, model), acc)| {
            let n = acc.count as f64;
            GroupStats {
                car_make: make.to_string(),
                car_model: model.to_string(),
                avg_sale_price: round2(acc.sales / n),
                total_sales: round2(acc.sales),
                count: acc.count,
                avg_commission: round2(acc.commission / n),
            }
        })
        .collect()
}

/// Two decimals, halves to even.
fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

fn check_finite(result: &Aggregation) -> Result<(), PipelineError> {
    let fail = |view: View, quantity: &'static str, group: &str| PipelineError::NonFinite {
        view,
        quantity,
        group: group.to_string(),
    };
    match result {
        Aggregation::NoData => Ok(()),
        Aggregation::Trend(points) => points.iter().try_for_each(|p| {
            if !p.sale_price.is_finite() {
                Err(fail(View::Trend, "sale price total", &p.month))
            } else if !p.commission.is_finite() {
                Err(fail(View::Trend, "commission total", &p.month))
            } else {
                Ok(())
            }
        }),
        Aggregation::Pivot(table) => {
            for (r, row) in table.rows.iter().zip(&table.cells) {
                if row.iter().any(|v| !v.is_finite()) {
                    return Err(fail(View::Pivot, "cell", r));
                }
            }
            Ok(())
        }
        Aggregation::TopN { rows, .. } => rows.iter().try_for_each(|r| {
            if r.value.is_finite() {
                Ok(())
            } else {
                Err(fail(View::TopN, "total", &r.key))
            }
        }),
        Aggregation::MultiGroup(groups) => groups.iter().try_for_each(|g| {
            let finite = [g.avg_sale_price, g.total_sales, g.avg_commission]
                .iter()
                .all(|v| v.is_finite());
            if finite {
                Ok(())
            } else {
                Err(fail(
                    View::MultiGroup,
                    "statistic",
                    &format!("{} {}", g.car_make, g.car_model),
                ))
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::data::filter::{apply_filter, Choice, FilterSelection};
    use crate::data::model::{Dataset, SaleRecord};

    fn rec(person: &str, make: &str, model: &str, month: u32, price: f64, comm: f64) -> SaleRecord {
        let date = NaiveDate::from_ymd_opt(2024, month, 15).unwrap();
        SaleRecord::new(person, make, model, 2022, date, price, comm)
    }

    fn dataset() -> Dataset {
        Dataset::from_records(vec![
            rec("Ann", "BMW", "X5", 3, 100.0, 10.0),
            rec("Bob", "Ford", "F-150", 1, 200.0, 20.0),
            rec("Ann", "Ford", "F-150", 1, 50.0, 5.0),
            rec("Cid", "BMW", "3 Series", 2, 300.0, 30.0),
            rec("Ann", "BMW", "X5", 3, 25.0, 1.0),
        ])
    }

    fn all(ds: &Dataset) -> Subset<'_> {
        apply_filter(ds, &FilterSelection::all())
    }

    #[test]
    fn empty_subset_is_no_data_for_every_view() {
        let ds = dataset();
        let sel = FilterSelection {
            salesperson: Choice::parse("Nobody"),
            ..FilterSelection::default()
        };
        let empty = apply_filter(&ds, &sel);
        for view in View::ALL {
            assert_eq!(
                aggregate(&empty, view, Metric::SalePrice),
                Ok(Aggregation::NoData)
            );
        }
    }

    #[test]
    fn trend_is_chronological() {
        let ds = dataset();
        let points = trend(&all(&ds));
        let months: Vec<&str> = points.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);
        assert_eq!(points[0].sale_price, 250.0);
        assert_eq!(points[0].commission, 25.0);
        assert_eq!(points[2].sale_price, 125.0);
    }

    #[test]
    fn trend_orders_years_outside_four_digits() {
        let at = |y: i32, m: u32| {
            let date = NaiveDate::from_ymd_opt(y, m, 1).unwrap();
            SaleRecord::new("Ann", "BMW", "X5", 2020, date, 1.0, 0.0)
        };
        let ds = Dataset::from_records(vec![
            at(10000, 1),
            at(9999, 12),
            at(-2, 6),
            at(-10, 6),
        ]);
        let months: Vec<String> = trend(&all(&ds)).into_iter().map(|p| p.month).collect();
        assert_eq!(months, vec!["-010-06", "-002-06", "9999-12", "10000-01"]);
    }

    #[test]
    fn pivot_fills_missing_with_zero() {
        let ds = dataset();
        let table = pivot(
            &all(&ds),
            Dimension::Salesperson,
            Dimension::CarMake,
            Metric::SalePrice,
        );
        assert_eq!(table.rows, vec!["Ann", "Bob", "Cid"]);
        assert_eq!(table.columns, vec!["BMW", "Ford"]);
        assert_eq!(table.cell("Ann", "BMW"), Some(125.0));
        assert_eq!(table.cell("Ann", "Ford"), Some(50.0));
        assert_eq!(table.cell("Bob", "BMW"), Some(0.0));
        assert_eq!(table.cell("Cid", "Ford"), Some(0.0));
        assert_eq!(table.cell("Dan", "BMW"), None);
        assert_eq!(table.max(), 300.0);
    }

    #[test]
    fn pivot_keys_come_from_subset() {
        let ds = dataset();
        let sel = FilterSelection {
            car_make: Choice::parse("Ford"),
            ..FilterSelection::default()
        };
        let table = pivot(
            &apply_filter(&ds, &sel),
            Dimension::Salesperson,
            Dimension::CarMake,
            Metric::Commission,
        );
        assert_eq!(table.rows, vec!["Ann", "Bob"]);
        assert_eq!(table.columns, vec!["Ford"]);
        assert_eq!(table.cells, vec![vec![5.0], vec![20.0]]);
    }

    #[test]
    fn top_n_descending_with_stable_ties() {
        let ds = Dataset::from_records(vec![
            rec("Eve", "BMW", "X5", 1, 10.0, 0.0),
            rec("Dan", "BMW", "X5", 1, 30.0, 0.0),
            rec("Fay", "BMW", "X5", 1, 10.0, 0.0),
            rec("Gus", "BMW", "X5", 1, 5.0, 0.0),
        ]);
        let ranked = top_n(&all(&ds), Dimension::Salesperson, Metric::SalePrice, 3);
        let keys: Vec<&str> = ranked.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["Dan", "Eve", "Fay"]);
    }

    #[test]
    fn top_n_caps_at_ten() {
        let records = (0..15)
            .map(|i| rec(&format!("P{i:02}"), "BMW", "X5", 1, i as f64, 0.0))
            .collect();
        let ds = Dataset::from_records(records);
        let result = aggregate(&all(&ds), View::TopN, Metric::SalePrice);
        let Ok(Aggregation::TopN { rows, metric }) = result else {
            panic!("expected top-N result");
        };
        assert_eq!(metric, Metric::SalePrice);
        assert_eq!(rows.len(), TOP_N_LIMIT);
        assert_eq!(rows[0].key, "P14");
        assert_eq!(rows[9].key, "P05");
    }

    #[test]
    fn multi_group_statistics() {
        let ds = Dataset::from_records(vec![
            rec("Ann", "BMW", "X5", 1, 100.0, 10.0),
            rec("Bob", "BMW", "X5", 1, 200.0, 20.0),
            rec("Bob", "BMW", "X5", 1, 0.01, 0.0),
            rec("Ann", "Audi", "A4", 1, 10.0, 1.0),
        ]);
        let groups = multi_group(&all(&ds));
        assert_eq!(
            groups,
            vec![
                GroupStats {
                    car_make: "Audi".into(),
                    car_model: "A4".into(),
                    avg_sale_price: 10.0,
                    total_sales: 10.0,
                    count: 1,
                    avg_commission: 1.0,
                },
                GroupStats {
                    car_make: "BMW".into(),
                    car_model: "X5".into(),
                    avg_sale_price: 100.0,
                    total_sales: 300.01,
                    count: 3,
                    avg_commission: 10.0,
                },
            ]
        );
    }

    #[test]
    fn group_statistics_round_half_to_even() {
        let ds = Dataset::from_records(vec![
            rec("Ann", "BMW", "X5", 1, 0.125, 0.375),
            rec("Bob", "BMW", "X5", 1, 0.125, 0.375),
        ]);
        let groups = multi_group(&all(&ds));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].avg_sale_price, 0.12);
        assert_eq!(groups[0].avg_commission, 0.38);
        assert_eq!(groups[0].total_sales, 0.25);
    }

    #[test]
    fn non_finite_measure_is_an_error() {
        let ds = Dataset::from_records(vec![rec("Ann", "BMW", "X5", 1, f64::INFINITY, 1.0)]);
        let err = aggregate(&all(&ds), View::TopN, Metric::SalePrice).unwrap_err();
        assert!(err.to_string().contains("Ann"));
        assert!(aggregate(&all(&ds), View::TopN, Metric::Commission).is_ok());
    }
}
