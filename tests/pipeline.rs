//! End-to-end properties of the filter-aggregate pipeline.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use autodash::data::export::export_csv;
use autodash::data::filter::{apply_filter, Choice, DateRange, FilterSelection};
use autodash::data::generate::{generate_dataset, GeneratorConfig};
use autodash::data::loader::read_csv;
use autodash::data::model::{Dataset, Dimension, Metric, SaleRecord};
use autodash::pipeline::aggregate::{pivot, top_n, TOP_N_LIMIT};
use autodash::pipeline::{
    aggregate, handle_filter_change, summarize, Aggregation, View, ViewContent,
};

// ---------------------------------------------------------------------------
// Fixtures and strategy generators
// ---------------------------------------------------------------------------

const PEOPLE: [&str; 4] = ["Ann", "Bob", "Cid", "Dee"];
const MAKES: [&str; 3] = ["BMW", "Ford", "Honda"];

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn arb_record() -> impl Strategy<Value = SaleRecord> {
    (
        0..PEOPLE.len(),
        0..MAKES.len(),
        2018..=2025i32,
        0..365i64,
        0.0..100_000.0f64,
        0.0..5_000.0f64,
    )
        .prop_map(|(p, m, year, day, price, comm)| {
            SaleRecord::new(
                PEOPLE[p],
                MAKES[m],
                format!("{}-{}", MAKES[m], year % 3),
                year,
                date(2024, 1, 1) + chrono::Duration::days(day),
                price,
                comm,
            )
        })
}

fn arb_dataset() -> impl Strategy<Value = Dataset> {
    proptest::collection::vec(arb_record(), 0..60).prop_map(Dataset::from_records)
}

fn arb_choice(values: &'static [&'static str]) -> impl Strategy<Value = Choice> {
    prop_oneof![
        2 => Just(Choice::All),
        3 => proptest::sample::select(values).prop_map(Choice::parse),
    ]
}

fn arb_selection() -> impl Strategy<Value = FilterSelection> {
    (
        arb_choice(&PEOPLE),
        arb_choice(&MAKES),
        prop_oneof![Just(Choice::All), (2018..=2025i32).prop_map(|y| Choice::Only(y.to_string()))],
        proptest::option::of((0..365i64, 0..365i64)),
    )
        .prop_map(|(salesperson, car_make, car_year, days)| FilterSelection {
            salesperson,
            car_make,
            car_year,
            car_model: Choice::All,
            date_range: days.map(|(a, b)| {
                let start = date(2024, 1, 1);
                DateRange::new(
                    start + chrono::Duration::days(a),
                    start + chrono::Duration::days(b),
                )
            }),
        })
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_filter_is_idempotent(ds in arb_dataset(), sel in arb_selection()) {
        let once = apply_filter(&ds, &sel);
        let twice = once.refine(&sel);
        prop_assert_eq!(once.indices(), twice.indices());
        prop_assert!(once.records().all(|r| sel.matches(r)));
    }

    #[test]
    fn prop_top_n_is_bounded_and_descending(ds in arb_dataset(), sel in arb_selection()) {
        let subset = apply_filter(&ds, &sel);
        match aggregate(&subset, View::TopN, Metric::Commission).unwrap() {
            Aggregation::NoData => prop_assert!(subset.is_empty()),
            Aggregation::TopN { rows, .. } => {
                prop_assert!(rows.len() <= TOP_N_LIMIT);
                prop_assert!(rows.windows(2).all(|w| w[0].value >= w[1].value));
            }
            other => prop_assert!(false, "unexpected {:?}", other),
        }
    }

    #[test]
    fn prop_pivot_cells_are_exact_sums(ds in arb_dataset(), sel in arb_selection()) {
        let subset = apply_filter(&ds, &sel);
        let table = pivot(&subset, Dimension::Salesperson, Dimension::CarMake, Metric::SalePrice);
        for (r, row_key) in table.rows.iter().enumerate() {
            prop_assert_eq!(table.cells[r].len(), table.columns.len());
            for (c, col_key) in table.columns.iter().enumerate() {
                let expected: f64 = subset
                    .records()
                    .filter(|rec| &rec.salesperson == row_key && &rec.car_make == col_key)
                    .map(|rec| rec.sale_price)
                    .sum();
                prop_assert!((table.cells[r][c] - expected).abs() <= 1e-6 * expected.max(1.0));
            }
        }
    }

    #[test]
    fn prop_export_round_trips(ds in arb_dataset(), sel in arb_selection()) {
        let subset = apply_filter(&ds, &sel);
        let bytes = export_csv(&subset).unwrap();
        let back = read_csv(bytes.as_slice()).unwrap();
        let expected: Vec<SaleRecord> = subset.records().cloned().collect();
        prop_assert_eq!(back, expected);
    }
}

// ---------------------------------------------------------------------------
// Worked example
// ---------------------------------------------------------------------------

#[test]
fn three_record_example() {
    let d = date(2024, 6, 1);
    let ds = Dataset::from_records(vec![
        SaleRecord::new("X", "A", "a1", 2020, d, 100.0, 1.0),
        SaleRecord::new("X", "B", "b1", 2020, d, 200.0, 2.0),
        SaleRecord::new("Y", "A", "a1", 2020, d, 50.0, 3.0),
    ]);
    let sel = FilterSelection {
        salesperson: Choice::parse("X"),
        ..FilterSelection::default()
    };
    let subset = apply_filter(&ds, &sel);
    assert_eq!(subset.len(), 2);

    let summary = summarize(&subset);
    assert_eq!(summary.total_sales, 300.0);
    assert_eq!(summary.avg_price, 150.0);
    assert_eq!(summary.count, 2);

    let ranked: Vec<(String, f64)> = top_n(&subset, Dimension::CarMake, Metric::SalePrice, 10)
        .into_iter()
        .map(|r| (r.key, r.value))
        .collect();
    assert_eq!(ranked, vec![("B".to_string(), 200.0), ("A".to_string(), 100.0)]);
}

#[test]
fn generated_dashboard_end_to_end() {
    let ds = generate_dataset(&GeneratorConfig::default());
    let make = ds.unique_values(Dimension::CarMake)[0].clone();
    let sel = FilterSelection {
        car_make: Choice::Only(make.clone()),
        ..FilterSelection::default()
    };

    for view in View::ALL {
        let update = handle_filter_change(&ds, &sel, view, Metric::SalePrice, TOP_N_LIMIT);
        assert!(update.summary.count > 0);
        assert!(update.kpis.total_sales.starts_with('$'));
        let ViewContent::Ready(agg) = update.content else {
            panic!("{view} failed");
        };
        match agg {
            Aggregation::Trend(points) => {
                assert!(points.windows(2).all(|w| w[0].month < w[1].month));
            }
            Aggregation::Pivot(table) => assert_eq!(table.columns, vec![make.clone()]),
            Aggregation::TopN { rows, .. } => assert!(rows.len() <= TOP_N_LIMIT),
            Aggregation::MultiGroup(groups) => {
                assert!(groups.iter().all(|g| g.car_make == make));
                let total: usize = groups.iter().map(|g| g.count).sum();
                assert_eq!(total, update.summary.count);
            }
            Aggregation::NoData => panic!("unexpected empty result"),
        }
    }
}
