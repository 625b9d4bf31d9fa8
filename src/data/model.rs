use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SaleRecord – one row of the dataset
// ---------------------------------------------------------------------------

/// A single car sale.
///
/// `year`, `quarter` and `month` are derived from `date` when the record is
/// built and are never recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub salesperson: String,
    pub car_make: String,
    pub car_model: String,
    pub car_year: i32,
    pub date: NaiveDate,
    pub sale_price: f64,
    pub commission: f64,
    pub year: i32,
    /// Calendar quarter label, e.g. `2024Q3`.
    pub quarter: String,
    /// Calendar month label, e.g. `2024-07`. Sorts chronologically.
    pub month: String,
}

impl SaleRecord {
    pub fn new(
        salesperson: impl Into<String>,
        car_make: impl Into<String>,
        car_model: impl Into<String>,
        car_year: i32,
        date: NaiveDate,
        sale_price: f64,
        commission: f64,
    ) -> Self {
        SaleRecord {
            salesperson: salesperson.into(),
            car_make: car_make.into(),
            car_model: car_model.into(),
            car_year,
            date,
            sale_price,
            commission,
            year: date.year(),
            quarter: quarter_label(date),
            month: month_label(date),
        }
    }
}

pub fn month_label(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

pub fn quarter_label(date: NaiveDate) -> String {
    format!("{}Q{}", date.year(), (date.month() - 1) / 3 + 1)
}

// ---------------------------------------------------------------------------
// Column / Dimension / Metric – named views onto a record
// ---------------------------------------------------------------------------

/// Every attribute of a [`SaleRecord`], in export order. The raw sale
/// columns come first, then the car model, then the derived date labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Salesperson,
    CarMake,
    CarYear,
    Date,
    SalePrice,
    Commission,
    CarModel,
    Year,
    Quarter,
    Month,
}

impl Column {
    pub const ALL: [Column; 10] = [
        Column::Salesperson,
        Column::CarMake,
        Column::CarYear,
        Column::Date,
        Column::SalePrice,
        Column::Commission,
        Column::CarModel,
        Column::Year,
        Column::Quarter,
        Column::Month,
    ];

    /// Header used in exported files and on screen.
    pub fn header(self) -> &'static str {
        match self {
            Column::Salesperson => "Salesperson",
            Column::CarMake => "Car Make",
            Column::CarYear => "Car Year",
            Column::CarModel => "Car Model",
            Column::Date => "Date",
            Column::SalePrice => "Sale Price",
            Column::Commission => "Commission Earned",
            Column::Year => "Year",
            Column::Quarter => "Quarter",
            Column::Month => "Month",
        }
    }
}

/// Categorical attributes usable as filters and grouping keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    Salesperson,
    CarMake,
    CarModel,
    CarYear,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Salesperson,
        Dimension::CarMake,
        Dimension::CarModel,
        Dimension::CarYear,
    ];

    /// The record's value for this dimension, as the dropdowns show it.
    pub fn key(self, record: &SaleRecord) -> String {
        match self {
            Dimension::Salesperson => record.salesperson.clone(),
            Dimension::CarMake => record.car_make.clone(),
            Dimension::CarModel => record.car_model.clone(),
            Dimension::CarYear => record.car_year.to_string(),
        }
    }

    /// Borrowing comparison used on the filter hot path.
    pub fn matches(self, record: &SaleRecord, value: &str) -> bool {
        match self {
            Dimension::Salesperson => record.salesperson == value,
            Dimension::CarMake => record.car_make == value,
            Dimension::CarModel => record.car_model == value,
            Dimension::CarYear => value.trim().parse::<i32>() == Ok(record.car_year),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Salesperson => Column::Salesperson.header(),
            Dimension::CarMake => Column::CarMake.header(),
            Dimension::CarModel => Column::CarModel.header(),
            Dimension::CarYear => Column::CarYear.header(),
        }
    }
}

/// Numeric measures that can drive the pivot and top-N views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    SalePrice,
    Commission,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::SalePrice, Metric::Commission];

    pub fn value(self, record: &SaleRecord) -> f64 {
        match self {
            Metric::SalePrice => record.sale_price,
            Metric::Commission => record.commission,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::SalePrice => Column::SalePrice.header(),
            Metric::Commission => Column::Commission.header(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete immutable collection
// ---------------------------------------------------------------------------

/// The full dataset with pre-computed dropdown options.
///
/// Never mutated once built; a new dataset replaces it wholesale.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<SaleRecord>,
    /// For each dimension the sorted set of unique values.
    unique_values: BTreeMap<Dimension, BTreeSet<String>>,
    /// Car make → sorted models sold under it.
    models_by_make: BTreeMap<String, BTreeSet<String>>,
}

impl Dataset {
    /// Build the option indices from the records.
    pub fn from_records(records: Vec<SaleRecord>) -> Self {
        let mut unique_values: BTreeMap<Dimension, BTreeSet<String>> = BTreeMap::new();
        let mut models_by_make: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for rec in &records {
            for dim in Dimension::ALL {
                unique_values.entry(dim).or_default().insert(dim.key(rec));
            }
            models_by_make
                .entry(rec.car_make.clone())
                .or_default()
                .insert(rec.car_model.clone());
        }

        Dataset {
            records,
            unique_values,
            models_by_make,
        }
    }

    pub fn records(&self) -> &[SaleRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted unique values of a dimension. Car years sort numerically.
    pub fn unique_values(&self, dim: Dimension) -> Vec<String> {
        let Some(values) = self.unique_values.get(&dim) else {
            return Vec::new();
        };
        let mut out: Vec<String> = values.iter().cloned().collect();
        if dim == Dimension::CarYear {
            out.sort_by_key(|v| v.parse::<i32>().unwrap_or(i32::MAX));
        }
        out
    }

    /// Models available for a make. `None` (the "All" make) offers no models.
    pub fn models_for_make(&self, make: Option<&str>) -> Vec<String> {
        make.and_then(|m| self.models_by_make.get(m))
            .map(|models| models.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Earliest and latest sale dates.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }
}
