use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Date32Array, Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use thiserror::Error;

use super::filter::Subset;
use super::model::{Column, SaleRecord};

/// File name offered when the user downloads the filtered rows.
pub const EXPORT_FILENAME: &str = "filtered_data.csv";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("csv writer could not be flushed: {0}")]
    Flush(String),
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Serialize the subset as CSV: one header row of column names, then one
/// row per record. Numbers are written unrounded.
pub fn export_csv(subset: &Subset<'_>) -> Result<Vec<u8>, ExportError> {
    write_csv(subset.records())
}

/// Serialize any sequence of records in the export layout.
pub fn write_csv<'a>(
    records: impl IntoIterator<Item = &'a SaleRecord>,
) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(Column::ALL.iter().map(|c| c.header()))?;
    for rec in records {
        writer.write_record(Column::ALL.iter().map(|c| cell(rec, *c)))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Flush(e.error().to_string()))
}

fn cell(rec: &SaleRecord, column: Column) -> String {
    match column {
        Column::Salesperson => rec.salesperson.clone(),
        Column::CarMake => rec.car_make.clone(),
        Column::CarYear => rec.car_year.to_string(),
        Column::CarModel => rec.car_model.clone(),
        Column::Date => rec.date.format(DATE_FORMAT).to_string(),
        // `Display` for f64 is the shortest string that parses back exactly.
        Column::SalePrice => rec.sale_price.to_string(),
        Column::Commission => rec.commission.to_string(),
        Column::Year => rec.year.to_string(),
        Column::Quarter => rec.quarter.clone(),
        Column::Month => rec.month.clone(),
    }
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Arrow schema of a sales file, using the export column names.
pub fn sales_schema() -> Schema {
    Schema::new(vec![
        Field::new(Column::Salesperson.header(), DataType::Utf8, false),
        Field::new(Column::CarMake.header(), DataType::Utf8, false),
        Field::new(Column::CarYear.header(), DataType::Int32, false),
        Field::new(Column::Date.header(), DataType::Date32, false),
        Field::new(Column::SalePrice.header(), DataType::Float64, false),
        Field::new(Column::Commission.header(), DataType::Float64, false),
        Field::new(Column::CarModel.header(), DataType::Utf8, false),
        Field::new(Column::Year.header(), DataType::Int32, false),
        Field::new(Column::Quarter.header(), DataType::Utf8, false),
        Field::new(Column::Month.header(), DataType::Utf8, false),
    ])
}

/// Write records to a Parquet file.
pub fn write_parquet(records: &[SaleRecord], path: &Path) -> Result<(), ExportError> {
    let schema = Arc::new(sales_schema());

    let columns: Vec<ArrayRef> = vec![
        string_column(records.iter().map(|r| r.salesperson.as_str())),
        string_column(records.iter().map(|r| r.car_make.as_str())),
        Arc::new(Int32Array::from_iter_values(records.iter().map(|r| r.car_year))),
        Arc::new(Date32Array::from_iter_values(
            records.iter().map(|r| days_since_epoch(r.date)),
        )),
        Arc::new(Float64Array::from_iter_values(records.iter().map(|r| r.sale_price))),
        Arc::new(Float64Array::from_iter_values(records.iter().map(|r| r.commission))),
        string_column(records.iter().map(|r| r.car_model.as_str())),
        Arc::new(Int32Array::from_iter_values(records.iter().map(|r| r.year))),
        string_column(records.iter().map(|r| r.quarter.as_str())),
        string_column(records.iter().map(|r| r.month.as_str())),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns)?;
    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn string_column<'a>(values: impl Iterator<Item = &'a str>) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(values))
}

pub(crate) fn unix_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    (date - unix_epoch()).num_days() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply_filter, Choice, FilterSelection};
    use crate::data::model::Dataset;

    fn dataset() -> Dataset {
        let d = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
        Dataset::from_records(vec![
            SaleRecord::new("Ann Lee", "BMW", "3 Series", 2021, d, 45_123.45, 1_234.5),
            SaleRecord::new("Bob, Jr.", "Ford", "F-150", 2019, d, 0.1 + 0.2, 500.0),
        ])
    }

    #[test]
    fn header_and_rows() {
        let ds = dataset();
        let bytes = export_csv(&apply_filter(&ds, &FilterSelection::all())).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Salesperson,Car Make,Car Year,Date,Sale Price,Commission Earned,Car Model,Year,Quarter,Month"
        );
        assert_eq!(
            lines[1],
            "Ann Lee,BMW,2021,2024-05-17,45123.45,1234.5,3 Series,2024,2024Q2,2024-05"
        );
        // Quoted field and full float precision.
        assert!(lines[2].starts_with("\"Bob, Jr.\",Ford,2019,2024-05-17,0.30000000000000004,500,F-150,"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_subset_exports_header_only() {
        let ds = dataset();
        let sel = FilterSelection {
            salesperson: Choice::parse("Nobody"),
            ..FilterSelection::default()
        };
        let text = String::from_utf8(export_csv(&apply_filter(&ds, &sel)).unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn epoch_offsets() {
        assert_eq!(days_since_epoch(unix_epoch()), 0);
        assert_eq!(
            days_since_epoch(NaiveDate::from_ymd_opt(1970, 1, 11).unwrap()),
            10
        );
    }
}
