use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, ArrayRef, AsArray, Date32Array, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::{Deserialize, Serialize};

use super::export::{unix_epoch, DATE_FORMAT};
use super::model::{Column, Dataset, SaleRecord};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a sales dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – the export layout (header row of column names)
/// * `.json`    – `[{ "Salesperson": "...", "Car Make": "...", ... }, ...]`
/// * `.parquet` – one column per attribute, as written by `generate_sample`
///
/// Derived columns (`Year`, `Quarter`, `Month`) are recomputed from `Date`
/// and ignored if present.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let records = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "csv" => load_csv(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };
    Ok(Dataset::from_records(records))
}

// ---------------------------------------------------------------------------
// Row layout shared by CSV and JSON
// ---------------------------------------------------------------------------

/// One sale as it appears in a CSV or JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRow {
    #[serde(rename = "Salesperson")]
    pub salesperson: String,
    #[serde(rename = "Car Make")]
    pub car_make: String,
    #[serde(rename = "Car Year")]
    pub car_year: i32,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Sale Price")]
    pub sale_price: f64,
    #[serde(rename = "Commission Earned")]
    pub commission: f64,
    #[serde(rename = "Car Model")]
    pub car_model: String,
}

impl From<SaleRow> for SaleRecord {
    fn from(row: SaleRow) -> Self {
        SaleRecord::new(
            row.salesperson,
            row.car_make,
            row.car_model,
            row.car_year,
            row.date,
            row.sale_price,
            row.commission,
        )
    }
}

impl From<&SaleRecord> for SaleRow {
    fn from(rec: &SaleRecord) -> Self {
        SaleRow {
            salesperson: rec.salesperson.clone(),
            car_make: rec.car_make.clone(),
            car_year: rec.car_year,
            date: rec.date,
            sale_price: rec.sale_price,
            commission: rec.commission,
            car_model: rec.car_model.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Vec<SaleRecord>> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    read_csv(file)
}

/// Parse CSV in the export layout.
pub fn read_csv(input: impl std::io::Read) -> Result<Vec<SaleRecord>> {
    let mut reader = csv::Reader::from_reader(input);
    reader
        .deserialize::<SaleRow>()
        .enumerate()
        .map(|(row_no, row)| {
            row.map(SaleRecord::from)
                .with_context(|| format!("CSV row {row_no}"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON:
///
/// ```json
/// [
///   { "Salesperson": "Maya Chen", "Car Make": "BMW", "Car Year": 2021,
///     "Date": "2024-05-17", "Sale Price": 45123.45,
///     "Commission Earned": 1234.5, "Car Model": "X5" }
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<SaleRecord>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let rows: Vec<SaleRow> = serde_json::from_str(&text).context("parsing JSON")?;
    Ok(rows.into_iter().map(SaleRecord::from).collect())
}

/// Serialize records in the JSON layout read by [`load_file`].
pub fn to_json(records: &[SaleRecord]) -> Result<String> {
    let rows: Vec<SaleRow> = records.iter().map(SaleRow::from).collect();
    serde_json::to_string_pretty(&rows).context("serializing JSON")
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file. Integer columns may be Int32 or Int64, measures
/// Float64 or Float32, and `Date` either Date32 or an ISO string column.
fn load_parquet(path: &Path) -> Result<Vec<SaleRecord>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        read_batch(&batch, &mut records)?;
    }
    Ok(records)
}

fn column(batch: &RecordBatch, c: Column) -> Result<&ArrayRef> {
    let idx = batch
        .schema()
        .index_of(c.header())
        .map_err(|_| anyhow::anyhow!("Parquet file missing '{}' column", c.header()))?;
    Ok(batch.column(idx))
}

fn read_batch(batch: &RecordBatch, out: &mut Vec<SaleRecord>) -> Result<()> {
    let salesperson = column(batch, Column::Salesperson)?;
    let make = column(batch, Column::CarMake)?;
    let car_year = column(batch, Column::CarYear)?;
    let model = column(batch, Column::CarModel)?;
    let date = column(batch, Column::Date)?;
    let price = column(batch, Column::SalePrice)?;
    let commission = column(batch, Column::Commission)?;

    for row in 0..batch.num_rows() {
        let rec = SaleRecord::new(
            extract_string(salesperson, row).with_context(|| format!("Row {row}"))?,
            extract_string(make, row).with_context(|| format!("Row {row}"))?,
            extract_string(model, row).with_context(|| format!("Row {row}"))?,
            extract_int(car_year, row).with_context(|| format!("Row {row}"))?,
            extract_date(date, row).with_context(|| format!("Row {row}"))?,
            extract_f64(price, row).with_context(|| format!("Row {row}"))?,
            extract_f64(commission, row).with_context(|| format!("Row {row}"))?,
        );
        out.push(rec);
    }
    Ok(())
}

// -- Parquet / Arrow helpers --

fn extract_string(col: &ArrayRef, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value in string column");
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        other => bail!("Expected string column, got {other:?}"),
    }
}

fn extract_int(col: &ArrayRef, row: usize) -> Result<i32> {
    if col.is_null(row) {
        bail!("null value in integer column");
    }
    if let Some(arr) = col.as_any().downcast_ref::<Int32Array>() {
        Ok(arr.value(row))
    } else if let Some(arr) = col.as_any().downcast_ref::<Int64Array>() {
        i32::try_from(arr.value(row)).context("integer out of range")
    } else {
        bail!("Expected Int32 or Int64 column, got {:?}", col.data_type())
    }
}

fn extract_f64(col: &ArrayRef, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null value in numeric column");
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(arr.value(row))
    } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        Ok(arr.value(row) as f64)
    } else {
        bail!(
            "Expected Float64 or Float32 column, got {:?}",
            col.data_type()
        )
    }
}

fn extract_date(col: &ArrayRef, row: usize) -> Result<NaiveDate> {
    if col.is_null(row) {
        bail!("null value in date column");
    }
    match col.data_type() {
        DataType::Date32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Date32Array>()
                .context("expected Date32Array")?;
            Ok(unix_epoch() + Duration::days(arr.value(row) as i64))
        }
        DataType::Utf8 | DataType::LargeUtf8 => {
            let raw = extract_string(col, row)?;
            NaiveDate::parse_from_str(&raw, DATE_FORMAT)
                .with_context(|| format!("'{raw}' is not a YYYY-MM-DD date"))
        }
        other => bail!("Expected Date32 or string date column, got {other:?}"),
    }
}
