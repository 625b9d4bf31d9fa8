use chrono::NaiveDate;

use super::model::{Dataset, Dimension, SaleRecord};

// ---------------------------------------------------------------------------
// Filter predicate: one optional constraint per dropdown
// ---------------------------------------------------------------------------

/// A dropdown selection. `All` is its own variant, so a category that is
/// literally called "All" is still a real constraint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Choice {
    #[default]
    All,
    Only(String),
}

impl Choice {
    /// Interpret a raw dropdown value: `"All"` or blank means no constraint.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == "All" {
            Choice::All
        } else {
            Choice::Only(raw.to_string())
        }
    }

    pub fn as_value(&self) -> Option<&str> {
        match self {
            Choice::All => None,
            Choice::Only(v) => Some(v),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Choice::All)
    }

    /// Display text for a dropdown button.
    pub fn label(&self) -> &str {
        self.as_value().unwrap_or("All")
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, swapping the bounds if they arrive reversed.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            DateRange { start, end }
        } else {
            DateRange {
                start: end,
                end: start,
            }
        }
    }

    /// Parse ISO `YYYY-MM-DD` bounds. A missing or malformed bound drops the
    /// whole constraint rather than failing the request.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Option<Self> {
        let (start_raw, end_raw) = (start?, end?);
        match (parse_date(start_raw), parse_date(end_raw)) {
            (Some(s), Some(e)) => Some(DateRange::new(s, e)),
            _ => {
                log::warn!(
                    "Ignoring malformed date range {start_raw:?}..{end_raw:?}; showing all dates"
                );
                None
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// The complete set of user-chosen constraints. Constraints compose with AND.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSelection {
    pub salesperson: Choice,
    pub car_make: Choice,
    pub car_year: Choice,
    pub car_model: Choice,
    pub date_range: Option<DateRange>,
}

impl FilterSelection {
    /// Selection that passes every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn choice(&self, dim: Dimension) -> &Choice {
        match dim {
            Dimension::Salesperson => &self.salesperson,
            Dimension::CarMake => &self.car_make,
            Dimension::CarModel => &self.car_model,
            Dimension::CarYear => &self.car_year,
        }
    }

    pub fn choice_mut(&mut self, dim: Dimension) -> &mut Choice {
        match dim {
            Dimension::Salesperson => &mut self.salesperson,
            Dimension::CarMake => &mut self.car_make,
            Dimension::CarModel => &mut self.car_model,
            Dimension::CarYear => &mut self.car_year,
        }
    }

    /// True when no constraint is active.
    pub fn is_unconstrained(&self) -> bool {
        Dimension::ALL.iter().all(|d| self.choice(*d).is_all()) && self.date_range.is_none()
    }

    /// Change the make and reset the dependent model dropdown.
    pub fn set_make(&mut self, make: Choice) {
        if self.car_make != make {
            self.car_make = make;
            self.car_model = Choice::All;
        }
    }

    /// Whether one record passes every active constraint.
    pub fn matches(&self, record: &SaleRecord) -> bool {
        let categorical = Dimension::ALL.iter().all(|dim| match self.choice(*dim) {
            Choice::All => true,
            Choice::Only(value) => dim.matches(record, value),
        });
        categorical
            && self
                .date_range
                .map_or(true, |range| range.contains(record.date))
    }
}

/// Return indices of records that pass all active filters.
pub fn filtered_indices(dataset: &Dataset, selection: &FilterSelection) -> Vec<usize> {
    if selection.is_unconstrained() {
        return (0..dataset.len()).collect();
    }
    dataset
        .records()
        .iter()
        .enumerate()
        .filter(|(_, rec)| selection.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Subset – a borrowed, filtered view of the dataset
// ---------------------------------------------------------------------------

/// Rows of a [`Dataset`] that passed a filter. Borrows the dataset, so
/// filtering can never mutate it.
#[derive(Debug, Clone)]
pub struct Subset<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> Subset<'a> {
    /// Narrow this subset further.
    pub fn refine(&self, selection: &FilterSelection) -> Subset<'a> {
        let records = self.dataset.records();
        Subset {
            dataset: self.dataset,
            indices: self
                .indices
                .iter()
                .copied()
                .filter(|&i| selection.matches(&records[i]))
                .collect(),
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Records in dataset order.
    pub fn records(&self) -> impl Iterator<Item = &'a SaleRecord> + '_ {
        let records = self.dataset.records();
        self.indices.iter().map(move |&i| &records[i])
    }
}

impl PartialEq for Subset<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.dataset, other.dataset) && self.indices == other.indices
    }
}

/// Filter the dataset by `selection`.
pub fn apply_filter<'a>(dataset: &'a Dataset, selection: &FilterSelection) -> Subset<'a> {
    Subset {
        dataset,
        indices: filtered_indices(dataset, selection),
    }
}
