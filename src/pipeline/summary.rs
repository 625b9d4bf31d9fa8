use crate::data::filter::Subset;

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

/// The four headline numbers for a filtered subset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub total_sales: f64,
    pub total_commission: f64,
    /// Mean sale price; 0 for an empty subset.
    pub avg_price: f64,
    pub count: usize,
}

/// [`Summary`] formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KpiCards {
    pub total_sales: String,
    pub total_commission: String,
    pub avg_price: String,
    pub count: String,
}

impl KpiCards {
    /// `(title, value)` pairs in display order.
    pub fn entries(&self) -> [(&'static str, &str); 4] {
        [
            ("Total Sales", &self.total_sales),
            ("Total Commission", &self.total_commission),
            ("Avg Sale Price", &self.avg_price),
            ("Transactions", &self.count),
        ]
    }
}

impl Summary {
    pub fn kpis(&self) -> KpiCards {
        KpiCards {
            total_sales: format_currency(self.total_sales),
            total_commission: format_currency(self.total_commission),
            avg_price: format_currency(self.avg_price),
            count: format_count(self.count),
        }
    }
}

pub fn summarize(subset: &Subset<'_>) -> Summary {
    let (total_sales, total_commission, count) = subset.records().fold(
        (0.0, 0.0, 0usize),
        |(sales, comm, n), rec| (sales + rec.sale_price, comm + rec.commission, n + 1),
    );
    let avg_price = if count == 0 {
        0.0
    } else {
        total_sales / count as f64
    };
    Summary {
        total_sales,
        total_commission,
        avg_price,
        count,
    }
}

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

/// `$1,234,568`: rounded to whole units, thousands separated.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return "$0".to_string();
    }
    let rounded = format!("{:.0}", value.abs());
    let sign = if value < 0.0 && rounded != "0" { "-" } else { "" };
    format!("{sign}${}", add_thousands_separator(&rounded))
}

/// `1,000`
pub fn format_count(count: usize) -> String {
    add_thousands_separator(&count.to_string())
}

/// Insert `,` every three digits of an unsigned integer string.
fn add_thousands_separator(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::filter::{apply_filter, Choice, FilterSelection};
    use crate::data::model::{Dataset, SaleRecord};

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(999.49), "$999");
        assert_eq!(format_currency(1000.0), "$1,000");
        assert_eq!(format_currency(1_234_567.6), "$1,234,568");
        assert_eq!(format_currency(-12_345.0), "-$12,345");
        assert_eq!(format_currency(-0.2), "$0");
        assert_eq!(format_currency(f64::NAN), "$0");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(7), "7");
    }

    #[test]
    fn empty_subset_is_all_zero() {
        let ds = Dataset::default();
        let s = summarize(&apply_filter(&ds, &FilterSelection::all()));
        assert_eq!(s, Summary::default());
        let kpis = s.kpis();
        assert_eq!(kpis.avg_price, "$0");
        assert_eq!(kpis.count, "0");
    }

    #[test]
    fn sums_and_mean() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let ds = Dataset::from_records(vec![
            SaleRecord::new("X", "A", "m", 2020, d, 100.0, 10.0),
            SaleRecord::new("X", "B", "m", 2020, d, 200.0, 20.4),
            SaleRecord::new("Y", "A", "m", 2020, d, 50.0, 5.0),
        ]);
        let sel = FilterSelection {
            salesperson: Choice::parse("X"),
            ..FilterSelection::default()
        };
        let s = summarize(&apply_filter(&ds, &sel));
        assert_eq!(s.total_sales, 300.0);
        assert!((s.total_commission - 30.4).abs() < 1e-9);
        assert_eq!(s.avg_price, 150.0);
        assert_eq!(s.count, 2);
        assert_eq!(s.kpis().total_commission, "$30");
    }
}
