use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::model::{Dataset, SaleRecord};

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

/// Makes and the three models sold under each.
pub const CATALOGUE: [(&str, [&str; 3]); 8] = [
    ("Toyota", ["Camry", "Corolla", "RAV4"]),
    ("Honda", ["Civic", "Accord", "CR-V"]),
    ("Ford", ["F-150", "Mustang", "Explorer"]),
    ("Chevrolet", ["Silverado", "Malibu", "Equinox"]),
    ("BMW", ["3 Series", "5 Series", "X5"]),
    ("Mercedes", ["C-Class", "E-Class", "GLC"]),
    ("Hyundai", ["Elantra", "Sonata", "Tucson"]),
    ("Volkswagen", ["Jetta", "Passat", "Tiguan"]),
];

const FIRST_NAMES: [&str; 16] = [
    "Alice", "Brian", "Carmen", "David", "Elena", "Felix", "Grace", "Hassan", "Irene", "Jamal",
    "Keiko", "Liam", "Maya", "Noah", "Olivia", "Pedro",
];

const LAST_NAMES: [&str; 16] = [
    "Anderson", "Baker", "Chen", "Diaz", "Evans", "Fischer", "Garcia", "Hughes", "Ito", "Johnson",
    "Kowalski", "Lopez", "Moreau", "Nguyen", "Okafor", "Patel",
];

pub const SALESPEOPLE: usize = 10;
const CAR_YEARS: std::ops::RangeInclusive<i32> = 2018..=2025;
const PRICE_RANGE: std::ops::Range<f64> = 15_000.0..100_000.0;
const COMMISSION_RANGE: std::ops::Range<f64> = 500.0..5_000.0;

// ---------------------------------------------------------------------------
// Generator settings
// ---------------------------------------------------------------------------

/// Shape of a synthetic dataset. Also the `[data]` section of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub rows: usize,
    pub seed: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            rows: 1000,
            seed: 42,
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2025, 7, 7).unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generate sales records deterministically from `config.seed`.
pub fn generate_sales(config: &GeneratorConfig) -> Vec<SaleRecord> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let salespeople = salesperson_names(&mut rng, SALESPEOPLE);

    let (start, end) = if config.start_date <= config.end_date {
        (config.start_date, config.end_date)
    } else {
        (config.end_date, config.start_date)
    };
    let span_days = (end - start).num_days();

    (0..config.rows)
        .map(|_| {
            let salesperson = &salespeople[rng.gen_range(0..salespeople.len())];
            let (make, models) = CATALOGUE[rng.gen_range(0..CATALOGUE.len())];
            let car_year = rng.gen_range(CAR_YEARS);
            let date = start + Duration::days(rng.gen_range(0..=span_days));
            let sale_price = round_cents(rng.gen_range(PRICE_RANGE));
            let commission = round_cents(rng.gen_range(COMMISSION_RANGE));
            let model = models.choose(&mut rng).copied().unwrap_or(models[0]);
            SaleRecord::new(
                salesperson.as_str(),
                make,
                model,
                car_year,
                date,
                sale_price,
                commission,
            )
        })
        .collect()
}

/// Generate and index a dataset in one step.
pub fn generate_dataset(config: &GeneratorConfig) -> Dataset {
    let dataset = Dataset::from_records(generate_sales(config));
    log::info!(
        "Generated {} sales records (seed {})",
        dataset.len(),
        config.seed
    );
    dataset
}

/// Draw `count` distinct "First Last" names.
fn salesperson_names(rng: &mut StdRng, count: usize) -> Vec<String> {
    let mut pairs: Vec<(usize, usize)> = (0..FIRST_NAMES.len())
        .flat_map(|f| (0..LAST_NAMES.len()).map(move |l| (f, l)))
        .collect();
    pairs.shuffle(rng);
    pairs
        .into_iter()
        .take(count)
        .map(|(f, l)| format!("{} {}", FIRST_NAMES[f], LAST_NAMES[l]))
        .collect()
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
