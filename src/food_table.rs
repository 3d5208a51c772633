use csv::ReaderBuilder;
use once_cell::sync::Lazy;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, error};

use crate::nutrient_normalizer::NutritionRecord;

const NAME_COL: &str = "Name";
const ENERGY_COL: &str = "Energy (kcal/100g)";
const FAT_COL: &str = "Fat (g/100g)";
const SUGARS_COL: &str = "Sugars (g/100g)";
const SALT_COL: &str = "Salt (g/100g)";
const FIBER_COL: &str = "Fiber (g/100g)";
const PROTEINS_COL: &str = "Proteins (g/100g)";

const BUILTIN_CSV: &str = include_str!("../data/fallback_foods.csv");

static BUILTIN: Lazy<FoodTable> = Lazy::new(|| {
    FoodTable::from_reader(BUILTIN_CSV.as_bytes()).unwrap_or_else(|e| {
        error!("Built-in food table failed to parse: {}", e);
        FoodTable::default()
    })
});

#[derive(Debug, Error)]
pub enum FoodTableError {
    #[error("Food table file not found at: {0}")]
    NotFound(String),
    #[error("Column '{0}' not found")]
    MissingColumn(&'static str),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FoodEntry {
    pub name: String,
    pub nutrition: NutritionRecord,
}

/// Per-100g nutrition for common whole foods, used when a product was
/// recognized from an image rather than scanned by barcode.
#[derive(Debug, Clone, Default)]
pub struct FoodTable {
    entries: Vec<FoodEntry>,
}

fn parse_cell(s: &str) -> f64 {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

impl FoodTable {
    /// The table shipped with the crate.
    pub fn builtin() -> &'static FoodTable {
        &BUILTIN
    }

    pub fn from_path(csv_path: &Path) -> Result<Self, FoodTableError> {
        if !csv_path.exists() {
            return Err(FoodTableError::NotFound(csv_path.display().to_string()));
        }
        let file = std::fs::File::open(csv_path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, FoodTableError> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = rdr.headers()?.clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(FoodTableError::MissingColumn(name))
        };

        let name_idx = column(NAME_COL)?;
        let energy_idx = column(ENERGY_COL)?;
        let fat_idx = column(FAT_COL)?;
        let sugars_idx = column(SUGARS_COL)?;
        let salt_idx = column(SALT_COL)?;
        let fiber_idx = column(FIBER_COL)?;
        let proteins_idx = column(PROTEINS_COL)?;

        let mut entries = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let name = record.get(name_idx).unwrap_or("").trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            let cell = |idx: usize| record.get(idx).map(parse_cell).unwrap_or(0.0);
            entries.push(FoodEntry {
                name,
                nutrition: NutritionRecord {
                    energy: cell(energy_idx),
                    sugars: cell(sugars_idx),
                    fat: cell(fat_idx),
                    salt: cell(salt_idx),
                    fiber: cell(fiber_idx),
                    proteins: cell(proteins_idx),
                },
            });
        }
        debug!("Food table loaded with {} entries", entries.len());
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact name match first, then the first entry whose name contains or
    /// is contained in the query.
    pub fn lookup(&self, food_name: &str) -> Option<&FoodEntry> {
        let query = food_name.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|e| e.name == query)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| query.contains(&e.name) || e.name.contains(&query))
            })
    }
}
