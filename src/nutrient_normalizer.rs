use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 1 kcal = 4.184 kJ
const KJ_PER_KCAL: f64 = 4.184;

const ENERGY_KCAL_KEY: &str = "energy-kcal_100g";
const ENERGY_KJ_KEY: &str = "energy-kj_100g";
const ENERGY_KEY: &str = "energy_100g";
const SUGARS_KEY: &str = "sugars_100g";
const FAT_KEY: &str = "fat_100g";
const SALT_KEY: &str = "salt_100g";
const FIBER_KEY: &str = "fiber_100g";
const PROTEINS_KEY: &str = "proteins_100g";

/// Canonical per-100g nutrition record shared by every downstream component.
///
/// Serialized with the `_100g` naming convention of the upstream data so a
/// record can be echoed back to callers and read from recommendation requests.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct NutritionRecord {
    /// kcal per 100g
    #[serde(rename = "energy_100g", default)]
    pub energy: f64,
    #[serde(rename = "sugars_100g", default)]
    pub sugars: f64,
    #[serde(rename = "fat_100g", default)]
    pub fat: f64,
    #[serde(rename = "salt_100g", default)]
    pub salt: f64,
    #[serde(rename = "fiber_100g", default)]
    pub fiber: f64,
    #[serde(rename = "proteins_100g", default)]
    pub proteins: f64,
}

impl NutritionRecord {
    /// A record is usable when at least one nutrient is strictly positive.
    pub fn is_usable(&self) -> bool {
        self.values().iter().any(|v| *v > 0.0)
    }

    /// Feature vector in the order the classifier was trained on:
    /// energy, fat, sugar, salt, fiber, protein.
    /// Values are narrowed to `f32` here only; thresholds elsewhere see full precision.
    pub fn features(&self) -> [f32; 6] {
        [
            self.energy as f32,
            self.fat as f32,
            self.sugars as f32,
            self.salt as f32,
            self.fiber as f32,
            self.proteins as f32,
        ]
    }

    /// Copy with every field rounded to two decimals, for display.
    pub fn rounded(&self) -> Self {
        let r = |v: f64| (v * 100.0).round() / 100.0;
        Self {
            energy: r(self.energy),
            sugars: r(self.sugars),
            fat: r(self.fat),
            salt: r(self.salt),
            fiber: r(self.fiber),
            proteins: r(self.proteins),
        }
    }

    fn values(&self) -> [f64; 6] {
        [
            self.energy,
            self.sugars,
            self.fat,
            self.salt,
            self.fiber,
            self.proteins,
        ]
    }
}

/// Identity and ingredient text of a scanned product.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProductInfo {
    pub product_name: String,
    pub brand: String,
    pub ingredients_text: String,
}

/// Why a payload could not produce a nutrition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NutritionStatus {
    /// No `product` section at all.
    MissingProduct,
    /// Product present but without a `nutriments` section (or an empty one).
    NoNutriments,
    /// Nutriments present but every canonical field resolved to zero.
    Insufficient,
    Usable,
}

fn nutriments(raw: &Value) -> Option<&Value> {
    raw.get("product")?.get("nutriments")
}

/// Reads a nutrient as a non-negative finite number; anything else counts as missing.
fn nutrient(nutriments: &Value, key: &str) -> f64 {
    nutriments
        .get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

fn resolve_energy(nutriments: &Value) -> f64 {
    let kcal = nutrient(nutriments, ENERGY_KCAL_KEY);
    if kcal > 0.0 {
        return kcal;
    }
    let kj = match nutrient(nutriments, ENERGY_KJ_KEY) {
        v if v > 0.0 => v,
        _ => nutrient(nutriments, ENERGY_KEY),
    };
    if kj > 0.0 {
        kj / KJ_PER_KCAL
    } else {
        0.0
    }
}

fn resolve(nutriments: &Value) -> NutritionRecord {
    NutritionRecord {
        energy: resolve_energy(nutriments),
        sugars: nutrient(nutriments, SUGARS_KEY),
        fat: nutrient(nutriments, FAT_KEY),
        salt: nutrient(nutriments, SALT_KEY),
        fiber: nutrient(nutriments, FIBER_KEY),
        proteins: nutrient(nutriments, PROTEINS_KEY),
    }
}

/// Normalizes a raw product payload into a canonical record.
///
/// Returns `None` when the payload has no `product` section or when every
/// resolved nutrient is zero. The second case also swallows genuinely
/// zero-nutrient products such as still water; callers cannot tell the two
/// apart.
pub fn normalize(raw: &Value) -> Option<NutritionRecord> {
    let product = raw.get("product")?;
    let record = match product.get("nutriments") {
        Some(n) => resolve(n),
        None => NutritionRecord::default(),
    };
    record.is_usable().then_some(record)
}

/// Classifies a payload the same way [`normalize`] does, keeping the reason.
pub fn nutrition_status(raw: &Value) -> NutritionStatus {
    if raw.get("product").is_none() {
        return NutritionStatus::MissingProduct;
    }
    match nutriments(raw) {
        None => NutritionStatus::NoNutriments,
        Some(n) if n.as_object().map_or(true, |o| o.is_empty()) => NutritionStatus::NoNutriments,
        Some(n) if resolve(n).is_usable() => NutritionStatus::Usable,
        Some(_) => NutritionStatus::Insufficient,
    }
}

/// Extracts name, brand and ingredient text, defaulting whatever is missing.
pub fn extract_product_info(raw: &Value) -> Option<ProductInfo> {
    let product = raw.get("product")?;
    let text = |key: &str, default: &str| {
        product
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(default)
            .to_string()
    };
    Some(ProductInfo {
        product_name: text("product_name", "Unknown Product"),
        brand: text("brands", "Unknown Brand"),
        ingredients_text: text("ingredients_text", ""),
    })
}
