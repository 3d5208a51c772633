use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::food_table::FoodTable;
use crate::health_classifier::rules::{is_high_fat, is_high_salt, is_high_sugar};
use crate::health_classifier::{ClassificationSource, HealthClassifier, HealthLevel};
use crate::ingredient_analyzer::{self, IngredientAnalysis};
use crate::nutrient_normalizer::{
    self, extract_product_info, NutritionRecord, NutritionStatus, ProductInfo,
};
use crate::nutrition_scorer::{self, DailyValues, Insight};
use crate::recommender::RecommendationRequest;

const MAX_LISTED_ITEMS: usize = 5;
const FALLBACK_BRAND: &str = "Natural Food";

#[derive(Debug, Error, PartialEq)]
pub enum ReportError {
    #[error("Payload has no product section")]
    MissingProduct,
    #[error("No nutrition data available for {product_name}")]
    NoNutritionData { product_name: String },
    #[error("Insufficient nutrition data for {product_name}")]
    InsufficientNutritionData { product_name: String },
}

/// Everything known about one product, merged for display.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProductReport {
    #[serde(flatten)]
    pub product: ProductInfo,
    pub health_level: HealthLevel,
    pub classification_source: ClassificationSource,
    /// Rounded to two decimals.
    pub nutrients: NutritionRecord,
    #[serde(flatten)]
    pub ingredients: IngredientAnalysis,
    pub health_message: String,
    pub nutrition_score: f64,
    pub daily_values: DailyValues,
    pub insights: Vec<Insight>,
}

/// Builds a report from a raw product payload.
pub fn build_report(
    raw: &Value,
    classifier: &HealthClassifier,
) -> Result<ProductReport, ReportError> {
    let info = extract_product_info(raw).ok_or(ReportError::MissingProduct)?;
    let record = match nutrient_normalizer::nutrition_status(raw) {
        NutritionStatus::MissingProduct => return Err(ReportError::MissingProduct),
        NutritionStatus::NoNutriments => {
            return Err(ReportError::NoNutritionData {
                product_name: info.product_name,
            })
        }
        NutritionStatus::Insufficient => {
            return Err(ReportError::InsufficientNutritionData {
                product_name: info.product_name,
            })
        }
        NutritionStatus::Usable => nutrient_normalizer::normalize(raw).ok_or_else(|| {
            ReportError::InsufficientNutritionData {
                product_name: info.product_name.clone(),
            }
        })?,
    };
    Ok(report_from_record(info, record, classifier))
}

/// Builds a report from an already canonical record, e.g. a fallback-table hit.
pub fn report_from_record(
    info: ProductInfo,
    record: NutritionRecord,
    classifier: &HealthClassifier,
) -> ProductReport {
    let (health_level, classification_source) = classifier.classify_with_source(&record);
    let ingredients = ingredient_analyzer::analyze(&info.ingredients_text);
    let scored = nutrition_scorer::score(&record);
    let health_message = health_message(health_level, &record, &ingredients.detected_items());

    info!(
        product = %info.product_name,
        level = %health_level,
        source = ?classification_source,
        score = scored.score,
        "Product analyzed"
    );
    debug!("Detected items: {:?}", ingredients.detected_items());

    ProductReport {
        product: info,
        health_level,
        classification_source,
        nutrients: record.rounded(),
        ingredients,
        health_message,
        nutrition_score: scored.score,
        daily_values: scored.daily_values,
        insights: scored.insights,
    }
}

/// Report for a food recognized by name, resolved through the fallback table.
/// Whole foods carry no ingredient list.
pub fn report_for_food(
    food_name: &str,
    table: &FoodTable,
    classifier: &HealthClassifier,
) -> Option<ProductReport> {
    let entry = table.lookup(food_name)?;
    debug!("Resolved '{}' to table entry '{}'", food_name, entry.name);
    let info = ProductInfo {
        product_name: food_name.trim().to_string(),
        brand: FALLBACK_BRAND.to_string(),
        ingredients_text: String::new(),
    };
    Some(report_from_record(info, entry.nutrition, classifier))
}

pub fn health_message(level: HealthLevel, record: &NutritionRecord, detected: &[String]) -> String {
    let mut sentences = vec![match level {
        HealthLevel::Healthy => "This product appears to be a healthy choice.".to_string(),
        HealthLevel::Moderate => {
            "This product has moderate nutritional value - consume in moderation.".to_string()
        }
        HealthLevel::Unhealthy => concat!(
            "This product has high levels of sugar, fat, or salt - ",
            "consume occasionally."
        )
        .to_string(),
    }];

    if is_high_sugar(record) {
        sentences.push(format!("High sugar content ({:.1}g per 100g).", record.sugars));
    }
    if is_high_fat(record) {
        sentences.push(format!("High fat content ({:.1}g per 100g).", record.fat));
    }
    if is_high_salt(record) {
        sentences.push(format!("High salt content ({:.1}g per 100g).", record.salt));
    }
    if !detected.is_empty() {
        let listed: Vec<&str> = detected
            .iter()
            .take(MAX_LISTED_ITEMS)
            .map(String::as_str)
            .collect();
        sentences.push(format!("Contains: {}.", listed.join(", ")));
    }

    sentences.join(" ")
}

impl RecommendationRequest {
    pub fn from_report(report: &ProductReport) -> Self {
        Self {
            product_name: report.product.product_name.clone(),
            brand: report.product.brand.clone(),
            nutrition: report.nutrients,
            health_level: report.health_level,
            detected_issues: report.ingredients.detected_items(),
        }
    }
}
