use super::{ClassificationSource, ClassificationStrategy, HealthLevel};
use crate::nutrient_normalizer::NutritionRecord;

// grams per 100g
pub const SUGAR_HIGH: f64 = 10.0;
pub const FAT_HIGH: f64 = 10.0;
pub const SALT_HIGH: f64 = 1.0;
pub const SUGAR_LOW: f64 = 5.0;
pub const FAT_LOW: f64 = 3.0;
pub const SALT_LOW: f64 = 0.3;

pub fn is_high_sugar(record: &NutritionRecord) -> bool {
    record.sugars >= SUGAR_HIGH
}

pub fn is_high_fat(record: &NutritionRecord) -> bool {
    record.fat >= FAT_HIGH
}

pub fn is_high_salt(record: &NutritionRecord) -> bool {
    record.salt >= SALT_HIGH
}

/// Threshold classification over sugar, fat and salt.
///
/// The unhealthy check runs first and wins over the healthy check.
pub fn classify(record: &NutritionRecord) -> HealthLevel {
    if is_high_sugar(record) || is_high_fat(record) || is_high_salt(record) {
        HealthLevel::Unhealthy
    } else if record.sugars < SUGAR_LOW && record.fat < FAT_LOW && record.salt < SALT_LOW {
        HealthLevel::Healthy
    } else {
        HealthLevel::Moderate
    }
}

/// Terminal strategy of the classification chain.
pub struct ThresholdRule;

impl ClassificationStrategy for ThresholdRule {
    fn source(&self) -> ClassificationSource {
        ClassificationSource::Rules
    }

    fn classify(&self, record: &NutritionRecord) -> Option<HealthLevel> {
        Some(classify(record))
    }
}
