use serde::{Deserialize, Serialize};

use crate::nutrient_normalizer::NutritionRecord;

// Reference daily intakes for an adult.
pub const DAILY_ENERGY_KCAL: f64 = 2000.0;
pub const DAILY_SUGAR_G: f64 = 50.0;
pub const DAILY_FAT_G: f64 = 70.0;
pub const DAILY_SALT_G: f64 = 6.0;
pub const DAILY_FIBER_G: f64 = 30.0;
pub const DAILY_PROTEIN_G: f64 = 50.0;

/// Percent of the reference daily intake covered by 100g, each in [0, 100].
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct DailyValues {
    pub energy: f64,
    pub sugar: f64,
    pub fat: f64,
    pub salt: f64,
    pub fiber: f64,
    pub protein: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Positive,
    Caution,
    Warning,
    Info,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub text: String,
}

impl Insight {
    fn new(kind: InsightKind, text: String) -> Self {
        Self { kind, text }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NutritionScore {
    /// 0 to 100, one decimal.
    pub score: f64,
    pub daily_values: DailyValues,
    pub insights: Vec<Insight>,
}

fn percent_of(amount: f64, daily: f64) -> f64 {
    (amount / daily * 100.0).clamp(0.0, 100.0)
}

pub fn daily_values(record: &NutritionRecord) -> DailyValues {
    DailyValues {
        energy: percent_of(record.energy, DAILY_ENERGY_KCAL),
        sugar: percent_of(record.sugars, DAILY_SUGAR_G),
        fat: percent_of(record.fat, DAILY_FAT_G),
        salt: percent_of(record.salt, DAILY_SALT_G),
        fiber: percent_of(record.fiber, DAILY_FIBER_G),
        protein: percent_of(record.proteins, DAILY_PROTEIN_G),
    }
}

/// Aggregate score from daily values.
///
/// Starts at 100, loses up to 30 points for sugar and up to 25 each for fat
/// and salt, gains up to 10 each for fiber and protein. Each term is capped
/// on its own before they are combined.
pub fn health_score(dv: &DailyValues) -> f64 {
    let mut score = 100.0_f64;
    score -= (dv.sugar * 0.3).min(30.0);
    score -= (dv.fat * 0.25).min(25.0);
    score -= (dv.salt * 0.25).min(25.0);
    score += (dv.fiber * 0.1).min(10.0);
    score += (dv.protein * 0.1).min(10.0);
    (score.clamp(0.0, 100.0) * 10.0).round() / 10.0
}

/// Per-nutrient remarks. Values in the unlabeled middle band of a nutrient
/// produce nothing for that nutrient.
pub fn health_insights(record: &NutritionRecord) -> Vec<Insight> {
    use InsightKind::*;

    let sugar = record.sugars;
    let fat = record.fat;
    let salt = record.salt;
    let fiber = record.fiber;
    let protein = record.proteins;

    let sugar_insight = if sugar >= 22.5 {
        Some(Insight::new(
            Warning,
            format!("Very high sugar ({:.1}g) - exceeds daily limit in small portions", sugar),
        ))
    } else if sugar >= 10.0 {
        Some(Insight::new(
            Caution,
            format!("High sugar content ({:.1}g) - consume in moderation", sugar),
        ))
    } else if sugar < 5.0 {
        Some(Insight::new(Positive, format!("Low sugar content ({:.1}g) - good choice", sugar)))
    } else {
        None
    };

    let fat_insight = if fat >= 17.5 {
        Some(Insight::new(Warning, format!("Very high fat ({:.1}g) - limit consumption", fat)))
    } else if fat >= 10.0 {
        Some(Insight::new(Caution, format!("High fat content ({:.1}g)", fat)))
    } else if fat < 3.0 {
        Some(Insight::new(Positive, format!("Low fat content ({:.1}g)", fat)))
    } else {
        None
    };

    let salt_insight = if salt >= 1.5 {
        Some(Insight::new(
            Warning,
            format!("Very high salt ({:.2}g) - may increase blood pressure", salt),
        ))
    } else if salt >= 1.0 {
        Some(Insight::new(Caution, format!("High salt content ({:.2}g)", salt)))
    } else if salt < 0.3 {
        Some(Insight::new(Positive, format!("Low salt content ({:.2}g)", salt)))
    } else {
        None
    };

    let fiber_insight = if fiber >= 6.0 {
        Some(Insight::new(Positive, format!("High fiber ({:.1}g) - supports digestion", fiber)))
    } else if fiber < 3.0 {
        Some(Insight::new(
            Info,
            format!("Low fiber ({:.1}g) - consider adding fiber-rich foods", fiber),
        ))
    } else {
        None
    };

    let protein_insight = if protein >= 10.0 {
        Some(Insight::new(
            Positive,
            format!("Good protein content ({:.1}g) - supports muscle health", protein),
        ))
    } else if protein < 3.0 {
        Some(Insight::new(Info, format!("Low protein ({:.1}g)", protein)))
    } else {
        None
    };

    [sugar_insight, fat_insight, salt_insight, fiber_insight, protein_insight]
        .into_iter()
        .flatten()
        .collect()
}

/// Scores a product's per-100g nutrition.
///
/// # Arguments
/// * `record`: canonical per-100g nutrition.
///
/// # Returns
/// The aggregate score, the six daily-value percentages and the insight list.
pub fn score(record: &NutritionRecord) -> NutritionScore {
    let dv = daily_values(record);
    NutritionScore {
        score: health_score(&dv),
        daily_values: dv,
        insights: health_insights(record),
    }
}
