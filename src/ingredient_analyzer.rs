//! Lexical scan of ingredient lists for allergens, harmful additives and
//! added-sugar indicators.
//!
//! Each vocabulary is compiled once into a [`RegexSet`] of whole-word,
//! case-insensitive patterns. A set reports every term that matches on its
//! own, so overlapping terms such as "sugar" and "cane sugar" are both
//! reported for "cane sugar".

use once_cell::sync::Lazy;
use regex::{RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::error;

pub const ALLERGENS: &[&str] = &[
    "gluten", "wheat", "barley", "rye", "oats",
    "milk", "lactose", "dairy",
    "eggs", "egg",
    "soy", "soya", "soybean",
    "nuts", "peanuts", "almonds", "walnuts", "cashews", "hazelnuts",
    "fish", "shellfish", "crustaceans",
    "sesame", "mustard", "celery", "sulphites", "sulfites",
];

pub const HARMFUL_ADDITIVES: &[&str] = &[
    "aspartame", "saccharin", "sucralose", "acesulfame",
    "msg", "monosodium glutamate",
    "sodium nitrite", "sodium nitrate",
    "bha", "bht", "butylated hydroxyanisole", "butylated hydroxytoluene",
    "tartrazine", "yellow 5", "red 40", "blue 1",
    "sodium benzoate", "potassium benzoate",
    "high fructose corn syrup", "hfcs",
    "trans fat", "partially hydrogenated",
    "artificial flavors", "artificial flavoring",
    "artificial colors", "artificial coloring",
];

pub const SUGAR_INDICATORS: &[&str] = &[
    "sugar", "sucrose", "fructose", "glucose", "dextrose",
    "corn syrup", "cane sugar", "brown sugar", "honey",
    "molasses", "maple syrup", "agave",
];

/// How a matched term is rendered back to the caller.
#[derive(Debug, Clone, Copy)]
enum Casing {
    /// "milk" -> "Milk"
    Capitalized,
    /// "high fructose corn syrup" -> "High Fructose Corn Syrup"
    Title,
}

struct Vocabulary {
    terms: &'static [&'static str],
    set: RegexSet,
    casing: Casing,
}

impl Vocabulary {
    fn compile(terms: &'static [&'static str], casing: Casing) -> Self {
        let patterns = terms
            .iter()
            .map(|t| format!(r"\b{}\b", regex::escape(t)));
        let set = RegexSetBuilder::new(patterns)
            .case_insensitive(true)
            .build()
            .unwrap_or_else(|e| {
                error!("Ingredient vocabulary failed to compile: {}", e);
                RegexSet::empty()
            });
        Self { terms, set, casing }
    }

    fn scan(&self, text: &str) -> Vec<String> {
        let found: BTreeSet<String> = self
            .set
            .matches(text)
            .into_iter()
            .filter_map(|idx| self.terms.get(idx))
            .map(|term| match self.casing {
                Casing::Capitalized => capitalize(term),
                Casing::Title => title_case(term),
            })
            .collect();
        found.into_iter().collect()
    }
}

static ALLERGEN_VOCAB: Lazy<Vocabulary> =
    Lazy::new(|| Vocabulary::compile(ALLERGENS, Casing::Capitalized));
static ADDITIVE_VOCAB: Lazy<Vocabulary> =
    Lazy::new(|| Vocabulary::compile(HARMFUL_ADDITIVES, Casing::Title));
static SUGAR_VOCAB: Lazy<Vocabulary> =
    Lazy::new(|| Vocabulary::compile(SUGAR_INDICATORS, Casing::Title));

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn title_case(phrase: &str) -> String {
    phrase
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Terms found in one ingredient list. Each list is deduplicated and sorted.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct IngredientAnalysis {
    pub allergens: Vec<String>,
    pub harmful_additives: Vec<String>,
    pub sugar_indicators: Vec<String>,
}

impl IngredientAnalysis {
    /// Allergens, then additives, then sugar indicators.
    pub fn detected_items(&self) -> Vec<String> {
        self.allergens
            .iter()
            .chain(&self.harmful_additives)
            .chain(&self.sugar_indicators)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.allergens.is_empty()
            && self.harmful_additives.is_empty()
            && self.sugar_indicators.is_empty()
    }
}

pub fn detect_allergens(ingredients_text: &str) -> Vec<String> {
    ALLERGEN_VOCAB.scan(ingredients_text)
}

pub fn detect_harmful_additives(ingredients_text: &str) -> Vec<String> {
    ADDITIVE_VOCAB.scan(ingredients_text)
}

pub fn detect_sugar_indicators(ingredients_text: &str) -> Vec<String> {
    SUGAR_VOCAB.scan(ingredients_text)
}

/// Runs all three vocabularies. Blank text yields an empty analysis.
pub fn analyze(ingredients_text: &str) -> IngredientAnalysis {
    if ingredients_text.trim().is_empty() {
        return IngredientAnalysis::default();
    }
    IngredientAnalysis {
        allergens: detect_allergens(ingredients_text),
        harmful_additives: detect_harmful_additives(ingredients_text),
        sugar_indicators: detect_sugar_indicators(ingredients_text),
    }
}
