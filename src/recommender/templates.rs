use std::collections::BTreeMap;

use super::Alternative;
use crate::health_classifier::rules::{is_high_fat, is_high_salt, is_high_sugar};
use crate::nutrient_normalizer::NutritionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductCategory {
    Beverage,
    SaltySnack,
    Confectionery,
    Generic,
}

/// Category keywords, checked in order against the lowercase product name.
/// The first category with a keyword contained in the name wins.
pub const CATEGORY_KEYWORDS: &[(ProductCategory, &[&str])] = &[
    (
        ProductCategory::Beverage,
        &[
            "soda", "cola", "drink", "juice", "beverage", "water", "tea", "coffee", "pepsi",
            "sprite", "fanta", "mountain dew", "7up", "dr pepper", "energy drink",
            "sports drink", "lemonade", "iced tea", "soft drink", "carbonated", "fizzy",
            "orange soda", "lemon", "lime",
        ],
    ),
    (ProductCategory::SaltySnack, &["chips", "crisp", "snack"]),
    (ProductCategory::Confectionery, &["chocolate", "candy", "sweet"]),
];

pub const GENERAL_TIPS: [&str; 4] = [
    "Choose products with simpler ingredient lists",
    "Look for items with higher fiber content",
    "Opt for products with less added sugars and sodium",
    "Consider whole food alternatives when possible",
];

struct Template {
    name: &'static str,
    why_better: &'static str,
    key_benefits: &'static [&'static str],
    improvements: &'static [(&'static str, &'static str)],
}

const BEVERAGE: [Template; 4] = [
    Template {
        name: "100% Natural Orange Juice (No Added Sugar)",
        why_better:
            "Natural fruit sugars with vitamins instead of added sugars and artificial ingredients",
        key_benefits: &["No added sugar", "Vitamin C", "Natural nutrients"],
        improvements: &[("added_sugar", "100% less"), ("vitamins", "High in Vitamin C")],
    },
    Template {
        name: "Sparkling Water with Natural Fruit",
        why_better: "Zero sugar and calories while still providing refreshing taste",
        key_benefits: &["No added sugar", "Zero calories", "Natural hydration"],
        improvements: &[("sugar", "100% less sugar"), ("calories", "100% less calories")],
    },
    Template {
        name: "Unsweetened Iced Tea",
        why_better: "Natural antioxidants without added sugars",
        key_benefits: &["No added sugar", "Contains antioxidants", "Low calorie"],
        improvements: &[("sugar", "100% less sugar"), ("antioxidants", "Added")],
    },
    Template {
        name: "Coconut Water",
        why_better: "Natural electrolytes with naturally occurring sugars only",
        key_benefits: &["Natural electrolytes", "Lower sugar", "Potassium rich"],
        improvements: &[("sugar", "50% less sugar"), ("electrolytes", "Natural")],
    },
];

const SALTY_SNACK: [Template; 4] = [
    Template {
        name: "Baked Vegetable Chips",
        why_better: "Baked instead of fried, made from real vegetables",
        key_benefits: &["Lower fat", "More fiber", "Real vegetables"],
        improvements: &[("fat", "50% less fat"), ("fiber", "2x more fiber")],
    },
    Template {
        name: "Air-Popped Popcorn",
        why_better: "Whole grain with minimal fat and salt",
        key_benefits: &["Whole grain", "High fiber", "Lower calories"],
        improvements: &[("fat", "70% less fat"), ("fiber", "3x more fiber")],
    },
    Template {
        name: "Rice Cakes",
        why_better: "Light, crunchy alternative with less fat and salt",
        key_benefits: &["Low fat", "Low sodium", "Whole grain options"],
        improvements: &[("fat", "80% less fat"), ("salt", "60% less salt")],
    },
    Template {
        name: "Roasted Chickpeas",
        why_better: "Crunchy legume snack with plant protein and fiber instead of fried starch",
        key_benefits: &["High protein", "High fiber", "Lower fat"],
        improvements: &[("protein", "3x more protein"), ("fiber", "4x more fiber")],
    },
];

const CONFECTIONERY: [Template; 4] = [
    Template {
        name: "Dark Chocolate (70%+ cocoa)",
        why_better: "Higher cocoa content, less sugar, contains antioxidants",
        key_benefits: &["Less sugar", "Antioxidants", "Heart-healthy"],
        improvements: &[("sugar", "40% less sugar"), ("antioxidants", "High")],
    },
    Template {
        name: "Fresh Fruit with Yogurt",
        why_better: "Natural sugars with added protein and vitamins",
        key_benefits: &["Natural sugars", "High protein", "Vitamins"],
        improvements: &[("sugar", "Natural only"), ("protein", "Added"), ("vitamins", "High")],
    },
    Template {
        name: "Dried Fruit (no added sugar)",
        why_better: "Natural sweetness with fiber and nutrients",
        key_benefits: &["Natural sugars", "High fiber", "Vitamins"],
        improvements: &[("fiber", "10x more fiber"), ("vitamins", "Added")],
    },
    Template {
        name: "Mixed Nuts (unsalted)",
        why_better: "Satisfying snack with healthy fats and protein and no added sugar",
        key_benefits: &["No added sugar", "Healthy fats", "High protein"],
        improvements: &[("sugar", "90% less sugar"), ("protein", "3x more protein")],
    },
];

const GENERIC: [Template; 4] = [
    Template {
        name: "Fresh Fruits and Vegetables",
        why_better: "Whole foods with natural nutrients and fiber",
        key_benefits: &["Natural nutrients", "High fiber", "Low calories"],
        improvements: &[("fiber", "Much higher"), ("vitamins", "Abundant")],
    },
    Template {
        name: "Whole Grain Products",
        why_better: "Complex carbohydrates and higher fiber content",
        key_benefits: &["Whole grains", "High fiber", "Sustained energy"],
        improvements: &[("fiber", "3-5x more"), ("nutrients", "More complete")],
    },
    Template {
        name: "Low-Fat Dairy or Plant-Based Alternatives",
        why_better: "Protein-rich with less fat and often fortified",
        key_benefits: &["High protein", "Lower fat", "Calcium fortified"],
        improvements: &[("fat", "50-70% less"), ("protein", "High")],
    },
    Template {
        name: "Legumes and Pulses",
        why_better: "Plant protein and fiber with very little fat or added sugar",
        key_benefits: &["Plant protein", "High fiber", "Low fat"],
        improvements: &[("protein", "High"), ("fiber", "Much higher")],
    },
];

impl ProductCategory {
    pub fn detect(product_name: &str) -> Self {
        let name = product_name.to_lowercase();
        CATEGORY_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| name.contains(k)))
            .map(|(category, _)| *category)
            .unwrap_or(ProductCategory::Generic)
    }

    fn templates(self) -> &'static [Template; 4] {
        match self {
            ProductCategory::Beverage => &BEVERAGE,
            ProductCategory::SaltySnack => &SALTY_SNACK,
            ProductCategory::Confectionery => &CONFECTIONERY,
            ProductCategory::Generic => &GENERIC,
        }
    }

    pub fn alternatives(self) -> Vec<Alternative> {
        self.templates()
            .iter()
            .map(|t| Alternative {
                name: t.name.to_string(),
                brand: "Generic".to_string(),
                why_better: t.why_better.to_string(),
                key_benefits: t.key_benefits.iter().map(|b| b.to_string()).collect(),
                estimated_improvements: t
                    .improvements
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<BTreeMap<_, _>>(),
            })
            .collect()
    }
}

/// One-sentence summary naming whichever of sugar, fat and salt are high.
pub fn fallback_summary(record: &NutritionRecord) -> String {
    let mut parts = Vec::new();
    if is_high_sugar(record) {
        parts.push(format!("high sugar content ({:.1}g)", record.sugars));
    }
    if is_high_fat(record) {
        parts.push(format!("high fat ({:.1}g)", record.fat));
    }
    if is_high_salt(record) {
        parts.push(format!("high salt ({:.2}g)", record.salt));
    }

    if parts.is_empty() {
        concat!(
            "While this product has moderate nutrition, there are healthier options ",
            "available with better nutritional profiles."
        )
        .to_string()
    } else {
        format!(
            "This product has {}. {}",
            parts.join(", "),
            "Consider healthier alternatives to reduce intake of these nutrients."
        )
    }
}

pub fn general_tips() -> Vec<String> {
    GENERAL_TIPS.iter().map(|t| t.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_detection() {
        assert_eq!(ProductCategory::detect("Diet Cola"), ProductCategory::Beverage);
        assert_eq!(
            ProductCategory::detect("Salted Potato Chips"),
            ProductCategory::SaltySnack
        );
        assert_eq!(
            ProductCategory::detect("Candy Bar"),
            ProductCategory::Confectionery
        );
        // "cola" is a substring of "chocolate"
        assert_eq!(
            ProductCategory::detect("Milk Chocolate Bar"),
            ProductCategory::Beverage
        );
        assert_eq!(ProductCategory::detect("Frozen Pizza"), ProductCategory::Generic);
        assert_eq!(ProductCategory::detect(""), ProductCategory::Generic);
    }

    #[test]
    fn test_beverage_is_checked_first() {
        // contains both "lemon" and "candy"
        assert_eq!(
            ProductCategory::detect("LEMON CANDY"),
            ProductCategory::Beverage
        );
        // substring match: "sweet" inside "sweetcorn"
        assert_eq!(
            ProductCategory::detect("Sweetcorn"),
            ProductCategory::Confectionery
        );
    }

    #[test]
    fn test_every_category_yields_four_alternatives() {
        for category in [
            ProductCategory::Beverage,
            ProductCategory::SaltySnack,
            ProductCategory::Confectionery,
            ProductCategory::Generic,
        ] {
            let alternatives = category.alternatives();
            assert_eq!(alternatives.len(), 4);
            assert!(alternatives.iter().all(|a| a.brand == "Generic"));
            assert!(alternatives.iter().all(|a| !a.key_benefits.is_empty()));
        }
        let beverage = ProductCategory::Beverage.alternatives();
        assert_eq!(beverage[3].name, "Coconut Water");
        assert_eq!(
            beverage[1].estimated_improvements.get("calories").map(String::as_str),
            Some("100% less calories")
        );
    }

    #[test]
    fn test_fallback_summary() {
        let cola = NutritionRecord {
            sugars: 10.6,
            salt: 1.25,
            ..Default::default()
        };
        assert_eq!(
            fallback_summary(&cola),
            concat!(
                "This product has high sugar content (10.6g), high salt (1.25g). ",
                "Consider healthier alternatives to reduce intake of these nutrients."
            )
        );

        let plain = NutritionRecord {
            sugars: 4.0,
            fat: 2.0,
            ..Default::default()
        };
        assert!(fallback_summary(&plain).starts_with("While this product has moderate nutrition"));
    }
}
