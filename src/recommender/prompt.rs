use super::RecommendationRequest;
use crate::health_classifier::rules::{is_high_fat, is_high_salt, is_high_sugar};

pub const SYSTEM_PROMPT: &str = concat!(
    "You are a nutrition expert AI that recommends healthier food alternatives. ",
    "Provide practical, achievable suggestions with clear reasoning based on nutritional data."
);

const LOW_FIBER: f64 = 3.0;
const LOW_PROTEIN: f64 = 5.0;

/// Comma-separated concern phrases, or a neutral remark when nothing stands out.
pub fn health_concerns(request: &RecommendationRequest) -> String {
    let n = &request.nutrition;
    let mut concerns = Vec::new();
    if is_high_sugar(n) {
        concerns.push(format!("high sugar ({:.1}g)", n.sugars));
    }
    if is_high_fat(n) {
        concerns.push(format!("high fat ({:.1}g)", n.fat));
    }
    if is_high_salt(n) {
        concerns.push(format!("high salt ({:.2}g)", n.salt));
    }
    if n.fiber < LOW_FIBER {
        concerns.push(format!("low fiber ({:.1}g)", n.fiber));
    }
    if n.proteins < LOW_PROTEIN {
        concerns.push(format!("low protein ({:.1}g)", n.proteins));
    }

    if concerns.is_empty() {
        "generally balanced nutrition".to_string()
    } else {
        concerns.join(", ")
    }
}

pub fn build_prompt(request: &RecommendationRequest) -> String {
    let n = &request.nutrition;
    let issues = if request.detected_issues.is_empty() {
        "none detected".to_string()
    } else {
        request.detected_issues.join(", ")
    };

    format!(
        r#"Analyze this food product and recommend 3-5 SPECIFIC healthier alternatives:

SCANNED PRODUCT:
- Name: {name}
- Brand: {brand}
- Health Level: {level}

NUTRITION (per 100g):
- Energy: {energy:.1} kcal
- Sugar: {sugar:.1}g
- Fat: {fat:.1}g
- Salt: {salt:.2}g
- Fiber: {fiber:.1}g
- Protein: {protein:.1}g

HEALTH CONCERNS: {concerns}
DETECTED ISSUES: {issues}

TASK: Recommend 3-5 specific, real product alternatives that are:
1. HEALTHIER - Lower in concerning nutrients (sugar/fat/salt),
   higher in beneficial ones (fiber/protein)
2. SIMILAR - Same food category and use case
3. AVAILABLE - Real products commonly found in supermarkets
4. SPECIFIC - Include actual brand names and product names when possible

Return your response as a JSON object with this EXACT structure:
{{
    "summary": "Brief 1-2 sentence summary of main health concerns with this product",
    "alternatives": [
        {{
            "name": "Specific product name",
            "brand": "Brand name (if known) or 'Generic'",
            "why_better": "Clear explanation of nutritional improvements",
            "key_benefits": ["benefit 1", "benefit 2", "benefit 3"],
            "estimated_improvements": {{
                "sugar": "e.g., 50% less sugar",
                "fat": "e.g., 30% less fat",
                "other": "other improvements"
            }}
        }}
    ],
    "general_tips": ["tip 1", "tip 2", "tip 3"]
}}

Ensure the response is valid JSON. Focus on practical, achievable swaps."#,
        name = request.product_name,
        brand = request.brand,
        level = request.health_level,
        energy = n.energy,
        sugar = n.sugars,
        fat = n.fat,
        salt = n.salt,
        fiber = n.fiber,
        protein = n.proteins,
        concerns = health_concerns(request),
        issues = issues,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health_classifier::HealthLevel;
    use crate::nutrient_normalizer::NutritionRecord;

    fn request(nutrition: NutritionRecord, issues: Vec<&str>) -> RecommendationRequest {
        RecommendationRequest {
            product_name: "Cola Classic".to_string(),
            brand: "FizzCo".to_string(),
            nutrition,
            health_level: HealthLevel::Unhealthy,
            detected_issues: issues.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn test_health_concerns() {
        let r = request(
            NutritionRecord {
                energy: 42.0,
                sugars: 10.6,
                salt: 0.01,
                ..Default::default()
            },
            vec![],
        );
        assert_eq!(
            health_concerns(&r),
            "high sugar (10.6g), low fiber (0.0g), low protein (0.0g)"
        );

        let balanced = request(
            NutritionRecord {
                sugars: 2.0,
                fiber: 5.0,
                proteins: 8.0,
                ..Default::default()
            },
            vec![],
        );
        assert_eq!(health_concerns(&balanced), "generally balanced nutrition");
    }

    #[test]
    fn test_prompt_contents() {
        let r = request(
            NutritionRecord {
                energy: 42.0,
                sugars: 10.6,
                salt: 0.01,
                ..Default::default()
            },
            vec!["Aspartame", "Sugar"],
        );
        let prompt = build_prompt(&r);
        assert!(prompt.contains("- Name: Cola Classic"));
        assert!(prompt.contains("- Health Level: Unhealthy"));
        assert!(prompt.contains("- Energy: 42.0 kcal"));
        assert!(prompt.contains("- Salt: 0.01g"));
        assert!(prompt.contains("DETECTED ISSUES: Aspartame, Sugar"));
        assert!(prompt.contains("\"general_tips\": [\"tip 1\", \"tip 2\", \"tip 3\"]"));

        let none = build_prompt(&request(NutritionRecord::default(), vec![]));
        assert!(none.contains("DETECTED ISSUES: none detected"));
    }
}
