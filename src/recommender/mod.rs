//! Healthier-alternative recommendations.
//!
//! The AI generator is tried first when one is configured. Any failure,
//! timeout or unusable reply falls back to the keyword-driven templates, so
//! [`AlternativeRecommender::recommend`] always returns a set of 3 to 5 items.

pub mod ai;
pub mod prompt;
pub mod templates;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::health_classifier::HealthLevel;
use crate::nutrient_normalizer::NutritionRecord;

pub use ai::{AlternativesGenerator, GeneratedAlternatives, GenerationError, OpenRouterGenerator};
pub use templates::ProductCategory;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    AiPowered,
    RuleBasedFallback,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Alternative {
    pub name: String,
    pub brand: String,
    pub why_better: String,
    #[serde(default)]
    pub key_benefits: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub estimated_improvements: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AlternativeSet {
    pub product_name: String,
    pub product_brand: String,
    pub product_health_level: HealthLevel,
    pub summary: String,
    pub alternatives: Vec<Alternative>,
    pub general_tips: Vec<String>,
    pub source: Provenance,
}

/// Everything the recommender needs to know about a classified product.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub product_name: String,
    #[serde(default = "unknown_brand")]
    pub brand: String,
    pub nutrition: NutritionRecord,
    pub health_level: HealthLevel,
    #[serde(default)]
    pub detected_issues: Vec<String>,
}

fn unknown_brand() -> String {
    "Unknown Brand".to_string()
}

pub struct AlternativeRecommender {
    generator: Option<Arc<dyn AlternativesGenerator>>,
    timeout: Duration,
}

impl AlternativeRecommender {
    pub fn new(generator: Option<Arc<dyn AlternativesGenerator>>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub fn rules_only() -> Self {
        Self::new(None, Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS))
    }

    /// OpenRouter generator when a key is configured, rules only otherwise.
    pub fn from_settings(settings: &Settings) -> Self {
        let generator = OpenRouterGenerator::from_settings(settings)
            .map(|g| Arc::new(g) as Arc<dyn AlternativesGenerator>);
        Self::new(
            generator,
            Duration::from_secs(settings.openrouter_timeout_secs),
        )
    }

    pub fn has_ai(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn recommend(&self, request: &RecommendationRequest) -> AlternativeSet {
        if let Some(generator) = &self.generator {
            match tokio::time::timeout(self.timeout, generator.generate(request)).await {
                Ok(Ok(generated)) => match generated.into_usable() {
                    Ok(usable) => {
                        info!(
                            product = %request.product_name,
                            count = usable.alternatives.len(),
                            "Using AI-generated alternatives"
                        );
                        return assemble(request, usable, Provenance::AiPowered);
                    }
                    Err(e) => warn!("{} reply unusable: {}", generator.name(), e),
                },
                Ok(Err(e)) => warn!("{} generation failed: {}", generator.name(), e),
                Err(_) => warn!(
                    "{} generation timed out after {:?}",
                    generator.name(),
                    self.timeout
                ),
            }
        } else {
            debug!("No AI generator configured");
        }

        info!("Using rule-based fallback for alternatives");
        fallback_alternatives(request)
    }
}

fn assemble(
    request: &RecommendationRequest,
    generated: GeneratedAlternatives,
    source: Provenance,
) -> AlternativeSet {
    AlternativeSet {
        product_name: request.product_name.clone(),
        product_brand: request.brand.clone(),
        product_health_level: request.health_level,
        summary: generated.summary,
        alternatives: generated.alternatives,
        general_tips: generated.general_tips,
        source,
    }
}

/// Deterministic alternatives from the product-name category templates.
pub fn fallback_alternatives(request: &RecommendationRequest) -> AlternativeSet {
    let category = ProductCategory::detect(&request.product_name);
    debug!(?category, "Fallback category");
    let generated = GeneratedAlternatives {
        summary: templates::fallback_summary(&request.nutrition),
        alternatives: category.alternatives(),
        general_tips: templates::general_tips(),
    };
    assemble(request, generated, Provenance::RuleBasedFallback)
}
