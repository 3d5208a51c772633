//! Health-level classification.
//!
//! A [`HealthClassifier`] holds an ordered list of strategies. The trained
//! model (when one was loaded) is asked first; the threshold rule answers for
//! every record, so the chain always terminates with a level.

pub mod forest;
pub mod rules;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::nutrient_normalizer::NutritionRecord;

pub use forest::{load_model, ForestModel};
pub use rules::ThresholdRule;

pub const FEATURE_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthLevel {
    Healthy,
    Moderate,
    Unhealthy,
}

impl HealthLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthLevel::Healthy => "Healthy",
            HealthLevel::Moderate => "Moderate",
            HealthLevel::Unhealthy => "Unhealthy",
        }
    }
}

impl fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthLevel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "healthy" => Ok(HealthLevel::Healthy),
            "moderate" => Ok(HealthLevel::Moderate),
            "unhealthy" => Ok(HealthLevel::Unhealthy),
            _ => Err(ModelError::UnknownLabel(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model file not found at {0}")]
    NotFound(String),
    #[error("Failed to read model file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode model: {0}")]
    Decode(#[from] bincode::Error),
    #[error("Invalid model: {0}")]
    Invalid(String),
    #[error("Malformed feature vector: {0}")]
    MalformedInput(String),
    #[error("Prediction failed: {0}")]
    Prediction(String),
    #[error("Unknown health label '{0}'")]
    UnknownLabel(String),
}

/// A pre-trained classifier over the six canonical features
/// (energy, fat, sugar, salt, fiber, protein).
pub trait HealthModel: Send + Sync {
    fn predict(&self, features: &[f32; FEATURE_COUNT]) -> Result<String, ModelError>;
}

/// Which strategy produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    Model,
    Rules,
}

/// One step of the classification chain. `None` hands over to the next step.
pub trait ClassificationStrategy: Send + Sync {
    fn source(&self) -> ClassificationSource;
    fn classify(&self, record: &NutritionRecord) -> Option<HealthLevel>;
}

/// Asks the trained model; any failure, including an unrecognized label, is
/// logged and treated as no prediction.
pub struct ModelStrategy {
    model: Arc<dyn HealthModel>,
}

impl ModelStrategy {
    pub fn new(model: Arc<dyn HealthModel>) -> Self {
        Self { model }
    }
}

impl ClassificationStrategy for ModelStrategy {
    fn source(&self) -> ClassificationSource {
        ClassificationSource::Model
    }

    fn classify(&self, record: &NutritionRecord) -> Option<HealthLevel> {
        let prediction = self
            .model
            .predict(&record.features())
            .and_then(|label| label.parse::<HealthLevel>());
        match prediction {
            Ok(level) => {
                debug!("Model predicted {}", level);
                Some(level)
            }
            Err(e) => {
                warn!("Model prediction failed, falling back to rules: {}", e);
                None
            }
        }
    }
}

pub struct HealthClassifier {
    strategies: Vec<Box<dyn ClassificationStrategy>>,
}

impl HealthClassifier {
    /// Builds the chain: the model (if any) first, the threshold rule last.
    pub fn new(model: Option<Arc<dyn HealthModel>>) -> Self {
        let mut strategies: Vec<Box<dyn ClassificationStrategy>> = Vec::new();
        if let Some(model) = model {
            strategies.push(Box::new(ModelStrategy::new(model)));
        }
        strategies.push(Box::new(ThresholdRule));
        Self { strategies }
    }

    /// Classifier with no trained model; every record goes through the rule.
    pub fn rules_only() -> Self {
        Self::new(None)
    }

    pub fn has_model(&self) -> bool {
        self.strategies
            .iter()
            .any(|s| s.source() == ClassificationSource::Model)
    }

    pub fn classify(&self, record: &NutritionRecord) -> HealthLevel {
        self.classify_with_source(record).0
    }

    pub fn classify_with_source(
        &self,
        record: &NutritionRecord,
    ) -> (HealthLevel, ClassificationSource) {
        self.strategies
            .iter()
            .find_map(|s| s.classify(record).map(|level| (level, s.source())))
            .unwrap_or_else(|| (rules::classify(record), ClassificationSource::Rules))
    }
}

impl Default for HealthClassifier {
    fn default() -> Self {
        Self::rules_only()
    }
}
