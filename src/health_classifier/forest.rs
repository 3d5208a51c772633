use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::{error, info};

use super::{HealthModel, ModelError, FEATURE_COUNT};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum TreeNode {
    /// Goes left when `features[feature] <= threshold`.
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
    /// Per-class sample counts (or probabilities) at this leaf.
    Leaf { votes: Vec<f32> },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DecisionTree {
    /// Node 0 is the root.
    pub nodes: Vec<TreeNode>,
}

/// Random-forest classifier persisted with bincode.
///
/// Each tree's leaf votes are normalized to a distribution, the distributions
/// are averaged over the forest and the class with the highest mean wins.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForestModel {
    pub n_features: usize,
    pub classes: Vec<String>,
    pub trees: Vec<DecisionTree>,
}

impl DecisionTree {
    fn leaf_votes<'a>(&'a self, features: &[f32; FEATURE_COUNT]) -> Result<&'a [f32], ModelError> {
        let mut idx = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { votes }) => return Ok(votes.as_slice()),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature).ok_or_else(|| {
                        ModelError::Prediction(format!("feature index {} out of range", feature))
                    })?;
                    idx = if *value <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(ModelError::Prediction(format!(
                        "node index {} out of range",
                        idx
                    )))
                }
            }
        }
        Err(ModelError::Prediction(
            "tree traversal did not reach a leaf".to_string(),
        ))
    }
}

impl ForestModel {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound(path.display().to_string()));
        }
        // Slice decoding bounds every length prefix by the bytes on disk.
        let bytes = fs::read(path)?;
        let model: ForestModel = bincode::deserialize(&bytes)?;
        model.validate()?;
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_features != FEATURE_COUNT {
            return Err(ModelError::Invalid(format!(
                "expected {} features, model has {}",
                FEATURE_COUNT, self.n_features
            )));
        }
        if self.classes.is_empty() {
            return Err(ModelError::Invalid("no classes".to_string()));
        }
        if self.trees.is_empty() {
            return Err(ModelError::Invalid("no trees".to_string()));
        }
        if self.trees.iter().any(|t| t.nodes.is_empty()) {
            return Err(ModelError::Invalid("empty tree".to_string()));
        }
        Ok(())
    }
}

impl HealthModel for ForestModel {
    fn predict(&self, features: &[f32; FEATURE_COUNT]) -> Result<String, ModelError> {
        if let Some(pos) = features.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::MalformedInput(format!(
                "feature {} is not finite",
                pos
            )));
        }

        let mut totals = vec![0.0_f32; self.classes.len()];
        for tree in &self.trees {
            let votes = tree.leaf_votes(features)?;
            if votes.len() != self.classes.len() {
                return Err(ModelError::Prediction(format!(
                    "leaf has {} votes for {} classes",
                    votes.len(),
                    self.classes.len()
                )));
            }
            let sum: f32 = votes.iter().sum();
            if sum > 0.0 {
                for (total, vote) in totals.iter_mut().zip(votes) {
                    *total += vote / sum;
                }
            }
        }

        totals
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > 0.0)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .and_then(|(idx, _)| self.classes.get(idx).cloned())
            .ok_or_else(|| ModelError::Prediction("no tree cast a vote".to_string()))
    }
}

/// Loads the classifier artifact, or `None` if it is missing or unusable.
/// Startup continues either way; classification then relies on the rules.
pub fn load_model(path: &Path) -> Option<ForestModel> {
    info!("Loading model from {}", path.display());
    match ForestModel::load(path) {
        Ok(model) => {
            info!(
                "Model loaded successfully ({} trees, classes {:?})",
                model.trees.len(),
                model.classes
            );
            Some(model)
        }
        Err(e) => {
            error!("Model not loaded: {}", e);
            None
        }
    }
}
