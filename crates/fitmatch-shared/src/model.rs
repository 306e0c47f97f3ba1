//! Scoring models.
//!
//! A model file is a JSON document tagged by `kind`:
//!
//! - `linear`: weighted sum of features plus intercept, optionally squashed
//!   through a logistic curve
//! - `forest`: mean output of a set of regression trees
//!
//! Both kinds may declare a `categories` table that maps text feature values
//! to numeric codes. Text that has no code and does not parse as a number
//! cannot be scored.

use crate::error::{FitmatchError, ModelError, Result};
use crate::features::{FeatureValue, NormalizedRow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Anything that turns a normalized row into a score
pub trait ScoringModel: Send + Sync {
    fn predict(&self, row: &NormalizedRow) -> std::result::Result<f64, ModelError>;

    /// Version string reported alongside predictions
    fn version(&self) -> Option<&str> {
        None
    }
}

/// Text value → numeric code, per feature
pub type CategoryTable = HashMap<String, HashMap<String, f64>>;

/// Numeric encoding of one row slot
pub fn encode(
    name: &str,
    value: &FeatureValue,
    categories: &CategoryTable,
) -> std::result::Result<f64, ModelError> {
    match value {
        FeatureValue::Number(n) => Ok(*n),
        FeatureValue::Flag(b) => Ok(if *b { 1.0 } else { 0.0 }),
        FeatureValue::Text(s) => categories
            .get(name)
            .and_then(|codes| codes.get(s.as_str()))
            .copied()
            .or_else(|| s.trim().parse::<f64>().ok())
            .ok_or_else(|| ModelError::Unencodable {
                feature: name.to_string(),
                value: s.clone(),
            }),
    }
}

fn finite(score: f64) -> std::result::Result<f64, ModelError> {
    if score.is_finite() {
        Ok(score)
    } else {
        Err(ModelError::NonFinite)
    }
}

// ============================================================================
// Linear
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub intercept: f64,
    /// Features without a weight do not contribute
    pub weights: HashMap<String, f64>,
    #[serde(default)]
    pub logistic: bool,
    #[serde(default)]
    pub categories: CategoryTable,
}

impl ScoringModel for LinearModel {
    fn predict(&self, row: &NormalizedRow) -> std::result::Result<f64, ModelError> {
        let mut z = self.intercept;
        for (name, value) in row.iter() {
            if let Some(weight) = self.weights.get(name) {
                z += weight * encode(name, value, &self.categories)?;
            }
        }
        let score = if self.logistic { 1.0 / (1.0 + (-z).exp()) } else { z };
        finite(score)
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

// ============================================================================
// Forest
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go left when `x[feature] <= threshold`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    fn evaluate(&self, x: &[f64], tree: usize) -> std::result::Result<f64, ModelError> {
        let mut index = 0;
        // a well formed tree reaches a leaf in at most nodes.len() steps
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = x
                        .get(*feature)
                        .ok_or(ModelError::MalformedTree { tree, node: index })?;
                    index = if v <= threshold { *left } else { *right };
                }
                None => break,
            }
        }
        Err(ModelError::MalformedTree { tree, node: index })
    }

    fn check(&self, features: usize, tree: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(FitmatchError::Model(format!("tree {} has no nodes", tree)));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split { feature, left, right, .. } = node {
                if *feature >= features || *left >= self.nodes.len() || *right >= self.nodes.len() {
                    return Err(FitmatchError::Model(format!(
                        "tree {} node {} points outside the model",
                        tree, i
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    #[serde(default)]
    pub version: Option<String>,
    /// Feature order split indices refer to
    pub features: Vec<String>,
    pub trees: Vec<Tree>,
    #[serde(default)]
    pub categories: CategoryTable,
}

impl ForestModel {
    fn check(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(FitmatchError::Model("forest has no trees".to_string()));
        }
        self.trees
            .iter()
            .enumerate()
            .try_for_each(|(i, tree)| tree.check(self.features.len(), i))
    }

    fn encode_row(&self, row: &NormalizedRow) -> std::result::Result<Vec<f64>, ModelError> {
        self.features
            .iter()
            .map(|name| {
                let value = row
                    .get(name)
                    .ok_or_else(|| ModelError::MissingFeature(name.clone()))?;
                encode(name, value, &self.categories)
            })
            .collect()
    }
}

impl ScoringModel for ForestModel {
    fn predict(&self, row: &NormalizedRow) -> std::result::Result<f64, ModelError> {
        let x = self.encode_row(row)?;
        let mut total = 0.0;
        for (i, tree) in self.trees.iter().enumerate() {
            total += tree.evaluate(&x, i)?;
        }
        finite(total / self.trees.len() as f64)
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

// ============================================================================
// Model files
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelFile {
    Linear(LinearModel),
    Forest(ForestModel),
}

impl ModelFile {
    pub fn from_json_str(content: &str) -> Result<Self> {
        let model: ModelFile = serde_json::from_str(content)
            .map_err(|e| FitmatchError::Model(format!("invalid model document: {}", e)))?;
        if let ModelFile::Forest(forest) = &model {
            forest.check()?;
        }
        Ok(model)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            FitmatchError::Model(format!("failed to read {}: {}", path.display(), e))
        })?;
        let model = Self::from_json_str(&content)?;
        info!(
            "Loaded {} model from {} (version {})",
            model.kind(),
            path.display(),
            model.version().unwrap_or("unknown")
        );
        Ok(model)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelFile::Linear(_) => "linear",
            ModelFile::Forest(_) => "forest",
        }
    }
}

impl ScoringModel for ModelFile {
    fn predict(&self, row: &NormalizedRow) -> std::result::Result<f64, ModelError> {
        match self {
            ModelFile::Linear(model) => model.predict(row),
            ModelFile::Forest(model) => model.predict(row),
        }
    }

    fn version(&self) -> Option<&str> {
        match self {
            ModelFile::Linear(model) => model.version(),
            ModelFile::Forest(model) => model.version(),
        }
    }
}
