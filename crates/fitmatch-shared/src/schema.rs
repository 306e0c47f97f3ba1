//! Feature schema: the ordered list of inputs the scoring model expects.
//!
//! Loaded from a JSON document shaped like `{"features": ["age", ...]}`.
//! A document whose `features` entry is absent, empty or not a list of
//! strings falls back to the default eight-feature order. A file that cannot
//! be read, or is not a JSON object, is an error.

use crate::error::{FitmatchError, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Feature order used when the schema document does not declare one
pub const DEFAULT_FEATURES: &[&str] = &[
    "age",
    "height",
    "weight",
    "bmi",
    "goal_type",
    "workouts_per_week",
    "calories_avg",
    "equipment",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSchema {
    features: Vec<String>,
}

impl FeatureSchema {
    pub fn new<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            features: features.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Parse a schema document
    pub fn from_json_str(content: &str) -> Result<Self> {
        let doc: serde_json::Value = serde_json::from_str(content)?;
        let object = doc
            .as_object()
            .ok_or_else(|| FitmatchError::Schema("schema document must be a JSON object".to_string()))?;

        match object.get("features").and_then(string_list) {
            Some(features) if !features.is_empty() => Ok(Self { features }),
            _ => {
                warn!("Schema declares no usable feature list, using default order");
                Ok(Self::default())
            }
        }
    }

    /// Load a schema document from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            FitmatchError::Schema(format!("failed to read {}: {}", path.display(), e))
        })?;
        let schema = Self::from_json_str(&content)?;
        info!("Loaded schema from {} ({} features)", path.display(), schema.len());
        Ok(schema)
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::new(DEFAULT_FEATURES.iter().copied())
    }
}

fn string_list(value: &serde_json::Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}
