//! Feature normalizer.
//!
//! Reconciles a loosely shaped client feature map into the exact ordered row
//! a scoring model expects. Resolution per schema feature, in order:
//!
//! 1. the feature's own key
//! 2. the first accepted synonym from [`ALIASES`]
//! 3. `bmi` only: derived from height (cm) and weight (kg)
//! 4. `*_missing` only: 0 if the base feature resolved, else 1
//! 5. default `0`
//!
//! Normalization never fails. Values that cannot be used degrade to the next
//! resolution step, and validation is left to the model boundary.

use crate::schema::FeatureSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Accepted synonyms per canonical feature name
pub const ALIASES: &[(&str, &[&str])] = &[
    ("height_cm", &["height"]),
    ("weight_kg", &["weight"]),
    ("height", &["height_cm"]),
    ("weight", &["weight_kg"]),
    ("workouts_per_week", &["sessions_per_week", "training_days"]),
    ("calories_avg", &["calories", "avg_calories"]),
    ("goal_type", &["goal"]),
    ("equipment", &["equipment_access"]),
];

const MISSING_SUFFIX: &str = "_missing";

const HEIGHT_KEYS: &[&str] = &["height_cm", "height"];
const WEIGHT_KEYS: &[&str] = &["weight_kg", "weight"];

const FATLOSS_GOALS: &[&str] = &["fatloss", "weight_loss", "weight loss", "cut"];
const HYPERTROPHY_GOALS: &[&str] = &["hypertrophy", "muscle", "bulk"];

/// Synonyms accepted for a canonical feature name
pub fn aliases_for(name: &str) -> &'static [&'static str] {
    ALIASES
        .iter()
        .find(|(canonical, _)| *canonical == name)
        .map(|(_, synonyms)| *synonyms)
        .unwrap_or(&[])
}

// ============================================================================
// Values
// ============================================================================

/// One scalar slot of a feature row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl FeatureValue {
    /// Convert a wire value. Null and non-scalar values carry no feature.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(FeatureValue::Flag(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(FeatureValue::Number),
            serde_json::Value::String(s) => Some(FeatureValue::Text(s.clone())),
            _ => None,
        }
    }

    /// Numeric reading of the value: numbers, and text that parses as one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) if n.is_finite() => Some(*n),
            FeatureValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Flag(b) => write!(f, "{}", b),
            FeatureValue::Number(n) => write!(f, "{}", n),
            FeatureValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Per-request client features, keyed by whatever names the client sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputFeatures(HashMap<String, serde_json::Value>);

impl InputFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Scalar value under `key`, if any
    pub fn get(&self, key: &str) -> Option<FeatureValue> {
        self.0.get(key).and_then(FeatureValue::from_json)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for InputFeatures
where
    K: Into<String>,
    V: Into<serde_json::Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Ordered feature row, one value per schema feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRow {
    names: Vec<String>,
    values: Vec<FeatureValue>,
}

impl NormalizedRow {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named feature
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Build the model row for `schema` out of `input`
pub fn normalize(input: &InputFeatures, schema: &FeatureSchema) -> NormalizedRow {
    let mut values = Vec::with_capacity(schema.len());
    let mut defaulted = Vec::new();

    for name in schema.names() {
        let value = match resolve(input, name) {
            Some(value) => canonicalize(name, value),
            None => match name.strip_suffix(MISSING_SUFFIX) {
                Some(base) => FeatureValue::Number(missing_flag(input, base)),
                None => {
                    defaulted.push(name.as_str());
                    FeatureValue::Number(0.0)
                }
            },
        };
        values.push(value);
    }

    if !defaulted.is_empty() {
        debug!("[NORMALIZE] Defaulted features: {:?}", defaulted);
    }

    NormalizedRow {
        names: schema.names().to_vec(),
        values,
    }
}

/// Resolve a feature through its own key, synonyms, then derivation
pub fn resolve(input: &InputFeatures, name: &str) -> Option<FeatureValue> {
    if let Some(value) = input.get(name) {
        return Some(value);
    }
    if let Some(value) = aliases_for(name).iter().find_map(|alias| input.get(alias)) {
        return Some(value);
    }
    if name == "bmi" {
        return derive_bmi(input).map(FeatureValue::Number);
    }
    None
}

fn missing_flag(input: &InputFeatures, base: &str) -> f64 {
    if resolve(input, base).is_some() {
        0.0
    } else {
        1.0
    }
}

/// BMI from height in centimeters and weight in kilograms
pub fn derive_bmi(input: &InputFeatures) -> Option<f64> {
    let height_cm = first_number(input, HEIGHT_KEYS)?;
    let weight_kg = first_number(input, WEIGHT_KEYS)?;
    if height_cm <= 0.0 || weight_kg <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    let bmi = weight_kg / (height_m * height_m);
    bmi.is_finite().then_some(bmi)
}

fn first_number(input: &InputFeatures, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|key| input.get(key))
        .and_then(|value| value.as_number())
}

fn canonicalize(name: &str, value: FeatureValue) -> FeatureValue {
    match (name, value) {
        ("equipment", FeatureValue::Text(s)) => FeatureValue::Text(s.trim().to_lowercase()),
        ("goal_type", FeatureValue::Text(s)) => FeatureValue::Number(goal_code(&s)),
        (_, value) => value,
    }
}

/// Goal category code: fat loss 0, hypertrophy 1, anything else 2
pub fn goal_code(goal: &str) -> f64 {
    let goal = goal.trim().to_lowercase();
    if FATLOSS_GOALS.contains(&goal.as_str()) {
        0.0
    } else if HYPERTROPHY_GOALS.contains(&goal.as_str()) {
        1.0
    } else {
        2.0
    }
}

/// Equipment access as sent by the client, lower-cased; `gym` when absent
pub fn equipment_of(input: &InputFeatures) -> String {
    resolve(input, "equipment")
        .map(|value| value.to_string().trim().to_lowercase())
        .unwrap_or_else(|| "gym".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: serde_json::Value) -> InputFeatures {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_direct_key_wins_over_alias() {
        let features = input(json!({"height_cm": 170, "height": 190}));
        assert_eq!(resolve(&features, "height_cm"), Some(FeatureValue::Number(170.0)));
    }

    #[test]
    fn test_alias_order() {
        let features = input(json!({"training_days": 3, "sessions_per_week": 5}));
        assert_eq!(
            resolve(&features, "workouts_per_week"),
            Some(FeatureValue::Number(5.0))
        );
    }

    #[test]
    fn test_null_is_unresolved() {
        let features = input(json!({"age": null, "equipment": ["db"]}));
        assert_eq!(resolve(&features, "age"), None);
        assert_eq!(resolve(&features, "equipment"), None);
    }

    #[test]
    fn test_bmi_requires_positive_numbers() {
        assert_eq!(derive_bmi(&input(json!({"height": 0, "weight": 80}))), None);
        assert_eq!(derive_bmi(&input(json!({"height": 180, "weight": -1}))), None);
        assert_eq!(derive_bmi(&input(json!({"height": "tall", "weight": 80}))), None);
        assert_eq!(derive_bmi(&input(json!({"weight": 80}))), None);
    }

    #[test]
    fn test_bmi_accepts_numeric_text() {
        let bmi = derive_bmi(&input(json!({"height": "200", "weight_kg": 100}))).unwrap();
        assert!((bmi - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_goal_codes() {
        assert_eq!(goal_code("Weight Loss"), 0.0);
        assert_eq!(goal_code(" MUSCLE "), 1.0);
        assert_eq!(goal_code("endurance"), 2.0);
        assert_eq!(goal_code(""), 2.0);
    }

    #[test]
    fn test_numeric_goal_is_kept() {
        let schema = FeatureSchema::new(["goal_type"]);
        let row = normalize(&input(json!({"goal_type": 1})), &schema);
        assert_eq!(row.values(), &[FeatureValue::Number(1.0)]);
    }

    #[test]
    fn test_equipment_of_defaults_to_gym() {
        assert_eq!(equipment_of(&InputFeatures::new()), "gym");
        let mut features = InputFeatures::new();
        features.insert("equipment", " Home ");
        assert_eq!(equipment_of(&features), "home");
        assert_eq!(equipment_of(&input(json!({"equipment_access": "NONE"}))), "none");
    }

    #[test]
    fn test_missing_flag_on_derived_base() {
        let schema = FeatureSchema::new(["bmi_missing", "age_missing"]);
        let row = normalize(&input(json!({"height": 180, "weight": 81})), &schema);
        assert_eq!(
            row.values(),
            &[FeatureValue::Number(0.0), FeatureValue::Number(1.0)]
        );
    }

    #[test]
    fn test_missing_flag_sent_by_client_is_kept() {
        let schema = FeatureSchema::new(["age_missing"]);
        let row = normalize(&input(json!({"age_missing": 0})), &schema);
        assert_eq!(row.get("age_missing"), Some(&FeatureValue::Number(0.0)));
    }
}
