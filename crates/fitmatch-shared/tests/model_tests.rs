//! Tests for model.rs and schema loading

use approx::assert_relative_eq;
use fitmatch_shared::error::{FitmatchError, ModelError};
use fitmatch_shared::features::{normalize, InputFeatures};
use fitmatch_shared::model::{ModelFile, ScoringModel};
use fitmatch_shared::schema::FeatureSchema;
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

const FOREST: &str = r#"{
    "kind": "forest",
    "version": "rf-2024.06",
    "features": ["workouts_per_week", "equipment"],
    "categories": {"equipment": {"none": 0, "home": 1, "gym": 2}},
    "trees": [
        {"nodes": [
            {"feature": 0, "threshold": 2.5, "left": 1, "right": 2},
            {"value": 0.3},
            {"value": 0.9}
        ]},
        {"nodes": [
            {"feature": 1, "threshold": 1.5, "left": 1, "right": 2},
            {"value": 0.4},
            {"value": 0.8}
        ]}
    ]
}"#;

fn input(value: serde_json::Value) -> InputFeatures {
    serde_json::from_value(value).unwrap()
}

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_forest_averages_trees() {
    let model = ModelFile::from_json_str(FOREST).unwrap();
    let schema = FeatureSchema::default();

    let row = normalize(&input(json!({"workouts_per_week": 4, "equipment": "Gym"})), &schema);
    assert_relative_eq!(model.predict(&row).unwrap(), 0.85, epsilon = 1e-9);

    let row = normalize(&input(json!({"workouts_per_week": 1, "equipment": "none"})), &schema);
    assert_relative_eq!(model.predict(&row).unwrap(), 0.35, epsilon = 1e-9);
    assert_eq!(model.version(), Some("rf-2024.06"));
}

#[test]
fn test_forest_unmapped_category_fails() {
    let model = ModelFile::from_json_str(FOREST).unwrap();
    let row = normalize(&input(json!({"equipment": "bands"})), &FeatureSchema::default());
    assert!(matches!(
        model.predict(&row),
        Err(ModelError::Unencodable { ref feature, .. }) if feature == "equipment"
    ));
}

#[test]
fn test_forest_needs_its_features_in_the_row() {
    let model = ModelFile::from_json_str(FOREST).unwrap();
    let row = normalize(&InputFeatures::new(), &FeatureSchema::new(["age"]));
    assert_eq!(
        model.predict(&row),
        Err(ModelError::MissingFeature("workouts_per_week".to_string()))
    );
}

#[test]
fn test_linear_logistic() {
    let model = ModelFile::from_json_str(
        r#"{"kind": "linear", "intercept": -1.0, "weights": {"workouts_per_week": 0.25}, "logistic": true}"#,
    )
    .unwrap();
    let row = normalize(&input(json!({"workouts_per_week": 4})), &FeatureSchema::default());
    assert_relative_eq!(model.predict(&row).unwrap(), 0.5);
    assert_eq!(model.version(), None);
    assert_eq!(model.kind(), "linear");
}

#[test]
fn test_linear_ignores_unweighted_text() {
    let model = ModelFile::from_json_str(
        r#"{"kind": "linear", "intercept": 0.1, "weights": {"age": 0.01}}"#,
    )
    .unwrap();
    let row = normalize(&input(json!({"age": 30, "equipment": "kettlebell"})), &FeatureSchema::default());
    assert_relative_eq!(model.predict(&row).unwrap(), 0.4, epsilon = 1e-9);
}

#[test]
fn test_load_model_from_file() {
    let file = write_temp(FOREST);
    let model = ModelFile::load(file.path()).unwrap();
    assert_eq!(model.kind(), "forest");
}

#[test]
fn test_load_missing_model_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ModelFile::load(dir.path().join("pipeline.json")).unwrap_err();
    assert!(matches!(err, FitmatchError::Model(_)));
    assert!(err.to_string().contains("pipeline.json"));
}

#[test]
fn test_forest_without_trees_rejected() {
    let err = ModelFile::from_json_str(r#"{"kind": "forest", "features": [], "trees": []}"#).unwrap_err();
    assert!(matches!(err, FitmatchError::Model(_)));
}

#[test]
fn test_load_schema_from_file() {
    let file = write_temp(r#"{"features": ["age", "bmi", "equipment"]}"#);
    let schema = FeatureSchema::load(file.path()).unwrap();
    assert_eq!(schema.names(), &["age", "bmi", "equipment"]);

    let fallback = write_temp(r#"{"features": null}"#);
    assert_eq!(FeatureSchema::load(fallback.path()).unwrap(), FeatureSchema::default());
}

#[test]
fn test_load_corrupt_schema_is_error() {
    let file = write_temp("features: [age]");
    assert!(FeatureSchema::load(file.path()).is_err());

    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        FeatureSchema::load(dir.path().join("feature_schema.json")),
        Err(FitmatchError::Schema(_))
    ));
}
