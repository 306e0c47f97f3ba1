//! Request pipeline: normalize → score → scale.

use crate::server::AppState;
use fitmatch_shared::features::{equipment_of, normalize};
use fitmatch_shared::plan::{build_plan, Band};
use fitmatch_shared::wire::{PredictRequest, PredictResponse};
use fitmatch_shared::FitmatchError;
use tracing::info;

/// Produce the scaled plan for one request. The request either fully
/// succeeds or fails with the model's error.
pub fn predict_plan(state: &AppState, req: &PredictRequest) -> Result<PredictResponse, FitmatchError> {
    let row = normalize(&req.features, &state.schema);
    let score = state.model.predict(&row)?;

    let equipment = equipment_of(&req.features);
    let plan = build_plan(&state.template, score, &equipment);

    info!(
        "[PREDICT] user={} score={:.3} band={} equipment={} week_index={:?}",
        req.user_id,
        score,
        Band::classify(score),
        equipment,
        req.week_index
    );

    Ok(PredictResponse {
        plan,
        model_version: state.model.version().map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitmatch_shared::error::ModelError;
    use fitmatch_shared::features::{FeatureValue, NormalizedRow};
    use fitmatch_shared::{FeatureSchema, InputFeatures, ScoringModel, SetCount, BUILTIN_TEMPLATE};
    use std::sync::Arc;

    /// Scores the `workouts_per_week` slot divided by 5
    struct WorkoutsModel;

    impl ScoringModel for WorkoutsModel {
        fn predict(&self, row: &NormalizedRow) -> Result<f64, ModelError> {
            match row.get("workouts_per_week") {
                Some(FeatureValue::Number(n)) => Ok(n / 5.0),
                _ => Err(ModelError::MissingFeature("workouts_per_week".to_string())),
            }
        }

        fn version(&self) -> Option<&str> {
            Some("test-1")
        }
    }

    fn state() -> AppState {
        AppState::new(
            Arc::new(WorkoutsModel),
            FeatureSchema::default(),
            BUILTIN_TEMPLATE.clone(),
        )
    }

    fn request(features: serde_json::Value) -> PredictRequest {
        PredictRequest {
            user_id: "u-42".to_string(),
            features: serde_json::from_value::<InputFeatures>(features).unwrap(),
            week_index: None,
            variant_seed: None,
        }
    }

    #[test]
    fn test_high_band_no_equipment() {
        let resp = predict_plan(
            &state(),
            &request(serde_json::json!({"workouts_per_week": 5, "equipment": "None"})),
        )
        .unwrap();
        assert_eq!(resp.plan.prediction, 1.0);
        assert_eq!(resp.model_version.as_deref(), Some("test-1"));
        assert_eq!(resp.plan.exercises[0].name, "Push-up");
        assert_eq!(resp.plan.exercises[0].sets, SetCount::Count(5));
        assert_eq!(resp.plan.exercises[2].reps, "49s hold");
    }

    #[test]
    fn test_missing_equipment_means_gym() {
        let resp = predict_plan(&state(), &request(serde_json::json!({"workouts_per_week": 3}))).unwrap();
        assert_eq!(resp.plan.exercises[0].name, "Flat Dumbbell Press");
        assert_eq!(resp.plan.exercises[0].sets, SetCount::Count(4));
    }

    #[test]
    fn test_model_error_propagates() {
        let resp = predict_plan(
            &state(),
            &request(serde_json::json!({"workouts_per_week": "often"})),
        );
        assert!(matches!(resp, Err(FitmatchError::Inference(_))));
    }
}
