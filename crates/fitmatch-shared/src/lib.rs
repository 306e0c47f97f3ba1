//! Shared types and pipeline stages for FitMatch components.

pub mod error;
pub mod features;
pub mod model;
pub mod plan;
pub mod schema;
pub mod template;
pub mod wire;

pub use error::{FitmatchError, ModelError};
pub use features::{normalize, FeatureValue, InputFeatures, NormalizedRow};
pub use model::{ModelFile, ScoringModel};
pub use plan::{build_plan, Band, ScaledPlan};
pub use schema::FeatureSchema;
pub use template::{ExerciseEntry, PlanTemplate, SetCount, BUILTIN_TEMPLATE};
