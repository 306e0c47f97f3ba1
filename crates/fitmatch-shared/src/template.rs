//! Exercise plan template.
//!
//! The template is loaded once per process and only ever read. Scaling works
//! on clones of its exercises, see [`crate::plan::build_plan`].

use crate::error::{FitmatchError, Result};
use crate::plan::Band;
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Template shipped with the service
pub static BUILTIN_TEMPLATE: Lazy<PlanTemplate> = Lazy::new(PlanTemplate::builtin);

/// Set count of an exercise. Hand-edited templates may carry values that
/// are not whole numbers; those pass through scaling untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SetCount {
    Count(i64),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    pub day: u32,
    pub block: String,
    pub name: String,
    pub sets: SetCount,
    /// Rep range ("8–10") or timed hold ("45s hold")
    #[serde(deserialize_with = "reps_as_string")]
    pub reps: String,
    pub tempo: String,
    pub rest_sec: u32,
}

/// Band-indexed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandTable<T> {
    pub low: T,
    pub medium: T,
    pub high: T,
}

impl<T: Copy> BandTable<T> {
    pub fn get(&self, band: Band) -> T {
        match band {
            Band::Low => self.low,
            Band::Medium => self.medium,
            Band::High => self.high,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scaling {
    /// Percent change for timed holds
    pub intensity: BandTable<i64>,
    /// Delta applied to set counts
    pub volume: BandTable<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTemplate {
    pub id: String,
    pub microcycle_days: u32,
    pub exercises: Vec<ExerciseEntry>,
    pub scaling: Scaling,
    /// Replacement exercise names when no equipment is available
    #[serde(rename = "subs_no_equipment", alias = "substitutions", default)]
    pub substitutions: BTreeMap<String, String>,
}

impl PlanTemplate {
    fn builtin() -> Self {
        let exercise = |day, block: &str, name: &str, sets, reps: &str, tempo: &str, rest_sec| {
            ExerciseEntry {
                day,
                block: block.to_string(),
                name: name.to_string(),
                sets: SetCount::Count(sets),
                reps: reps.to_string(),
                tempo: tempo.to_string(),
                rest_sec,
            }
        };

        let substitutions = [
            ("Flat Dumbbell Press", "Push-up"),
            ("Lat Pulldown", "Inverted Row"),
            ("Back Squat", "Goblet Squat"),
            ("Romanian Deadlift", "Hip Hinge with Backpack"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        Self {
            id: "hypertrophy_upper_lower_v1".to_string(),
            microcycle_days: 4,
            exercises: vec![
                exercise(1, "Upper A", "Flat Dumbbell Press", 4, "8–10", "2-0-2", 90),
                exercise(1, "Upper A", "Lat Pulldown", 4, "10–12", "2-1-2", 90),
                exercise(1, "Core", "Plank", 3, "45s hold", "-", 60),
                exercise(2, "Lower A", "Back Squat", 4, "6–8", "3-1-1", 120),
                exercise(3, "Upper B", "Incline Push-up", 3, "12–15", "2-0-2", 60),
                exercise(4, "Lower B", "Romanian Deadlift", 3, "8–10", "3-1-1", 120),
            ],
            scaling: Scaling {
                intensity: BandTable { low: -20, medium: 0, high: 10 },
                volume: BandTable { low: -1, medium: 0, high: 1 },
            },
            substitutions,
        }
    }

    /// Parse and check a template document
    pub fn from_json_str(content: &str) -> Result<Self> {
        let template: PlanTemplate = serde_json::from_str(content)?;
        template.validate()?;
        Ok(template)
    }

    /// Load a template document from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            FitmatchError::Template(format!("failed to read {}: {}", path.display(), e))
        })?;
        let template = Self::from_json_str(&content)?;
        info!(
            "Loaded plan template '{}' from {} ({} exercises)",
            template.id,
            path.display(),
            template.exercises.len()
        );
        Ok(template)
    }

    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(FitmatchError::Template("template id is empty".to_string()));
        }
        if self.microcycle_days == 0 {
            return Err(FitmatchError::Template("microcycle_days must be at least 1".to_string()));
        }
        if let Some(entry) = self
            .exercises
            .iter()
            .find(|e| e.day == 0 || e.day > self.microcycle_days)
        {
            return Err(FitmatchError::Template(format!(
                "exercise '{}' is on day {} outside the {}-day microcycle",
                entry.name, entry.day, self.microcycle_days
            )));
        }
        Ok(())
    }
}

fn reps_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}
