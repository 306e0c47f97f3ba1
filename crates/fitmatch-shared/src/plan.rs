//! Plan scaler: turns a model score into a scaled copy of the plan template.

use crate::template::{ExerciseEntry, PlanTemplate, SetCount};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Advice attached to every scaled plan
pub const ADVISORY_NOTE: &str = "Progress if you hit top reps/time at RPE ≤ 8; otherwise hold.";

/// Shortest timed hold a scaled plan will prescribe
pub const MIN_HOLD_SECS: i64 = 20;

const MIN_SETS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Low,
    Medium,
    High,
}

impl Band {
    /// Bucket a score. Lower bounds are inclusive and scores are not clamped.
    pub fn classify(score: f64) -> Self {
        if score >= 0.8 {
            Band::High
        } else if score >= 0.5 {
            Band::Medium
        } else {
            Band::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Low => "low",
            Band::Medium => "medium",
            Band::High => "high",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledPlan {
    pub prediction: f64,
    pub plan_id: String,
    pub microcycle_days: u32,
    pub exercises: Vec<ExerciseEntry>,
    pub notes: String,
}

/// Scale `template` for a score and the client's equipment access
pub fn build_plan(template: &PlanTemplate, score: f64, equipment: &str) -> ScaledPlan {
    let band = Band::classify(score);
    let volume_delta = template.scaling.volume.get(band);
    let intensity_pct = template.scaling.intensity.get(band);
    let no_equipment = equipment.trim().eq_ignore_ascii_case("none");

    let exercises = template
        .exercises
        .iter()
        .map(|entry| {
            let mut entry = entry.clone();
            if no_equipment {
                if let Some(sub) = template.substitutions.get(&entry.name) {
                    entry.name = sub.clone();
                }
            }
            scale_exercise(entry, volume_delta, intensity_pct)
        })
        .collect();

    ScaledPlan {
        prediction: score,
        plan_id: template.id.clone(),
        microcycle_days: template.microcycle_days,
        exercises,
        notes: ADVISORY_NOTE.to_string(),
    }
}

/// Apply volume and intensity deltas to one exercise
pub fn scale_exercise(mut entry: ExerciseEntry, volume_delta: i64, intensity_pct: i64) -> ExerciseEntry {
    if let SetCount::Count(sets) = entry.sets {
        entry.sets = SetCount::Count(sets.saturating_add(volume_delta).max(MIN_SETS));
    }
    if let Some(reps) = scale_hold(&entry.reps, intensity_pct) {
        entry.reps = reps;
    }
    entry
}

/// Rescaled timed hold, or `None` when `reps` is not a readable hold
pub fn scale_hold(reps: &str, intensity_pct: i64) -> Option<String> {
    let secs = parse_hold_secs(reps)?;
    let scaled = (secs as f64 * (1.0 + intensity_pct as f64 / 100.0)).floor() as i64;
    Some(format!("{}s hold", scaled.max(MIN_HOLD_SECS)))
}

/// Seconds of a timed hold such as "45s hold" or "30s". Durations that do
/// not fit an `i64` are not read as holds.
pub fn parse_hold_secs(reps: &str) -> Option<i64> {
    if !reps.contains('s') {
        return None;
    }
    reps.replace("s hold", "").replace('s', "").trim().parse().ok()
}
