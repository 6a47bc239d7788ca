use std::collections::BTreeMap;

use log::warn;

use crate::{
    Exercise, ExerciseID, MetricKey, MetricValue, Metrics, WorkoutAssignment, WorkoutTemplate,
};

/// Default set count for exercises performed in counted sets.
pub const DEFAULT_SETS: u32 = 3;

/// A concrete, per-set table of target values for one exercise.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedExercise {
    pub exercise_id: ExerciseID,
    pub sets: Vec<ResolvedSet>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSet {
    pub set_number: u32,
    pub prescribed: Metrics,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ResolveError {
    #[error("Exercise not found: {0}")]
    ExerciseNotFound(ExerciseID),
}

/// Resolves the prescribed target values for every exercise and every set of
/// a workout. For each set the first matching source wins, with no partial
/// merge across levels: assignment per-set override, workout per-set default,
/// then the global fallback (assignment global if present, otherwise the
/// workout default, with the `sets` directive stripped).
///
/// Deterministic and total: every set in range gets a defined, possibly
/// empty, metric bag. Input order is preserved, sets are emitted in
/// set-number order. The only fatal condition is an exercise missing from
/// the catalog, which would leave the session internally inconsistent.
pub fn resolve(
    assignment: &WorkoutAssignment,
    workout: &WorkoutTemplate,
    exercises: &BTreeMap<ExerciseID, Exercise>,
) -> Result<Vec<ResolvedExercise>, ResolveError> {
    workout
        .exercises
        .iter()
        .map(|workout_exercise| {
            let exercise = exercises
                .get(&workout_exercise.exercise_id)
                .ok_or(ResolveError::ExerciseNotFound(workout_exercise.exercise_id))?;
            let prescription = assignment.prescriptions.get(&exercise.id);
            let global_metrics = prescription
                .and_then(|p| p.prescribed_metrics.as_ref())
                .unwrap_or(&workout_exercise.default_metrics);

            let mut base_metrics = global_metrics.clone();
            base_metrics.remove(&MetricKey::sets());
            // The fallback applies to many sets; warn about it once.
            check_schema(exercise, &base_metrics);

            let set_count = set_count(
                prescription.and_then(|p| p.prescribed_metrics.as_ref()),
                exercise,
            );

            let sets = (1..=set_count)
                .map(|set_number| {
                    let per_set = prescription
                        .and_then(|p| p.prescribed_metrics_per_set.get(&set_number))
                        .or_else(|| workout_exercise.default_metrics_per_set.get(&set_number));
                    if let Some(prescribed) = per_set {
                        check_schema(exercise, prescribed);
                    }
                    ResolvedSet {
                        set_number,
                        prescribed: per_set.unwrap_or(&base_metrics).clone(),
                    }
                })
                .collect();

            Ok(ResolvedExercise {
                exercise_id: exercise.id,
                sets,
            })
        })
        .collect()
}

fn set_count(prescribed_metrics: Option<&Metrics>, exercise: &Exercise) -> u32 {
    prescribed_metrics
        .and_then(|m| m.get(&MetricKey::sets()))
        .and_then(MetricValue::as_count)
        .unwrap_or(if exercise.settings.sets_counting {
            DEFAULT_SETS
        } else {
            1
        })
}

fn check_schema(exercise: &Exercise, prescribed: &Metrics) {
    for (key, value) in prescribed {
        match exercise.metric_definition(key) {
            None => warn!(
                "metric {key} is not declared by exercise {}",
                exercise.name
            ),
            Some(definition) if definition.kind != value.kind() => warn!(
                "metric {key} of exercise {} has kind {:?}, expected {:?}",
                exercise.name,
                value.kind(),
                definition.kind
            ),
            Some(_) => {}
        }
    }
}
