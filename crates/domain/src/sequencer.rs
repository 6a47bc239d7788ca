use crate::{ExerciseID, SessionExercise, SetStatus, WorkoutSession};

/// A forced navigation target after a set has been completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextStep {
    pub exercise_id: ExerciseID,
    pub set_number: Option<u32>,
}

/// Determines whether navigation must auto-advance after work on the current
/// exercise.
///
/// Superset exercises are performed back-to-back within a round before the
/// round repeats, so the group is walked round-robin: ascending set number,
/// group members in their order of appearance. The first set that is not
/// completed is the target; if that target is on the current exercise there
/// is still pending work here and no navigation is forced. Once the whole
/// group is complete, the exercise following the group is the target.
///
/// Never errors. Non-superset exercises and unresolvable inputs yield `None`,
/// leaving navigation to the caller.
#[must_use]
pub fn next_step(session: &WorkoutSession, current_exercise_id: ExerciseID) -> Option<NextStep> {
    let current = session
        .exercises
        .iter()
        .find(|e| e.exercise_id == current_exercise_id)?;
    let superset_id = current.superset_id?;

    let group = session
        .exercises
        .iter()
        .filter(|e| e.superset_id == Some(superset_id))
        .collect::<Vec<&SessionExercise>>();
    let max_sets = group.iter().map(|e| e.total_sets()).max().unwrap_or(0);

    for set_number in 1..=max_sets {
        for exercise in &group {
            let Some(set) = exercise.sets.iter().find(|s| s.set_number == set_number) else {
                continue;
            };
            if set.status != SetStatus::Completed {
                if exercise.exercise_id == current_exercise_id {
                    return None;
                }
                return Some(NextStep {
                    exercise_id: exercise.exercise_id,
                    set_number: Some(set_number),
                });
            }
        }
    }

    let last_member = session
        .exercises
        .iter()
        .rposition(|e| e.superset_id == Some(superset_id))?;
    session.exercises.get(last_member + 1).map(|e| NextStep {
        exercise_id: e.exercise_id,
        set_number: None,
    })
}
