use std::collections::BTreeMap;

use derive_more::{Deref, Display};
use uuid::Uuid;

use crate::{ExerciseID, Metrics, ReadError, WorkoutID};

#[allow(async_fn_in_trait)]
pub trait AssignmentRepository {
    async fn read_assignment(&self, id: AssignmentID) -> Result<WorkoutAssignment, ReadError>;
}

/// A coach's instruction linking a workout template to one or more athletes.
/// Read-only once a session has started: resolution happens once per session
/// creation, so later edits never reach in-flight sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutAssignment {
    pub id: AssignmentID,
    pub workout_id: WorkoutID,
    pub athlete_ids: Vec<AthleteID>,
    pub prescriptions: BTreeMap<ExerciseID, Prescription>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Prescription {
    /// Global prescription for the exercise. May carry the reserved `sets`
    /// key as a cardinality directive. Replaces, never merges with, the
    /// workout-level default.
    pub prescribed_metrics: Option<Metrics>,
    /// Sparse per-set overrides, keyed by set number.
    pub prescribed_metrics_per_set: BTreeMap<u32, Metrics>,
}

#[derive(Deref, Debug, Default, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AssignmentID(Uuid);

impl AssignmentID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for AssignmentID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for AssignmentID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

#[derive(Deref, Debug, Default, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AthleteID(Uuid);

impl From<Uuid> for AthleteID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for AthleteID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}
