use std::collections::BTreeMap;

use derive_more::{Deref, Display};
use uuid::Uuid;

use crate::{ExerciseID, Metrics, Name, ReadError};

#[allow(async_fn_in_trait)]
pub trait WorkoutRepository {
    async fn read_workout(&self, id: WorkoutID) -> Result<WorkoutTemplate, ReadError>;
}

/// Catalog entity. Referenced, never copied, by assignments.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutTemplate {
    pub id: WorkoutID,
    pub name: Name,
    pub exercises: Vec<WorkoutExerciseRef>,
    pub pre_questionnaires: Vec<QuestionnaireID>,
    pub post_questionnaires: Vec<QuestionnaireID>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutExerciseRef {
    pub exercise_id: ExerciseID,
    pub default_metrics: Metrics,
    /// Sparse per-set defaults, keyed by set number.
    pub default_metrics_per_set: BTreeMap<u32, Metrics>,
    pub superset_id: Option<SupersetID>,
}

#[derive(Deref, Debug, Default, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WorkoutID(Uuid);

impl WorkoutID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for WorkoutID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for WorkoutID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

#[derive(Deref, Debug, Default, Display, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SupersetID(Uuid);

impl From<Uuid> for SupersetID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for SupersetID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

#[derive(Deref, Debug, Default, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct QuestionnaireID(Uuid);

impl From<Uuid> for QuestionnaireID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for QuestionnaireID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}
