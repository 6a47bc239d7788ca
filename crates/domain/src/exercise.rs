use derive_more::{Deref, Display};
use uuid::Uuid;

use crate::{MetricKey, MetricKind, Name, ReadError};

#[allow(async_fn_in_trait)]
pub trait ExerciseRepository {
    async fn read_exercises(&self) -> Result<Vec<Exercise>, ReadError>;
}

/// Catalog entity. Immutable during a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: ExerciseID,
    pub name: Name,
    pub settings: ExerciseSettings,
    pub metrics: Vec<MetricDefinition>,
}

impl Exercise {
    #[must_use]
    pub fn metric_definition(&self, key: &MetricKey) -> Option<&MetricDefinition> {
        self.metrics.iter().find(|m| m.key == *key)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExerciseSettings {
    /// Whether the exercise is performed in counted sets. Drives the default
    /// set count during prescription resolution.
    pub sets_counting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDefinition {
    pub key: MetricKey,
    pub kind: MetricKind,
}

#[derive(Deref, Debug, Default, Display, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExerciseID(Uuid);

impl ExerciseID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for ExerciseID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for ExerciseID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}
