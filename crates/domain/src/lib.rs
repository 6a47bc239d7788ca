#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod assignment;
mod error;
mod exercise;
mod metric;
mod name;
mod resolver;
mod rpe;
mod sequencer;
mod service;
mod session;
mod workout;

pub use assignment::{
    AssignmentID, AssignmentRepository, AthleteID, Prescription, WorkoutAssignment,
};
pub use error::{CreateError, ReadError, StorageError, UpdateError};
pub use exercise::{Exercise, ExerciseID, ExerciseRepository, ExerciseSettings, MetricDefinition};
pub use metric::{MetricKey, MetricKeyError, MetricKind, MetricValue, Metrics};
pub use name::{Name, NameError};
pub use resolver::{DEFAULT_SETS, ResolveError, ResolvedExercise, ResolvedSet, resolve};
pub use rpe::{RPE, RPEError};
pub use sequencer::{NextStep, next_step};
pub use service::Service;
pub use session::{
    CalendarEventID, Position, Progress, Route, SessionExercise, SessionID, SessionRepository,
    SessionSet, SessionStatus, SessionStep, SetStatus, Summary, WorkoutSession, materialize,
};
pub use workout::{
    QuestionnaireID, SupersetID, WorkoutExerciseRef, WorkoutID, WorkoutRepository, WorkoutTemplate,
};
