use std::iter::zip;

use chrono::{DateTime, Utc};
use derive_more::{Deref, Display};
use uuid::Uuid;

use crate::{
    AssignmentID, AthleteID, CreateError, ExerciseID, Metrics, QuestionnaireID, RPE, ReadError,
    ResolvedExercise, SupersetID, UpdateError, WorkoutTemplate,
};

#[allow(async_fn_in_trait)]
pub trait SessionRepository {
    async fn read_session(&self, id: SessionID) -> Result<WorkoutSession, ReadError>;
    /// Must reject a second session for a calendar event that already has
    /// one with [`CreateError::Conflict`].
    async fn create_session(
        &self,
        calendar_event_id: CalendarEventID,
        athlete_id: AthleteID,
        assignment_id: AssignmentID,
        exercises: Vec<SessionExercise>,
    ) -> Result<WorkoutSession, CreateError>;
    async fn modify_session(
        &self,
        id: SessionID,
        status: Option<SessionStatus>,
        progress: Option<Progress>,
        exercises: Option<Vec<SessionExercise>>,
        rpe: Option<RPE>,
        actual_end_time: Option<DateTime<Utc>>,
    ) -> Result<WorkoutSession, UpdateError>;
}

/// The live, per-athlete, per-event execution record of a workout.
///
/// Completion metrics are derived from the current set statuses on every
/// read and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutSession {
    pub id: SessionID,
    pub calendar_event_id: CalendarEventID,
    pub athlete_id: AthleteID,
    pub assignment_id: AssignmentID,
    pub status: SessionStatus,
    pub progress: Option<Progress>,
    pub exercises: Vec<SessionExercise>,
    pub rpe: Option<RPE>,
    pub actual_end_time: Option<DateTime<Utc>>,
}

impl WorkoutSession {
    /// Determines the route a freshly loaded session resumes at.
    ///
    /// A completed session always routes to the summary, regardless of any
    /// stale progress record. A session without recorded progress starts at
    /// the pre-workout questionnaire if the template declares any, otherwise
    /// at the first exercise.
    #[must_use]
    pub fn route(&self, workout: &WorkoutTemplate) -> Route {
        match (self.status, self.progress) {
            (SessionStatus::Completed, _) => Route::Summary,
            (SessionStatus::InProgress, Some(progress)) => self.progress_route(progress),
            _ => {
                if workout.pre_questionnaires.is_empty() {
                    self.first_exercise_route()
                } else {
                    Route::PreWorkoutQuestionnaire
                }
            }
        }
    }

    fn progress_route(&self, progress: Progress) -> Route {
        match (progress.step, progress.position) {
            (SessionStep::PreWorkoutQuestionnaire, Some(Position::Questionnaire(id))) => {
                Route::Questionnaire(id)
            }
            (SessionStep::PreWorkoutQuestionnaire, _) => Route::PreWorkoutQuestionnaire,
            (SessionStep::Exercises, Some(Position::Exercise(id))) => Route::Exercise(id),
            (SessionStep::Exercises, _) => self.first_exercise_route(),
            (SessionStep::Rpe, _) => Route::Rpe,
            (SessionStep::PostWorkoutQuestionnaire, Some(Position::Questionnaire(id))) => {
                Route::Questionnaire(id)
            }
            (SessionStep::PostWorkoutQuestionnaire, _) => Route::PostWorkoutQuestionnaire,
            (SessionStep::Summary, _) => Route::Summary,
        }
    }

    fn first_exercise_route(&self) -> Route {
        self.exercises
            .first()
            .map_or(Route::Summary, |e| Route::Exercise(e.exercise_id))
    }

    #[must_use]
    pub fn total_sets(&self) -> u32 {
        self.exercises.iter().map(SessionExercise::total_sets).sum()
    }

    #[must_use]
    pub fn completed_sets(&self) -> u32 {
        self.exercises
            .iter()
            .map(SessionExercise::completed_sets)
            .sum()
    }

    #[must_use]
    pub fn skipped_sets(&self) -> u32 {
        self.exercises
            .iter()
            .map(|e| count_sets(e, SetStatus::Skipped))
            .sum()
    }

    #[must_use]
    pub fn completion_percentage(&self) -> u8 {
        percentage(self.completed_sets(), self.total_sets())
    }

    /// Share of completed sets whose actual values cover every prescribed
    /// metric.
    #[must_use]
    pub fn compliance_percentage(&self) -> u8 {
        let compliant = self
            .exercises
            .iter()
            .flat_map(|e| &e.sets)
            .filter(|s| s.status == SetStatus::Completed && s.is_compliant())
            .count();
        #[allow(clippy::cast_possible_truncation)]
        percentage(compliant as u32, self.completed_sets())
    }

    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary {
            total_sets: self.total_sets(),
            completed_sets: self.completed_sets(),
            skipped_sets: self.skipped_sets(),
            completion_percentage: self.completion_percentage(),
            compliance_percentage: self.compliance_percentage(),
            rpe: self.rpe.or_else(|| {
                RPE::avg(
                    &self
                        .exercises
                        .iter()
                        .filter_map(|e| e.rpe)
                        .collect::<Vec<RPE>>(),
                )
            }),
        }
    }
}

fn percentage(part: u32, total: u32) -> u8 {
    if total == 0 {
        0
    } else {
        #[allow(clippy::cast_possible_truncation)]
        {
            ((100 * part + total / 2) / total) as u8
        }
    }
}

/// Builds the session's exercise list from the output of prescription
/// resolution. Resolution happens exactly once, here; the resulting set list
/// is never re-derived mid-session.
#[must_use]
pub fn materialize(
    workout: &WorkoutTemplate,
    resolved: &[ResolvedExercise],
) -> Vec<SessionExercise> {
    zip(&workout.exercises, resolved)
        .map(|(workout_exercise, resolved_exercise)| SessionExercise {
            exercise_id: resolved_exercise.exercise_id,
            superset_id: workout_exercise.superset_id,
            sets: resolved_exercise
                .sets
                .iter()
                .map(|s| SessionSet {
                    set_number: s.set_number,
                    prescribed: s.prescribed.clone(),
                    actual: None,
                    status: SetStatus::Pending,
                })
                .collect(),
            rpe: None,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionExercise {
    pub exercise_id: ExerciseID,
    pub superset_id: Option<SupersetID>,
    pub sets: Vec<SessionSet>,
    pub rpe: Option<RPE>,
}

impl SessionExercise {
    #[must_use]
    pub fn total_sets(&self) -> u32 {
        #[allow(clippy::cast_possible_truncation)]
        {
            self.sets.len() as u32
        }
    }

    #[must_use]
    pub fn completed_sets(&self) -> u32 {
        count_sets(self, SetStatus::Completed)
    }

    #[must_use]
    pub fn completion_percentage(&self) -> u8 {
        percentage(self.completed_sets(), self.total_sets())
    }
}

fn count_sets(exercise: &SessionExercise, status: SetStatus) -> u32 {
    #[allow(clippy::cast_possible_truncation)]
    {
        exercise.sets.iter().filter(|s| s.status == status).count() as u32
    }
}

/// Created immutably at session materialization time; only `actual` and
/// `status` are mutated during execution.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSet {
    pub set_number: u32,
    pub prescribed: Metrics,
    pub actual: Option<Metrics>,
    pub status: SetStatus,
}

impl SessionSet {
    pub fn complete(&mut self, actual: Metrics) {
        self.actual = Some(actual);
        self.status = SetStatus::Completed;
    }

    fn is_compliant(&self) -> bool {
        self.actual.as_ref().is_some_and(|actual| {
            self.prescribed.keys().all(|key| actual.contains_key(key))
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SetStatus {
    #[default]
    Pending,
    Completed,
    Skipped,
}

/// Monotonic, terminal at `Completed`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub step: SessionStep,
    pub position: Option<Position>,
}

impl Progress {
    #[must_use]
    pub fn step(step: SessionStep) -> Self {
        Self {
            step,
            position: None,
        }
    }

    #[must_use]
    pub fn at_exercise(exercise_id: ExerciseID) -> Self {
        Self {
            step: SessionStep::Exercises,
            position: Some(Position::Exercise(exercise_id)),
        }
    }

    #[must_use]
    pub fn at_questionnaire(step: SessionStep, questionnaire_id: QuestionnaireID) -> Self {
        Self {
            step,
            position: Some(Position::Questionnaire(questionnaire_id)),
        }
    }
}

/// The canonical step set exposed to callers for validation. String input
/// parses through `FromStr`; anything outside this set is rejected there.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum SessionStep {
    PreWorkoutQuestionnaire,
    Exercises,
    Rpe,
    PostWorkoutQuestionnaire,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Exercise(ExerciseID),
    Questionnaire(QuestionnaireID),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    PreWorkoutQuestionnaire,
    Questionnaire(QuestionnaireID),
    Exercise(ExerciseID),
    Rpe,
    PostWorkoutQuestionnaire,
    Summary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_sets: u32,
    pub completed_sets: u32,
    pub skipped_sets: u32,
    pub completion_percentage: u8,
    pub compliance_percentage: u8,
    pub rpe: Option<RPE>,
}

#[derive(Deref, Debug, Default, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SessionID(Uuid);

impl SessionID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for SessionID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for SessionID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

#[derive(Deref, Debug, Default, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CalendarEventID(Uuid);

impl From<Uuid> for CalendarEventID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for CalendarEventID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}
