use std::collections::BTreeMap;

use chrono::Utc;
use log::{debug, error};

use crate::{
    AssignmentID, AssignmentRepository, AthleteID, CalendarEventID, CreateError, ExerciseID,
    ExerciseRepository, Metrics, Progress, RPE, ReadError, Route, SessionID, SessionRepository,
    SessionSet, SessionStatus, SetStatus, UpdateError, WorkoutRepository, WorkoutSession,
    materialize, next_step, resolve,
};

/// Drives a session through its execution steps on top of the session store
/// and the read-only catalog collaborators.
pub struct Service<R> {
    repository: R,
}

macro_rules! log_on_error {
    ($func: expr, $error: ident, $action: literal, $entity: literal) => {{
        let result = $func.await;
        match result {
            Ok(_) => {}
            Err(ref err) => match err {
                $error::Storage(crate::StorageError::NoConnection) => {
                    debug!("failed to {} {}: {err}", $action, $entity);
                }
                _ => {
                    error!("failed to {} {}: {err}", $action, $entity);
                }
            },
        }
        result
    }};
}

impl<R> Service<R>
where
    R: SessionRepository + AssignmentRepository + WorkoutRepository + ExerciseRepository,
{
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Creates the session for a calendar event. Prescriptions are resolved
    /// exactly once, here; later edits to the assignment never reach the
    /// created session.
    pub async fn start_session(
        &self,
        calendar_event_id: CalendarEventID,
        athlete_id: AthleteID,
        assignment_id: AssignmentID,
    ) -> Result<WorkoutSession, CreateError> {
        let assignment = self.repository.read_assignment(assignment_id).await?;
        let workout = self.repository.read_workout(assignment.workout_id).await?;
        let exercises = self
            .repository
            .read_exercises()
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect::<BTreeMap<ExerciseID, _>>();
        let elements = materialize(&workout, &resolve(&assignment, &workout, &exercises)?);
        log_on_error!(
            self.repository
                .create_session(calendar_event_id, athlete_id, assignment_id, elements),
            CreateError,
            "create",
            "session"
        )
    }

    pub async fn get_session(&self, id: SessionID) -> Result<WorkoutSession, ReadError> {
        log_on_error!(self.repository.read_session(id), ReadError, "get", "session")
    }

    /// Resolves the route a loaded session resumes at.
    pub async fn route_for(&self, id: SessionID) -> Result<Route, ReadError> {
        let session = self.get_session(id).await?;
        let assignment = self
            .repository
            .read_assignment(session.assignment_id)
            .await?;
        let workout = self.repository.read_workout(assignment.workout_id).await?;
        Ok(session.route(&workout))
    }

    pub async fn update_progress(
        &self,
        id: SessionID,
        progress: Progress,
    ) -> Result<WorkoutSession, UpdateError> {
        let session = self.repository.read_session(id).await?;
        if session.status == SessionStatus::Completed {
            return Err(UpdateError::Completed);
        }
        log_on_error!(
            self.repository
                .modify_session(id, started(&session), Some(progress), None, None, None),
            UpdateError,
            "update",
            "session progress"
        )
    }

    /// Records actual values for a set, marks it completed and lets the
    /// superset sequencer decide whether to auto-advance the progress
    /// position.
    pub async fn record_set(
        &self,
        id: SessionID,
        exercise_id: ExerciseID,
        set_number: u32,
        actual: Metrics,
    ) -> Result<WorkoutSession, UpdateError> {
        let mut session = self.repository.read_session(id).await?;
        if session.status == SessionStatus::Completed {
            return Err(UpdateError::Completed);
        }
        let status = started(&session);
        set_in(&mut session, exercise_id, set_number)?.complete(actual);
        let progress =
            next_step(&session, exercise_id).map(|next| Progress::at_exercise(next.exercise_id));
        log_on_error!(
            self.repository
                .modify_session(id, status, progress, Some(session.exercises), None, None),
            UpdateError,
            "record",
            "set"
        )
    }

    /// Marks a set skipped. Skipped sets never count as completed and force
    /// no navigation.
    pub async fn skip_set(
        &self,
        id: SessionID,
        exercise_id: ExerciseID,
        set_number: u32,
    ) -> Result<WorkoutSession, UpdateError> {
        let mut session = self.repository.read_session(id).await?;
        if session.status == SessionStatus::Completed {
            return Err(UpdateError::Completed);
        }
        let status = started(&session);
        set_in(&mut session, exercise_id, set_number)?.status = SetStatus::Skipped;
        log_on_error!(
            self.repository
                .modify_session(id, status, None, Some(session.exercises), None, None),
            UpdateError,
            "skip",
            "set"
        )
    }

    /// Attaches the session RPE, distributes per-exercise values if given,
    /// and completes the session.
    pub async fn submit_rpe(
        &self,
        id: SessionID,
        overall: RPE,
        exercise_values: Option<BTreeMap<ExerciseID, RPE>>,
    ) -> Result<WorkoutSession, UpdateError> {
        let session = self.repository.read_session(id).await?;
        if session.status == SessionStatus::Completed {
            return Err(UpdateError::Completed);
        }
        let exercises = exercise_values.map(|values| {
            let mut exercises = session.exercises.clone();
            for exercise in &mut exercises {
                if let Some(rpe) = values.get(&exercise.exercise_id) {
                    exercise.rpe = Some(*rpe);
                }
            }
            exercises
        });
        log_on_error!(
            self.repository.modify_session(
                id,
                Some(SessionStatus::Completed),
                None,
                exercises,
                Some(overall),
                Some(Utc::now()),
            ),
            UpdateError,
            "complete",
            "session"
        )
    }
}

fn started(session: &WorkoutSession) -> Option<SessionStatus> {
    (session.status == SessionStatus::NotStarted).then_some(SessionStatus::InProgress)
}

fn set_in(
    session: &mut WorkoutSession,
    exercise_id: ExerciseID,
    set_number: u32,
) -> Result<&mut SessionSet, UpdateError> {
    session
        .exercises
        .iter_mut()
        .find(|e| e.exercise_id == exercise_id)
        .ok_or(UpdateError::NotFound)?
        .sets
        .iter_mut()
        .find(|s| s.set_number == set_number)
        .ok_or(UpdateError::NotFound)
}
