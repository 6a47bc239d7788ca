//! In-memory store
//!
//! Authoritative session store backed by process memory, plus read-only
//! catalog lookups seeded at construction time. The session document is
//! owned by exactly one athlete per calendar event; concurrent writers are
//! last-write-wins.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tempo_domain as domain;
use uuid::Uuid;

pub struct InMemory {
    exercises: Vec<domain::Exercise>,
    workouts: Vec<domain::WorkoutTemplate>,
    assignments: Vec<domain::WorkoutAssignment>,
    sessions: Mutex<BTreeMap<domain::SessionID, domain::WorkoutSession>>,
}

impl InMemory {
    #[must_use]
    pub fn new(
        exercises: Vec<domain::Exercise>,
        workouts: Vec<domain::WorkoutTemplate>,
        assignments: Vec<domain::WorkoutAssignment>,
    ) -> Self {
        Self {
            exercises,
            workouts,
            assignments,
            sessions: Mutex::new(BTreeMap::new()),
        }
    }

    fn sessions(
        &self,
    ) -> Result<MutexGuard<'_, BTreeMap<domain::SessionID, domain::WorkoutSession>>, domain::StorageError>
    {
        self.sessions
            .lock()
            .map_err(|err| domain::StorageError::Other(err.to_string().into()))
    }
}

impl domain::ExerciseRepository for InMemory {
    async fn read_exercises(&self) -> Result<Vec<domain::Exercise>, domain::ReadError> {
        Ok(self.exercises.clone())
    }
}

impl domain::WorkoutRepository for InMemory {
    async fn read_workout(
        &self,
        id: domain::WorkoutID,
    ) -> Result<domain::WorkoutTemplate, domain::ReadError> {
        self.workouts
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .ok_or(domain::ReadError::NotFound)
    }
}

impl domain::AssignmentRepository for InMemory {
    async fn read_assignment(
        &self,
        id: domain::AssignmentID,
    ) -> Result<domain::WorkoutAssignment, domain::ReadError> {
        self.assignments
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(domain::ReadError::NotFound)
    }
}

impl domain::SessionRepository for InMemory {
    async fn read_session(
        &self,
        id: domain::SessionID,
    ) -> Result<domain::WorkoutSession, domain::ReadError> {
        self.sessions()?
            .get(&id)
            .cloned()
            .ok_or(domain::ReadError::NotFound)
    }

    async fn create_session(
        &self,
        calendar_event_id: domain::CalendarEventID,
        athlete_id: domain::AthleteID,
        assignment_id: domain::AssignmentID,
        exercises: Vec<domain::SessionExercise>,
    ) -> Result<domain::WorkoutSession, domain::CreateError> {
        let mut sessions = self.sessions()?;

        if sessions
            .values()
            .any(|s| s.calendar_event_id == calendar_event_id)
        {
            return Err(domain::CreateError::Conflict);
        }

        let session = domain::WorkoutSession {
            id: Uuid::new_v4().into(),
            calendar_event_id,
            athlete_id,
            assignment_id,
            status: domain::SessionStatus::NotStarted,
            progress: None,
            exercises,
            rpe: None,
            actual_end_time: None,
        };
        sessions.insert(session.id, session.clone());

        Ok(session)
    }

    async fn modify_session(
        &self,
        id: domain::SessionID,
        status: Option<domain::SessionStatus>,
        progress: Option<domain::Progress>,
        exercises: Option<Vec<domain::SessionExercise>>,
        rpe: Option<domain::RPE>,
        actual_end_time: Option<DateTime<Utc>>,
    ) -> Result<domain::WorkoutSession, domain::UpdateError> {
        let mut sessions = self.sessions()?;
        let session = sessions.get_mut(&id).ok_or(domain::UpdateError::NotFound)?;

        if let Some(status) = status {
            session.status = status;
        }
        if let Some(progress) = progress {
            session.progress = Some(progress);
        }
        if let Some(exercises) = exercises {
            session.exercises = exercises;
        }
        if let Some(rpe) = rpe {
            session.rpe = Some(rpe);
        }
        if let Some(actual_end_time) = actual_end_time {
            session.actual_end_time = Some(actual_end_time);
        }

        Ok(session.clone())
    }
}
