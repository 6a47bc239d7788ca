//! Cached store
//!
//! Read-through cache in front of the authoritative session store. Cached
//! sessions carry a time-to-live whose countdown is suspended while the
//! athlete is inside the session flow and resumes once they leave. The cache
//! is never authoritative: every mutation goes through the inner store and
//! merely refreshes the cached copy, and a lost cache only costs a re-read.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use log::error;
use tempo_domain as domain;

pub struct Cached<S> {
    store: S,
    ttl: Duration,
    state: Mutex<CacheState>,
}

struct CacheState {
    entries: BTreeMap<domain::SessionID, CacheEntry>,
    in_session_flow: bool,
}

struct CacheEntry {
    session: domain::WorkoutSession,
    deadline: Deadline,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Deadline::Running(until) => now < until,
            Deadline::Suspended(_) => true,
        }
    }
}

enum Deadline {
    Running(DateTime<Utc>),
    Suspended(Duration),
}

impl<S> Cached<S> {
    pub fn new(store: S, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            state: Mutex::new(CacheState {
                entries: BTreeMap::new(),
                in_session_flow: false,
            }),
        }
    }

    /// Suspends the TTL countdown of all cached sessions.
    pub fn enter_session_flow(&self) {
        let now = Utc::now();
        if let Some(mut state) = self.state() {
            state.in_session_flow = true;
            for entry in state.entries.values_mut() {
                // Already-expired entries stay expired.
                if let Deadline::Running(until) = entry.deadline {
                    if until > now {
                        entry.deadline = Deadline::Suspended(until - now);
                    }
                }
            }
        }
    }

    /// Resumes the TTL countdown with the time that was left on entering the
    /// session flow.
    pub fn leave_session_flow(&self) {
        let now = Utc::now();
        if let Some(mut state) = self.state() {
            state.in_session_flow = false;
            for entry in state.entries.values_mut() {
                if let Deadline::Suspended(remaining) = entry.deadline {
                    entry.deadline = Deadline::Running(now + remaining);
                }
            }
        }
    }

    fn cached(&self, id: domain::SessionID) -> Option<domain::WorkoutSession> {
        let now = Utc::now();
        let state = self.state()?;
        state
            .entries
            .get(&id)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.session.clone())
    }

    fn refresh(&self, session: &domain::WorkoutSession) {
        if let Some(mut state) = self.state() {
            let deadline = if state.in_session_flow {
                Deadline::Suspended(self.ttl)
            } else {
                Deadline::Running(Utc::now() + self.ttl)
            };
            state.entries.insert(
                session.id,
                CacheEntry {
                    session: session.clone(),
                    deadline,
                },
            );
        }
    }

    fn state(&self) -> Option<MutexGuard<'_, CacheState>> {
        match self.state.lock() {
            Ok(state) => Some(state),
            Err(err) => {
                error!("session cache unavailable: {err}");
                None
            }
        }
    }
}

impl<S: domain::SessionRepository> domain::SessionRepository for Cached<S> {
    async fn read_session(
        &self,
        id: domain::SessionID,
    ) -> Result<domain::WorkoutSession, domain::ReadError> {
        if let Some(session) = self.cached(id) {
            return Ok(session);
        }

        let session = self.store.read_session(id).await?;
        self.refresh(&session);
        Ok(session)
    }

    async fn create_session(
        &self,
        calendar_event_id: domain::CalendarEventID,
        athlete_id: domain::AthleteID,
        assignment_id: domain::AssignmentID,
        exercises: Vec<domain::SessionExercise>,
    ) -> Result<domain::WorkoutSession, domain::CreateError> {
        let session = self
            .store
            .create_session(calendar_event_id, athlete_id, assignment_id, exercises)
            .await?;
        self.refresh(&session);
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
        let session = self
            .store
            .modify_session(id, status, progress, exercises, rpe, actual_end_time)
            .await?;
        self.refresh(&session);
        Ok(session)
    }
}

impl<S: domain::ExerciseRepository> domain::ExerciseRepository for Cached<S> {
    async fn read_exercises(&self) -> Result<Vec<domain::Exercise>, domain::ReadError> {
        self.store.read_exercises().await
    }
}

impl<S: domain::WorkoutRepository> domain::WorkoutRepository for Cached<S> {
    async fn read_workout(
        &self,
        id: domain::WorkoutID,
    ) -> Result<domain::WorkoutTemplate, domain::ReadError> {
        self.store.read_workout(id).await
    }
}

impl<S: domain::AssignmentRepository> domain::AssignmentRepository for Cached<S> {
    async fn read_assignment(
        &self,
        id: domain::AssignmentID,
    ) -> Result<domain::WorkoutAssignment, domain::ReadError> {
        self.store.read_assignment(id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;
    use tempo_domain::SessionRepository;

    use crate::InMemory;

    use super::*;

    /// Counts reads hitting the authoritative store.
    struct Counting {
        store: InMemory,
        reads: AtomicUsize,
    }

    impl Counting {
        fn new() -> Self {
            Self {
                store: InMemory::new(vec![], vec![], vec![]),
                reads: AtomicUsize::new(0),
            }
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::Relaxed)
        }
    }

    impl domain::SessionRepository for &Counting {
        async fn read_session(
            &self,
            id: domain::SessionID,
        ) -> Result<domain::WorkoutSession, domain::ReadError> {
            self.reads.fetch_add(1, Ordering::Relaxed);
            self.store.read_session(id).await
        }

        async fn create_session(
            &self,
            calendar_event_id: domain::CalendarEventID,
            athlete_id: domain::AthleteID,
            assignment_id: domain::AssignmentID,
            exercises: Vec<domain::SessionExercise>,
        ) -> Result<domain::WorkoutSession, domain::CreateError> {
            self.store
                .create_session(calendar_event_id, athlete_id, assignment_id, exercises)
                .await
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
            self.store
                .modify_session(id, status, progress, exercises, rpe, actual_end_time)
                .await
        }
    }

    #[tokio::test]
    async fn test_read_session_served_from_cache() {
        let counting = Counting::new();
        let cached = Cached::new(&counting, Duration::hours(1));
        let session = cached
            .create_session(1.into(), 1.into(), 1.into(), vec![])
            .await
            .unwrap();

        assert_eq!(cached.read_session(session.id).await.unwrap(), session);
        assert_eq!(cached.read_session(session.id).await.unwrap(), session);
        // Creation already populated the cache.
        assert_eq!(counting.reads(), 0);
    }

    #[tokio::test]
    async fn test_read_session_expired_entry() {
        let counting = Counting::new();
        let cached = Cached::new(&counting, Duration::zero());
        let session = cached
            .create_session(1.into(), 1.into(), 1.into(), vec![])
            .await
            .unwrap();

        assert_eq!(cached.read_session(session.id).await.unwrap(), session);
        assert_eq!(cached.read_session(session.id).await.unwrap(), session);
        assert_eq!(counting.reads(), 2);
    }

    #[tokio::test]
    async fn test_ttl_suspended_in_session_flow() {
        let counting = Counting::new();
        let cached = Cached::new(&counting, Duration::zero());
        let session = cached
            .create_session(1.into(), 1.into(), 1.into(), vec![])
            .await
            .unwrap();

        cached.enter_session_flow();
        assert_eq!(cached.read_session(session.id).await.unwrap(), session);
        // The entry written during the first read does not expire while the
        // athlete is inside the session flow.
        assert_eq!(cached.read_session(session.id).await.unwrap(), session);
        assert_eq!(counting.reads(), 1);

        // Once they leave, the countdown resumes and the entry expires.
        cached.leave_session_flow();
        assert_eq!(cached.read_session(session.id).await.unwrap(), session);
        assert_eq!(counting.reads(), 2);
    }

    #[tokio::test]
    async fn test_mutation_writes_through_and_refreshes() {
        let counting = Counting::new();
        let cached = Cached::new(&counting, Duration::hours(1));
        let session = cached
            .create_session(1.into(), 1.into(), 1.into(), vec![])
            .await
            .unwrap();

        let modified = cached
            .modify_session(
                session.id,
                Some(domain::SessionStatus::InProgress),
                None,
                None,
                None,
                None,
            )
            .await
            .unwrap();

        // The inner store holds the modification and the cache serves the
        // refreshed copy without another read.
        assert_eq!(counting.store.read_session(session.id).await.unwrap(), modified);
        assert_eq!(cached.read_session(session.id).await.unwrap(), modified);
        assert_eq!(counting.reads(), 0);
    }
}
