use std::collections::BTreeMap;

use chrono::Duration;
use pretty_assertions::assert_eq;
use tempo_domain as domain;
use tempo_domain::Service;
use tempo_storage::{Cached, InMemory};

const LUNGE: u128 = 1;
const ROW: u128 = 2;
const SQUAT: u128 = 3;
const SUPERSET: u128 = 9;
const WORKOUT: u128 = 1;
const ASSIGNMENT: u128 = 1;
const ATHLETE: u128 = 1;
const QUESTIONNAIRE: u128 = 7;

fn key(name: &str) -> domain::MetricKey {
    domain::MetricKey::new(name).unwrap()
}

fn reps(count: f64) -> domain::Metrics {
    BTreeMap::from([(key("reps"), domain::MetricValue::Number(count))])
}

fn exercise(id: u128, name: &str) -> domain::Exercise {
    domain::Exercise {
        id: id.into(),
        name: domain::Name::new(name).unwrap(),
        settings: domain::ExerciseSettings {
            sets_counting: true,
        },
        metrics: vec![
            domain::MetricDefinition {
                key: key("reps"),
                kind: domain::MetricKind::Number,
            },
            domain::MetricDefinition {
                key: key("load"),
                kind: domain::MetricKind::Number,
            },
        ],
    }
}

fn workout_exercise(id: u128, superset: Option<u128>) -> domain::WorkoutExerciseRef {
    domain::WorkoutExerciseRef {
        exercise_id: id.into(),
        default_metrics: reps(8.0),
        default_metrics_per_set: BTreeMap::new(),
        superset_id: superset.map(domain::SupersetID::from),
    }
}

fn store() -> InMemory {
    InMemory::new(
        vec![
            exercise(LUNGE, "Lunge"),
            exercise(ROW, "Row"),
            exercise(SQUAT, "Back Squat"),
        ],
        vec![domain::WorkoutTemplate {
            id: WORKOUT.into(),
            name: domain::Name::new("Full Body").unwrap(),
            exercises: vec![
                workout_exercise(LUNGE, Some(SUPERSET)),
                workout_exercise(ROW, Some(SUPERSET)),
                workout_exercise(SQUAT, None),
            ],
            pre_questionnaires: vec![QUESTIONNAIRE.into()],
            post_questionnaires: vec![],
        }],
        vec![domain::WorkoutAssignment {
            id: ASSIGNMENT.into(),
            workout_id: WORKOUT.into(),
            athlete_ids: vec![ATHLETE.into()],
            prescriptions: BTreeMap::from([(
                SQUAT.into(),
                domain::Prescription {
                    prescribed_metrics: Some(BTreeMap::from([
                        (key("sets"), domain::MetricValue::Number(2.0)),
                        (key("reps"), domain::MetricValue::Number(10.0)),
                    ])),
                    prescribed_metrics_per_set: BTreeMap::new(),
                },
            )]),
        }],
    )
}

fn service() -> Service<InMemory> {
    Service::new(store())
}

async fn started_session(service: &Service<InMemory>) -> domain::WorkoutSession {
    service
        .start_session(1.into(), ATHLETE.into(), ASSIGNMENT.into())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_start_session_materializes_prescriptions() {
    let service = service();
    let session = started_session(&service).await;

    assert_eq!(session.status, domain::SessionStatus::NotStarted);
    assert_eq!(
        session
            .exercises
            .iter()
            .map(|e| e.exercise_id)
            .collect::<Vec<domain::ExerciseID>>(),
        vec![LUNGE.into(), ROW.into(), SQUAT.into()]
    );
    assert_eq!(session.exercises[0].superset_id, Some(SUPERSET.into()));
    assert_eq!(session.exercises[2].superset_id, None);

    // No prescription: workout default, three sets.
    assert_eq!(session.exercises[0].sets.len(), 3);
    assert!(
        session.exercises[0]
            .sets
            .iter()
            .all(|s| s.prescribed == reps(8.0))
    );

    // Assignment global prescription wins over the workout default, and its
    // sets directive drives cardinality without being prescribed itself.
    assert_eq!(session.exercises[2].sets.len(), 2);
    assert!(
        session.exercises[2]
            .sets
            .iter()
            .all(|s| s.prescribed == reps(10.0))
    );

    assert!(
        session
            .exercises
            .iter()
            .flat_map(|e| &e.sets)
            .all(|s| s.status == domain::SetStatus::Pending && s.actual.is_none())
    );
    assert_eq!(session.completion_percentage(), 0);
}

#[tokio::test]
async fn test_start_session_conflict_on_existing_event() {
    let service = service();
    started_session(&service).await;

    assert!(matches!(
        service
            .start_session(1.into(), ATHLETE.into(), ASSIGNMENT.into())
            .await,
        Err(domain::CreateError::Conflict)
    ));
}

#[tokio::test]
async fn test_start_session_unknown_assignment() {
    assert!(matches!(
        service().start_session(1.into(), ATHLETE.into(), 99.into()).await,
        Err(domain::CreateError::NotFound)
    ));
}

#[tokio::test]
async fn test_route_for() {
    let service = service();
    let session = started_session(&service).await;

    // Fresh session, the workout declares a pre-workout questionnaire.
    assert_eq!(
        service.route_for(session.id).await.unwrap(),
        domain::Route::PreWorkoutQuestionnaire
    );

    service
        .update_progress(session.id, domain::Progress::at_exercise(ROW.into()))
        .await
        .unwrap();

    assert_eq!(
        service.route_for(session.id).await.unwrap(),
        domain::Route::Exercise(ROW.into())
    );
    // Routing is idempotent.
    assert_eq!(
        service.route_for(session.id).await.unwrap(),
        domain::Route::Exercise(ROW.into())
    );

    assert!(matches!(
        service.route_for(99.into()).await,
        Err(domain::ReadError::NotFound)
    ));
}

#[tokio::test]
async fn test_update_progress_starts_session() {
    let service = service();
    let session = started_session(&service).await;

    let updated = service
        .update_progress(
            session.id,
            domain::Progress::step(domain::SessionStep::PreWorkoutQuestionnaire),
        )
        .await
        .unwrap();

    assert_eq!(updated.status, domain::SessionStatus::InProgress);
    assert_eq!(
        updated.progress,
        Some(domain::Progress::step(
            domain::SessionStep::PreWorkoutQuestionnaire
        ))
    );

    assert!(matches!(
        service
            .update_progress(99.into(), domain::Progress::step(domain::SessionStep::Rpe))
            .await,
        Err(domain::UpdateError::NotFound)
    ));
}

#[tokio::test]
async fn test_record_set_superset_auto_advance() {
    let service = service();
    let session = started_session(&service).await;

    let updated = service
        .record_set(session.id, LUNGE.into(), 1, reps(8.0))
        .await
        .unwrap();

    assert_eq!(updated.status, domain::SessionStatus::InProgress);
    assert_eq!(
        updated.exercises[0].sets[0].status,
        domain::SetStatus::Completed
    );
    assert_eq!(updated.exercises[0].sets[0].actual, Some(reps(8.0)));
    // The sequencer rotates to the superset partner.
    assert_eq!(
        updated.progress,
        Some(domain::Progress::at_exercise(ROW.into()))
    );
    assert_eq!(updated.completed_sets(), 1);
}

#[tokio::test]
async fn test_record_set_non_superset_no_navigation() {
    let service = service();
    let session = started_session(&service).await;

    let updated = service
        .record_set(session.id, SQUAT.into(), 1, reps(10.0))
        .await
        .unwrap();

    // No superset, no forced navigation: the progress record is untouched.
    assert_eq!(updated.progress, None);
    assert_eq!(updated.completed_sets(), 1);
    assert_eq!(updated.total_sets(), 8);
    assert_eq!(updated.completion_percentage(), 13);
}

#[tokio::test]
async fn test_record_set_unknown_set() {
    let service = service();
    let session = started_session(&service).await;

    assert!(matches!(
        service.record_set(session.id, SQUAT.into(), 99, reps(10.0)).await,
        Err(domain::UpdateError::NotFound)
    ));
    assert!(matches!(
        service.record_set(session.id, 99.into(), 1, reps(10.0)).await,
        Err(domain::UpdateError::NotFound)
    ));
}

#[tokio::test]
async fn test_skip_set() {
    let service = service();
    let session = started_session(&service).await;

    let updated = service.skip_set(session.id, LUNGE.into(), 1).await.unwrap();

    assert_eq!(
        updated.exercises[0].sets[0].status,
        domain::SetStatus::Skipped
    );
    assert_eq!(updated.completed_sets(), 0);
    assert_eq!(updated.completion_percentage(), 0);
    assert_eq!(updated.summary().skipped_sets, 1);
}

#[tokio::test]
async fn test_submit_rpe_completes_session() {
    let service = service();
    let session = started_session(&service).await;
    service
        .update_progress(session.id, domain::Progress::at_exercise(LUNGE.into()))
        .await
        .unwrap();

    let completed = service
        .submit_rpe(
            session.id,
            domain::RPE::EIGHT,
            Some(BTreeMap::from([(LUNGE.into(), domain::RPE::SEVEN)])),
        )
        .await
        .unwrap();

    assert_eq!(completed.status, domain::SessionStatus::Completed);
    assert_eq!(completed.rpe, Some(domain::RPE::EIGHT));
    assert_eq!(completed.exercises[0].rpe, Some(domain::RPE::SEVEN));
    assert!(completed.actual_end_time.is_some());
    assert_eq!(completed.summary().rpe, Some(domain::RPE::EIGHT));

    // A completed session routes to the summary, even though the stored
    // progress still points at an exercise.
    assert_eq!(
        service.route_for(session.id).await.unwrap(),
        domain::Route::Summary
    );

    // Completed is terminal.
    assert!(matches!(
        service
            .update_progress(session.id, domain::Progress::step(domain::SessionStep::Rpe))
            .await,
        Err(domain::UpdateError::Completed)
    ));
    assert!(matches!(
        service.record_set(session.id, LUNGE.into(), 2, reps(8.0)).await,
        Err(domain::UpdateError::Completed)
    ));
    assert!(matches!(
        service.submit_rpe(session.id, domain::RPE::SEVEN, None).await,
        Err(domain::UpdateError::Completed)
    ));
}

#[tokio::test]
async fn test_service_over_cached_store() {
    let service = Service::new(Cached::new(store(), Duration::hours(1)));
    let session = service
        .start_session(1.into(), ATHLETE.into(), ASSIGNMENT.into())
        .await
        .unwrap();

    let updated = service
        .record_set(session.id, LUNGE.into(), 1, reps(8.0))
        .await
        .unwrap();
    assert_eq!(
        updated.progress,
        Some(domain::Progress::at_exercise(ROW.into()))
    );
    assert_eq!(service.get_session(session.id).await.unwrap(), updated);
}
