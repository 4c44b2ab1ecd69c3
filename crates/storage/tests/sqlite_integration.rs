use chrono::Duration;
use pcteacher_core::grading::GradeOutcome;
use pcteacher_core::model::{Catalog, LearnerId, LearnerProgressRecord, ModuleId, ModuleProgress};
use pcteacher_core::time::fixed_now;
use storage::repository::{ProgressRepository, StorageError};
use storage::sqlite::SqliteRepository;

fn fresh_record() -> LearnerProgressRecord {
    LearnerProgressRecord::fresh(&Catalog::course_default())
}

#[tokio::test]
async fn sqlite_roundtrip_creates_and_loads_full_record() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let learner = LearnerId::new(1);
    repo.create_record(learner, &fresh_record()).await.unwrap();

    let loaded = repo.load_record(learner).await.unwrap();
    for id in ModuleId::ALL {
        let progress = loaded.module(id);
        assert_eq!(progress.exercises_done(), 0);
        assert!(!progress.is_completed());
    }
}

#[tokio::test]
async fn sqlite_create_twice_conflicts_and_missing_learner_not_found() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_conflict?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let learner = LearnerId::new(2);
    repo.create_record(learner, &fresh_record()).await.unwrap();
    let err = repo
        .create_record(learner, &fresh_record())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let err = repo.load_record(LearnerId::new(99)).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_increment_is_atomic_per_field_and_stops_after_completion() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_increment?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let learner = LearnerId::new(3);
    repo.create_record(learner, &fresh_record()).await.unwrap();

    let row = repo
        .increment_answer(learner, ModuleId::Introducao, GradeOutcome::Correct)
        .await
        .unwrap();
    assert_eq!(row.correct_count(), 1);
    assert_eq!(row.incorrect_count(), 0);

    let row = repo
        .increment_answer(learner, ModuleId::Introducao, GradeOutcome::Incorrect)
        .await
        .unwrap();
    assert_eq!(row.correct_count(), 1);
    assert_eq!(row.incorrect_count(), 1);

    repo.complete_module(learner, ModuleId::Introducao, fixed_now())
        .await
        .unwrap();

    // conditional UPDATE matches no row once completed
    let row = repo
        .increment_answer(learner, ModuleId::Introducao, GradeOutcome::Correct)
        .await
        .unwrap();
    assert_eq!(row.correct_count(), 1);
    assert!(row.is_completed());
}

#[tokio::test]
async fn sqlite_complete_module_is_idempotent_with_first_timestamp() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_complete?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let learner = LearnerId::new(4);
    repo.create_record(learner, &fresh_record()).await.unwrap();

    let first = fixed_now();
    let row = repo
        .complete_module(learner, ModuleId::Introducao, first)
        .await
        .unwrap();
    assert!(row.is_completed());
    assert_eq!(row.completed_at(), Some(first));

    let row = repo
        .complete_module(learner, ModuleId::Introducao, first + Duration::days(2))
        .await
        .unwrap();
    assert_eq!(row.completed_at(), Some(first));

    let err = repo
        .complete_module(LearnerId::new(77), ModuleId::Introducao, first)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_save_record_overwrites_rows() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_save?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let learner = LearnerId::new(5);
    let mut record = fresh_record();
    repo.create_record(learner, &record).await.unwrap();

    let row =
        ModuleProgress::from_persisted(ModuleId::Introducao, 3, 2, true, Some(fixed_now()))
            .unwrap();
    record.apply_module(ModuleId::Introducao, row.clone());
    repo.save_record(learner, &record).await.unwrap();

    let loaded = repo.load_record(learner).await.unwrap();
    assert_eq!(loaded.module(ModuleId::Introducao), row);
    assert_eq!(loaded.module(ModuleId::Decomposicao).exercises_done(), 0);

    let err = repo.save_record(LearnerId::new(88), &record).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}
