use chrono::{DateTime, Utc};

use pcteacher_core::grading::GradeOutcome;
use pcteacher_core::model::{LearnerId, LearnerProgressRecord, ModuleId, ModuleProgress};

use super::SqliteRepository;
use super::mapping::{learner_id_to_i64, map_progress_row};
use crate::repository::{ProgressRepository, ProgressRow, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

impl SqliteRepository {
    async fn fetch_module_row(
        &self,
        learner: i64,
        module: ModuleId,
    ) -> Result<ModuleProgress, StorageError> {
        let row = sqlx::query(
            r"
            SELECT module, correct_count, incorrect_count, completed, completed_at
            FROM module_progress
            WHERE learner_id = ?1 AND module = ?2
            ",
        )
        .bind(learner)
        .bind(module.slug())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_progress_row(&row).map(|(_, progress)| progress),
            None => Err(StorageError::NotFound),
        }
    }
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn create_record(
        &self,
        learner: LearnerId,
        record: &LearnerProgressRecord,
    ) -> Result<(), StorageError> {
        let learner_id = learner_id_to_i64(learner)?;

        let existing = sqlx::query("SELECT 1 FROM module_progress WHERE learner_id = ?1 LIMIT 1")
            .bind(learner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        if existing.is_some() {
            return Err(StorageError::Conflict);
        }

        let mut tx = self.pool.begin().await.map_err(conn)?;
        for (module, progress) in record.iter() {
            let row = ProgressRow::from_progress(learner, module, progress);
            sqlx::query(
                r"
                INSERT INTO module_progress
                    (learner_id, module, correct_count, incorrect_count, completed, completed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(learner_id)
            .bind(module.slug())
            .bind(i64::from(row.correct_count))
            .bind(i64::from(row.incorrect_count))
            .bind(i64::from(row.completed))
            .bind(row.completed_at)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }
        tx.commit().await.map_err(conn)?;

        Ok(())
    }

    async fn load_record(&self, learner: LearnerId) -> Result<LearnerProgressRecord, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT module, correct_count, incorrect_count, completed, completed_at
            FROM module_progress
            WHERE learner_id = ?1
            ",
        )
        .bind(learner_id_to_i64(learner)?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        if rows.is_empty() {
            return Err(StorageError::NotFound);
        }

        let mut record = LearnerProgressRecord::default();
        for row in &rows {
            let (module, progress) = map_progress_row(row)?;
            record.apply_module(module, progress);
        }
        Ok(record)
    }

    async fn save_record(
        &self,
        learner: LearnerId,
        record: &LearnerProgressRecord,
    ) -> Result<(), StorageError> {
        let learner_id = learner_id_to_i64(learner)?;

        let existing = sqlx::query("SELECT 1 FROM module_progress WHERE learner_id = ?1 LIMIT 1")
            .bind(learner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        if existing.is_none() {
            return Err(StorageError::NotFound);
        }

        let mut tx = self.pool.begin().await.map_err(conn)?;
        for (module, progress) in record.iter() {
            let row = ProgressRow::from_progress(learner, module, progress);
            sqlx::query(
                r"
                INSERT INTO module_progress
                    (learner_id, module, correct_count, incorrect_count, completed, completed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(learner_id, module) DO UPDATE SET
                    correct_count = excluded.correct_count,
                    incorrect_count = excluded.incorrect_count,
                    completed = excluded.completed,
                    completed_at = excluded.completed_at
                ",
            )
            .bind(learner_id)
            .bind(module.slug())
            .bind(i64::from(row.correct_count))
            .bind(i64::from(row.incorrect_count))
            .bind(i64::from(row.completed))
            .bind(row.completed_at)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }
        tx.commit().await.map_err(conn)?;

        Ok(())
    }

    async fn increment_answer(
        &self,
        learner: LearnerId,
        module: ModuleId,
        outcome: GradeOutcome,
    ) -> Result<ModuleProgress, StorageError> {
        let learner_id = learner_id_to_i64(learner)?;

        // Single conditional statement: the store is the serialization
        // point for concurrent submissions, and completed rows never move.
        let query = match outcome {
            GradeOutcome::Correct => {
                r"
                UPDATE module_progress
                SET correct_count = correct_count + 1
                WHERE learner_id = ?1 AND module = ?2 AND completed = 0
                "
            }
            GradeOutcome::Incorrect => {
                r"
                UPDATE module_progress
                SET incorrect_count = incorrect_count + 1
                WHERE learner_id = ?1 AND module = ?2 AND completed = 0
                "
            }
        };

        sqlx::query(query)
            .bind(learner_id)
            .bind(module.slug())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        // Post-increment row; NotFound distinguishes "no row" from the
        // zero-rows-affected no-op on a completed module.
        self.fetch_module_row(learner_id, module).await
    }

    async fn complete_module(
        &self,
        learner: LearnerId,
        module: ModuleId,
        at: DateTime<Utc>,
    ) -> Result<ModuleProgress, StorageError> {
        let learner_id = learner_id_to_i64(learner)?;

        let res = sqlx::query(
            r"
            UPDATE module_progress
            SET completed = 1,
                completed_at = COALESCE(completed_at, ?3)
            WHERE learner_id = ?1 AND module = ?2
            ",
        )
        .bind(learner_id)
        .bind(module.slug())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        self.fetch_module_row(learner_id, module).await
    }
}
