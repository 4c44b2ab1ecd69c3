use pcteacher_core::model::{LearnerId, ModuleId, ModuleProgress};
use sqlx::Row;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn learner_id_to_i64(id: LearnerId) -> Result<i64, StorageError> {
    i64::try_from(id.value())
        .map_err(|_| StorageError::Serialization("learner_id overflow".into()))
}

pub(crate) fn module_from_str(s: &str) -> Result<ModuleId, StorageError> {
    s.parse::<ModuleId>().map_err(ser)
}

fn count_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<(ModuleId, ModuleProgress), StorageError> {
    let module = module_from_str(row.try_get::<String, _>("module").map_err(ser)?.as_str())?;

    let progress = ModuleProgress::from_persisted(
        module,
        count_from_i64(
            "correct_count",
            row.try_get::<i64, _>("correct_count").map_err(ser)?,
        )?,
        count_from_i64(
            "incorrect_count",
            row.try_get::<i64, _>("incorrect_count").map_err(ser)?,
        )?,
        row.try_get::<i64, _>("completed").map_err(ser)? != 0,
        row.try_get("completed_at").map_err(ser)?,
    )?;

    Ok((module, progress))
}
