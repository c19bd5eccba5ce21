//! Error log persistence. Logs are append-only; bulk delete is the only other write.

use sqlx::Row;

use crate::errors::AppError;
use crate::models::ErrorLog;

use super::repository::{created_or_now, Repository};

impl Repository {
    /// List all error logs.
    pub async fn list_error_logs(&self) -> Result<Vec<ErrorLog>, AppError> {
        let rows = sqlx::query(
            "SELECT id, description, url, stack_trace, created_at FROM error_logs ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(error_log_from_row).collect())
    }

    /// Get an error log by ID.
    pub async fn get_error_log(&self, id: i64) -> Result<Option<ErrorLog>, AppError> {
        let row = sqlx::query(
            "SELECT id, description, url, stack_trace, created_at FROM error_logs WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(error_log_from_row))
    }

    /// Record a new error log entry.
    pub async fn save_error_log(&self, log: &ErrorLog) -> Result<ErrorLog, AppError> {
        if log.id != 0 {
            return Err(AppError::InvalidArgument(
                "Error logs cannot be edited".to_string(),
            ));
        }
        if log.description.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "Error log description is required".to_string(),
            ));
        }

        let mut saved = log.clone();
        saved.created_at = created_or_now(log.created_at);
        let result = sqlx::query(
            "INSERT INTO error_logs (description, url, stack_trace, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&saved.description)
        .bind(&saved.url)
        .bind(&saved.stack_trace)
        .bind(saved.created_at)
        .execute(&self.pool)
        .await?;

        saved.id = result.last_insert_rowid();
        tracing::warn!(id = saved.id, url = %saved.url, "Recorded error log");
        Ok(saved)
    }
}

fn error_log_from_row(row: &sqlx::sqlite::SqliteRow) -> ErrorLog {
    ErrorLog {
        id: row.get("id"),
        description: row.get("description"),
        url: row.get("url"),
        stack_trace: row.get("stack_trace"),
        created_at: row.get("created_at"),
    }
}
