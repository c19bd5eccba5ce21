//! Database repository for CRUD operations.
//!
//! Uses prepared statements and transactions for data integrity. The per-type
//! operations live next to this file; shared pieces (bulk actions, slug handling)
//! are here.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::models::BulkAction;

/// Tables that accept bulk actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTable {
    Blogs,
    Categories,
    Tags,
    ErrorLogs,
}

impl ContentTable {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentTable::Blogs => "blogs",
            ContentTable::Categories => "categories",
            ContentTable::Tags => "tags",
            ContentTable::ErrorLogs => "error_logs",
        }
    }

    fn delete_sql(self) -> String {
        match self {
            // Removes the whole subtree so no category is left pointing at a missing parent;
            // UNION stops at rows already visited, so a looping chain still terminates
            ContentTable::Categories => r#"
                WITH RECURSIVE subtree(id) AS (
                    SELECT ?
                    UNION
                    SELECT c.id FROM categories c JOIN subtree s ON c.parent_id = s.id
                )
                DELETE FROM categories WHERE id IN (SELECT id FROM subtree)"#
                .to_string(),
            other => format!("DELETE FROM {} WHERE id = ?", other.as_str()),
        }
    }
}

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pub(super) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply resolved bulk actions in one transaction.
    ///
    /// Returns the number of affected rows. Ids that no longer exist are skipped.
    pub async fn apply_actions(
        &self,
        table: ContentTable,
        actions: &[(i64, BulkAction)],
    ) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut affected = 0;

        for &(id, action) in actions {
            let result = match action.assignment() {
                Some((column, value)) => {
                    let sql = format!("UPDATE {} SET {} = ? WHERE id = ?", table.as_str(), column);
                    sqlx::query(&sql)
                        .bind(value)
                        .bind(id)
                        .execute(&mut *tx)
                        .await?
                }
                None => {
                    sqlx::query(&table.delete_sql())
                        .bind(id)
                        .execute(&mut *tx)
                        .await?
                }
            };
            affected += result.rows_affected();
        }

        tx.commit().await?;

        tracing::info!(
            table = table.as_str(),
            requested = actions.len(),
            affected,
            "Applied bulk actions"
        );
        Ok(affected)
    }
}

/// Slug for a record: the given one if present, otherwise derived from the title.
pub fn slug_or_title(slug: &str, title: &str) -> String {
    let source = if slug.trim().is_empty() { title } else { slug };
    slugify(source)
}

/// Lower-case ASCII alphanumerics separated by single hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Creation timestamp for a new record; unset (epoch) timestamps become now.
pub(super) fn created_or_now(created_at: DateTime<Utc>) -> DateTime<Utc> {
    if created_at == DateTime::<Utc>::default() {
        Utc::now()
    } else {
        created_at
    }
}

/// Reject records that fail basic shape checks before they reach SQL.
pub(super) fn require_title(title: &str, kind: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::InvalidArgument(format!("{} title is required", kind)));
    }
    Ok(())
}
