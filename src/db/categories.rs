//! Category persistence.
//!
//! `child_count` is not stored; every read computes it from the live table.

use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::errors::AppError;
use crate::models::Category;

use super::repository::{created_or_now, require_title, slug_or_title, Repository};

const CATEGORY_SELECT: &str = r#"SELECT c.id, c.parent_id, c.title, c.slug, c.description,
        c.priority, c.category_type, c.is_enabled, c.created_at,
        (SELECT COUNT(*) FROM categories k WHERE k.parent_id = c.id) AS child_count
    FROM categories c"#;

impl Repository {
    /// List all categories.
    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let sql = format!("{} ORDER BY c.id", CATEGORY_SELECT);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(category_from_row).collect())
    }

    /// Get a category by ID.
    pub async fn get_category(&self, id: i64) -> Result<Option<Category>, AppError> {
        let sql = format!("{} WHERE c.id = ?", CATEGORY_SELECT);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(category_from_row))
    }

    /// Create the category when its id is 0, otherwise overwrite the stored one.
    pub async fn save_category(&self, category: &Category) -> Result<Category, AppError> {
        require_title(&category.title, "Category")?;
        if category.id != 0 && category.parent_id == category.id {
            return Err(AppError::InvalidArgument(format!(
                "Category {} cannot be its own parent",
                category.id
            )));
        }
        if category.parent_id != 0 && self.get_category(category.parent_id).await?.is_none() {
            return Err(AppError::InvalidArgument(format!(
                "Parent category {} does not exist",
                category.parent_id
            )));
        }
        if category.id != 0 && self.is_ancestor_or_self(category.id, category.parent_id).await? {
            return Err(AppError::InvalidArgument(format!(
                "Category {} cannot be moved under its own descendant {}",
                category.id, category.parent_id
            )));
        }

        let slug = slug_or_title(&category.slug, &category.title);

        let id = if category.id == 0 {
            let result = sqlx::query(
                r#"INSERT INTO categories (
                    parent_id, title, slug, description, priority, category_type, is_enabled, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(category.parent_id)
            .bind(&category.title)
            .bind(&slug)
            .bind(&category.description)
            .bind(category.priority)
            .bind(category.category_type)
            .bind(category.is_enabled as i32)
            .bind(created_or_now(category.created_at))
            .execute(&self.pool)
            .await?;

            let id = result.last_insert_rowid();
            tracing::info!(id, parent_id = category.parent_id, "Created category");
            id
        } else {
            let result = sqlx::query(
                r#"UPDATE categories SET
                    parent_id = ?, title = ?, slug = ?, description = COALESCE(?, description),
                    priority = ?, category_type = ?, is_enabled = ?
                WHERE id = ?"#,
            )
            .bind(category.parent_id)
            .bind(&category.title)
            .bind(&slug)
            .bind(&category.description)
            .bind(category.priority)
            .bind(category.category_type)
            .bind(category.is_enabled as i32)
            .bind(category.id)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(format!(
                    "Category {} not found",
                    category.id
                )));
            }
            tracing::info!(id = category.id, "Updated category");
            category.id
        };

        self.get_category(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Category {} vanished after save", id)))
    }

    /// Whether `ancestor` is `id` itself or appears on the parent chain above it.
    ///
    /// The walk stops at the root, at a missing row, or after visiting as many rows as
    /// the table holds, so a chain that already loops cannot hang it.
    async fn is_ancestor_or_self(&self, ancestor: i64, id: i64) -> Result<bool, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;

        let mut current = id;
        for _ in 0..=total {
            if current == ancestor {
                return Ok(true);
            }
            if current == 0 {
                return Ok(false);
            }
            let parent: Option<i64> =
                sqlx::query_scalar("SELECT parent_id FROM categories WHERE id = ?")
                    .bind(current)
                    .fetch_optional(&self.pool)
                    .await?;
            match parent {
                Some(parent) => current = parent,
                None => return Ok(false),
            }
        }
        Ok(false)
    }
}

fn category_from_row(row: &sqlx::sqlite::SqliteRow) -> Category {
    let is_enabled: i32 = row.get("is_enabled");
    let created_at: DateTime<Utc> = row.get("created_at");
    Category {
        id: row.get("id"),
        parent_id: row.get("parent_id"),
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
        priority: row.get("priority"),
        category_type: row.get("category_type"),
        is_enabled: is_enabled != 0,
        child_count: row.get("child_count"),
        created_at,
    }
}
