//! Tag persistence.

use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::errors::AppError;
use crate::models::Tag;

use super::repository::{created_or_now, require_title, slug_or_title, Repository};

impl Repository {
    /// List all tags.
    pub async fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        let rows = sqlx::query(
            "SELECT id, title, slug, tag_type, priority, is_enabled, created_at FROM tags ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(tag_from_row).collect())
    }

    /// Get a tag by ID.
    pub async fn get_tag(&self, id: i64) -> Result<Option<Tag>, AppError> {
        let row = sqlx::query(
            "SELECT id, title, slug, tag_type, priority, is_enabled, created_at FROM tags WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(tag_from_row))
    }

    /// Create the tag when its id is 0, otherwise overwrite the stored one.
    pub async fn save_tag(&self, tag: &Tag) -> Result<Tag, AppError> {
        require_title(&tag.title, "Tag")?;
        let mut saved = tag.clone();
        saved.slug = slug_or_title(&tag.slug, &tag.title);

        if tag.id == 0 {
            saved.created_at = created_or_now(tag.created_at);
            let result = sqlx::query(
                "INSERT INTO tags (title, slug, tag_type, priority, is_enabled, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&saved.title)
            .bind(&saved.slug)
            .bind(saved.tag_type)
            .bind(saved.priority)
            .bind(saved.is_enabled as i32)
            .bind(saved.created_at)
            .execute(&self.pool)
            .await?;

            saved.id = result.last_insert_rowid();
            tracing::info!(id = saved.id, "Created tag");
            return Ok(saved);
        }

        let row = sqlx::query("SELECT created_at FROM tags WHERE id = ?")
            .bind(tag.id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tag {} not found", tag.id)))?;
        saved.created_at = row.get("created_at");

        sqlx::query(
            "UPDATE tags SET title = ?, slug = ?, tag_type = ?, priority = ?, is_enabled = ? WHERE id = ?",
        )
        .bind(&saved.title)
        .bind(&saved.slug)
        .bind(saved.tag_type)
        .bind(saved.priority)
        .bind(saved.is_enabled as i32)
        .bind(saved.id)
        .execute(&self.pool)
        .await?;

        tracing::info!(id = saved.id, "Updated tag");
        Ok(saved)
    }
}

fn tag_from_row(row: &sqlx::sqlite::SqliteRow) -> Tag {
    let is_enabled: i32 = row.get("is_enabled");
    let created_at: DateTime<Utc> = row.get("created_at");
    Tag {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        tag_type: row.get("tag_type"),
        priority: row.get("priority"),
        is_enabled: is_enabled != 0,
        created_at,
    }
}
