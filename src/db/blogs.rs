//! Blog persistence.

use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::errors::AppError;
use crate::models::Blog;

use super::repository::{created_or_now, require_title, slug_or_title, Repository};

const BLOG_COLUMNS: &str = "id, title, slug, short_description, body, category_id, tags, author, \
     is_enabled, is_approved, is_draft, is_archived, is_featured, views, created_at";

impl Repository {
    /// List all blogs.
    pub async fn list_blogs(&self) -> Result<Vec<Blog>, AppError> {
        let sql = format!("SELECT {} FROM blogs ORDER BY id", BLOG_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(blog_from_row).collect())
    }

    /// Get a blog by ID.
    pub async fn get_blog(&self, id: i64) -> Result<Option<Blog>, AppError> {
        let sql = format!("SELECT {} FROM blogs WHERE id = ?", BLOG_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(blog_from_row))
    }

    /// Create the blog when its id is 0, otherwise overwrite the stored one.
    pub async fn save_blog(&self, blog: &Blog) -> Result<Blog, AppError> {
        require_title(&blog.title, "Blog")?;
        let mut saved = blog.clone();
        saved.slug = slug_or_title(&blog.slug, &blog.title);

        if blog.id == 0 {
            saved.created_at = created_or_now(blog.created_at);
            let result = sqlx::query(
                r#"INSERT INTO blogs (
                    title, slug, short_description, body, category_id, tags, author,
                    is_enabled, is_approved, is_draft, is_archived, is_featured, views, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(&saved.title)
            .bind(&saved.slug)
            .bind(&saved.short_description)
            .bind(&saved.body)
            .bind(saved.category_id)
            .bind(&saved.tags)
            .bind(&saved.author)
            .bind(saved.is_enabled as i32)
            .bind(saved.is_approved as i32)
            .bind(saved.is_draft as i32)
            .bind(saved.is_archived as i32)
            .bind(saved.is_featured as i32)
            .bind(saved.views)
            .bind(saved.created_at)
            .execute(&self.pool)
            .await?;

            saved.id = result.last_insert_rowid();
            tracing::info!(id = saved.id, slug = %saved.slug, "Created blog");
            return Ok(saved);
        }

        let existing = self
            .get_blog(blog.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Blog {} not found", blog.id)))?;
        saved.created_at = existing.created_at;
        // List loads carry no body; keep the stored one rather than erasing it
        if saved.body.is_none() {
            saved.body = existing.body;
        }

        sqlx::query(
            r#"UPDATE blogs SET
                title = ?, slug = ?, short_description = ?, body = ?, category_id = ?, tags = ?,
                author = ?, is_enabled = ?, is_approved = ?, is_draft = ?, is_archived = ?,
                is_featured = ?, views = ?
            WHERE id = ?"#,
        )
        .bind(&saved.title)
        .bind(&saved.slug)
        .bind(&saved.short_description)
        .bind(&saved.body)
        .bind(saved.category_id)
        .bind(&saved.tags)
        .bind(&saved.author)
        .bind(saved.is_enabled as i32)
        .bind(saved.is_approved as i32)
        .bind(saved.is_draft as i32)
        .bind(saved.is_archived as i32)
        .bind(saved.is_featured as i32)
        .bind(saved.views)
        .bind(saved.id)
        .execute(&self.pool)
        .await?;

        tracing::info!(id = saved.id, "Updated blog");
        Ok(saved)
    }
}

fn blog_from_row(row: &sqlx::sqlite::SqliteRow) -> Blog {
    let is_enabled: i32 = row.get("is_enabled");
    let is_approved: i32 = row.get("is_approved");
    let is_draft: i32 = row.get("is_draft");
    let is_archived: i32 = row.get("is_archived");
    let is_featured: i32 = row.get("is_featured");
    let created_at: DateTime<Utc> = row.get("created_at");
    Blog {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        short_description: row.get("short_description"),
        body: row.get("body"),
        category_id: row.get("category_id"),
        tags: row.get("tags"),
        author: row.get("author"),
        is_enabled: is_enabled != 0,
        is_approved: is_approved != 0,
        is_draft: is_draft != 0,
        is_archived: is_archived != 0,
        is_featured: is_featured != 0,
        views: row.get("views"),
        created_at,
    }
}
