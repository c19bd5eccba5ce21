//! Blog post model and its listing criteria.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::{
    CacheKey, ColumnOptions, ContentQuery, FilterState, Listable, QueryCriteria, Rule, SortValue,
    StatusFlag,
};

use super::BulkAction;

/// A blog post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Blog {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub short_description: String,
    /// Full post body, only populated for profile loads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub category_id: i64,
    /// Comma-separated tag slugs
    pub tags: String,
    pub author: String,
    pub is_enabled: bool,
    pub is_approved: bool,
    pub is_draft: bool,
    pub is_archived: bool,
    pub is_featured: bool,
    pub views: i64,
    pub created_at: DateTime<Utc>,
}

impl Blog {
    /// Bulk actions a blog accepts.
    pub const ACTIONS: &'static [BulkAction] = &[
        BulkAction::Enable,
        BulkAction::Disable,
        BulkAction::Approve,
        BulkAction::Unapprove,
        BulkAction::Draft,
        BulkAction::Publish,
        BulkAction::Archive,
        BulkAction::Unarchive,
        BulkAction::Featured,
        BulkAction::Unfeatured,
        BulkAction::Delete,
    ];

    fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .split(',')
            .any(|t| t.trim().eq_ignore_ascii_case(tag.trim()))
    }
}

impl Listable for Blog {
    const ORDER_FIELDS: &'static [&'static str] =
        &["id", "title", "createdAt", "views", "isFeatured"];
    const DEFAULT_ORDER: &'static str = "createdAt desc";

    fn id(&self) -> i64 {
        self.id
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn status(&self, flag: StatusFlag) -> Option<bool> {
        Some(match flag {
            StatusFlag::Enabled => self.is_enabled,
            StatusFlag::Approved => self.is_approved,
            StatusFlag::Draft => self.is_draft,
            StatusFlag::Archived => self.is_archived,
        })
    }

    fn search_columns(&self) -> Vec<&str> {
        vec![&self.title[..], &self.short_description[..], &self.tags[..]]
    }

    fn sort_value(&self, field: &str) -> SortValue {
        match field {
            "title" => SortValue::text(&self.title),
            "createdAt" => SortValue::Time(self.created_at),
            "views" => SortValue::Int(self.views),
            "isFeatured" => SortValue::Int(i64::from(self.is_featured)),
            _ => SortValue::Int(self.id),
        }
    }

    fn project(self, columns: ColumnOptions) -> Self {
        match columns {
            ColumnOptions::Profile => self,
            ColumnOptions::List => Self { body: None, ..self },
            ColumnOptions::Dropdown => Self {
                id: self.id,
                title: self.title,
                ..Default::default()
            },
        }
    }
}

/// Listing criteria for blog posts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogQuery {
    #[serde(flatten)]
    pub base: QueryCriteria,
    pub category_id: i64,
    pub author: String,
    pub tag: String,
    pub is_featured: FilterState,
}

impl ContentQuery for BlogQuery {
    type Record = Blog;

    const NAMESPACE: &'static str = "blogs";

    fn base(&self) -> &QueryCriteria {
        &self.base
    }

    fn base_mut(&mut self) -> &mut QueryCriteria {
        &mut self.base
    }

    fn rules() -> Vec<Rule<Self>> {
        vec![
            Rule::new("categoryId", |q| q.category_id > 0, |q, r| {
                r.category_id == q.category_id
            }),
            Rule::new("author", |q| !q.author.trim().is_empty(), |q, r| {
                r.author.eq_ignore_ascii_case(q.author.trim())
            }),
            Rule::new("tag", |q| !q.tag.trim().is_empty(), |q, r| r.has_tag(&q.tag)),
            Rule::new("isFeatured", |q| q.is_featured.is_set(), |q, r| {
                q.is_featured.wanted() == Some(r.is_featured)
            }),
        ]
    }

    fn key_parts(&self, key: &mut CacheKey) {
        key.push(self.category_id)
            .push_text(&self.author.trim().to_lowercase())
            .push_text(&self.tag.trim().to_lowercase())
            .push(self.is_featured.as_str());
    }
}
